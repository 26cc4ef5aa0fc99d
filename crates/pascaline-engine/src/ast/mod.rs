//! Abstract syntax tree consumed by the object model
//!
//! The parser lives outside this crate; these are the node shapes it hands
//! over. Declarations carry names, parameter lists and type annotations,
//! method bodies are opaque statement trees that only the evaluator walks.

pub mod build;
pub mod declaration;
pub mod expression;
pub mod statement;

pub use declaration::*;
pub use expression::*;
pub use statement::*;

use std::fmt;

/// Source position of a node (1-based line and column, 0 when unknown)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
}

impl Span {
    /// Create a span at the given position
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Whether this span points at a real source position
    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Type annotation as written in source
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A named type (`Integer`, `TPoint`, `Outer.Inner`)
    Named(String),
    /// `array of T`
    DynamicArray(Box<TypeExpr>),
    /// `array[low..high] of T`
    StaticArray {
        /// Element type
        element: Box<TypeExpr>,
        /// Lower bound (inclusive)
        low: i64,
        /// Upper bound (inclusive)
        high: i64,
    },
}

impl TypeExpr {
    /// Shorthand for a named type
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    /// Source-like rendering, used for operator signatures and messages
    pub fn display_name(&self) -> String {
        match self {
            TypeExpr::Named(name) => name.clone(),
            TypeExpr::DynamicArray(element) => format!("array of {}", element.display_name()),
            TypeExpr::StaticArray { element, low, high } => {
                format!("array[{}..{}] of {}", low, high, element.display_name())
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}
