//! Pascaline Object Model Engine
//!
//! This crate implements the runtime object model of the Pascaline
//! interpreter on top of an externally parsed AST:
//! - **Registry**: classes, records, interfaces, helpers, enums and operator
//!   tables (`registry` module)
//! - **Interpreter**: declaration builder, virtual method tables, property
//!   access, operator resolution, helpers and record value semantics
//!   (`interp` module)
//! - **Runtime**: values, scopes, call stack, options and errors (`runtime`
//!   module)
//!
//! # Example
//!
//! ```rust,ignore
//! use pascaline_engine::ast::{build::*, ClassDecl, FunctionDecl, Program};
//! use pascaline_engine::Interpreter;
//!
//! let class = ClassDecl::new("TGreeter").method(
//!     FunctionDecl::function("Hello", ty("String")).body(vec![result(string("hi"))]),
//! );
//! let program = Program::new()
//!     .decl(class)
//!     .stmt(let_("g", method_call(ident("TGreeter"), "Create", vec![])))
//!     .stmt(let_("s", method_call(ident("g"), "Hello", vec![])));
//!
//! let mut interp = Interpreter::new();
//! interp.run(&program).unwrap();
//! assert_eq!(interp.global("s").unwrap().as_str(), Some("hi"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// AST node shapes and a builder for assembling programs
pub mod ast;

/// Case-insensitive identifier handling
pub mod ident;

/// Declaration builder, dispatch and the evaluator
pub mod interp;

/// Type registry
pub mod registry;

/// Values, scopes, call stack, options and errors
pub mod runtime;

// ============================================================================
// Re-exports
// ============================================================================

pub use interp::{BuiltinLibrary, DefaultBuiltins, Interpreter, PropertyReceiver};
pub use registry::{TypeEntry, TypeRegistry};
pub use runtime::{
    ClassId, EngineOptions, EnumId, EvalResult, HelperId, InterfaceId, RecordId, RuntimeError,
    Type, Value,
};
