//! Statement nodes

use super::{Expr, Span, TypeExpr};

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `begin .. end`
    Block(Vec<Stmt>),

    /// `var name: Type := init;`
    VarDecl {
        /// Variable name
        name: String,
        /// Declared type
        ty: Option<TypeExpr>,
        /// Initializer
        init: Option<Expr>,
        /// Location
        span: Span,
    },

    /// `target := value;`
    Assign {
        /// Assignment target (identifier, member, index)
        target: Expr,
        /// Assigned value
        value: Expr,
        /// Location
        span: Span,
    },

    /// Expression evaluated for its side effects (usually a call)
    Expr(Expr),

    /// `if cond then .. else ..`
    If {
        /// Condition
        cond: Expr,
        /// Then branch
        then_branch: Box<Stmt>,
        /// Optional else branch
        else_branch: Option<Box<Stmt>>,
        /// Location
        span: Span,
    },

    /// `while cond do ..`
    While {
        /// Condition
        cond: Expr,
        /// Loop body
        body: Box<Stmt>,
        /// Location
        span: Span,
    },

    /// `for var := start to|downto end do ..`
    For {
        /// Loop variable
        var: String,
        /// Start value
        start: Expr,
        /// End value (inclusive)
        end: Expr,
        /// `downto` when true
        descending: bool,
        /// Loop body
        body: Box<Stmt>,
        /// Location
        span: Span,
    },

    /// `Exit` or `Exit(value)`
    Exit(Option<Expr>, Span),
}

impl Stmt {
    /// Location of the statement
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(stmts) => stmts.first().map(Stmt::span).unwrap_or_default(),
            Stmt::Expr(expr) => expr.span(),
            Stmt::Exit(_, span) => *span,
            Stmt::VarDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. } => *span,
        }
    }
}
