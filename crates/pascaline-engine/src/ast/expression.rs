//! Expression nodes

use super::Span;

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal
    String(String),
    /// `True` / `False`
    Boolean(bool),
    /// `nil`
    Nil,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` (always floating-point)
    Div,
    /// `div`
    IntDiv,
    /// `mod`
    Mod,
    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`
    Xor,
    /// `shl`
    Shl,
    /// `shr`
    Shr,
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
}

impl BinaryOp {
    /// Operator symbol as it appears in source and in operator declarations
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::IntDiv => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "shr",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
        }
    }

    /// Whether this is a comparison producing a Boolean
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `not x`
    Not,
}

impl UnaryOp {
    /// Operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "not",
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal, Span),

    /// Identifier reference (`x`, `Self`, `Result`, `TFoo`)
    Ident(String, Span),

    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
        /// Location
        span: Span,
    },

    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
        /// Location
        span: Span,
    },

    /// Member access `object.member` (a parameterless call when the member is a method)
    Member {
        /// Receiver expression
        object: Box<Expr>,
        /// Member name
        member: String,
        /// Location
        span: Span,
    },

    /// Call `callee(args)`
    Call {
        /// Callee, usually an identifier or a member access
        callee: Box<Expr>,
        /// Arguments
        args: Vec<Expr>,
        /// Location
        span: Span,
    },

    /// Indexing `object[indices]`
    Index {
        /// Indexed expression
        object: Box<Expr>,
        /// Index expressions
        indices: Vec<Expr>,
        /// Location
        span: Span,
    },

    /// `inherited` or `inherited Name(args)`
    Inherited {
        /// Explicit method name; `None` re-targets the current method
        method: Option<String>,
        /// Arguments; ignored for the bare form which forwards the current parameters
        args: Vec<Expr>,
        /// Location
        span: Span,
    },

    /// `expr is TypeName`
    Is {
        /// Tested expression
        expr: Box<Expr>,
        /// Class or interface name
        type_name: String,
        /// Location
        span: Span,
    },

    /// `expr as TypeName`
    As {
        /// Cast expression
        expr: Box<Expr>,
        /// Class or interface name
        type_name: String,
        /// Location
        span: Span,
    },

    /// `@target` function or method pointer
    AddressOf {
        /// Function identifier or `object.Method`
        target: Box<Expr>,
        /// Location
        span: Span,
    },

    /// `[a, b, c]`
    ArrayLiteral {
        /// Elements
        elements: Vec<Expr>,
        /// Location
        span: Span,
    },

    /// `TPoint(X: 1; Y: 2)` anonymous record construction
    RecordLiteral {
        /// Record type name
        type_name: String,
        /// Field initializers in source order
        fields: Vec<(String, Expr)>,
        /// Location
        span: Span,
    },
}

impl Expr {
    /// Location of the expression
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, span) | Expr::Ident(_, span) => *span,
            Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Member { span, .. }
            | Expr::Call { span, .. }
            | Expr::Index { span, .. }
            | Expr::Inherited { span, .. }
            | Expr::Is { span, .. }
            | Expr::As { span, .. }
            | Expr::AddressOf { span, .. }
            | Expr::ArrayLiteral { span, .. }
            | Expr::RecordLiteral { span, .. } => *span,
        }
    }

    /// The identifier name if this is a bare identifier
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name, _) => Some(name),
            _ => None,
        }
    }
}
