//! Terse constructors for expressions and statements
//!
//! All nodes get a default span. Hosts with real source positions build the
//! enum variants directly.

use super::{BinaryOp, Expr, Literal, Span, Stmt, TypeExpr, UnaryOp};

const NO_SPAN: Span = Span::new(0, 0);

// ============================================================================
// Types
// ============================================================================

/// Named type
pub fn ty(name: &str) -> TypeExpr {
    TypeExpr::named(name)
}

/// `array of T`
pub fn array_of(element: TypeExpr) -> TypeExpr {
    TypeExpr::DynamicArray(Box::new(element))
}

/// `array[low..high] of T`
pub fn static_array(element: TypeExpr, low: i64, high: i64) -> TypeExpr {
    TypeExpr::StaticArray {
        element: Box::new(element),
        low,
        high,
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Integer literal
pub fn int(value: i64) -> Expr {
    Expr::Literal(Literal::Integer(value), NO_SPAN)
}

/// Float literal
pub fn float(value: f64) -> Expr {
    Expr::Literal(Literal::Float(value), NO_SPAN)
}

/// String literal
pub fn string(value: &str) -> Expr {
    Expr::Literal(Literal::String(value.to_string()), NO_SPAN)
}

/// Boolean literal
pub fn boolean(value: bool) -> Expr {
    Expr::Literal(Literal::Boolean(value), NO_SPAN)
}

/// `nil`
pub fn nil() -> Expr {
    Expr::Literal(Literal::Nil, NO_SPAN)
}

/// Identifier
pub fn ident(name: &str) -> Expr {
    Expr::Ident(name.to_string(), NO_SPAN)
}

/// `Self`
pub fn self_() -> Expr {
    ident("Self")
}

/// `object.member`
pub fn member(object: Expr, name: &str) -> Expr {
    Expr::Member {
        object: Box::new(object),
        member: name.to_string(),
        span: NO_SPAN,
    }
}

/// `callee(args)`
pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
        span: NO_SPAN,
    }
}

/// `name(args)`
pub fn call_fn(name: &str, args: Vec<Expr>) -> Expr {
    call(ident(name), args)
}

/// `object.method(args)`
pub fn method_call(object: Expr, method: &str, args: Vec<Expr>) -> Expr {
    call(member(object, method), args)
}

/// `object[indices]`
pub fn index(object: Expr, indices: Vec<Expr>) -> Expr {
    Expr::Index {
        object: Box::new(object),
        indices,
        span: NO_SPAN,
    }
}

/// Binary operation
pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: NO_SPAN,
    }
}

/// `left + right`
pub fn add(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Add, left, right)
}

/// `left - right`
pub fn sub(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Sub, left, right)
}

/// `left * right`
pub fn mul(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Mul, left, right)
}

/// `left = right`
pub fn eq(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Eq, left, right)
}

/// `left < right`
pub fn lt(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Lt, left, right)
}

/// `left > right`
pub fn gt(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Gt, left, right)
}

/// Unary operation
pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
        span: NO_SPAN,
    }
}

/// `not operand`
pub fn not(operand: Expr) -> Expr {
    unary(UnaryOp::Not, operand)
}

/// `-operand`
pub fn neg(operand: Expr) -> Expr {
    unary(UnaryOp::Neg, operand)
}

/// `inherited`
pub fn inherited() -> Expr {
    Expr::Inherited {
        method: None,
        args: Vec::new(),
        span: NO_SPAN,
    }
}

/// `inherited Name(args)`
pub fn inherited_call(method: &str, args: Vec<Expr>) -> Expr {
    Expr::Inherited {
        method: Some(method.to_string()),
        args,
        span: NO_SPAN,
    }
}

/// `expr is T`
pub fn is(expr: Expr, type_name: &str) -> Expr {
    Expr::Is {
        expr: Box::new(expr),
        type_name: type_name.to_string(),
        span: NO_SPAN,
    }
}

/// `expr as T`
pub fn as_(expr: Expr, type_name: &str) -> Expr {
    Expr::As {
        expr: Box::new(expr),
        type_name: type_name.to_string(),
        span: NO_SPAN,
    }
}

/// `@target`
pub fn address_of(target: Expr) -> Expr {
    Expr::AddressOf {
        target: Box::new(target),
        span: NO_SPAN,
    }
}

/// `[elements]`
pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::ArrayLiteral {
        elements,
        span: NO_SPAN,
    }
}

/// `T(Field: value; ...)`
pub fn record(type_name: &str, fields: Vec<(&str, Expr)>) -> Expr {
    Expr::RecordLiteral {
        type_name: type_name.to_string(),
        fields: fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
        span: NO_SPAN,
    }
}

// ============================================================================
// Statements
// ============================================================================

/// `var name: T;`
pub fn var(name: &str, ty: TypeExpr) -> Stmt {
    Stmt::VarDecl {
        name: name.to_string(),
        ty: Some(ty),
        init: None,
        span: NO_SPAN,
    }
}

/// `var name: T := init;`
pub fn var_init(name: &str, ty: TypeExpr, init: Expr) -> Stmt {
    Stmt::VarDecl {
        name: name.to_string(),
        ty: Some(ty),
        init: Some(init),
        span: NO_SPAN,
    }
}

/// `var name := init;`
pub fn let_(name: &str, init: Expr) -> Stmt {
    Stmt::VarDecl {
        name: name.to_string(),
        ty: None,
        init: Some(init),
        span: NO_SPAN,
    }
}

/// `target := value;`
pub fn assign(target: Expr, value: Expr) -> Stmt {
    Stmt::Assign {
        target,
        value,
        span: NO_SPAN,
    }
}

/// `name := value;`
pub fn set(name: &str, value: Expr) -> Stmt {
    assign(ident(name), value)
}

/// `Result := value;`
pub fn result(value: Expr) -> Stmt {
    set("Result", value)
}

/// Expression statement
pub fn expr(expr: Expr) -> Stmt {
    Stmt::Expr(expr)
}

/// `begin .. end`
pub fn block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Block(stmts)
}

/// `if cond then then_branch`
pub fn if_(cond: Expr, then_branch: Stmt) -> Stmt {
    Stmt::If {
        cond,
        then_branch: Box::new(then_branch),
        else_branch: None,
        span: NO_SPAN,
    }
}

/// `if cond then then_branch else else_branch`
pub fn if_else(cond: Expr, then_branch: Stmt, else_branch: Stmt) -> Stmt {
    Stmt::If {
        cond,
        then_branch: Box::new(then_branch),
        else_branch: Some(Box::new(else_branch)),
        span: NO_SPAN,
    }
}

/// `while cond do body`
pub fn while_(cond: Expr, body: Stmt) -> Stmt {
    Stmt::While {
        cond,
        body: Box::new(body),
        span: NO_SPAN,
    }
}

/// `for var := start to end do body`
pub fn for_to(var: &str, start: Expr, end: Expr, body: Stmt) -> Stmt {
    Stmt::For {
        var: var.to_string(),
        start,
        end,
        descending: false,
        body: Box::new(body),
        span: NO_SPAN,
    }
}

/// `for var := start downto end do body`
pub fn for_downto(var: &str, start: Expr, end: Expr, body: Stmt) -> Stmt {
    Stmt::For {
        var: var.to_string(),
        start,
        end,
        descending: true,
        body: Box::new(body),
        span: NO_SPAN,
    }
}

/// `Exit`
pub fn exit() -> Stmt {
    Stmt::Exit(None, NO_SPAN)
}

/// `Exit(value)`
pub fn exit_with(value: Expr) -> Stmt {
    Stmt::Exit(Some(value), NO_SPAN)
}
