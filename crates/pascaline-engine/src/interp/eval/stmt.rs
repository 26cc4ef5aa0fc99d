//! Statement execution

use crate::ast::{Expr, Span, Stmt};
use crate::interp::{Flow, Interpreter};
use crate::runtime::{EvalResult, RuntimeError, Value};

impl Interpreter {
    /// Execute statements in order, stopping at `Exit`
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt]) -> EvalResult<Flow> {
        for stmt in stmts {
            if self.exec_stmt(stmt)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Normal)
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Block(stmts) => self.exec_block(stmts),
            Stmt::VarDecl {
                name,
                ty,
                init,
                span,
            } => {
                let value = match (ty, init) {
                    (Some(ty), init) => {
                        let ty = self.resolve_type_expr(ty, *span)?;
                        match init {
                            Some(init) => {
                                let value = self.eval_expr(init)?;
                                self.coerce(value, &ty, *span)?
                            }
                            None => self.zero_value(&ty)?,
                        }
                    }
                    (None, Some(init)) => self.eval_expr(init)?,
                    (None, None) => {
                        return Err(RuntimeError::semantic(
                            format!("variable '{}' needs a type or an initializer", name),
                            *span,
                        ))
                    }
                };
                self.env.define(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign {
                target,
                value,
                span,
            } => {
                let value = self.eval_expr(value)?;
                self.assign_to(target, value, *span)?;
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                if self.eval_condition(cond)? {
                    self.exec_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body, .. } => {
                while self.eval_condition(cond)? {
                    if self.exec_stmt(body)? == Flow::Exit {
                        return Ok(Flow::Exit);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                var,
                start,
                end,
                descending,
                body,
                span,
            } => self.exec_for(var, start, end, *descending, body, *span),
            Stmt::Exit(value, span) => {
                if let Some(value) = value {
                    let value = self.eval_expr(value)?;
                    if !self.env.set("Result", value) {
                        return Err(RuntimeError::semantic(
                            "'Exit' with a value outside of a function",
                            *span,
                        ));
                    }
                }
                Ok(Flow::Exit)
            }
        }
    }

    fn eval_condition(&mut self, cond: &Expr) -> EvalResult<bool> {
        match self.eval_expr(cond)? {
            Value::Boolean(b) => Ok(b),
            other => Err(RuntimeError::runtime(
                format!(
                    "condition must be Boolean, got {}",
                    self.registry.value_type_name(&other)
                ),
                cond.span(),
            )),
        }
    }

    /// Counted loop; both bounds are evaluated once, inclusive
    fn exec_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        descending: bool,
        body: &Stmt,
        span: Span,
    ) -> EvalResult<Flow> {
        let bound = |value: Value| {
            value.as_integer().ok_or_else(|| {
                RuntimeError::runtime(
                    format!("for-loop bound must be Integer, got {}", value.type_tag()),
                    span,
                )
            })
        };
        let start = bound(self.eval_expr(start)?)?;
        let end = bound(self.eval_expr(end)?)?;
        if self.env.get(var).is_none() {
            self.env.define(var, Value::Integer(start));
        }

        let mut current = start;
        loop {
            let done = if descending { current < end } else { current > end };
            if done {
                break;
            }
            self.env.set(var, Value::Integer(current));
            if self.exec_stmt(body)? == Flow::Exit {
                return Ok(Flow::Exit);
            }
            let next = if descending {
                current.checked_sub(1)
            } else {
                current.checked_add(1)
            };
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(Flow::Normal)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::build::*;
    use crate::interp::Interpreter;
    use crate::runtime::Value;

    #[test]
    fn test_for_loop_sums_inclusive_range() {
        let mut interp = Interpreter::new();
        interp.exec(&let_("total", int(0))).unwrap();
        interp
            .exec(&for_to(
                "i",
                int(1),
                int(4),
                set("total", add(ident("total"), ident("i"))),
            ))
            .unwrap();
        assert_eq!(interp.global("total"), Some(Value::Integer(10)));
    }

    #[test]
    fn test_for_downto_and_empty_range() {
        let mut interp = Interpreter::new();
        interp.exec(&let_("n", int(0))).unwrap();
        interp
            .exec(&for_downto("i", int(3), int(1), set("n", add(ident("n"), int(1)))))
            .unwrap();
        interp
            .exec(&for_to("i", int(5), int(1), set("n", add(ident("n"), int(100)))))
            .unwrap();
        assert_eq!(interp.global("n"), Some(Value::Integer(3)));
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let mut interp = Interpreter::new();
        let err = interp.exec(&if_(int(1), expr(int(2)))).unwrap_err();
        assert!(err.to_string().contains("condition must be Boolean"));
    }

    #[test]
    fn test_var_without_type_or_init() {
        let mut interp = Interpreter::new();
        let stmt = crate::ast::Stmt::VarDecl {
            name: "x".into(),
            ty: None,
            init: None,
            span: Default::default(),
        };
        assert!(interp.exec(&stmt).is_err());
    }
}
