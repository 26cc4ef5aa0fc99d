//! Invocation protocol
//!
//! Every body (method, accessor, helper method, global function) runs the
//! same way: push a call-stack frame, enter a fresh child of the global
//! scope, let the caller bind `Self` and friends, bind parameters, seed
//! `Result` and alias the function's own name to it, run the body, read
//! `Result` back and restore the caller's scope.

use super::{Context, Interpreter};
use crate::ast::{FunctionDecl, Span, Stmt, TypeExpr};
use crate::ident::{normalize, normalize_type_name};
use crate::registry::{MethodOwner, MethodRef};
use crate::runtime::{Environment, EvalResult, RuntimeError, Type, Value};
use std::rc::Rc;

impl Interpreter {
    /// Run a method body with caller-provided bindings
    ///
    /// `bind` runs after the scope is created and before parameters are
    /// bound; `finish` runs after the body, while the scope is still alive.
    pub(crate) fn invoke_body<B, F, T>(
        &mut self,
        method: &MethodRef,
        args: Vec<Value>,
        mut context: Context,
        span: Span,
        bind: B,
        finish: F,
    ) -> EvalResult<(Value, T)>
    where
        B: FnOnce(&mut Self, &Environment) -> EvalResult<()>,
        F: FnOnce(&mut Self, &Environment) -> EvalResult<T>,
    {
        let decl = method.decl.clone();
        let frame = self.qualified_name(method);
        let Some(body) = decl.body.as_ref() else {
            return Err(RuntimeError::semantic(
                format!("method '{}' has no body", frame),
                span,
            ));
        };

        self.call_stack.push(frame, span)?;
        let scope = Environment::enclosed(&self.globals);
        let saved = std::mem::replace(&mut self.env, scope.clone());
        context.method = Some(method.clone());
        context.args = args.clone();
        self.contexts.push(context);

        let outcome = self.run_in_scope(&scope, &decl, body, args, span, bind, finish);

        self.contexts.pop();
        self.env = saved;
        self.call_stack.pop();
        outcome.map_err(|err| err.with_span(span))
    }

    #[allow(clippy::too_many_arguments)]
    fn run_in_scope<B, F, T>(
        &mut self,
        scope: &Environment,
        decl: &FunctionDecl,
        body: &[Stmt],
        args: Vec<Value>,
        span: Span,
        bind: B,
        finish: F,
    ) -> EvalResult<(Value, T)>
    where
        B: FnOnce(&mut Self, &Environment) -> EvalResult<()>,
        F: FnOnce(&mut Self, &Environment) -> EvalResult<T>,
    {
        bind(self, scope)?;
        self.bind_params(scope, decl, args, span)?;
        if let Some(ret) = &decl.return_type {
            let ty = self.resolve_type_expr(ret, span)?;
            scope.define("Result", self.zero_value(&ty)?);
            scope.define_alias(&decl.name, "Result");
        }

        self.exec_block(body)?;

        let result = if decl.return_type.is_some() {
            scope.get_local("Result").unwrap_or_default()
        } else {
            Value::Nil
        };
        let extra = finish(self, scope)?;
        Ok((result, extra))
    }

    /// Bind arguments to formal parameters, applying conversions
    pub(crate) fn bind_params(
        &mut self,
        scope: &Environment,
        decl: &FunctionDecl,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<()> {
        if args.len() != decl.params.len() {
            return Err(RuntimeError::resolution(
                format!(
                    "wrong number of arguments for '{}': expected {}, got {}",
                    decl.name,
                    decl.params.len(),
                    args.len()
                ),
                span,
            ));
        }
        for (param, arg) in decl.params.iter().zip(args) {
            let value = match &param.ty {
                Some(ty) => {
                    let ty = self.resolve_type_expr(ty, span)?;
                    self.coerce(arg, &ty, span)?
                }
                None => arg,
            };
            scope.define(&param.name, value);
        }
        Ok(())
    }

    /// Qualified display name of a method, e.g. `TPoint.Move`
    pub(crate) fn qualified_name(&self, method: &MethodRef) -> String {
        let owner = match method.owner {
            MethodOwner::Class(id) => Some(self.registry.class(id).name.as_str()),
            MethodOwner::Record(id) => Some(self.registry.record(id).name.as_str()),
            MethodOwner::Helper(id) => Some(self.registry.helper(id).name.as_str()),
            MethodOwner::Global => None,
        };
        match owner {
            Some(owner) => format!("{}.{}", owner, method.name()),
            None => method.name().to_string(),
        }
    }

    // ========================================================================
    // Types and coercion
    // ========================================================================

    /// Resolve a type annotation or fail with an unknown-type error
    pub(crate) fn resolve_type_expr(&self, expr: &TypeExpr, span: Span) -> EvalResult<Type> {
        self.registry.resolve_type(expr).ok_or_else(|| {
            RuntimeError::declaration(format!("unknown type '{}'", expr.display_name()), span)
        })
    }

    /// Zero value of a type, running record field initializers
    pub(crate) fn zero_value(&mut self, ty: &Type) -> EvalResult<Value> {
        match ty {
            Type::Record(id) => self.new_record(*id),
            other => Ok(self.registry.zero_value(other)),
        }
    }

    /// Best-effort runtime type of a value
    pub(crate) fn type_of_value(&self, value: &Value) -> Type {
        match value {
            Value::Integer(_) => Type::Integer,
            Value::Float(_) => Type::Float,
            Value::String(_) => Type::String,
            Value::Boolean(_) => Type::Boolean,
            Value::Object(obj) => Type::Class(obj.borrow().class),
            Value::Record(rec) => Type::Record(rec.record),
            Value::Enum(e) => Type::Enum(e.enum_id),
            Value::Array(arr) => {
                let arr = arr.borrow();
                Type::Array(Rc::new(crate::runtime::ArrayType {
                    element: arr.element_type.clone(),
                    bounds: arr.bounds,
                }))
            }
            Value::Function(_) => Type::Function,
            Value::Nil | Value::Class(_) | Value::RecordType(_) | Value::EnumType(_) => {
                Type::Variant
            }
        }
    }

    /// Convert a value for storage in a slot of type `ty`
    ///
    /// Integers widen to floats, subranges are range checked and user
    /// `implicit` conversion operators are applied when the value's type
    /// differs from the target type.
    pub(crate) fn coerce(&mut self, value: Value, ty: &Type, span: Span) -> EvalResult<Value> {
        match (ty, &value) {
            (Type::Variant, _) => return Ok(value),
            (Type::Float, Value::Integer(i)) => return Ok(Value::Float(*i as f64)),
            (Type::Subrange(range), Value::Integer(i)) => {
                if !range.contains(*i) {
                    return Err(RuntimeError::runtime(
                        format!(
                            "value {} out of range for {} ({}..{})",
                            i, range.name, range.low, range.high
                        ),
                        span,
                    ));
                }
                return Ok(value);
            }
            _ => {}
        }

        let from = self.registry.value_type_name(&value);
        let to = normalize_type_name(&self.registry.type_name(ty));
        if from == to || value.is_nil() {
            return Ok(value);
        }
        let binding = self
            .registry
            .conversions
            .find_implicit(&from, &to)
            .map(|c| c.binding.clone());
        match binding {
            Some(binding) => self.call_function(&binding, vec![value], span),
            None => Ok(value),
        }
    }

    /// How well a value matches a parameter type: `None` if incompatible
    pub(crate) fn match_score(&self, value: &Value, param: Option<&TypeExpr>) -> Option<u32> {
        let Some(expr) = param else {
            return Some(1);
        };
        let Some(ty) = self.registry.resolve_type(expr) else {
            return Some(0);
        };
        let exact = match (&ty, value) {
            (Type::Variant, _) => return Some(1),
            (Type::Integer, Value::Integer(_))
            | (Type::Float, Value::Float(_))
            | (Type::String, Value::String(_))
            | (Type::Boolean, Value::Boolean(_))
            | (Type::Function, Value::Function(_)) => true,
            (Type::Subrange(range), Value::Integer(i)) => range.contains(*i),
            (Type::Float, Value::Integer(_)) => return Some(2),
            (Type::Enum(a), Value::Enum(e)) => *a == e.enum_id,
            (Type::Record(a), Value::Record(r)) => *a == r.record,
            (Type::Class(a), Value::Object(obj)) => {
                let class = obj.borrow().class;
                if class == *a {
                    true
                } else {
                    return self.registry.inherits_from(class, *a).then_some(2);
                }
            }
            (Type::Interface(i), Value::Object(obj)) => {
                return self
                    .registry
                    .class_implements(obj.borrow().class, *i)
                    .then_some(2);
            }
            (Type::Class(_) | Type::Interface(_) | Type::Function, Value::Nil) => {
                return Some(2)
            }
            (Type::Array(_), Value::Array(_)) => return Some(2),
            _ => false,
        };
        if exact {
            return Some(3);
        }
        let from = self.registry.value_type_name(value);
        let to = normalize_type_name(&self.registry.type_name(&ty));
        self.registry
            .conversions
            .find_implicit(&from, &to)
            .map(|_| 1)
    }

    /// Pick the overload whose parameters best fit the arguments
    ///
    /// Candidates must match the argument count. Among them the best type
    /// score wins, earlier candidates win ties. When no candidate is
    /// type-compatible the first one with the right count is returned and
    /// binding reports the mismatch.
    pub(crate) fn select_overload(&self, candidates: &[MethodRef], args: &[Value]) -> Option<MethodRef> {
        let arity: Vec<&MethodRef> = candidates
            .iter()
            .filter(|m| m.decl.params.len() == args.len())
            .collect();
        if arity.len() <= 1 {
            return arity.first().map(|m| (*m).clone());
        }
        let mut best: Option<(u32, &MethodRef)> = None;
        for candidate in &arity {
            let score = candidate
                .decl
                .params
                .iter()
                .zip(args)
                .try_fold(0u32, |acc, (param, arg)| {
                    self.match_score(arg, param.ty.as_ref()).map(|s| acc + s)
                });
            if let Some(score) = score {
                if best.map_or(true, |(b, _)| score > b) {
                    best = Some((score, candidate));
                }
            }
        }
        best.map(|(_, m)| m.clone())
            .or_else(|| arity.first().map(|m| (*m).clone()))
    }

    // ========================================================================
    // Global functions
    // ========================================================================

    /// Overloads of a global function
    pub(crate) fn function_overloads(&self, name: &str) -> Vec<MethodRef> {
        self.functions
            .get(&normalize(name))
            .map(|list| {
                list.iter()
                    .map(|decl| MethodRef::new(decl.clone(), MethodOwner::Global))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Call a global function by name
    pub fn call_function(&mut self, name: &str, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        let overloads = self.function_overloads(name);
        if overloads.is_empty() {
            return Err(RuntimeError::resolution(
                format!("function '{}' not found", name),
                span,
            ));
        }
        let function = self.select_overload(&overloads, &args).ok_or_else(|| {
            RuntimeError::resolution(
                format!(
                    "no overload of '{}' accepts {} argument(s)",
                    name,
                    args.len()
                ),
                span,
            )
        })?;
        self.invoke_body(&function, args, Context::default(), span, |_, _| Ok(()), |_, _| Ok(()))
            .map(|(value, _)| value)
    }
}
