//! Operator evaluation
//!
//! User overloads are consulted before the primitive rules. Lookup is an
//! exact match on the operand type names; an object operand also matches
//! under the name of each of its ancestors, so an operator declared for a
//! base class applies to its descendants. Class tables are searched before
//! the global table. `<>` falls back to a negated `=` overload.

use super::Interpreter;
use crate::ast::{BinaryOp, Expr, Span, UnaryOp};
use crate::ident::{normalize, normalize_type_name};
use crate::registry::{OperatorEntry, TypeEntry};
use crate::runtime::{EnumValue, EvalResult, RuntimeError, Type, Value};

impl Interpreter {
    // ========================================================================
    // Binary
    // ========================================================================

    pub(crate) fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> EvalResult<Value> {
        let lhs = self.eval_expr(left)?;
        if let (BinaryOp::And | BinaryOp::Or, Value::Boolean(b)) = (op, &lhs) {
            // Short-circuit only decides for the boolean forms
            if (op == BinaryOp::And && !*b) || (op == BinaryOp::Or && *b) {
                return Ok(Value::Boolean(*b));
            }
        }
        let rhs = self.eval_expr(right)?;
        self.apply_binary(op, lhs, rhs, span)
    }

    /// Apply a binary operator to evaluated operands
    pub fn apply_binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value, span: Span) -> EvalResult<Value> {
        let operands = [lhs, rhs];
        if let Some(value) = self.try_operator_overload(op.symbol(), &operands, span)? {
            return Ok(value);
        }
        if op == BinaryOp::Ne {
            if let Some(value) = self.try_operator_overload("=", &operands, span)? {
                return match value {
                    Value::Boolean(b) => Ok(Value::Boolean(!b)),
                    other => Err(RuntimeError::runtime(
                        format!(
                            "operator '=' returned {} instead of Boolean",
                            self.registry.value_type_name(&other)
                        ),
                        span,
                    )),
                };
            }
        }
        let [lhs, rhs] = operands;
        self.primitive_binary(op, &lhs, &rhs, span)
    }

    fn primitive_binary(&self, op: BinaryOp, lhs: &Value, rhs: &Value, span: Span) -> EvalResult<Value> {
        use BinaryOp::*;

        let division_by_zero = || RuntimeError::runtime("division by zero", span);
        let result = match (lhs, rhs) {
            (Value::Integer(a), Value::Integer(b)) => {
                let (a, b) = (*a, *b);
                match op {
                    Add => Some(Value::Integer(a.wrapping_add(b))),
                    Sub => Some(Value::Integer(a.wrapping_sub(b))),
                    Mul => Some(Value::Integer(a.wrapping_mul(b))),
                    Div => {
                        if b == 0 {
                            return Err(division_by_zero());
                        }
                        Some(Value::Float(a as f64 / b as f64))
                    }
                    IntDiv => {
                        if b == 0 {
                            return Err(division_by_zero());
                        }
                        Some(Value::Integer(a.wrapping_div(b)))
                    }
                    Mod => {
                        if b == 0 {
                            return Err(division_by_zero());
                        }
                        Some(Value::Integer(a.wrapping_rem(b)))
                    }
                    And => Some(Value::Integer(a & b)),
                    Or => Some(Value::Integer(a | b)),
                    Xor => Some(Value::Integer(a ^ b)),
                    Shl => Some(Value::Integer(a.wrapping_shl(b as u32))),
                    Shr => Some(Value::Integer(((a as u64).wrapping_shr(b as u32)) as i64)),
                    _ => compare(op, a.cmp(&b)),
                }
            }
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                let (a, b) = (lhs.as_float().unwrap_or_default(), rhs.as_float().unwrap_or_default());
                match op {
                    Add => Some(Value::Float(a + b)),
                    Sub => Some(Value::Float(a - b)),
                    Mul => Some(Value::Float(a * b)),
                    Div => {
                        if b == 0.0 {
                            return Err(division_by_zero());
                        }
                        Some(Value::Float(a / b))
                    }
                    _ => a.partial_cmp(&b).and_then(|ordering| compare(op, ordering)),
                }
            }
            (Value::String(a), Value::String(b)) => match op {
                Add => Some(Value::string(format!("{}{}", a, b))),
                _ => compare(op, a.cmp(b)),
            },
            (Value::Boolean(a), Value::Boolean(b)) => match op {
                And => Some(Value::Boolean(*a && *b)),
                Or => Some(Value::Boolean(*a || *b)),
                Xor => Some(Value::Boolean(a ^ b)),
                _ => compare(op, a.cmp(b)),
            },
            (Value::Enum(a), Value::Enum(b)) if a.enum_id == b.enum_id => {
                compare(op, a.ordinal.cmp(&b.ordinal))
            }
            (element, Value::Array(arr)) if op == In => Some(Value::Boolean(
                arr.borrow().elements.iter().any(|e| e == element),
            )),
            _ => match op {
                Eq => Some(Value::Boolean(lhs == rhs)),
                Ne => Some(Value::Boolean(lhs != rhs)),
                _ => None,
            },
        };
        result.ok_or_else(|| {
            RuntimeError::runtime(
                format!(
                    "operator '{}' not applicable to {} and {}",
                    op.symbol(),
                    self.registry.value_type_name(lhs),
                    self.registry.value_type_name(rhs)
                ),
                span,
            )
        })
    }

    // ========================================================================
    // Unary
    // ========================================================================

    pub(crate) fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> EvalResult<Value> {
        let value = self.eval_expr(operand)?;
        if let Some(result) = self.try_operator_overload(op.symbol(), std::slice::from_ref(&value), span)? {
            return Ok(result);
        }
        let result = match (op, &value) {
            (UnaryOp::Neg, Value::Integer(i)) => Some(Value::Integer(i.wrapping_neg())),
            (UnaryOp::Neg, Value::Float(f)) => Some(Value::Float(-f)),
            (UnaryOp::Plus, Value::Integer(_) | Value::Float(_)) => Some(value.clone()),
            (UnaryOp::Not, Value::Boolean(b)) => Some(Value::Boolean(!b)),
            (UnaryOp::Not, Value::Integer(i)) => Some(Value::Integer(!i)),
            _ => None,
        };
        result.ok_or_else(|| {
            RuntimeError::runtime(
                format!(
                    "operator '{}' not applicable to {}",
                    op.symbol(),
                    self.registry.value_type_name(&value)
                ),
                span,
            )
        })
    }

    // ========================================================================
    // Overload resolution
    // ========================================================================

    /// Find and run a user operator for the operands, `None` when none matches
    pub(crate) fn try_operator_overload(
        &mut self,
        symbol: &str,
        operands: &[Value],
        span: Span,
    ) -> EvalResult<Option<Value>> {
        let Some(entry) = self.find_operator(symbol, operands) else {
            return Ok(None);
        };
        tracing::trace!(symbol, binding = %entry.binding, "operator overload");
        self.invoke_operator(&entry, operands, span).map(Some)
    }

    fn find_operator(&self, symbol: &str, operands: &[Value]) -> Option<OperatorEntry> {
        let classes: Vec<_> = operands
            .iter()
            .filter_map(|v| v.as_object().map(|obj| obj.borrow().class))
            .collect();
        let in_class_table = classes
            .iter()
            .any(|c| self.registry.class(*c).operators.has_symbol(symbol));
        if !in_class_table && !self.registry.global_operators.has_symbol(symbol) {
            return None;
        }

        let signatures = self.operand_signatures(operands);
        for class in &classes {
            let table = &self.registry.class(*class).operators;
            if let Some(entry) = signatures.iter().find_map(|sig| table.lookup(symbol, sig)) {
                return Some(entry.clone());
            }
        }
        signatures
            .iter()
            .find_map(|sig| self.registry.global_operators.lookup(symbol, sig))
            .cloned()
    }

    /// Candidate operand signatures, most specific first
    fn operand_signatures(&self, operands: &[Value]) -> Vec<Vec<String>> {
        let mut signatures: Vec<Vec<String>> = vec![Vec::new()];
        for value in operands {
            let names: Vec<String> = match value {
                Value::Object(obj) => self
                    .registry
                    .ancestors(obj.borrow().class)
                    .into_iter()
                    .map(|c| normalize(&self.registry.class(c).name))
                    .collect(),
                other => vec![self.registry.value_type_name(other)],
            };
            signatures = signatures
                .into_iter()
                .flat_map(|prefix| {
                    names.iter().map(move |name| {
                        let mut sig = prefix.clone();
                        sig.push(name.clone());
                        sig
                    })
                })
                .collect();
        }
        signatures
    }

    fn invoke_operator(&mut self, entry: &OperatorEntry, operands: &[Value], span: Span) -> EvalResult<Value> {
        let key = normalize(&entry.binding);
        let not_found = || {
            RuntimeError::resolution(
                format!(
                    "operator '{}' binding '{}' not found",
                    entry.symbol, entry.binding
                ),
                span,
            )
        };
        match (entry.class, entry.self_index) {
            (Some(_), Some(index)) => {
                let receiver = operands.get(index).cloned().unwrap_or_default();
                let Value::Object(obj) = &receiver else {
                    return Err(RuntimeError::runtime(
                        format!("operator '{}' applied to nil", entry.symbol),
                        span,
                    ));
                };
                let class = obj.borrow().class;
                let args = operands
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, v)| v.clone())
                    .collect();
                self.dispatch(class, &receiver, &key, args, false, span)?
                    .ok_or_else(not_found)
            }
            (Some(class), None) => self
                .dispatch(class, &Value::Class(class), &key, operands.to_vec(), true, span)?
                .ok_or_else(not_found),
            (None, _) => self.call_function(&entry.binding, operands.to_vec(), span),
        }
    }

    // ========================================================================
    // Casts
    // ========================================================================

    /// Explicit cast `T(x)`; `None` when `name` is not a type
    pub(crate) fn eval_cast(&mut self, name: &str, value: Value, span: Span) -> EvalResult<Option<Value>> {
        let target = match Type::from_builtin_name(name) {
            Some(ty) => ty,
            None => match self.registry.lookup_type(name) {
                Some(TypeEntry::Class(id)) => Type::Class(id),
                Some(TypeEntry::Record(id)) => Type::Record(id),
                Some(TypeEntry::Interface(id)) => Type::Interface(id),
                Some(TypeEntry::Enum(id)) => Type::Enum(id),
                Some(TypeEntry::Array(array)) => Type::Array(array),
                Some(TypeEntry::Subrange(range)) => Type::Subrange(range),
                Some(TypeEntry::Alias(ty)) => ty,
                Some(TypeEntry::Helper(_)) | None => return Ok(None),
            },
        };

        let from = self.registry.value_type_name(&value);
        let to = normalize_type_name(&self.registry.type_name(&target));
        if from != to {
            let binding = self
                .registry
                .conversions
                .lookup(&from, &to)
                .map(|c| c.binding.clone());
            if let Some(binding) = binding {
                return self.call_function(&binding, vec![value], span).map(Some);
            }
        }

        let invalid = |interp: &Self, value: &Value| {
            RuntimeError::runtime(
                format!(
                    "cannot cast {} to {}",
                    interp.registry.value_type_name(value),
                    interp.registry.type_name(&target)
                ),
                span,
            )
        };
        let cast = match (&target, &value) {
            (Type::Variant, _) => value.clone(),
            (Type::Integer, Value::Integer(_)) => value.clone(),
            (Type::Integer, Value::Float(f)) => Value::Integer(f.trunc() as i64),
            (Type::Integer, Value::Boolean(b)) => Value::Integer(*b as i64),
            (Type::Integer, Value::Enum(e)) => Value::Integer(e.ordinal),
            (Type::Float, Value::Integer(_) | Value::Float(_)) => {
                Value::Float(value.as_float().unwrap_or_default())
            }
            (Type::String, _) => Value::string(self.display(&value)),
            (Type::Boolean, Value::Boolean(_)) => value.clone(),
            (Type::Boolean, Value::Integer(i)) => Value::Boolean(*i != 0),
            (Type::Enum(id), Value::Integer(i)) => Value::Enum(EnumValue {
                enum_id: *id,
                ordinal: *i,
            }),
            (Type::Enum(id), Value::Enum(e)) if e.enum_id == *id => value.clone(),
            (Type::Subrange(_), Value::Integer(_)) => self.coerce(value.clone(), &target, span)?,
            (Type::Record(id), Value::Record(rec)) if rec.record == *id => value.clone(),
            (Type::Class(_) | Type::Interface(_), Value::Nil) => Value::Nil,
            (Type::Class(id), Value::Object(obj)) => {
                if !self.registry.inherits_from(obj.borrow().class, *id) {
                    return Err(RuntimeError::runtime("invalid class cast", span));
                }
                value.clone()
            }
            (Type::Class(id), Value::Class(class)) => {
                if !self.registry.inherits_from(*class, *id) {
                    return Err(RuntimeError::runtime("invalid class cast", span));
                }
                value.clone()
            }
            (Type::Interface(id), Value::Object(obj)) => {
                if !self.registry.class_implements(obj.borrow().class, *id) {
                    return Err(RuntimeError::runtime("invalid class cast", span));
                }
                value.clone()
            }
            (Type::Array(_), Value::Array(_)) => value.clone(),
            _ => return Err(invalid(self, &value)),
        };
        Ok(Some(cast))
    }
}

fn compare(op: BinaryOp, ordering: std::cmp::Ordering) -> Option<Value> {
    use std::cmp::Ordering::*;
    let result = match op {
        BinaryOp::Eq => ordering == Equal,
        BinaryOp::Ne => ordering != Equal,
        BinaryOp::Lt => ordering == Less,
        BinaryOp::Le => ordering != Greater,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::Ge => ordering != Less,
        _ => return None,
    };
    Some(Value::Boolean(result))
}
