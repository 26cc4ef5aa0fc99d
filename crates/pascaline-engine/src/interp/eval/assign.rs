//! Assignment targets
//!
//! Record members are assigned on a copy that is then stored back into
//! the expression the record came from, so `a.b.c := x` on nested records
//! rewrites each level on the way out.

use super::{index_integer, out_of_bounds, IndexedProperty};
use crate::ast::{Expr, Span};
use crate::ident::normalize;
use crate::interp::property::PropertyReceiver;
use crate::interp::Interpreter;
use crate::runtime::{ClassId, EvalResult, ObjectRef, RuntimeError, Value};

impl Interpreter {
    /// Assign `value` to an identifier, member or indexed target
    pub(crate) fn assign_to(&mut self, target: &Expr, value: Value, span: Span) -> EvalResult<()> {
        match target {
            Expr::Ident(name, _) => self.assign_identifier(name, value, span),
            Expr::Member { object, member, .. } => self.assign_member(object, member, value, span),
            Expr::Index {
                object, indices, ..
            } => self.assign_index(object, indices, value, span),
            _ => Err(RuntimeError::semantic("invalid assignment target", span)),
        }
    }

    fn assign_identifier(&mut self, name: &str, value: Value, span: Span) -> EvalResult<()> {
        let key = normalize(name);
        if key == "self" && self.env.get_until("Self", Some(&self.globals)).is_some() {
            self.store_self(value);
            return Ok(());
        }
        if self.env.set_until(&key, value.clone(), Some(&self.globals)) {
            return Ok(());
        }
        if let Some(this) = self.current_self() {
            if self.assign_self_member(&this, &key, value.clone(), span)? {
                return Ok(());
            }
        }
        if let Some(context) = self.current_context().cloned() {
            if let Some(class) = context.class {
                if self.assign_class_member(class, &key, value.clone(), span)? {
                    return Ok(());
                }
            }
            if let Some(record) = context.record {
                if self.registry.record(record).class_vars.contains_key(&key) {
                    return self.set_record_class_var(record, &key, value, span);
                }
            }
            if let Some(helper) = context.helper {
                if self.set_helper_class_var(helper, &key, value.clone()) {
                    return Ok(());
                }
            }
        }
        if self.globals.set(&key, value) {
            return Ok(());
        }
        Err(RuntimeError::resolution(
            format!("undeclared identifier '{}'", name),
            span,
        ))
    }

    /// Unqualified assignment to a member of `Self`
    fn assign_self_member(&mut self, this: &Value, key: &str, value: Value, span: Span) -> EvalResult<bool> {
        match this {
            Value::Object(obj) => self.assign_object_member(obj, key, value, span),
            Value::Class(class) => self.assign_class_member(*class, key, value, span),
            Value::Record(rec) => match self.assign_record_member(rec.clone(), key, value, span)? {
                Some(updated) => {
                    self.store_self(Value::Record(updated));
                    Ok(true)
                }
                None => Ok(false),
            },
            other => self.assign_helper_property(other, key, value, span),
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn assign_member(&mut self, object: &Expr, member: &str, value: Value, span: Span) -> EvalResult<()> {
        let receiver = self.eval_expr(object)?;
        let key = normalize(member);
        let done = match &receiver {
            Value::Object(obj) => self.assign_object_member(obj, &key, value.clone(), span)?,
            Value::Class(class) => self.assign_class_member(*class, &key, value.clone(), span)?,
            Value::Record(rec) => match self.assign_record_member(rec.clone(), &key, value.clone(), span)? {
                Some(updated) => {
                    self.assign_to(object, Value::Record(updated), span)?;
                    true
                }
                None => false,
            },
            Value::RecordType(id) => {
                if self.registry.record(*id).class_vars.contains_key(&key) {
                    self.set_record_class_var(*id, &key, value.clone(), span)?;
                    true
                } else {
                    false
                }
            }
            Value::Nil => {
                return Err(RuntimeError::runtime(
                    format!("cannot assign member '{}' of nil", member),
                    span,
                ))
            }
            _ => false,
        };
        if done || self.assign_helper_property(&receiver, &key, value, span)? {
            return Ok(());
        }
        Err(RuntimeError::resolution(
            format!(
                "member '{}' not found in {}",
                member,
                self.registry.value_type_name(&receiver)
            ),
            span,
        ))
    }

    /// Field, property, class variable of an instance; false when absent
    pub(crate) fn assign_object_member(
        &mut self,
        obj: &ObjectRef,
        key: &str,
        value: Value,
        span: Span,
    ) -> EvalResult<bool> {
        let (class, destroyed, has_field) = {
            let instance = obj.borrow();
            (instance.class, instance.destroyed, instance.fields.contains_key(key))
        };
        if destroyed {
            return Err(RuntimeError::runtime("object already destroyed", span));
        }
        if has_field {
            let ty = self
                .registry
                .ancestors(class)
                .into_iter()
                .find_map(|c| self.registry.class(c).fields.get(key).map(|f| f.ty.clone()));
            let value = match ty {
                Some(ty) => self.coerce(value, &ty, span)?,
                None => value,
            };
            obj.borrow_mut().set_field(key, value);
            return Ok(true);
        }
        if let Some(property) = self.registry.find_property(class, key) {
            self.write_property(&PropertyReceiver::Instance(obj.clone()), &property, value, span)?;
            return Ok(true);
        }
        self.assign_class_member(class, key, value, span)
    }

    /// Class variable or class property; constants are read-only
    fn assign_class_member(&mut self, class: ClassId, key: &str, value: Value, span: Span) -> EvalResult<bool> {
        if self.registry.class_var_owner(class, key).is_some() {
            self.set_class_var(class, key, value, span)?;
            return Ok(true);
        }
        if let Some(property) = self.registry.find_property(class, key) {
            self.write_property(&PropertyReceiver::Class(class), &property, value, span)?;
            return Ok(true);
        }
        if let Some(owner) = self.registry.constant_owner(class, key) {
            return Err(RuntimeError::access(
                format!(
                    "cannot assign to constant '{}.{}'",
                    self.registry.class(owner).name,
                    key
                ),
                span,
            ));
        }
        Ok(false)
    }

    fn assign_helper_property(&mut self, receiver: &Value, key: &str, value: Value, span: Span) -> EvalResult<bool> {
        let found = self.helpers_for_value(receiver).into_iter().find_map(|helper| {
            self.registry.helper_chain(helper).into_iter().find_map(|link| {
                let property = self.registry.helper(link).properties.get(key)?.clone();
                Some((link, property))
            })
        });
        let Some((helper, property)) = found else {
            return Ok(false);
        };
        let receiver = PropertyReceiver::Helper {
            helper,
            value: receiver.clone(),
        };
        self.write_property(&receiver, &property, value, span)?;
        Ok(true)
    }

    // ========================================================================
    // Indexed targets
    // ========================================================================

    fn assign_index(&mut self, object: &Expr, indices: &[Expr], value: Value, span: Span) -> EvalResult<()> {
        if let Expr::Member {
            object: inner,
            member,
            ..
        } = object
        {
            let receiver = self.eval_expr(inner)?;
            if let Some(target) = self.indexed_property(&receiver, &normalize(member)) {
                let indices = self.eval_args(indices)?;
                return self.write_indexed(inner, receiver, target, indices, value, span);
            }
        }
        let base = self.eval_expr(object)?;
        let indices = self.eval_args(indices)?;
        self.store_indexed(object, base, indices, value, span)
    }

    fn write_indexed(
        &mut self,
        holder: &Expr,
        receiver: Value,
        target: IndexedProperty,
        indices: Vec<Value>,
        value: Value,
        span: Span,
    ) -> EvalResult<()> {
        let IndexedProperty { helper, property } = target;
        if let Some(helper) = helper {
            let receiver = PropertyReceiver::Helper {
                helper,
                value: receiver,
            };
            return self.write_indexed_property(&receiver, &property, indices, value, span);
        }
        match receiver {
            Value::Object(obj) => {
                self.write_indexed_property(&PropertyReceiver::Instance(obj), &property, indices, value, span)
            }
            Value::Class(class) => {
                self.write_indexed_property(&PropertyReceiver::Class(class), &property, indices, value, span)
            }
            Value::Record(rec) => {
                let updated = self.write_record_indexed_property(&rec, &property, indices, value, span)?;
                self.assign_to(holder, Value::Record(updated), span)
            }
            other => Err(RuntimeError::runtime(
                format!("cannot index {}", self.registry.value_type_name(&other)),
                span,
            )),
        }
    }

    /// Store through `base[indices]` where `base` was read from `target`
    fn store_indexed(
        &mut self,
        target: &Expr,
        base: Value,
        indices: Vec<Value>,
        value: Value,
        span: Span,
    ) -> EvalResult<()> {
        let Some((last, path)) = indices.split_last() else {
            return Err(RuntimeError::semantic("missing index", span));
        };
        match &base {
            Value::Object(obj) => {
                let class = obj.borrow().class;
                let property = self.registry.default_property(class).ok_or_else(|| {
                    RuntimeError::resolution(
                        format!("type '{}' has no default property", self.registry.class(class).name),
                        span,
                    )
                })?;
                self.write_indexed_property(&PropertyReceiver::Instance(obj.clone()), &property, indices, value, span)
            }
            Value::Record(rec) => {
                let property = self.record_default_property(rec).ok_or_else(|| {
                    RuntimeError::resolution(
                        format!(
                            "type '{}' has no default property",
                            self.registry.record(rec.record).name
                        ),
                        span,
                    )
                })?;
                let updated = self.write_record_indexed_property(rec, &property, indices, value, span)?;
                self.assign_to(target, Value::Record(updated), span)
            }
            Value::String(s) => {
                if !path.is_empty() {
                    return Err(RuntimeError::runtime("strings take a single index", span));
                }
                let i = index_integer(last, span)?;
                let replacement = match value.as_str() {
                    Some(c) if c.chars().count() == 1 => c.to_string(),
                    _ => {
                        return Err(RuntimeError::runtime(
                            "string element must be a single character",
                            span,
                        ))
                    }
                };
                let mut chars: Vec<char> = s.chars().collect();
                let count = chars.len() as i64;
                let slot = usize::try_from(i - 1)
                    .ok()
                    .filter(|n| *n < chars.len())
                    .ok_or_else(|| out_of_bounds(i, 1, count, span))?;
                chars.splice(slot..=slot, replacement.chars());
                self.assign_to(target, Value::string(chars.into_iter().collect::<String>()), span)
            }
            Value::Array(_) => {
                let container = self.index_value(base.clone(), path.to_vec(), span)?;
                let Value::Array(arr) = &container else {
                    return self.store_indexed_in(container, last.clone(), value, span);
                };
                let i = index_integer(last, span)?;
                let (slot, element_type) = {
                    let arr = arr.borrow();
                    let slot = arr
                        .slot(i)
                        .ok_or_else(|| out_of_bounds(i, arr.low(), arr.high(), span))?;
                    (slot, arr.element_type.clone())
                };
                let value = self.coerce(value, &element_type, span)?;
                arr.borrow_mut().elements[slot] = value;
                Ok(())
            }
            other => Err(RuntimeError::runtime(
                format!("cannot index {}", self.registry.value_type_name(other)),
                span,
            )),
        }
    }

    /// Last-dimension store into an element that is not itself an array
    fn store_indexed_in(&mut self, container: Value, index: Value, value: Value, span: Span) -> EvalResult<()> {
        match container {
            Value::Object(obj) => {
                let class = obj.borrow().class;
                let property = self.registry.default_property(class).ok_or_else(|| {
                    RuntimeError::resolution(
                        format!("type '{}' has no default property", self.registry.class(class).name),
                        span,
                    )
                })?;
                self.write_indexed_property(&PropertyReceiver::Instance(obj), &property, vec![index], value, span)
            }
            other => Err(RuntimeError::runtime(
                format!("cannot assign an element of {}", self.registry.value_type_name(&other)),
                span,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::build::*;
    use crate::interp::Interpreter;
    use crate::runtime::Value;

    #[test]
    fn test_array_element_assignment_is_shared() {
        let mut interp = Interpreter::new();
        interp.exec(&let_("a", array(vec![int(1), int(2)]))).unwrap();
        interp.exec(&let_("b", ident("a"))).unwrap();
        interp.exec(&assign(index(ident("a"), vec![int(0)]), int(9))).unwrap();
        assert_eq!(
            interp.eval(&index(ident("b"), vec![int(0)])).unwrap(),
            Value::Integer(9)
        );
    }

    #[test]
    fn test_string_char_assignment() {
        let mut interp = Interpreter::new();
        interp.exec(&let_("s", string("cat"))).unwrap();
        interp.exec(&assign(index(ident("s"), vec![int(1)]), string("b"))).unwrap();
        assert_eq!(interp.global("s"), Some(Value::string("bat")));
    }

    #[test]
    fn test_undeclared_assignment_fails() {
        let mut interp = Interpreter::new();
        let err = interp.exec(&set("ghost", int(1))).unwrap_err();
        assert!(err.to_string().contains("undeclared identifier 'ghost'"));
    }
}
