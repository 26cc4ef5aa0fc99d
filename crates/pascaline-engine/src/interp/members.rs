//! Member access on objects, class references and type values
//!
//! Lookup order on an instance: field, property, method, constructor, class
//! variable, constant, helper. Class references see constructors, class
//! methods, class properties, class variables, constants and nested classes.

use super::property::PropertyReceiver;
use super::{Context, Interpreter};
use crate::ast::Span;
use crate::ident::normalize;
use crate::runtime::{ClassId, EnumValue, EvalResult, ObjectRef, RuntimeError, Value};

/// Outcome of a member access
///
/// `receiver` carries the mutated copy when a record method ran; the caller
/// decides whether there is a variable to write it back to.
#[derive(Debug, Clone)]
pub(crate) struct Access {
    pub value: Value,
    pub receiver: Option<Value>,
}

impl Access {
    pub(crate) fn value(value: Value) -> Self {
        Self {
            value,
            receiver: None,
        }
    }
}

impl Interpreter {
    /// Read a member or call a method on a receiver
    ///
    /// `args` is `Some` for an explicit call `x.M(..)`; a bare `x.M` names a
    /// field or property, or calls a parameterless method.
    pub(crate) fn access_member(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Access> {
        if let Some(access) = self.lookup_member(receiver, name, args, span)? {
            return Ok(access);
        }
        let owner = match receiver {
            Value::Object(obj) => {
                format!("class '{}'", self.registry.class(obj.borrow().class).name)
            }
            Value::Class(id) => format!("class '{}'", self.registry.class(*id).name),
            Value::Record(rec) => format!("record '{}'", self.registry.record(rec.record).name),
            Value::RecordType(id) => format!("record '{}'", self.registry.record(*id).name),
            Value::EnumType(id) => format!("enum '{}'", self.registry.enum_info(*id).name),
            other => format!("type '{}'", self.registry.value_type_name(other)),
        };
        Err(RuntimeError::resolution(
            format!("member '{}' not found in {}", name, owner),
            span,
        ))
    }

    /// Like [`Interpreter::access_member`] but `None` when nothing matches
    pub(crate) fn lookup_member(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Access>> {
        let key = normalize(name);
        let found = match receiver {
            Value::Object(obj) => self.object_member(obj, &key, args.clone(), span)?,
            Value::Class(id) => self.class_member(*id, &key, args.clone(), span)?,
            Value::Record(rec) => self.record_member(rec, &key, args.clone(), span)?,
            Value::RecordType(id) => self.record_type_member(*id, &key, args.clone(), span)?,
            Value::EnumType(id) => self
                .registry
                .enum_info(*id)
                .ordinal_of(&key)
                .map(|ordinal| {
                    Access::value(Value::Enum(EnumValue {
                        enum_id: *id,
                        ordinal,
                    }))
                }),
            Value::Nil => {
                if key == "free" {
                    return Ok(Some(Access::value(Value::Nil)));
                }
                return Err(RuntimeError::runtime(
                    format!("cannot access member '{}' of nil", name),
                    span,
                ));
            }
            _ => None,
        };
        if found.is_some() {
            return Ok(found);
        }
        self.helper_member(receiver, &key, args, span)
    }

    fn object_member(
        &mut self,
        obj: &ObjectRef,
        key: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Access>> {
        let (class, destroyed, field) = {
            let instance = obj.borrow();
            (instance.class, instance.destroyed, instance.get_field(key))
        };
        if destroyed {
            return Err(RuntimeError::runtime("object already destroyed", span));
        }
        let this = Value::Object(obj.clone());

        match key {
            "free" => {
                self.destroy(obj, span)?;
                return Ok(Some(Access::value(Value::Nil)));
            }
            "classname" => {
                return Ok(Some(Access::value(Value::string(
                    self.registry.class(class).name.clone(),
                ))));
            }
            "classtype" => return Ok(Some(Access::value(Value::Class(class)))),
            _ => {}
        }

        if let (Some(value), None) = (&field, &args) {
            return Ok(Some(Access::value(value.clone())));
        }

        if let Some(property) = self.registry.find_property(class, key) {
            let receiver = PropertyReceiver::Instance(obj.clone());
            let value = match args {
                Some(indices) if property.is_indexed() => {
                    self.read_indexed_property(&receiver, &property, indices, span)?
                }
                _ => self.read_property(&receiver, &property, span)?,
            };
            return Ok(Some(Access::value(value)));
        }

        let is_destructor = self
            .registry
            .class(class)
            .destructor
            .as_ref()
            .is_some_and(|d| normalize(d.name()) == key);
        if is_destructor {
            self.destroy(obj, span)?;
            return Ok(Some(Access::value(Value::Nil)));
        }

        let call_args = args.clone().unwrap_or_default();
        if let Some(value) = self.dispatch(class, &this, key, call_args.clone(), false, span)? {
            return Ok(Some(Access::value(value)));
        }

        let overloads = self.registry.collect_constructors(class, key);
        if !overloads.is_empty() {
            let ctor = self.select_overload(&overloads, &call_args).ok_or_else(|| {
                RuntimeError::resolution(
                    format!("no constructor '{}' accepts {} argument(s)", key, call_args.len()),
                    span,
                )
            })?;
            self.run_constructor(obj, &ctor, call_args, span)?;
            return Ok(Some(Access::value(this)));
        }

        self.class_static_member(class, key, span)
    }

    pub(crate) fn class_member(
        &mut self,
        class: ClassId,
        key: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Access>> {
        let call_args = args.clone().unwrap_or_default();
        if let Some(ctor) = self.registry.collect_constructors(class, key).first() {
            let name = ctor.name().to_string();
            return self
                .instantiate(class, &name, call_args, span)
                .map(|v| Some(Access::value(v)));
        }
        if key == "classname" {
            return Ok(Some(Access::value(Value::string(
                self.registry.class(class).name.clone(),
            ))));
        }

        let this = Value::Class(class);
        if let Some(value) = self.dispatch(class, &this, key, call_args, true, span)? {
            return Ok(Some(Access::value(value)));
        }

        if let Some(property) = self.registry.find_property(class, key) {
            let receiver = PropertyReceiver::Class(class);
            let value = match args {
                Some(indices) if property.is_indexed() => {
                    self.read_indexed_property(&receiver, &property, indices, span)?
                }
                _ => self.read_property(&receiver, &property, span)?,
            };
            return Ok(Some(Access::value(value)));
        }

        if let Some(found) = self.class_static_member(class, key, span)? {
            return Ok(Some(found));
        }

        if self.registry.collect_overloads(class, key, false).is_empty() {
            return Ok(None);
        }
        Err(RuntimeError::semantic(
            format!(
                "cannot call instance method '{}.{}' without an instance",
                self.registry.class(class).name,
                key
            ),
            span,
        ))
    }

    /// Class variable, constant or nested class visible from `class`
    fn class_static_member(&mut self, class: ClassId, key: &str, span: Span) -> EvalResult<Option<Access>> {
        if let Some(owner) = self.registry.class_var_owner(class, key) {
            let value = self.registry.class(owner).class_vars[key].clone();
            return Ok(Some(Access::value(value)));
        }
        if self.registry.constant_owner(class, key).is_some() {
            return self
                .class_constant(class, key, span)
                .map(|v| Some(Access::value(v)));
        }
        Ok(self
            .registry
            .find_nested(class, key)
            .map(|nested| Access::value(Value::Class(nested))))
    }

    // ========================================================================
    // Class constants
    // ========================================================================

    /// Evaluate (once) and return a class constant visible from `class`
    pub(crate) fn class_constant(&mut self, class: ClassId, key: &str, span: Span) -> EvalResult<Value> {
        let Some(owner) = self.registry.constant_owner(class, key) else {
            return Err(RuntimeError::resolution(
                format!("constant '{}' not found", key),
                span,
            ));
        };
        if let Some(value) = self.registry.class(owner).constant_values.get(key) {
            return Ok(value.clone());
        }

        let guard = (owner, key.to_string());
        if self.constant_guard.contains(&guard) {
            return Err(RuntimeError::semantic(
                format!(
                    "circular constant reference '{}.{}'",
                    self.registry.class(owner).name,
                    key
                ),
                span,
            ));
        }
        let decl = self.registry.class(owner).constants[key].clone();
        self.constant_guard.push(guard);
        let value = self.eval_isolated(Context::class(owner), &decl.value);
        self.constant_guard.pop();
        let mut value = value?;
        if let Some(ty) = &decl.ty {
            let ty = self.resolve_type_expr(ty, decl.span)?;
            value = self.coerce(value, &ty, decl.span)?;
        }

        self.registry
            .class_mut(owner)
            .constant_values
            .insert(key.to_string(), value.clone());
        Ok(value)
    }
}
