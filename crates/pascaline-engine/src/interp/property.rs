//! Property access protocol
//!
//! A property read or write is dispatched on the accessor kind recorded at
//! declaration time:
//!
//! - `Field`: an identifier that may still turn out to be a method. It is
//!   resolved on every access in the order class variable, constant, field,
//!   method.
//! - `Method` / `Indexed`: a getter or setter call. Index directive values
//!   come first, then the index arguments, then (for writes) the value.
//! - `Expression`: re-evaluated on each read with `Self` and every field of
//!   the receiver bound as plain identifiers.
//! - `Builtin`: an intrinsic accessor such as `Length` on arrays.
//!
//! Non-indexed reads and writes are tracked on a chain so a property that
//! reaches itself again fails instead of recursing without bound.

use super::{Context, Interpreter};
use crate::ast::{Expr, Span};
use crate::ident::normalize;
use crate::registry::{BuiltinAccessor, PropertyAccess, PropertyInfo};
use crate::runtime::{
    ClassId, Environment, EvalResult, HelperId, ObjectRef, RuntimeError, Value,
};
use std::rc::Rc;

/// Target of a property access
#[derive(Debug, Clone)]
pub enum PropertyReceiver {
    /// Instance property on an object
    Instance(ObjectRef),
    /// Class property (no `Self`)
    Class(ClassId),
    /// Helper property on an arbitrary value
    Helper {
        /// Helper declaring the property
        helper: HelperId,
        /// Extended value, bound as `Self`
        value: Value,
    },
}

/// Identity of an in-flight property access
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PropertyKey {
    receiver: ReceiverIdentity,
    name: String,
    write: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReceiverIdentity {
    Object(usize),
    Class(u32),
    Helper(u32),
    Record(u32),
}

impl PropertyKey {
    pub(crate) fn new(receiver: ReceiverIdentity, name: &str, write: bool) -> Self {
        Self {
            receiver,
            name: normalize(name),
            write,
        }
    }
}

impl PropertyReceiver {
    fn identity(&self) -> ReceiverIdentity {
        match self {
            PropertyReceiver::Instance(obj) => ReceiverIdentity::Object(Rc::as_ptr(obj) as usize),
            PropertyReceiver::Class(id) => ReceiverIdentity::Class(id.0),
            PropertyReceiver::Helper { helper, .. } => ReceiverIdentity::Helper(helper.0),
        }
    }

    fn self_value(&self) -> Value {
        match self {
            PropertyReceiver::Instance(obj) => Value::Object(obj.clone()),
            PropertyReceiver::Class(id) => Value::Class(*id),
            PropertyReceiver::Helper { value, .. } => value.clone(),
        }
    }
}

impl Interpreter {
    // ========================================================================
    // Entry points
    // ========================================================================

    /// Read a non-indexed property
    pub fn read_property(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        span: Span,
    ) -> EvalResult<Value> {
        if property.is_indexed() {
            return Err(RuntimeError::resolution(
                format!("indexed property '{}' requires index arguments", property.name),
                span,
            ));
        }
        let key = PropertyKey::new(receiver.identity(), &property.name, false);
        self.guarded(key, &property.name, span, |interp| {
            interp.read_property_unguarded(receiver, property, span)
        })
    }

    /// Write a non-indexed property
    pub fn write_property(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        value: Value,
        span: Span,
    ) -> EvalResult<()> {
        if property.is_indexed() {
            return Err(RuntimeError::resolution(
                format!("indexed property '{}' requires index arguments", property.name),
                span,
            ));
        }
        let key = PropertyKey::new(receiver.identity(), &property.name, true);
        self.guarded(key, &property.name, span, |interp| {
            interp.write_property_unguarded(receiver, property, value, span)
        })
    }

    /// Read an indexed property
    pub fn read_indexed_property(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        indices: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        self.check_indexed(property, indices.len(), span)?;
        let spec = match &property.read {
            PropertyAccess::None => {
                return Err(RuntimeError::access(
                    format!("property '{}' is write-only", property.name),
                    span,
                ))
            }
            PropertyAccess::Indexed(spec) | PropertyAccess::Method(spec) => spec.clone(),
            _ => return Err(field_backed(property, span)),
        };
        let mut args = property.directive_args();
        args.extend(indices);
        self.call_accessor(receiver, property, &spec, args, span)
    }

    /// Write an indexed property
    pub fn write_indexed_property(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        indices: Vec<Value>,
        value: Value,
        span: Span,
    ) -> EvalResult<()> {
        self.check_indexed(property, indices.len(), span)?;
        let spec = match &property.write {
            PropertyAccess::None => {
                return Err(RuntimeError::access(
                    format!("property '{}' is read-only", property.name),
                    span,
                ))
            }
            PropertyAccess::Indexed(spec) | PropertyAccess::Method(spec) => spec.clone(),
            _ => return Err(field_backed(property, span)),
        };
        let mut args = property.directive_args();
        args.extend(indices);
        args.push(value);
        self.call_accessor(receiver, property, &spec, args, span)
            .map(|_| ())
    }

    fn check_indexed(&self, property: &PropertyInfo, count: usize, span: Span) -> EvalResult<()> {
        if !property.is_indexed() {
            return Err(RuntimeError::resolution(
                format!("property '{}' is not indexed", property.name),
                span,
            ));
        }
        if count != property.index_param_count {
            return Err(RuntimeError::resolution(
                format!(
                    "property '{}' expects {} index argument(s), got {}",
                    property.name, property.index_param_count, count
                ),
                span,
            ));
        }
        Ok(())
    }

    /// Run `f` with `key` on the property chain
    pub(crate) fn guarded<T>(
        &mut self,
        key: PropertyKey,
        name: &str,
        span: Span,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        if self.property_chain.contains(&key) {
            tracing::debug!(property = %name, "circular property reference");
            return Err(RuntimeError::semantic(
                format!("circular property reference detected: {}", name),
                span,
            ));
        }
        self.property_chain.push(key);
        let result = f(self);
        self.property_chain.pop();
        result
    }

    // ========================================================================
    // Reads
    // ========================================================================

    fn read_property_unguarded(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        span: Span,
    ) -> EvalResult<Value> {
        match &property.read {
            PropertyAccess::None => Err(RuntimeError::access(
                format!("property '{}' is write-only", property.name),
                span,
            )),
            PropertyAccess::Field(spec) => self.read_field_spec(receiver, property, spec, span),
            PropertyAccess::Method(spec) | PropertyAccess::Indexed(spec) => {
                self.call_accessor(receiver, property, spec, property.directive_args(), span)
            }
            PropertyAccess::Expression(expr) => {
                self.eval_property_expression(receiver, property, expr, span)
            }
            PropertyAccess::Builtin(accessor) => {
                self.read_builtin(*accessor, &receiver.self_value(), span)
            }
        }
    }

    /// Resolve an identifier read specifier: class var, constant, field, method
    fn read_field_spec(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        spec: &str,
        span: Span,
    ) -> EvalResult<Value> {
        if property.index_value.is_some() {
            return Err(field_backed(property, span));
        }
        let key = normalize(spec);
        let found = match receiver {
            PropertyReceiver::Instance(obj) => {
                let class = obj.borrow().class;
                match self.class_level_value(class, &key, span)? {
                    Some(value) => Some(value),
                    None => {
                        let field = obj.borrow().get_field(&key);
                        match field {
                            Some(value) => Some(value),
                            None => self.dispatch(
                                class,
                                &Value::Object(obj.clone()),
                                &key,
                                Vec::new(),
                                false,
                                span,
                            )?,
                        }
                    }
                }
            }
            PropertyReceiver::Class(class) => match self.class_level_value(*class, &key, span)? {
                Some(value) => Some(value),
                None => self.dispatch(*class, &Value::Class(*class), &key, Vec::new(), true, span)?,
            },
            PropertyReceiver::Helper { helper, value } => {
                match self.helper_static_value(*helper, &key) {
                    Some(found) => Some(found),
                    None => match value {
                        Value::Object(obj) if obj.borrow().fields.contains_key(&key) => {
                            obj.borrow().get_field(&key)
                        }
                        Value::Record(rec) if rec.fields.contains_key(&key) => {
                            rec.fields.get(&key).cloned()
                        }
                        _ => self.call_helper_by_name(*helper, value, &key, Vec::new(), span)?,
                    },
                }
            }
        };
        found.ok_or_else(|| unresolved(property, spec, span))
    }

    /// Class variable, then constant, visible from `class`
    fn class_level_value(&mut self, class: ClassId, key: &str, span: Span) -> EvalResult<Option<Value>> {
        if let Some(owner) = self.registry.class_var_owner(class, key) {
            return Ok(self.registry.class(owner).class_vars.get(key).cloned());
        }
        if self.registry.constant_owner(class, key).is_some() {
            return self.class_constant(class, key, span).map(Some);
        }
        Ok(None)
    }

    /// Call a getter or setter method by name
    fn call_accessor(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        spec: &str,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        let key = normalize(spec);
        let found = match receiver {
            PropertyReceiver::Instance(obj) => {
                let class = obj.borrow().class;
                self.dispatch(class, &Value::Object(obj.clone()), &key, args, false, span)?
            }
            PropertyReceiver::Class(class) => {
                self.dispatch(*class, &Value::Class(*class), &key, args, true, span)?
            }
            PropertyReceiver::Helper { helper, value } => {
                self.call_helper_by_name(*helper, value, &key, args, span)?
            }
        };
        match found {
            Some(value) => Ok(value),
            None if property.is_indexed() && self.names_storage(receiver, &key) => {
                Err(field_backed(property, span))
            }
            None => Err(unresolved(property, spec, span)),
        }
    }

    /// Whether `key` is a field or class variable visible from the receiver
    fn names_storage(&self, receiver: &PropertyReceiver, key: &str) -> bool {
        let class = match receiver {
            PropertyReceiver::Instance(obj) => obj.borrow().class,
            PropertyReceiver::Class(class) => *class,
            PropertyReceiver::Helper { .. } => return false,
        };
        self.registry.class(class).fields.contains_key(key)
            || self.registry.class_var_owner(class, key).is_some()
    }

    /// Evaluate an expression getter with `Self` and fields in scope
    fn eval_property_expression(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        expr: &Expr,
        span: Span,
    ) -> EvalResult<Value> {
        let scope = Environment::enclosed(&self.globals);
        let mut context = Context::default();
        match receiver {
            PropertyReceiver::Instance(obj) => {
                let instance = obj.borrow();
                scope.define("Self", Value::Object(obj.clone()));
                for (key, value) in &instance.fields {
                    scope.define(key, value.clone());
                }
                context.class = Some(instance.class);
            }
            PropertyReceiver::Class(class) => context.class = Some(*class),
            PropertyReceiver::Helper { helper, value } => {
                scope.define("Self", value.clone());
                if let Value::Record(rec) = value {
                    for (key, field) in &rec.fields {
                        scope.define(key, field.clone());
                    }
                }
                context.helper = Some(*helper);
            }
        }

        self.call_stack.push(format!("property {}", property.name), span)?;
        let saved = std::mem::replace(&mut self.env, scope);
        let result = self.with_context(context, |interp| interp.eval_expr(expr));
        self.env = saved;
        self.call_stack.pop();
        result.map_err(|err| err.with_span(span))
    }

    /// Evaluate an intrinsic accessor
    pub(crate) fn read_builtin(
        &self,
        accessor: BuiltinAccessor,
        value: &Value,
        span: Span,
    ) -> EvalResult<Value> {
        let result = match (accessor, value) {
            (BuiltinAccessor::ArrayLength | BuiltinAccessor::ArrayCount, Value::Array(arr)) => {
                Some(Value::Integer(arr.borrow().len() as i64))
            }
            (BuiltinAccessor::ArrayHigh, Value::Array(arr)) => Some(Value::Integer(arr.borrow().high())),
            (BuiltinAccessor::ArrayLow, Value::Array(arr)) => Some(Value::Integer(arr.borrow().low())),
            (BuiltinAccessor::StringLength, Value::String(s)) => {
                Some(Value::Integer(s.chars().count() as i64))
            }
            (BuiltinAccessor::EnumValue, Value::Enum(e)) => Some(Value::Integer(e.ordinal)),
            (BuiltinAccessor::EnumName, Value::Enum(e)) => Some(Value::string(
                self.registry
                    .enum_info(e.enum_id)
                    .name_of(e.ordinal)
                    .map(str::to_string)
                    .unwrap_or_else(|| e.ordinal.to_string()),
            )),
            (BuiltinAccessor::EnumQualifiedName, Value::Enum(e)) => {
                let info = self.registry.enum_info(e.enum_id);
                let member = info
                    .name_of(e.ordinal)
                    .map(str::to_string)
                    .unwrap_or_else(|| e.ordinal.to_string());
                Some(Value::string(format!("{}.{}", info.name, member)))
            }
            (
                BuiltinAccessor::ToString,
                Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::String(_),
            ) => Some(Value::string(value.to_string())),
            _ => None,
        };
        result.ok_or_else(|| {
            RuntimeError::runtime(
                format!(
                    "'{}' is not applicable to {}",
                    accessor.name(),
                    self.registry.value_type_name(value)
                ),
                span,
            )
        })
    }

    // ========================================================================
    // Writes
    // ========================================================================

    fn write_property_unguarded(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        value: Value,
        span: Span,
    ) -> EvalResult<()> {
        match &property.write {
            PropertyAccess::Field(spec) => {
                self.write_field_spec(receiver, property, spec, value, span)
            }
            PropertyAccess::Method(spec) | PropertyAccess::Indexed(spec) => {
                let mut args = property.directive_args();
                args.push(value);
                self.call_accessor(receiver, property, spec, args, span)
                    .map(|_| ())
            }
            PropertyAccess::None | PropertyAccess::Expression(_) | PropertyAccess::Builtin(_) => {
                Err(RuntimeError::access(
                    format!("property '{}' is read-only", property.name),
                    span,
                ))
            }
        }
    }

    fn write_field_spec(
        &mut self,
        receiver: &PropertyReceiver,
        property: &PropertyInfo,
        spec: &str,
        value: Value,
        span: Span,
    ) -> EvalResult<()> {
        if property.index_value.is_some() {
            return Err(field_backed(property, span));
        }
        let key = normalize(spec);
        let class = match receiver {
            PropertyReceiver::Instance(obj) => Some(obj.borrow().class),
            PropertyReceiver::Class(class) => Some(*class),
            PropertyReceiver::Helper { .. } => None,
        };

        if let Some(class) = class {
            if self.registry.class_var_owner(class, &key).is_some() {
                return self.set_class_var(class, &key, value, span);
            }
            if let Some(owner) = self.registry.constant_owner(class, &key) {
                return Err(RuntimeError::access(
                    format!(
                        "cannot assign to constant '{}.{}'",
                        self.registry.class(owner).name,
                        spec
                    ),
                    span,
                ));
            }
        }

        match receiver {
            PropertyReceiver::Instance(obj) => {
                let class = obj.borrow().class;
                let field_ty = self
                    .registry
                    .class(class)
                    .fields
                    .get(&key)
                    .map(|f| f.ty.clone());
                if let Some(ty) = field_ty {
                    let value = self.coerce(value, &ty, span)?;
                    obj.borrow_mut().set_field(&key, value);
                    return Ok(());
                }
                let this = Value::Object(obj.clone());
                self.dispatch(class, &this, &key, vec![value], false, span)?
                    .map(|_| ())
                    .ok_or_else(|| unresolved(property, spec, span))
            }
            PropertyReceiver::Class(class) => {
                self.dispatch(*class, &Value::Class(*class), &key, vec![value], true, span)?
                    .map(|_| ())
                    .ok_or_else(|| unresolved(property, spec, span))
            }
            PropertyReceiver::Helper { helper, value: this } => {
                if self.set_helper_class_var(*helper, &key, value.clone()) {
                    return Ok(());
                }
                if let Value::Object(obj) = this {
                    if obj.borrow_mut().set_field(&key, value.clone()) {
                        return Ok(());
                    }
                }
                self.call_helper_by_name(*helper, this, &key, vec![value], span)?
                    .map(|_| ())
                    .ok_or_else(|| unresolved(property, spec, span))
            }
        }
    }

    /// Assign a class variable in the class of the chain that stores it
    pub(crate) fn set_class_var(&mut self, class: ClassId, key: &str, value: Value, span: Span) -> EvalResult<()> {
        let Some(owner) = self.registry.class_var_owner(class, key) else {
            return Err(RuntimeError::resolution(
                format!("class variable '{}' not found", key),
                span,
            ));
        };
        let ty = self.registry.class(owner).class_var_types.get(key).cloned();
        let value = match ty {
            Some(ty) => self.coerce(value, &ty, span)?,
            None => value,
        };
        self.registry
            .class_mut(owner)
            .class_vars
            .insert(key.to_string(), value);
        Ok(())
    }
}

pub(crate) fn field_backed(property: &PropertyInfo, span: Span) -> RuntimeError {
    RuntimeError::semantic(
        format!(
            "property '{}' has index arguments and cannot be field-backed",
            property.name
        ),
        span,
    )
}

fn unresolved(property: &PropertyInfo, spec: &str, span: Span) -> RuntimeError {
    RuntimeError::resolution(
        format!(
            "accessor '{}' of property '{}' not found",
            spec, property.name
        ),
        span,
    )
}
