//! Record value semantics
//!
//! Record methods always run on a copy of the receiver. `Self`, every field
//! and every simple field-backed property are bound as plain identifiers;
//! after the body the changed bindings are folded back into the copy and
//! changed class variables into the shared record type. The caller writes
//! the copy back when the receiver was a plain variable.

use super::members::Access;
use super::property::{field_backed, PropertyKey, ReceiverIdentity};
use super::{Context, Interpreter};
use crate::ast::{Expr, FunctionDecl, Span};
use crate::ident::normalize;
use crate::registry::{MethodOwner, MethodRef, PropertyAccess, PropertyInfo};
use crate::runtime::{Environment, EvalResult, RecordId, RecordValue, RuntimeError, Value};
use rustc_hash::FxHashMap;

impl Interpreter {
    /// Fresh record value with field initializers applied
    pub(crate) fn new_record(&mut self, id: RecordId) -> EvalResult<Value> {
        let info = self.registry.record(id);
        let layout: Vec<_> = info
            .field_order
            .iter()
            .filter_map(|key| info.fields.get(key).map(|f| (key.clone(), f.clone())))
            .collect();
        let mut fields = FxHashMap::default();
        for (key, field) in layout {
            let value = match &field.init {
                Some(init) => {
                    let value = self.eval_isolated(Context::record(id), init)?;
                    self.coerce(value, &field.ty, init.span())?
                }
                None => self.zero_value(&field.ty)?,
            };
            fields.insert(key, value);
        }
        Ok(Value::Record(RecordValue { record: id, fields }))
    }

    // ========================================================================
    // Method calls
    // ========================================================================

    /// Run an instance method on a copy of `rec`; returns the mutated copy
    pub(crate) fn call_record_method(
        &mut self,
        rec: RecordValue,
        method: &MethodRef,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<(Value, RecordValue)> {
        let id = rec.record;
        let info = self.registry.record(id);
        let aliases: Vec<(String, String)> = info
            .properties
            .values()
            .filter(|p| !p.is_indexed() && p.index_value.is_none())
            .filter_map(|p| match &p.read {
                PropertyAccess::Field(spec) if rec.fields.contains_key(&normalize(spec)) => {
                    Some((p.name.clone(), spec.clone()))
                }
                _ => None,
            })
            .collect();
        let statics = self.record_statics(id);
        let class_vars = info.class_vars.clone();
        let original = rec.clone();

        self.invoke_body(
            method,
            args,
            Context::record(id),
            span,
            |_, scope| {
                bind_statics(scope, &statics);
                for (key, value) in &rec.fields {
                    scope.define(key, value.clone());
                }
                for (property, field) in &aliases {
                    if !scope.has_local(property) {
                        scope.define_alias(property, field);
                    }
                }
                scope.define("Self", Value::Record(rec));
                Ok(())
            },
            |interp, scope| {
                let mut updated = match scope.get_local("Self") {
                    Some(Value::Record(current)) if current.record == id => current,
                    _ => original.clone(),
                };
                for (key, before) in &original.fields {
                    if let Some(after) = scope.get_local(key) {
                        if after != *before {
                            updated.fields.insert(key.clone(), after);
                        }
                    }
                }
                interp.write_back_record_class_vars(id, scope, &class_vars);
                Ok(updated)
            },
        )
    }

    /// Run a static record method
    pub(crate) fn call_static_record_method(
        &mut self,
        id: RecordId,
        method: &MethodRef,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        let statics = self.record_statics(id);
        let class_vars = self.registry.record(id).class_vars.clone();
        self.invoke_body(
            method,
            args,
            Context::record(id),
            span,
            |_, scope| {
                bind_statics(scope, &statics);
                Ok(())
            },
            |interp, scope| {
                interp.write_back_record_class_vars(id, scope, &class_vars);
                Ok(())
            },
        )
        .map(|(value, _)| value)
    }

    /// Constants and class variables of a record, in binding order
    fn record_statics(&self, id: RecordId) -> Vec<(String, Value)> {
        let info = self.registry.record(id);
        info.constants
            .iter()
            .chain(info.class_vars.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn write_back_record_class_vars(
        &mut self,
        id: RecordId,
        scope: &Environment,
        before: &FxHashMap<String, Value>,
    ) {
        for (key, old) in before {
            if let Some(new) = scope.get_local(key) {
                if new != *old {
                    self.registry
                        .record_mut(id)
                        .class_vars
                        .insert(key.clone(), new);
                }
            }
        }
    }

    /// Overload-resolve and call a record method by name
    ///
    /// Instance methods return the mutated copy; static methods leave the
    /// receiver unchanged.
    fn call_record_by_name(
        &mut self,
        rec: &RecordValue,
        key: &str,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Option<(Value, RecordValue)>> {
        let info = self.registry.record(rec.record);
        let instance = info.overloads(key, false).to_vec();
        let statics = info.overloads(key, true).to_vec();
        let name = info.name.clone();
        if instance.is_empty() && statics.is_empty() {
            return Ok(None);
        }
        if let Some(method) = self.select_overload(&instance, &args) {
            return self
                .call_record_method(rec.clone(), &method, args, span)
                .map(Some);
        }
        match self.select_overload(&statics, &args) {
            Some(method) => self
                .call_static_record_method(rec.record, &method, args, span)
                .map(|value| Some((value, rec.clone()))),
            None => Err(RuntimeError::resolution(
                format!(
                    "no overload of '{}.{}' accepts {} argument(s)",
                    name,
                    key,
                    args.len()
                ),
                span,
            )),
        }
    }

    // ========================================================================
    // Member access
    // ========================================================================

    /// Member of a record value
    pub(crate) fn record_member(
        &mut self,
        rec: &RecordValue,
        key: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Access>> {
        if args.is_none() {
            if let Some(value) = rec.fields.get(key) {
                return Ok(Some(Access::value(value.clone())));
            }
        }
        let property = self.registry.record(rec.record).properties.get(key).cloned();
        if let Some(property) = property {
            let value = match args {
                Some(indices) if property.is_indexed() => {
                    self.read_record_indexed_property(rec, &property, indices, span)?
                }
                _ => self.read_record_property(rec, &property, span)?,
            };
            return Ok(Some(Access::value(value)));
        }
        let call_args = args.unwrap_or_default();
        if let Some((value, updated)) = self.call_record_by_name(rec, key, call_args, span)? {
            return Ok(Some(Access {
                value,
                receiver: Some(Value::Record(updated)),
            }));
        }
        Ok(self.record_static_value(rec.record, key).map(Access::value))
    }

    /// Member of a record type reference: static methods, constants, class vars
    pub(crate) fn record_type_member(
        &mut self,
        id: RecordId,
        key: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Access>> {
        let statics = self.registry.record(id).overloads(key, true).to_vec();
        if !statics.is_empty() {
            let args = args.unwrap_or_default();
            let method = self.select_overload(&statics, &args).ok_or_else(|| {
                RuntimeError::resolution(
                    format!(
                        "no overload of '{}.{}' accepts {} argument(s)",
                        self.registry.record(id).name,
                        key,
                        args.len()
                    ),
                    span,
                )
            })?;
            return self
                .call_static_record_method(id, &method, args, span)
                .map(|v| Some(Access::value(v)));
        }
        Ok(self.record_static_value(id, key).map(Access::value))
    }

    fn record_static_value(&self, id: RecordId, key: &str) -> Option<Value> {
        let info = self.registry.record(id);
        info.class_vars
            .get(key)
            .or_else(|| info.constants.get(key))
            .cloned()
    }

    /// Assign a member of a record value, returning the updated copy
    ///
    /// `None` when the record has no such member.
    pub(crate) fn assign_record_member(
        &mut self,
        mut rec: RecordValue,
        key: &str,
        value: Value,
        span: Span,
    ) -> EvalResult<Option<RecordValue>> {
        let info = self.registry.record(rec.record);
        if let Some(field) = info.fields.get(key) {
            let ty = field.ty.clone();
            let value = self.coerce(value, &ty, span)?;
            rec.fields.insert(key.to_string(), value);
            return Ok(Some(rec));
        }
        if let Some(property) = info.properties.get(key).cloned() {
            return self
                .write_record_property(rec, &property, value, span)
                .map(Some);
        }
        if info.class_vars.contains_key(key) {
            self.set_record_class_var(rec.record, key, value, span)?;
            return Ok(Some(rec));
        }
        Ok(None)
    }

    /// Assign a record class variable, shared by every value of the type
    pub(crate) fn set_record_class_var(
        &mut self,
        id: RecordId,
        key: &str,
        value: Value,
        span: Span,
    ) -> EvalResult<()> {
        let ty = self.registry.record(id).class_var_types.get(key).cloned();
        let value = match ty {
            Some(ty) => self.coerce(value, &ty, span)?,
            None => value,
        };
        self.registry
            .record_mut(id)
            .class_vars
            .insert(key.to_string(), value);
        Ok(())
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Read a non-indexed record property
    pub(crate) fn read_record_property(
        &mut self,
        rec: &RecordValue,
        property: &PropertyInfo,
        span: Span,
    ) -> EvalResult<Value> {
        if property.is_indexed() {
            return Err(RuntimeError::resolution(
                format!("indexed property '{}' requires index arguments", property.name),
                span,
            ));
        }
        let guard = PropertyKey::new(ReceiverIdentity::Record(rec.record.0), &property.name, false);
        self.guarded(guard, &property.name, span, |interp| match &property.read {
            PropertyAccess::None => Err(RuntimeError::access(
                format!("property '{}' is write-only", property.name),
                span,
            )),
            PropertyAccess::Field(spec) => {
                let key = normalize(spec);
                if let Some(value) = interp.record_static_value(rec.record, &key) {
                    return Ok(value);
                }
                if property.index_value.is_none() {
                    if let Some(value) = rec.fields.get(&key) {
                        return Ok(value.clone());
                    }
                }
                interp.record_accessor(rec, property, spec, property.directive_args(), span)
                    .map(|(value, _)| value)
            }
            PropertyAccess::Method(spec) | PropertyAccess::Indexed(spec) => interp
                .record_accessor(rec, property, spec, property.directive_args(), span)
                .map(|(value, _)| value),
            PropertyAccess::Expression(expr) => {
                interp.eval_record_expression(rec, property, expr, span)
            }
            PropertyAccess::Builtin(accessor) => {
                interp.read_builtin(*accessor, &Value::Record(rec.clone()), span)
            }
        })
    }

    /// Write a non-indexed record property, returning the updated copy
    pub(crate) fn write_record_property(
        &mut self,
        rec: RecordValue,
        property: &PropertyInfo,
        value: Value,
        span: Span,
    ) -> EvalResult<RecordValue> {
        if property.is_indexed() {
            return Err(RuntimeError::resolution(
                format!("indexed property '{}' requires index arguments", property.name),
                span,
            ));
        }
        let guard = PropertyKey::new(ReceiverIdentity::Record(rec.record.0), &property.name, true);
        self.guarded(guard, &property.name, span, |interp| match &property.write {
            PropertyAccess::Field(spec) => {
                let key = normalize(spec);
                let id = rec.record;
                if interp.registry.record(id).class_vars.contains_key(&key) {
                    interp.set_record_class_var(id, &key, value, span)?;
                    return Ok(rec);
                }
                if interp.registry.record(id).constants.contains_key(&key) {
                    return Err(RuntimeError::access(
                        format!("cannot assign to constant '{}'", spec),
                        span,
                    ));
                }
                let field_ty = interp
                    .registry
                    .record(id)
                    .fields
                    .get(&key)
                    .map(|f| f.ty.clone());
                match field_ty {
                    Some(ty) if property.index_value.is_none() => {
                        let value = interp.coerce(value, &ty, span)?;
                        let mut rec = rec;
                        rec.fields.insert(key, value);
                        Ok(rec)
                    }
                    _ => {
                        let mut args = property.directive_args();
                        args.push(value);
                        interp
                            .record_accessor(&rec, property, spec, args, span)
                            .map(|(_, updated)| updated)
                    }
                }
            }
            PropertyAccess::Method(spec) | PropertyAccess::Indexed(spec) => {
                let mut args = property.directive_args();
                args.push(value);
                interp
                    .record_accessor(&rec, property, spec, args, span)
                    .map(|(_, updated)| updated)
            }
            _ => Err(RuntimeError::access(
                format!("property '{}' is read-only", property.name),
                span,
            )),
        })
    }

    /// Read an indexed record property
    pub(crate) fn read_record_indexed_property(
        &mut self,
        rec: &RecordValue,
        property: &PropertyInfo,
        indices: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        let spec = self.indexed_spec(property, &property.read, indices.len(), false, span)?;
        let mut args = property.directive_args();
        args.extend(indices);
        self.record_accessor(rec, property, &spec, args, span)
            .map(|(value, _)| value)
    }

    /// Write an indexed record property, returning the updated copy
    pub(crate) fn write_record_indexed_property(
        &mut self,
        rec: &RecordValue,
        property: &PropertyInfo,
        indices: Vec<Value>,
        value: Value,
        span: Span,
    ) -> EvalResult<RecordValue> {
        let spec = self.indexed_spec(property, &property.write, indices.len(), true, span)?;
        let mut args = property.directive_args();
        args.extend(indices);
        args.push(value);
        self.record_accessor(rec, property, &spec, args, span)
            .map(|(_, updated)| updated)
    }

    fn indexed_spec(
        &self,
        property: &PropertyInfo,
        access: &PropertyAccess,
        count: usize,
        write: bool,
        span: Span,
    ) -> EvalResult<String> {
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
        match access {
            PropertyAccess::Indexed(spec) | PropertyAccess::Method(spec) => Ok(spec.clone()),
            PropertyAccess::None if write => Err(RuntimeError::access(
                format!("property '{}' is read-only", property.name),
                span,
            )),
            PropertyAccess::None => Err(RuntimeError::access(
                format!("property '{}' is write-only", property.name),
                span,
            )),
            _ => Err(field_backed(property, span)),
        }
    }

    fn record_accessor(
        &mut self,
        rec: &RecordValue,
        property: &PropertyInfo,
        spec: &str,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<(Value, RecordValue)> {
        let key = normalize(spec);
        if let Some(found) = self.call_record_by_name(rec, &key, args, span)? {
            return Ok(found);
        }
        let names_storage = rec.fields.contains_key(&key)
            || self.registry.record(rec.record).class_vars.contains_key(&key);
        if property.is_indexed() && names_storage {
            return Err(field_backed(property, span));
        }
        Err(RuntimeError::resolution(
            format!(
                "accessor '{}' of property '{}' not found",
                spec, property.name
            ),
            span,
        ))
    }

    fn eval_record_expression(
        &mut self,
        rec: &RecordValue,
        property: &PropertyInfo,
        expr: &Expr,
        span: Span,
    ) -> EvalResult<Value> {
        let scope = Environment::enclosed(&self.globals);
        bind_statics(&scope, &self.record_statics(rec.record));
        for (key, value) in &rec.fields {
            scope.define(key, value.clone());
        }
        scope.define("Self", Value::Record(rec.clone()));

        self.call_stack.push(format!("property {}", property.name), span)?;
        let saved = std::mem::replace(&mut self.env, scope);
        let result = self.with_context(Context::record(rec.record), |interp| interp.eval_expr(expr));
        self.env = saved;
        self.call_stack.pop();
        result.map_err(|err| err.with_span(span))
    }

    // ========================================================================
    // Out-of-line implementations
    // ========================================================================

    /// Attach an out-of-line body to a declared record method
    pub(crate) fn register_record_implementation(
        &mut self,
        id: RecordId,
        implementation: &FunctionDecl,
    ) -> EvalResult<()> {
        let key = normalize(&implementation.name);
        let info = self.registry.record(id);
        let declared: Vec<MethodRef> = info
            .overloads(&key, false)
            .iter()
            .chain(info.overloads(&key, true))
            .cloned()
            .collect();
        let name = info.name.clone();
        let merged = self.merge_implementation(&declared, implementation, &name)?;
        let is_static = merged.flags.is_class_method;
        self.registry.record_mut(id).upsert_method(
            key,
            Self::method_ref(merged, MethodOwner::Record(id)),
            is_static,
        );
        tracing::debug!(record = %name, method = %implementation.name, "registered method implementation");
        Ok(())
    }
}

fn bind_statics(scope: &Environment, statics: &[(String, Value)]) {
    for (key, value) in statics {
        scope.define(key, value.clone());
    }
}
