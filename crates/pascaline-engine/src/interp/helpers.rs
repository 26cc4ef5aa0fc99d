//! Helper resolution
//!
//! Helpers are filed under a target key derived from the extended type:
//! the class or record name, `array of <element>` or the bare `array` for
//! helpers that apply to every array, `enum` for every enumeration, and the
//! scalar type names. A value is matched against its keys from most to least
//! specific; within one helper the parent chain is searched leaf first.

use super::members::Access;
use super::property::PropertyReceiver;
use super::{Context, Interpreter};
use crate::ast::Span;
use crate::ident::{normalize, normalize_type_name};
use crate::registry::MethodRef;
use crate::runtime::{EvalResult, HelperId, RuntimeError, Type, Value};
use rustc_hash::FxHashMap;

impl Interpreter {
    /// Registry key a helper for `ty` is filed under
    pub(crate) fn helper_target_key(&self, ty: &Type) -> String {
        match ty {
            Type::Array(array) => format!(
                "array of {}",
                normalize_type_name(&self.registry.type_name(&array.element))
            ),
            Type::Subrange(_) => "integer".to_string(),
            other => normalize_type_name(&self.registry.type_name(other)),
        }
    }

    /// Target keys of a value, most specific first
    fn helper_keys(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Object(obj) => self
                .registry
                .ancestors(obj.borrow().class)
                .into_iter()
                .map(|c| normalize(&self.registry.class(c).name))
                .collect(),
            Value::Record(rec) => vec![normalize(&self.registry.record(rec.record).name)],
            Value::Array(_) => vec![self.registry.value_type_name(value), "array".to_string()],
            Value::Enum(e) => vec![
                normalize(&self.registry.enum_info(e.enum_id).name),
                "enum".to_string(),
            ],
            Value::Integer(_) | Value::Float(_) | Value::String(_) | Value::Boolean(_) => {
                vec![self.registry.value_type_name(value)]
            }
            _ => Vec::new(),
        }
    }

    /// Helpers applicable to a value, most specific first
    pub(crate) fn helpers_for_value(&self, value: &Value) -> Vec<HelperId> {
        self.helper_keys(value)
            .iter()
            .flat_map(|key| self.registry.helpers_for(key))
            .collect()
    }

    /// Property, method or intrinsic provided by a helper for `value`
    pub(crate) fn helper_member(
        &mut self,
        value: &Value,
        key: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Access>> {
        for helper in self.helpers_for_value(value) {
            for link in self.registry.helper_chain(helper) {
                let property = self.registry.helper(link).properties.get(key).cloned();
                if let Some(property) = property {
                    let receiver = PropertyReceiver::Helper {
                        helper: link,
                        value: value.clone(),
                    };
                    let result = match args {
                        Some(indices) if property.is_indexed() => {
                            self.read_indexed_property(&receiver, &property, indices, span)?
                        }
                        _ => self.read_property(&receiver, &property, span)?,
                    };
                    return Ok(Some(Access::value(result)));
                }
            }
            let call_args = args.clone().unwrap_or_default();
            if let Some(result) = self.call_helper_by_name(helper, value, key, call_args, span)? {
                return Ok(Some(Access::value(result)));
            }
        }
        Ok(None)
    }

    /// Call a helper method (user or intrinsic) by name, walking the chain
    pub(crate) fn call_helper_by_name(
        &mut self,
        helper: HelperId,
        value: &Value,
        key: &str,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Option<Value>> {
        for link in self.registry.helper_chain(helper) {
            let info = self.registry.helper(link);
            if let Some(overloads) = info.methods.get(key).cloned() {
                let method = self.select_overload(&overloads, &args).ok_or_else(|| {
                    RuntimeError::resolution(
                        format!(
                            "no overload of '{}.{}' accepts {} argument(s)",
                            self.registry.helper(link).name,
                            key,
                            args.len()
                        ),
                        span,
                    )
                })?;
                return self
                    .invoke_helper_method(link, &method, value.clone(), args, span)
                    .map(Some);
            }
            if let Some(id) = info.builtin_methods.get(key).cloned() {
                return self.call_builtin_method(&id, value, &args, span).map(Some);
            }
        }
        Ok(None)
    }

    /// Run a helper method with `Self` bound to the extended value
    ///
    /// Class variables and constants of the helper chain are bound root
    /// first so a child helper shadows its parents; changed class variables
    /// are stored back in the helper that owns the visible binding.
    pub(crate) fn invoke_helper_method(
        &mut self,
        helper: HelperId,
        method: &MethodRef,
        this: Value,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        let mut class_vars: FxHashMap<String, (HelperId, Value)> = FxHashMap::default();
        let mut constants: Vec<(String, Value)> = Vec::new();
        for link in self.registry.helper_chain(helper).into_iter().rev() {
            let info = self.registry.helper(link);
            for (key, value) in &info.constants {
                constants.push((key.clone(), value.clone()));
            }
            for (key, value) in &info.class_vars {
                class_vars.insert(key.clone(), (link, value.clone()));
            }
        }
        let context = Context {
            helper: Some(helper),
            ..Default::default()
        };

        self.invoke_body(
            method,
            args,
            context,
            span,
            |_, scope| {
                for (key, value) in &constants {
                    scope.define(key, value.clone());
                }
                for (key, (_, value)) in &class_vars {
                    scope.define(key, value.clone());
                }
                scope.define("Self", this);
                Ok(())
            },
            |interp, scope| {
                for (key, (owner, before)) in &class_vars {
                    if let Some(after) = scope.get_local(key) {
                        if after != *before {
                            interp
                                .registry
                                .helper_mut(*owner)
                                .class_vars
                                .insert(key.clone(), after);
                        }
                    }
                }
                Ok(())
            },
        )
        .map(|(value, _)| value)
    }

    /// Class variable or constant visible from a helper
    pub(crate) fn helper_static_value(&self, helper: HelperId, key: &str) -> Option<Value> {
        self.registry.helper_chain(helper).into_iter().find_map(|link| {
            let info = self.registry.helper(link);
            info.class_vars
                .get(key)
                .or_else(|| info.constants.get(key))
                .cloned()
        })
    }

    /// Assign a helper class variable; false when none is visible
    pub(crate) fn set_helper_class_var(&mut self, helper: HelperId, key: &str, value: Value) -> bool {
        let owner = self
            .registry
            .helper_chain(helper)
            .into_iter()
            .find(|link| self.registry.helper(*link).class_vars.contains_key(key));
        match owner {
            Some(owner) => {
                self.registry
                    .helper_mut(owner)
                    .class_vars
                    .insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Route an intrinsic helper method to the built-in library
    pub(crate) fn call_builtin_method(
        &mut self,
        id: &str,
        receiver: &Value,
        args: &[Value],
        span: Span,
    ) -> EvalResult<Value> {
        tracing::trace!(builtin = %id, "calling intrinsic helper method");
        self.builtins
            .call_method(id, receiver, args)
            .map_err(|message| RuntimeError::runtime(message, span))
    }
}
