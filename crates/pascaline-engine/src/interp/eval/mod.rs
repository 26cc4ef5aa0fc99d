//! Expression evaluation
//!
//! Unqualified identifiers resolve in this order: locals and parameters,
//! members of `Self`, statics of the running class, record or helper,
//! globals, parameterless global functions, then type names. Calls follow
//! the same order with function pointers tried first and conversions and
//! built-ins last.

mod assign;
mod stmt;

use super::property::PropertyReceiver;
use super::Interpreter;
use crate::ast::{Expr, Literal, Span};
use crate::ident::normalize;
use crate::registry::{PropertyInfo, TypeEntry};
use crate::runtime::{
    ArrayValue, EvalResult, FunctionPointer, HelperId, RecordValue, RuntimeError, Type, Value,
};
use std::rc::Rc;

/// Where an indexed property lives on a receiver
pub(crate) struct IndexedProperty {
    pub helper: Option<HelperId>,
    pub property: Rc<PropertyInfo>,
}

impl Interpreter {
    /// Evaluate an expression in the current scope
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(literal, _) => Ok(match literal {
                Literal::Integer(n) => Value::Integer(*n),
                Literal::Float(f) => Value::Float(*f),
                Literal::String(s) => Value::string(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Nil => Value::Nil,
            }),
            Expr::Ident(name, span) => self.eval_identifier(name, *span),
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => self.eval_binary(*op, left, right, *span),
            Expr::Unary { op, operand, span } => self.eval_unary(*op, operand, *span),
            Expr::Member {
                object,
                member,
                span,
            } => {
                let receiver = self.eval_expr(object)?;
                let access = self.access_member(&receiver, member, None, *span)?;
                self.write_back(object, access.receiver);
                Ok(access.value)
            }
            Expr::Call { callee, args, span } => self.eval_call(callee, args, *span),
            Expr::Index {
                object,
                indices,
                span,
            } => self.eval_index(object, indices, *span),
            Expr::Inherited { method, args, span } => {
                self.eval_inherited(method.as_deref(), args, *span)
            }
            Expr::Is {
                expr,
                type_name,
                span,
            } => {
                let value = self.eval_expr(expr)?;
                self.is_instance(&value, type_name, *span).map(Value::Boolean)
            }
            Expr::As {
                expr,
                type_name,
                span,
            } => {
                let value = self.eval_expr(expr)?;
                if value.is_nil() {
                    return Ok(Value::Nil);
                }
                if value.as_object().is_some() && self.is_instance(&value, type_name, *span)? {
                    return Ok(value);
                }
                Err(RuntimeError::runtime(
                    format!(
                        "invalid class cast: {} is not {}",
                        self.registry.value_type_name(&value),
                        type_name
                    ),
                    *span,
                ))
            }
            Expr::AddressOf { target, span } => self.eval_address_of(target, *span),
            Expr::ArrayLiteral { elements, .. } => {
                let values = self.eval_args(elements)?;
                let element = values
                    .first()
                    .map(|v| self.type_of_value(v))
                    .unwrap_or(Type::Variant);
                let zero = self.registry.zero_value(&element);
                Ok(Value::array(ArrayValue::dynamic(element, zero, values)))
            }
            Expr::RecordLiteral {
                type_name,
                fields,
                span,
            } => self.eval_record_literal(type_name, fields, *span),
        }
    }

    pub(crate) fn eval_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    fn eval_identifier(&mut self, name: &str, span: Span) -> EvalResult<Value> {
        // Inside a record method the field locals are newer than `Self`
        if normalize(name) == "self" {
            if let Some(this) = self.current_self() {
                return Ok(this);
            }
        }
        if let Some(value) = self.env.get_until(name, Some(&self.globals)) {
            return Ok(value);
        }
        let key = normalize(name);
        if let Some(this) = self.current_self() {
            if let Some(value) = self.implicit_self_member(&this, &key, None, span)? {
                return Ok(value);
            }
        }
        if let Some(value) = self.context_member(&key, None, span)? {
            return Ok(value);
        }
        if let Some(value) = self.globals.get(&key) {
            return Ok(value);
        }
        if !self.function_overloads(&key).is_empty() {
            return self.call_function(name, Vec::new(), span);
        }
        if let Some(value) = self.type_value(&key) {
            return Ok(value);
        }
        Err(RuntimeError::resolution(
            format!("unknown identifier '{}'", name),
            span,
        ))
    }

    /// `Self` of the running method with field locals folded in
    ///
    /// Record methods bind fields as plain locals, so the bound `Self` can
    /// lag behind assignments made in the body.
    pub(crate) fn current_self(&self) -> Option<Value> {
        let this = self.env.get_until("Self", Some(&self.globals))?;
        let in_record_method = |rec: &RecordValue| {
            self.current_context().and_then(|c| c.record) == Some(rec.record)
        };
        match this {
            Value::Record(mut rec) if in_record_method(&rec) => {
                for (key, value) in rec.fields.iter_mut() {
                    if let Some(local) = self.env.get_local(key) {
                        *value = local;
                    }
                }
                Some(Value::Record(rec))
            }
            Value::Nil => None,
            other => Some(other),
        }
    }

    /// Replace `Self` and refresh the field locals of a record method
    pub(crate) fn store_self(&mut self, updated: Value) {
        let record = self.current_context().and_then(|c| c.record);
        match &updated {
            Value::Record(rec) if record == Some(rec.record) => {
                for (key, value) in &rec.fields {
                    if self.env.has_local(key) {
                        self.env.set(key, value.clone());
                    }
                }
            }
            _ => {}
        }
        self.env.set("Self", updated);
    }

    fn implicit_self_member(
        &mut self,
        this: &Value,
        key: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Value>> {
        let Some(access) = self.lookup_member(this, key, args, span)? else {
            return Ok(None);
        };
        if let Some(updated) = access.receiver {
            self.store_self(updated);
        }
        Ok(Some(access.value))
    }

    /// Statics of the running class, record or helper
    fn context_member(
        &mut self,
        key: &str,
        args: Option<Vec<Value>>,
        span: Span,
    ) -> EvalResult<Option<Value>> {
        let Some(context) = self.current_context().cloned() else {
            return Ok(None);
        };
        if let Some(class) = context.class {
            if let Some(access) = self.class_member(class, key, args.clone(), span)? {
                return Ok(Some(access.value));
            }
        }
        if let Some(record) = context.record {
            if let Some(access) = self.record_type_member(record, key, args.clone(), span)? {
                return Ok(Some(access.value));
            }
        }
        match (context.helper, args) {
            (Some(helper), None) => Ok(self.helper_static_value(helper, key)),
            _ => Ok(None),
        }
    }

    fn type_value(&self, key: &str) -> Option<Value> {
        match self.registry.lookup_type(key)? {
            TypeEntry::Class(id) => Some(Value::Class(id)),
            TypeEntry::Record(id) => Some(Value::RecordType(id)),
            TypeEntry::Enum(id) => Some(Value::EnumType(id)),
            _ => None,
        }
    }

    /// Whether `Self` has a callable member named `key`
    fn self_has_method(&self, this: &Value, key: &str) -> bool {
        match this {
            Value::Object(obj) => {
                let class = obj.borrow().class;
                !self.registry.collect_overloads(class, key, false).is_empty()
                    || !self.registry.collect_overloads(class, key, true).is_empty()
            }
            Value::Class(class) => !self.registry.collect_overloads(*class, key, true).is_empty(),
            Value::Record(rec) => self.registry.record(rec.record).has_method(key),
            other => self.helpers_for_value(other).into_iter().any(|helper| {
                self.registry.helper_chain(helper).into_iter().any(|link| {
                    let info = self.registry.helper(link);
                    info.methods.contains_key(key) || info.builtin_methods.contains_key(key)
                })
            }),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> EvalResult<Value> {
        match callee {
            Expr::Ident(name, _) => self.call_named(name, args, span),
            Expr::Member { object, member, .. } => {
                let receiver = self.eval_expr(object)?;
                let values = self.eval_args(args)?;
                let access = self.access_member(&receiver, member, Some(values), span)?;
                self.write_back(object, access.receiver);
                Ok(access.value)
            }
            other => {
                let target = self.eval_expr(other)?;
                let values = self.eval_args(args)?;
                self.call_value(&target, values, span)
            }
        }
    }

    fn call_named(&mut self, name: &str, args: &[Expr], span: Span) -> EvalResult<Value> {
        let key = normalize(name);
        if let Some(Value::Function(pointer)) = self.env.get(&key) {
            let values = self.eval_args(args)?;
            return self.call_pointer(&pointer, values, span);
        }

        let values = self.eval_args(args)?;
        if let Some(this) = self.current_self() {
            if self.self_has_method(&this, &key) {
                if let Some(value) = self.implicit_self_member(&this, &key, Some(values.clone()), span)? {
                    return Ok(value);
                }
            }
        }
        if let Some(value) = self.context_member(&key, Some(values.clone()), span)? {
            return Ok(value);
        }
        if !self.function_overloads(&key).is_empty() {
            return self.call_function(name, values, span);
        }
        if let [value] = values.as_slice() {
            if let Some(cast) = self.eval_cast(name, value.clone(), span)? {
                return Ok(cast);
            }
        }
        if let Some(result) = self.builtins.call_function(name, &values) {
            return result.map_err(|message| RuntimeError::runtime(message, span));
        }
        Err(RuntimeError::resolution(
            format!("unknown function '{}'", name),
            span,
        ))
    }

    fn call_value(&mut self, target: &Value, args: Vec<Value>, span: Span) -> EvalResult<Value> {
        match target {
            Value::Function(pointer) => self.call_pointer(pointer, args, span),
            other => Err(RuntimeError::runtime(
                format!(
                    "value of type {} is not callable",
                    self.registry.value_type_name(other)
                ),
                span,
            )),
        }
    }

    /// Call through a function or method pointer
    pub(crate) fn call_pointer(
        &mut self,
        pointer: &FunctionPointer,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        match &pointer.receiver {
            Some(receiver) => self
                .access_member(receiver, &pointer.name, Some(args), span)
                .map(|access| access.value),
            None => self.call_function(&pointer.name, args, span),
        }
    }

    fn eval_address_of(&mut self, target: &Expr, span: Span) -> EvalResult<Value> {
        let pointer = match target {
            Expr::Ident(name, _) => {
                let key = normalize(name);
                let receiver = self
                    .current_self()
                    .filter(|this| self.self_has_method(this, &key));
                if receiver.is_none() && self.function_overloads(&key).is_empty() {
                    return Err(RuntimeError::resolution(
                        format!("function '{}' not found", name),
                        span,
                    ));
                }
                FunctionPointer {
                    name: name.clone(),
                    receiver: receiver.map(Box::new),
                }
            }
            Expr::Member { object, member, .. } => {
                let receiver = self.eval_expr(object)?;
                if receiver.is_nil() {
                    return Err(RuntimeError::runtime(
                        format!("cannot take the address of method '{}' of nil", member),
                        span,
                    ));
                }
                FunctionPointer {
                    name: member.clone(),
                    receiver: Some(Box::new(receiver)),
                }
            }
            _ => {
                return Err(RuntimeError::semantic(
                    "cannot take the address of this expression",
                    span,
                ))
            }
        };
        Ok(Value::Function(Rc::new(pointer)))
    }

    // ========================================================================
    // Write-back of record copies
    // ========================================================================

    /// Store a mutated record receiver back into the variable it came from
    ///
    /// Only plain variables are written back. Receivers read from fields,
    /// array elements, calls or properties are temporary copies.
    pub(crate) fn write_back(&mut self, object: &Expr, receiver: Option<Value>) {
        if let (Expr::Ident(name, _), Some(updated)) = (object, receiver) {
            self.store_variable(name, updated);
        }
    }

    /// Assign a variable or a field of `Self` when one exists by that name
    fn store_variable(&mut self, name: &str, value: Value) {
        if normalize(name) == "self" {
            self.store_self(value);
            return;
        }
        if self.env.set_until(name, value.clone(), Some(&self.globals)) {
            return;
        }
        if let Some(Value::Object(obj)) = self.current_self() {
            if obj.borrow_mut().set_field(&normalize(name), value.clone()) {
                return;
            }
        }
        self.globals.set(name, value);
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    fn eval_index(&mut self, object: &Expr, indices: &[Expr], span: Span) -> EvalResult<Value> {
        if let Expr::Member {
            object: inner,
            member,
            ..
        } = object
        {
            let receiver = self.eval_expr(inner)?;
            if self.indexed_property(&receiver, &normalize(member)).is_some() {
                let values = self.eval_args(indices)?;
                return self
                    .access_member(&receiver, member, Some(values), span)
                    .map(|access| access.value);
            }
            let base = self.access_member(&receiver, member, None, span)?;
            self.write_back(inner, base.receiver);
            let values = self.eval_args(indices)?;
            return self.index_value(base.value, values, span);
        }
        let base = self.eval_expr(object)?;
        let values = self.eval_args(indices)?;
        self.index_value(base, values, span)
    }

    /// Indexed property named `key` on a receiver, helpers included
    pub(crate) fn indexed_property(&self, receiver: &Value, key: &str) -> Option<IndexedProperty> {
        let own = match receiver {
            Value::Object(obj) => self.registry.find_property(obj.borrow().class, key),
            Value::Class(class) => self.registry.find_property(*class, key),
            Value::Record(rec) => self.registry.record(rec.record).properties.get(key).cloned(),
            _ => None,
        };
        if let Some(property) = own.filter(|p| p.is_indexed()) {
            return Some(IndexedProperty {
                helper: None,
                property,
            });
        }
        self.helpers_for_value(receiver).into_iter().find_map(|helper| {
            self.registry.helper_chain(helper).into_iter().find_map(|link| {
                let property = self.registry.helper(link).properties.get(key)?;
                property.is_indexed().then(|| IndexedProperty {
                    helper: Some(link),
                    property: property.clone(),
                })
            })
        })
    }

    /// Apply index arguments to a value
    ///
    /// Arrays and strings consume one index per dimension; an object or
    /// record consumes the remaining indices through its default property.
    pub(crate) fn index_value(&mut self, base: Value, indices: Vec<Value>, span: Span) -> EvalResult<Value> {
        let mut current = base;
        for (position, index) in indices.iter().enumerate() {
            current = match &current {
                Value::Array(arr) => {
                    let i = index_integer(index, span)?;
                    let arr = arr.borrow();
                    let slot = arr.slot(i).ok_or_else(|| out_of_bounds(i, arr.low(), arr.high(), span))?;
                    arr.elements[slot].clone()
                }
                Value::String(s) => {
                    let i = index_integer(index, span)?;
                    let count = s.chars().count() as i64;
                    let c = usize::try_from(i - 1)
                        .ok()
                        .and_then(|n| s.chars().nth(n))
                        .ok_or_else(|| out_of_bounds(i, 1, count, span))?;
                    Value::string(c.to_string())
                }
                Value::Object(_) | Value::Record(_) => {
                    return self.read_default_property(&current, indices[position..].to_vec(), span)
                }
                other => {
                    return Err(RuntimeError::runtime(
                        format!("cannot index {}", self.registry.value_type_name(other)),
                        span,
                    ))
                }
            };
        }
        Ok(current)
    }

    fn read_default_property(&mut self, value: &Value, indices: Vec<Value>, span: Span) -> EvalResult<Value> {
        match value {
            Value::Object(obj) => {
                let class = obj.borrow().class;
                let property = self
                    .registry
                    .default_property(class)
                    .ok_or_else(|| no_default_property(self.registry.class(class).name.as_str(), span))?;
                self.read_indexed_property(&PropertyReceiver::Instance(obj.clone()), &property, indices, span)
            }
            Value::Record(rec) => {
                let property = self
                    .record_default_property(rec)
                    .ok_or_else(|| no_default_property(self.registry.record(rec.record).name.as_str(), span))?;
                self.read_record_indexed_property(rec, &property, indices, span)
            }
            other => Err(RuntimeError::runtime(
                format!("cannot index {}", self.registry.value_type_name(other)),
                span,
            )),
        }
    }

    pub(crate) fn record_default_property(&self, rec: &RecordValue) -> Option<Rc<PropertyInfo>> {
        self.registry
            .record(rec.record)
            .properties
            .values()
            .find(|p| p.is_default)
            .cloned()
    }

    // ========================================================================
    // Type tests and literals
    // ========================================================================

    /// `value is T` for classes and interfaces; nil is never an instance
    fn is_instance(&self, value: &Value, type_name: &str, span: Span) -> EvalResult<bool> {
        let target = self.registry.lookup_type(type_name).ok_or_else(|| {
            RuntimeError::resolution(format!("type '{}' not found", type_name), span)
        })?;
        let Some(obj) = value.as_object() else {
            return Ok(false);
        };
        let class = obj.borrow().class;
        match target {
            TypeEntry::Class(id) => Ok(self.registry.inherits_from(class, id)),
            TypeEntry::Interface(id) => Ok(self.registry.class_implements(class, id)),
            _ => Err(RuntimeError::semantic(
                format!("'{}' is not a class or interface type", type_name),
                span,
            )),
        }
    }

    fn eval_record_literal(
        &mut self,
        type_name: &str,
        fields: &[(String, Expr)],
        span: Span,
    ) -> EvalResult<Value> {
        let id = self.registry.find_record(type_name).ok_or_else(|| {
            RuntimeError::resolution(format!("record type '{}' not found", type_name), span)
        })?;
        let mut value = self.new_record(id)?;
        for (name, expr) in fields {
            let key = normalize(name);
            let ty = self
                .registry
                .record(id)
                .fields
                .get(&key)
                .map(|field| field.ty.clone())
                .ok_or_else(|| {
                    RuntimeError::resolution(
                        format!("field '{}' not found in record '{}'", name, type_name),
                        expr.span(),
                    )
                })?;
            let field = self.eval_expr(expr)?;
            let field = self.coerce(field, &ty, expr.span())?;
            if let Value::Record(rec) = &mut value {
                rec.fields.insert(key, field);
            }
        }
        Ok(value)
    }
}

pub(crate) fn index_integer(index: &Value, span: Span) -> EvalResult<i64> {
    index.as_integer().ok_or_else(|| {
        RuntimeError::runtime(format!("index must be Integer, got {}", index.type_tag()), span)
    })
}

pub(crate) fn out_of_bounds(index: i64, low: i64, high: i64, span: Span) -> RuntimeError {
    RuntimeError::runtime(
        format!("index {} out of bounds ({}..{})", index, low, high),
        span,
    )
}

fn no_default_property(owner: &str, span: Span) -> RuntimeError {
    RuntimeError::resolution(format!("type '{}' has no default property", owner), span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    #[test]
    fn test_unknown_identifier() {
        let mut interp = Interpreter::new();
        let err = interp.eval(&ident("Nope")).unwrap_err();
        assert!(err.to_string().contains("unknown identifier 'Nope'"));
    }

    #[test]
    fn test_string_indexing_is_one_based() {
        let mut interp = Interpreter::new();
        interp.define_global("s", Value::string("abc"));
        assert_eq!(interp.eval(&index(ident("s"), vec![int(1)])).unwrap(), Value::string("a"));
        let err = interp.eval(&index(ident("s"), vec![int(0)])).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn test_array_literal_and_index() {
        let mut interp = Interpreter::new();
        let value = interp
            .eval(&index(array(vec![int(10), int(20), int(30)]), vec![int(2)]))
            .unwrap();
        assert_eq!(value, Value::Integer(30));
        let err = interp
            .eval(&index(array(vec![int(1)]), vec![int(5)]))
            .unwrap_err();
        assert!(err.to_string().contains("index 5 out of bounds (0..0)"));
    }

    #[test]
    fn test_builtin_function_fallback() {
        let mut interp = Interpreter::new();
        let value = interp.eval(&call_fn("IntToStr", vec![int(7)])).unwrap();
        assert_eq!(value, Value::string("7"));
        let err = interp.eval(&call_fn("Missing", vec![])).unwrap_err();
        assert!(err.to_string().contains("unknown function 'Missing'"));
    }

    #[test]
    fn test_nil_is_not_an_instance() {
        let mut interp = Interpreter::new();
        let value = interp
            .eval(&is(nil(), "TObject"))
            .unwrap();
        assert_eq!(value, Value::Boolean(false));
    }
}
