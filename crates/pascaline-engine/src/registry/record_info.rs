//! Record type metadata

use super::{FieldInfo, MethodRef, PropertyInfo};
use crate::ident::normalize;
use crate::runtime::{RecordId, Type, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Shared metadata of a record type
///
/// Record values are independent copies; only the class variables stored
/// here are shared by every copy.
#[derive(Debug, Clone)]
pub struct RecordTypeInfo {
    /// Handle of this record type
    pub id: RecordId,
    /// Declared name
    pub name: String,
    /// Fields keyed by normalized name
    pub fields: FxHashMap<String, FieldInfo>,
    /// Field keys in declaration order
    pub field_order: Vec<String>,
    /// Instance method overloads
    pub methods: FxHashMap<String, Vec<MethodRef>>,
    /// Static (class) method overloads
    pub static_methods: FxHashMap<String, Vec<MethodRef>>,
    /// Evaluated constants
    pub constants: FxHashMap<String, Value>,
    /// Class variable storage
    pub class_vars: FxHashMap<String, Value>,
    /// Class variable types
    pub class_var_types: FxHashMap<String, Type>,
    /// Properties keyed by normalized name
    pub properties: FxHashMap<String, Rc<PropertyInfo>>,
}

impl RecordTypeInfo {
    /// Empty record type
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            fields: FxHashMap::default(),
            field_order: Vec::new(),
            methods: FxHashMap::default(),
            static_methods: FxHashMap::default(),
            constants: FxHashMap::default(),
            class_vars: FxHashMap::default(),
            class_var_types: FxHashMap::default(),
            properties: FxHashMap::default(),
        }
    }

    /// Add a field, keeping declaration order
    pub fn add_field(&mut self, field: FieldInfo) {
        let key = normalize(&field.name);
        if !self.fields.contains_key(&key) {
            self.field_order.push(key.clone());
        }
        self.fields.insert(key, field);
    }

    /// Instance or static overloads of a method
    pub fn overloads(&self, key: &str, is_static: bool) -> &[MethodRef] {
        let table = if is_static {
            &self.static_methods
        } else {
            &self.methods
        };
        table.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a method of either kind exists
    pub fn has_method(&self, key: &str) -> bool {
        self.methods.contains_key(key) || self.static_methods.contains_key(key)
    }

    /// Replace the overload matching `method`'s signature, or append it
    pub fn upsert_method(&mut self, key: String, method: MethodRef, is_static: bool) {
        let table = if is_static {
            &mut self.static_methods
        } else {
            &mut self.methods
        };
        let list = table.entry(key).or_default();
        match list.iter_mut().find(|m| m.decl.params_match(&method.decl)) {
            Some(slot) => *slot = method,
            None => list.push(method),
        }
    }
}
