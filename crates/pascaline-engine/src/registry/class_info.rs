//! Class metadata

use super::{FieldInfo, MethodRef, OperatorTable, PropertyInfo};
use crate::ast::ConstDecl;
use crate::ident::normalize;
use crate::runtime::{ClassId, InterfaceId, Type, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Class modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassFlags {
    /// `abstract` (explicit, or implied by an abstract method)
    pub is_abstract: bool,
    /// `external`
    pub is_external: bool,
    /// `partial`
    pub is_partial: bool,
}

/// Everything known about one declared class
///
/// Single-entry method maps (`methods`, `class_methods`) include inherited
/// entries copied from the parent. Overload lists, constructors included,
/// hold only the class's own declarations and are merged across the
/// hierarchy at call time.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Handle of this class
    pub id: ClassId,
    /// Declared name
    pub name: String,
    /// Parent class
    pub parent: Option<ClassId>,
    /// Enclosing class for nested declarations
    pub enclosing: Option<ClassId>,
    /// Instance fields (own and inherited) keyed by normalized name
    pub fields: FxHashMap<String, FieldInfo>,
    /// Field keys in declaration order, parents first
    pub field_order: Vec<String>,
    /// Class variable storage (own only; shared by all instances)
    pub class_vars: FxHashMap<String, Value>,
    /// Class variable types
    pub class_var_types: FxHashMap<String, Type>,
    /// Own constant declarations
    pub constants: FxHashMap<String, Rc<ConstDecl>>,
    /// Own constant keys in declaration order
    pub constant_order: Vec<String>,
    /// Evaluated constants
    pub constant_values: FxHashMap<String, Value>,
    /// Instance methods by name (own and inherited)
    pub methods: FxHashMap<String, MethodRef>,
    /// Own instance method overloads
    pub method_overloads: FxHashMap<String, Vec<MethodRef>>,
    /// Class methods by name (own and inherited)
    pub class_methods: FxHashMap<String, MethodRef>,
    /// Own class method overloads
    pub class_method_overloads: FxHashMap<String, Vec<MethodRef>>,
    /// Own constructor overloads; see [`crate::registry::TypeRegistry::collect_constructors`]
    pub constructor_overloads: FxHashMap<String, Vec<MethodRef>>,
    /// Destructor
    pub destructor: Option<MethodRef>,
    /// Properties (own and inherited) keyed by normalized name
    pub properties: FxHashMap<String, Rc<PropertyInfo>>,
    /// Directly implemented interfaces
    pub interfaces: Vec<InterfaceId>,
    /// Class operators (cloned from the parent, then extended)
    pub operators: OperatorTable,
    /// Virtual method table: `name|signature` to most-derived implementation
    pub vmt: FxHashMap<String, MethodRef>,
    /// Nested classes by normalized short name
    pub nested: FxHashMap<String, ClassId>,
    /// Modifiers
    pub flags: ClassFlags,
}

impl ClassInfo {
    /// Empty class info
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            enclosing: None,
            fields: FxHashMap::default(),
            field_order: Vec::new(),
            class_vars: FxHashMap::default(),
            class_var_types: FxHashMap::default(),
            constants: FxHashMap::default(),
            constant_order: Vec::new(),
            constant_values: FxHashMap::default(),
            methods: FxHashMap::default(),
            method_overloads: FxHashMap::default(),
            class_methods: FxHashMap::default(),
            class_method_overloads: FxHashMap::default(),
            constructor_overloads: FxHashMap::default(),
            destructor: None,
            properties: FxHashMap::default(),
            interfaces: Vec::new(),
            operators: OperatorTable::new(),
            vmt: FxHashMap::default(),
            nested: FxHashMap::default(),
            flags: ClassFlags::default(),
        }
    }

    /// Add or replace an instance field, keeping declaration order
    pub fn add_field(&mut self, field: FieldInfo) {
        let key = normalize(&field.name);
        if !self.fields.contains_key(&key) {
            self.field_order.push(key.clone());
        }
        self.fields.insert(key, field);
    }

    /// Own overloads of `name` (class or instance methods)
    pub fn own_overloads(&self, key: &str, class_methods: bool) -> &[MethodRef] {
        let table = if class_methods {
            &self.class_method_overloads
        } else {
            &self.method_overloads
        };
        table.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether this class declares a method (of either kind) with this key
    pub fn declares_method(&self, key: &str) -> bool {
        self.method_overloads.contains_key(key) || self.class_method_overloads.contains_key(key)
    }

    /// Instance or class method by name, instance methods first
    pub fn find_method(&self, key: &str) -> Option<&MethodRef> {
        self.methods.get(key).or_else(|| self.class_methods.get(key))
    }

    /// The property marked `default`, if any
    pub fn default_property(&self) -> Option<&Rc<PropertyInfo>> {
        self.properties.values().find(|p| p.is_default)
    }

    /// Whether a constructor exists under this key
    pub fn has_constructor(&self, key: &str) -> bool {
        self.constructor_overloads
            .get(key)
            .is_some_and(|list| !list.is_empty())
    }
}
