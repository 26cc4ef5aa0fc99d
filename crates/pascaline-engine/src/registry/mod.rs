//! Type registry
//!
//! Owns every declared class, record, interface, helper and enum in arenas
//! addressed by integer handles. Parent links are handles too, so hierarchy
//! walks never chase raw back-references. All name lookups are
//! case-insensitive.

pub mod class_info;
pub mod helper_info;
pub mod interface_info;
pub mod operators;
pub mod property;
pub mod record_info;

pub use class_info::{ClassFlags, ClassInfo};
pub use helper_info::{EnumInfo, HelperInfo};
pub use interface_info::InterfaceInfo;
pub use operators::{ConversionEntry, ConversionTable, OperatorEntry, OperatorError, OperatorTable};
pub use property::{BuiltinAccessor, PropertyAccess, PropertyAccessKind, PropertyInfo};
pub use record_info::RecordTypeInfo;

use crate::ast::{Expr, FunctionDecl, TypeExpr};
use crate::ident::normalize;
use crate::runtime::{
    ArrayType, ArrayValue, ClassId, EnumId, EnumValue, HelperId, InterfaceId, RecordId,
    RecordValue, SubrangeType, Type, Value,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

// ============================================================================
// Shared member descriptors
// ============================================================================

/// Who declared a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOwner {
    /// Class method or instance method
    Class(ClassId),
    /// Record method
    Record(RecordId),
    /// Helper method
    Helper(HelperId),
    /// Free function
    Global,
}

/// A method declaration together with its declaring type
#[derive(Debug, Clone)]
pub struct MethodRef {
    /// Declaration (signature and optional body)
    pub decl: Rc<FunctionDecl>,
    /// Declaring type
    pub owner: MethodOwner,
}

impl MethodRef {
    /// Wrap a declaration
    pub fn new(decl: Rc<FunctionDecl>, owner: MethodOwner) -> Self {
        Self { decl, owner }
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    /// Whether a body is attached
    pub fn has_body(&self) -> bool {
        self.decl.has_body()
    }

    /// Key used in virtual method tables
    pub fn vmt_key(&self) -> String {
        vmt_key(&self.decl)
    }

    /// Whether this is a class (static) method
    pub fn is_class_method(&self) -> bool {
        self.decl.flags.is_class_method
    }
}

/// VMT key for a declaration: `name|paramtypes`
pub fn vmt_key(decl: &FunctionDecl) -> String {
    format!("{}|{}", normalize(&decl.name), decl.signature())
}

/// Field of a class or record
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Declared name
    pub name: String,
    /// Resolved type
    pub ty: Type,
    /// Initializer evaluated for every new instance
    pub init: Option<Rc<Expr>>,
}

/// Result of a by-name type lookup
#[derive(Debug, Clone, PartialEq)]
pub enum TypeEntry {
    /// Class
    Class(ClassId),
    /// Record
    Record(RecordId),
    /// Interface
    Interface(InterfaceId),
    /// Helper
    Helper(HelperId),
    /// Enumeration
    Enum(EnumId),
    /// Named array type
    Array(Rc<ArrayType>),
    /// Subrange
    Subrange(Rc<SubrangeType>),
    /// Alias for another type
    Alias(Type),
}

// ============================================================================
// Registry
// ============================================================================

/// All declared types of one interpreter
#[derive(Debug, Default)]
pub struct TypeRegistry {
    classes: Vec<ClassInfo>,
    class_names: FxHashMap<String, ClassId>,
    records: Vec<RecordTypeInfo>,
    record_names: FxHashMap<String, RecordId>,
    interfaces: Vec<InterfaceInfo>,
    interface_names: FxHashMap<String, InterfaceId>,
    helpers: Vec<HelperInfo>,
    helper_names: FxHashMap<String, HelperId>,
    helpers_by_target: FxHashMap<String, Vec<HelperId>>,
    enums: Vec<EnumInfo>,
    enum_names: FxHashMap<String, EnumId>,
    arrays: FxHashMap<String, Rc<ArrayType>>,
    subranges: FxHashMap<String, Rc<SubrangeType>>,
    aliases: FxHashMap<String, Type>,
    /// Global operator overloads
    pub global_operators: OperatorTable,
    /// Conversion operators
    pub conversions: ConversionTable,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------------

    /// Allocate a new class and register it under `name`
    pub fn add_class(&mut self, name: &str) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassInfo::new(id, name));
        self.class_names.insert(normalize(name), id);
        id
    }

    /// Register an additional name (e.g. `Outer.Inner`) for a class
    pub fn register_class_name(&mut self, name: &str, id: ClassId) {
        self.class_names.insert(normalize(name), id);
    }

    /// Class by handle
    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.index()]
    }

    /// Mutable class by handle
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassInfo {
        &mut self.classes[id.index()]
    }

    /// Class by name
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(&normalize(name)).copied()
    }

    /// Every registered class handle
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len() as u32).map(ClassId)
    }

    /// The class followed by its ancestors, most derived first
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut seen = FxHashSet::default();
        seen.insert(id);
        let mut current = self.class(id).parent;
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = self.class(parent).parent;
        }
        chain
    }

    /// Whether `id` is `ancestor` or derives from it
    pub fn inherits_from(&self, id: ClassId, ancestor: ClassId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Whether `id` strictly derives from `ancestor`
    pub fn is_descendant_of(&self, id: ClassId, ancestor: ClassId) -> bool {
        id != ancestor && self.inherits_from(id, ancestor)
    }

    /// Method overloads visible from `id`, most derived first
    ///
    /// An ancestor overload whose parameter signature is already provided by
    /// a more derived class is hidden.
    pub fn collect_overloads(&self, id: ClassId, key: &str, class_methods: bool) -> Vec<MethodRef> {
        let mut result: Vec<MethodRef> = Vec::new();
        for class in self.ancestors(id) {
            for method in self.class(class).own_overloads(key, class_methods) {
                if !result.iter().any(|m| m.decl.params_match(&method.decl)) {
                    result.push(method.clone());
                }
            }
        }
        result
    }

    /// Constructor overloads visible from `id`, most derived first
    ///
    /// Overload lists stay on the declaring class and are gathered here at
    /// call time. A constructor whose parameter signature is already
    /// provided by a more derived class is hidden.
    pub fn collect_constructors(&self, id: ClassId, key: &str) -> Vec<MethodRef> {
        let mut result: Vec<MethodRef> = Vec::new();
        for class in self.ancestors(id) {
            let Some(list) = self.class(class).constructor_overloads.get(key) else {
                continue;
            };
            for ctor in list {
                if !result.iter().any(|m| m.decl.params_match(&ctor.decl)) {
                    result.push(ctor.clone());
                }
            }
        }
        result
    }

    /// Whether `id` or one of its ancestors declares constructor `key`
    pub fn has_constructor(&self, id: ClassId, key: &str) -> bool {
        self.ancestors(id)
            .into_iter()
            .any(|c| self.class(c).has_constructor(key))
    }

    /// Map a statically found method to the runtime class's VMT entry
    pub fn virtual_target(&self, id: ClassId, method: &MethodRef) -> MethodRef {
        self.class(id)
            .vmt
            .get(&method.vmt_key())
            .cloned()
            .unwrap_or_else(|| method.clone())
    }

    /// The class in the chain that stores class variable `key`
    pub fn class_var_owner(&self, id: ClassId, key: &str) -> Option<ClassId> {
        self.ancestors(id)
            .into_iter()
            .find(|c| self.class(*c).class_vars.contains_key(key))
    }

    /// The class in the chain that declares constant `key`
    pub fn constant_owner(&self, id: ClassId, key: &str) -> Option<ClassId> {
        self.ancestors(id)
            .into_iter()
            .find(|c| self.class(*c).constants.contains_key(key))
    }

    /// Property visible from `id`
    pub fn find_property(&self, id: ClassId, key: &str) -> Option<Rc<PropertyInfo>> {
        self.ancestors(id)
            .into_iter()
            .find_map(|c| self.class(c).properties.get(key).cloned())
    }

    /// Default indexed property visible from `id`
    pub fn default_property(&self, id: ClassId) -> Option<Rc<PropertyInfo>> {
        self.ancestors(id)
            .into_iter()
            .find_map(|c| self.class(c).default_property().cloned())
    }

    /// Nested class visible from `id` by short name
    pub fn find_nested(&self, id: ClassId, key: &str) -> Option<ClassId> {
        self.ancestors(id)
            .into_iter()
            .find_map(|c| self.class(c).nested.get(key).copied())
    }

    /// Whether the class hierarchy implements an interface (directly or via a
    /// descendant interface)
    pub fn class_implements(&self, id: ClassId, interface: InterfaceId) -> bool {
        self.ancestors(id).into_iter().any(|c| {
            self.class(c)
                .interfaces
                .iter()
                .any(|i| self.interface_extends(*i, interface))
        })
    }

    // ------------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------------

    /// Allocate a new record type
    pub fn add_record(&mut self, name: &str) -> RecordId {
        let id = RecordId(self.records.len() as u32);
        self.records.push(RecordTypeInfo::new(id, name));
        self.record_names.insert(normalize(name), id);
        id
    }

    /// Record type by handle
    pub fn record(&self, id: RecordId) -> &RecordTypeInfo {
        &self.records[id.index()]
    }

    /// Mutable record type by handle
    pub fn record_mut(&mut self, id: RecordId) -> &mut RecordTypeInfo {
        &mut self.records[id.index()]
    }

    /// Record type by name
    pub fn find_record(&self, name: &str) -> Option<RecordId> {
        self.record_names.get(&normalize(name)).copied()
    }

    // ------------------------------------------------------------------------
    // Interfaces
    // ------------------------------------------------------------------------

    /// Allocate a new interface
    pub fn add_interface(&mut self, name: &str) -> InterfaceId {
        let id = InterfaceId(self.interfaces.len() as u32);
        self.interfaces.push(InterfaceInfo::new(id, name));
        self.interface_names.insert(normalize(name), id);
        id
    }

    /// Interface by handle
    pub fn interface(&self, id: InterfaceId) -> &InterfaceInfo {
        &self.interfaces[id.index()]
    }

    /// Mutable interface by handle
    pub fn interface_mut(&mut self, id: InterfaceId) -> &mut InterfaceInfo {
        &mut self.interfaces[id.index()]
    }

    /// Interface by name
    pub fn find_interface(&self, name: &str) -> Option<InterfaceId> {
        self.interface_names.get(&normalize(name)).copied()
    }

    /// The interface followed by its ancestors
    pub fn interface_chain(&self, id: InterfaceId) -> Vec<InterfaceId> {
        let mut chain = vec![id];
        let mut current = self.interface(id).parent;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.interface(parent).parent;
        }
        chain
    }

    /// Whether `id` is `ancestor` or extends it
    pub fn interface_extends(&self, id: InterfaceId, ancestor: InterfaceId) -> bool {
        self.interface_chain(id).contains(&ancestor)
    }

    /// Method signature declared by the interface or one of its parents
    pub fn interface_method(&self, id: InterfaceId, key: &str) -> Option<Rc<FunctionDecl>> {
        self.interface_chain(id)
            .into_iter()
            .find_map(|i| self.interface(i).methods.get(key).cloned())
    }

    /// Every method signature of the interface including inherited ones
    pub fn interface_all_methods(&self, id: InterfaceId) -> Vec<Rc<FunctionDecl>> {
        let mut seen = FxHashSet::default();
        let mut methods = Vec::new();
        for interface in self.interface_chain(id) {
            let info = self.interface(interface);
            for key in &info.method_order {
                if seen.insert(key.clone()) {
                    if let Some(decl) = info.methods.get(key) {
                        methods.push(decl.clone());
                    }
                }
            }
        }
        methods
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Allocate a new helper filed under `target_key`
    pub fn add_helper(&mut self, name: &str, target: Option<Type>, target_key: &str) -> HelperId {
        let id = HelperId(self.helpers.len() as u32);
        let key = normalize(target_key);
        self.helpers
            .push(HelperInfo::new(id, name, target, key.clone()));
        self.helper_names.insert(normalize(name), id);
        self.helpers_by_target.entry(key).or_default().push(id);
        id
    }

    /// Helper by handle
    pub fn helper(&self, id: HelperId) -> &HelperInfo {
        &self.helpers[id.index()]
    }

    /// Mutable helper by handle
    pub fn helper_mut(&mut self, id: HelperId) -> &mut HelperInfo {
        &mut self.helpers[id.index()]
    }

    /// Helper by name
    pub fn find_helper(&self, name: &str) -> Option<HelperId> {
        self.helper_names.get(&normalize(name)).copied()
    }

    /// Helpers filed under a target key, most recently declared first
    pub fn helpers_for(&self, target_key: &str) -> Vec<HelperId> {
        self.helpers_by_target
            .get(&normalize(target_key))
            .map(|list| list.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    /// The helper followed by its parent helpers
    pub fn helper_chain(&self, id: HelperId) -> Vec<HelperId> {
        let mut chain = vec![id];
        let mut current = self.helper(id).parent;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.helper(parent).parent;
        }
        chain
    }

    // ------------------------------------------------------------------------
    // Enums, arrays, subranges, aliases
    // ------------------------------------------------------------------------

    /// Register an enumeration
    pub fn add_enum(&mut self, name: &str, members: Vec<(String, i64)>) -> EnumId {
        let id = EnumId(self.enums.len() as u32);
        self.enums.push(EnumInfo {
            id,
            name: name.to_string(),
            members,
        });
        self.enum_names.insert(normalize(name), id);
        id
    }

    /// Enum by handle
    pub fn enum_info(&self, id: EnumId) -> &EnumInfo {
        &self.enums[id.index()]
    }

    /// Enum by name
    pub fn find_enum(&self, name: &str) -> Option<EnumId> {
        self.enum_names.get(&normalize(name)).copied()
    }

    /// Register a named array type
    pub fn add_array_type(&mut self, name: &str, array: Rc<ArrayType>) {
        self.arrays.insert(normalize(name), array);
    }

    /// Register a subrange type
    pub fn add_subrange(&mut self, subrange: SubrangeType) -> Rc<SubrangeType> {
        let subrange = Rc::new(subrange);
        self.subranges
            .insert(normalize(&subrange.name), subrange.clone());
        subrange
    }

    /// Register a type alias
    pub fn add_alias(&mut self, name: &str, target: Type) {
        self.aliases.insert(normalize(name), target);
    }

    // ------------------------------------------------------------------------
    // Type lookup
    // ------------------------------------------------------------------------

    /// Whether any type (of any kind) is registered under `name`
    pub fn has_type(&self, name: &str) -> bool {
        self.lookup_type(name).is_some()
    }

    /// Case-insensitive by-name lookup across every kind of type
    pub fn lookup_type(&self, name: &str) -> Option<TypeEntry> {
        let key = normalize(name);
        if let Some(id) = self.class_names.get(&key) {
            return Some(TypeEntry::Class(*id));
        }
        if let Some(id) = self.record_names.get(&key) {
            return Some(TypeEntry::Record(*id));
        }
        if let Some(id) = self.interface_names.get(&key) {
            return Some(TypeEntry::Interface(*id));
        }
        if let Some(id) = self.enum_names.get(&key) {
            return Some(TypeEntry::Enum(*id));
        }
        if let Some(array) = self.arrays.get(&key) {
            return Some(TypeEntry::Array(array.clone()));
        }
        if let Some(subrange) = self.subranges.get(&key) {
            return Some(TypeEntry::Subrange(subrange.clone()));
        }
        if let Some(ty) = self.aliases.get(&key) {
            return Some(TypeEntry::Alias(ty.clone()));
        }
        self.helper_names.get(&key).map(|id| TypeEntry::Helper(*id))
    }

    /// Resolve a type annotation
    pub fn resolve_type(&self, expr: &TypeExpr) -> Option<Type> {
        match expr {
            TypeExpr::Named(name) => {
                if let Some(ty) = Type::from_builtin_name(name) {
                    return Some(ty);
                }
                match self.lookup_type(name)? {
                    TypeEntry::Class(id) => Some(Type::Class(id)),
                    TypeEntry::Record(id) => Some(Type::Record(id)),
                    TypeEntry::Interface(id) => Some(Type::Interface(id)),
                    TypeEntry::Enum(id) => Some(Type::Enum(id)),
                    TypeEntry::Array(array) => Some(Type::Array(array)),
                    TypeEntry::Subrange(subrange) => Some(Type::Subrange(subrange)),
                    TypeEntry::Alias(ty) => Some(ty),
                    TypeEntry::Helper(_) => None,
                }
            }
            TypeExpr::DynamicArray(element) => Some(Type::Array(Rc::new(ArrayType {
                element: self.resolve_type(element)?,
                bounds: None,
            }))),
            TypeExpr::StaticArray { element, low, high } => {
                Some(Type::Array(Rc::new(ArrayType {
                    element: self.resolve_type(element)?,
                    bounds: Some((*low, *high)),
                })))
            }
        }
    }

    /// Display name of a resolved type
    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Integer => "Integer".to_string(),
            Type::Float => "Float".to_string(),
            Type::String => "String".to_string(),
            Type::Boolean => "Boolean".to_string(),
            Type::Variant => "Variant".to_string(),
            Type::Function => "TMethod".to_string(),
            Type::Class(id) => self.class(*id).name.clone(),
            Type::Interface(id) => self.interface(*id).name.clone(),
            Type::Record(id) => self.record(*id).name.clone(),
            Type::Enum(id) => self.enum_info(*id).name.clone(),
            Type::Subrange(subrange) => subrange.name.clone(),
            Type::Array(array) => match array.bounds {
                Some((low, high)) => format!(
                    "array[{}..{}] of {}",
                    low,
                    high,
                    self.type_name(&array.element)
                ),
                None => format!("array of {}", self.type_name(&array.element)),
            },
        }
    }

    /// Normalized type name of a value, as used in operator signatures
    pub fn value_type_name(&self, value: &Value) -> String {
        normalize(&match value {
            Value::Nil => "nil".to_string(),
            Value::Integer(_) => "integer".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Boolean(_) => "boolean".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Object(obj) => self.class(obj.borrow().class).name.clone(),
            Value::Record(rec) => self.record(rec.record).name.clone(),
            Value::Enum(e) => self.enum_info(e.enum_id).name.clone(),
            Value::Array(arr) => {
                let arr = arr.borrow();
                format!("array of {}", self.type_name(&arr.element_type))
            }
            Value::Class(id) => format!("class of {}", self.class(*id).name),
            Value::RecordType(id) => self.record(*id).name.clone(),
            Value::EnumType(id) => self.enum_info(*id).name.clone(),
            Value::Function(_) => "tmethod".to_string(),
        })
    }

    /// Zero value of a type (records are zero-filled without initializers)
    pub fn zero_value(&self, ty: &Type) -> Value {
        match ty {
            Type::Integer => Value::Integer(0),
            Type::Float => Value::Float(0.0),
            Type::String => Value::String(String::new()),
            Type::Boolean => Value::Boolean(false),
            Type::Subrange(subrange) => Value::Integer(subrange.low),
            Type::Enum(id) => Value::Enum(EnumValue {
                enum_id: *id,
                ordinal: self.enum_info(*id).first_ordinal(),
            }),
            Type::Record(id) => {
                let info = self.record(*id);
                let fields = info
                    .fields
                    .iter()
                    .map(|(key, field)| (key.clone(), self.zero_value(&field.ty)))
                    .collect();
                Value::Record(RecordValue { record: *id, fields })
            }
            Type::Array(array) => {
                let zero = self.zero_value(&array.element);
                let elements = match array.bounds {
                    Some((low, high)) if high >= low => {
                        vec![zero.clone(); (high - low + 1) as usize]
                    }
                    _ => Vec::new(),
                };
                Value::array(ArrayValue {
                    element_type: array.element.clone(),
                    bounds: array.bounds,
                    zero,
                    elements,
                })
            }
            Type::Variant | Type::Class(_) | Type::Interface(_) | Type::Function => Value::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::{array_of, ty};

    #[test]
    fn test_class_lookup_is_case_insensitive() {
        let mut registry = TypeRegistry::new();
        let id = registry.add_class("TShape");
        assert_eq!(registry.find_class("tshape"), Some(id));
        assert_eq!(registry.find_class("TSHAPE"), Some(id));
        assert_eq!(registry.lookup_type("TShape"), Some(TypeEntry::Class(id)));
    }

    #[test]
    fn test_descendant_queries() {
        let mut registry = TypeRegistry::new();
        let base = registry.add_class("TBase");
        let mid = registry.add_class("TMid");
        let leaf = registry.add_class("TLeaf");
        registry.class_mut(mid).parent = Some(base);
        registry.class_mut(leaf).parent = Some(mid);

        assert!(registry.is_descendant_of(leaf, base));
        assert!(registry.is_descendant_of(mid, base));
        assert!(!registry.is_descendant_of(base, leaf));
        assert!(!registry.is_descendant_of(base, base));
        assert!(registry.inherits_from(base, base));
        assert_eq!(registry.ancestors(leaf), vec![leaf, mid, base]);
    }

    #[test]
    fn test_ancestors_stop_on_cycle() {
        let mut registry = TypeRegistry::new();
        let a = registry.add_class("A");
        let b = registry.add_class("B");
        registry.class_mut(a).parent = Some(b);
        registry.class_mut(b).parent = Some(a);
        assert_eq!(registry.ancestors(a), vec![a, b]);
    }

    #[test]
    fn test_resolve_array_type() {
        let registry = TypeRegistry::new();
        let resolved = registry.resolve_type(&array_of(ty("String"))).unwrap();
        assert_eq!(registry.type_name(&resolved), "array of String");
        assert!(registry.resolve_type(&ty("TUnknown")).is_none());
    }

    #[test]
    fn test_interface_methods_walk_parents() {
        let mut registry = TypeRegistry::new();
        let parent = registry.add_interface("IBase");
        let child = registry.add_interface("IChild");
        registry.interface_mut(child).parent = Some(parent);
        registry.interface_mut(parent).methods.insert(
            "name".into(),
            Rc::new(FunctionDecl::function("Name", ty("String"))),
        );
        registry.interface_mut(parent).method_order.push("name".into());

        assert!(registry.interface_method(child, "name").is_some());
        assert_eq!(registry.interface_all_methods(child).len(), 1);
        assert!(registry.interface_extends(child, parent));
        assert!(!registry.interface_extends(parent, child));
    }

    #[test]
    fn test_zero_values() {
        let mut registry = TypeRegistry::new();
        let color = registry.add_enum("TColor", vec![("Red".into(), 0), ("Green".into(), 1)]);
        assert_eq!(registry.zero_value(&Type::Integer), Value::Integer(0));
        assert_eq!(
            registry.zero_value(&Type::Enum(color)),
            Value::Enum(EnumValue {
                enum_id: color,
                ordinal: 0
            })
        );
        match registry.zero_value(&Type::Array(Rc::new(ArrayType {
            element: Type::Integer,
            bounds: Some((1, 4)),
        }))) {
            Value::Array(arr) => assert_eq!(arr.borrow().len(), 4),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_helpers_for_returns_latest_first() {
        let mut registry = TypeRegistry::new();
        let first = registry.add_helper("TFirst", Some(Type::String), "String");
        let second = registry.add_helper("TSecond", Some(Type::String), "string");
        assert_eq!(registry.helpers_for("STRING"), vec![second, first]);
        assert_eq!(registry.find_helper("tfirst"), Some(first));
    }
}
