//! Property descriptors
//!
//! A descriptor records how reads and writes are routed. At declaration time
//! an accessor identifier cannot always be classified, so plain identifiers
//! that do not name a known method are stored as `Field` and resolved on every
//! access in a fixed order: class variable, constant, instance field, method.

use crate::ast::Expr;
use crate::runtime::{Type, Value};
use std::rc::Rc;

/// Intrinsic accessors available through helpers on built-in types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAccessor {
    /// `arr.Length`
    ArrayLength,
    /// `arr.High`
    ArrayHigh,
    /// `arr.Low`
    ArrayLow,
    /// `arr.Count`
    ArrayCount,
    /// `s.Length`
    StringLength,
    /// `e.Value`
    EnumValue,
    /// `e.Name`
    EnumName,
    /// `e.QualifiedName`
    EnumQualifiedName,
    /// `i.ToString`, `f.ToString`, `b.ToString`
    ToString,
}

impl BuiltinAccessor {
    /// Accessor name as exposed to programs
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinAccessor::ArrayLength | BuiltinAccessor::StringLength => "Length",
            BuiltinAccessor::ArrayHigh => "High",
            BuiltinAccessor::ArrayLow => "Low",
            BuiltinAccessor::ArrayCount => "Count",
            BuiltinAccessor::EnumValue => "Value",
            BuiltinAccessor::EnumName => "Name",
            BuiltinAccessor::EnumQualifiedName => "QualifiedName",
            BuiltinAccessor::ToString => "ToString",
        }
    }
}

/// Kind tag of an accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyAccessKind {
    /// No accessor (read-only or write-only property)
    None,
    /// Identifier not known to be a method at declaration time
    Field,
    /// Getter or setter method
    Method,
    /// Stored expression, re-evaluated on every read
    Expression,
    /// Getter or setter method taking index arguments
    Indexed,
    /// Intrinsic accessor
    Builtin,
}

/// How one direction (read or write) of a property is implemented
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyAccess {
    /// Not accessible in this direction
    None,
    /// Field, class variable, constant or method, resolved on access
    Field(String),
    /// Method by name
    Method(String),
    /// Expression evaluated with `Self` and all fields in scope
    Expression(Rc<Expr>),
    /// Method taking the index arguments (plus the value for writes)
    Indexed(String),
    /// Intrinsic accessor
    Builtin(BuiltinAccessor),
}

impl PropertyAccess {
    /// Kind tag
    pub fn kind(&self) -> PropertyAccessKind {
        match self {
            PropertyAccess::None => PropertyAccessKind::None,
            PropertyAccess::Field(_) => PropertyAccessKind::Field,
            PropertyAccess::Method(_) => PropertyAccessKind::Method,
            PropertyAccess::Expression(_) => PropertyAccessKind::Expression,
            PropertyAccess::Indexed(_) => PropertyAccessKind::Indexed,
            PropertyAccess::Builtin(_) => PropertyAccessKind::Builtin,
        }
    }

    /// Whether this direction is accessible at all
    pub fn is_none(&self) -> bool {
        matches!(self, PropertyAccess::None)
    }
}

/// Property descriptor shared by classes, records, interfaces and helpers
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Declared name
    pub name: String,
    /// Declared type
    pub ty: Type,
    /// Read accessor
    pub read: PropertyAccess,
    /// Write accessor
    pub write: PropertyAccess,
    /// Number of index parameters (0 for plain properties)
    pub index_param_count: usize,
    /// `default` marker
    pub is_default: bool,
    /// `class property`
    pub is_class_property: bool,
    /// Evaluated `index N` directive
    pub index_value: Option<Value>,
}

impl PropertyInfo {
    /// Read-only intrinsic property
    pub fn builtin(name: &str, ty: Type, accessor: BuiltinAccessor) -> Self {
        Self {
            name: name.to_string(),
            ty,
            read: PropertyAccess::Builtin(accessor),
            write: PropertyAccess::None,
            index_param_count: 0,
            is_default: false,
            is_class_property: false,
            index_value: None,
        }
    }

    /// Whether the property takes index arguments
    pub fn is_indexed(&self) -> bool {
        self.index_param_count > 0
    }

    /// Implicit leading arguments contributed by the `index` directive
    pub fn directive_args(&self) -> Vec<Value> {
        self.index_value.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_kinds() {
        assert_eq!(PropertyAccess::None.kind(), PropertyAccessKind::None);
        assert_eq!(
            PropertyAccess::Field("FSize".into()).kind(),
            PropertyAccessKind::Field
        );
        assert_eq!(
            PropertyAccess::Builtin(BuiltinAccessor::ArrayHigh).kind(),
            PropertyAccessKind::Builtin
        );
    }

    #[test]
    fn test_builtin_descriptor_is_read_only() {
        let prop = PropertyInfo::builtin("Length", Type::Integer, BuiltinAccessor::ArrayLength);
        assert!(prop.write.is_none());
        assert!(!prop.is_indexed());
        assert!(prop.directive_args().is_empty());
    }
}
