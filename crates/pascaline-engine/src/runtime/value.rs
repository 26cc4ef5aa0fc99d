//! Runtime values
//!
//! Objects and dynamic arrays are reference types (`Rc<RefCell<..>>`); two
//! values holding the same instance compare equal by identity. Records are
//! value types: cloning a `Value::Record` deep-copies every field, which is
//! what gives record method calls their copy semantics.

use crate::runtime::types::{ClassId, EnumId, RecordId, Type};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an object instance
pub type ObjectRef = Rc<RefCell<ObjectInstance>>;

/// Shared handle to an array
pub type ArrayRef = Rc<RefCell<ArrayValue>>;

/// A class instance
#[derive(Debug, Clone)]
pub struct ObjectInstance {
    /// Runtime class
    pub class: ClassId,
    /// Instance fields keyed by normalized name
    pub fields: FxHashMap<String, Value>,
    /// Set once the destructor has run
    pub destroyed: bool,
}

impl ObjectInstance {
    /// Create an instance with pre-initialized fields
    pub fn new(class: ClassId, fields: FxHashMap<String, Value>) -> Self {
        Self {
            class,
            fields,
            destroyed: false,
        }
    }

    /// Read a field by normalized name
    pub fn get_field(&self, key: &str) -> Option<Value> {
        self.fields.get(key).cloned()
    }

    /// Write an existing field; returns false when the field does not exist
    pub fn set_field(&mut self, key: &str, value: Value) -> bool {
        match self.fields.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Array storage
#[derive(Debug, Clone)]
pub struct ArrayValue {
    /// Element type
    pub element_type: Type,
    /// Inclusive bounds for static arrays
    pub bounds: Option<(i64, i64)>,
    /// Value used to fill new slots
    pub zero: Value,
    /// Elements
    pub elements: Vec<Value>,
}

impl ArrayValue {
    /// Dynamic array with the given elements
    pub fn dynamic(element_type: Type, zero: Value, elements: Vec<Value>) -> Self {
        Self {
            element_type,
            bounds: None,
            zero,
            elements,
        }
    }

    /// Lowest valid index
    pub fn low(&self) -> i64 {
        self.bounds.map(|(low, _)| low).unwrap_or(0)
    }

    /// Highest valid index (`-1` for an empty dynamic array)
    pub fn high(&self) -> i64 {
        self.low() + self.elements.len() as i64 - 1
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Storage slot for a language-level index
    pub fn slot(&self, index: i64) -> Option<usize> {
        let offset = index.checked_sub(self.low())?;
        usize::try_from(offset)
            .ok()
            .filter(|slot| *slot < self.elements.len())
    }
}

/// A record value
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    /// Record type
    pub record: RecordId,
    /// Fields keyed by normalized name
    pub fields: FxHashMap<String, Value>,
}

/// An enumeration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Enum type
    pub enum_id: EnumId,
    /// Ordinal
    pub ordinal: i64,
}

/// Function or method pointer created with `@`
#[derive(Debug, Clone)]
pub struct FunctionPointer {
    /// Function or method name
    pub name: String,
    /// Bound receiver for method pointers
    pub receiver: Option<Box<Value>>,
}

/// Runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// `nil`, also the value of procedures
    #[default]
    Nil,
    /// 64-bit integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// String
    String(String),
    /// Array (reference semantics)
    Array(ArrayRef),
    /// Record (value semantics)
    Record(RecordValue),
    /// Object instance (reference semantics)
    Object(ObjectRef),
    /// Class reference (`TFoo` used as a value)
    Class(ClassId),
    /// Record type reference, target of static calls and class vars
    RecordType(RecordId),
    /// Enum type reference (`TColor.Red`)
    EnumType(EnumId),
    /// Enumeration member
    Enum(EnumValue),
    /// Function or method pointer
    Function(Rc<FunctionPointer>),
}

impl Value {
    /// Wrap an object instance
    pub fn object(instance: ObjectInstance) -> Self {
        Value::Object(Rc::new(RefCell::new(instance)))
    }

    /// Wrap an array
    pub fn array(array: ArrayValue) -> Self {
        Value::Array(Rc::new(RefCell::new(array)))
    }

    /// String value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Short tag naming the value kind, used in error messages
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Nil => "NIL",
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Record(_) => "RECORD",
            Value::Object(_) => "OBJECT",
            Value::Class(_) => "CLASS",
            Value::RecordType(_) => "RECORD_TYPE",
            Value::EnumType(_) => "ENUM_TYPE",
            Value::Enum(_) => "ENUM",
            Value::Function(_) => "FUNCTION_POINTER",
        }
    }

    /// Whether this is `nil`
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Integer payload
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric payload, promoting integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Object payload
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Record payload
    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(rec) => Some(rec),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::RecordType(a), Value::RecordType(b)) => a == b,
            (Value::EnumType(a), Value::EnumType(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::String(s) => f.write_str(s),
            Value::Array(arr) => {
                let arr = arr.borrow();
                f.write_str("[")?;
                for (i, element) in arr.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            Value::Enum(e) => write!(f, "{}", e.ordinal),
            Value::Function(ptr) => write!(f, "@{}", ptr.name),
            other => write!(f, "<{}>", other.type_tag().to_ascii_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objects_compare_by_identity() {
        let a = Value::object(ObjectInstance::new(ClassId(0), FxHashMap::default()));
        let b = Value::object(ObjectInstance::new(ClassId(0), FxHashMap::default()));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_clone_is_independent() {
        let mut fields = FxHashMap::default();
        fields.insert("x".to_string(), Value::Integer(1));
        let original = RecordValue {
            record: RecordId(0),
            fields,
        };
        let mut copy = original.clone();
        copy.fields.insert("x".to_string(), Value::Integer(2));
        assert_eq!(original.fields["x"], Value::Integer(1));
        assert_ne!(original, copy);
    }

    #[test]
    fn test_static_array_slots() {
        let arr = ArrayValue {
            element_type: Type::Integer,
            bounds: Some((1, 3)),
            zero: Value::Integer(0),
            elements: vec![Value::Integer(0); 3],
        };
        assert_eq!(arr.low(), 1);
        assert_eq!(arr.high(), 3);
        assert_eq!(arr.slot(1), Some(0));
        assert_eq!(arr.slot(3), Some(2));
        assert_eq!(arr.slot(0), None);
        assert_eq!(arr.slot(4), None);
    }

    #[test]
    fn test_empty_dynamic_array_high() {
        let arr = ArrayValue::dynamic(Type::String, Value::string(""), Vec::new());
        assert_eq!(arr.high(), -1);
        assert!(arr.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Boolean(true).to_string(), "True");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Nil.to_string(), "nil");
    }
}
