//! Runtime type descriptors and registry handles

use std::fmt;
use std::rc::Rc;

macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);

            impl $name {
                /// Arena index
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}#{}", stringify!($name), self.0)
                }
            }
        )*
    };
}

define_id! {
    /// Handle to a `ClassInfo` in the registry arena
    ClassId,
    /// Handle to a `RecordTypeInfo`
    RecordId,
    /// Handle to an `InterfaceInfo`
    InterfaceId,
    /// Handle to a `HelperInfo`
    HelperId,
    /// Handle to an `EnumInfo`
    EnumId,
}

/// Array shape
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// Element type
    pub element: Type,
    /// Inclusive bounds for static arrays, `None` for dynamic arrays
    pub bounds: Option<(i64, i64)>,
}

/// Integer subrange `low..high`
#[derive(Debug, Clone, PartialEq)]
pub struct SubrangeType {
    /// Declared name
    pub name: String,
    /// Lower bound (inclusive)
    pub low: i64,
    /// Upper bound (inclusive)
    pub high: i64,
}

impl SubrangeType {
    /// Whether `value` lies inside the range
    pub fn contains(&self, value: i64) -> bool {
        (self.low..=self.high).contains(&value)
    }
}

/// Resolved type of a field, parameter, variable or property
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// `Integer`
    Integer,
    /// `Float`
    Float,
    /// `String`
    String,
    /// `Boolean`
    Boolean,
    /// `Variant`, accepts anything
    Variant,
    /// Class reference
    Class(ClassId),
    /// Interface reference
    Interface(InterfaceId),
    /// Record value
    Record(RecordId),
    /// Enumeration value
    Enum(EnumId),
    /// Dynamic or static array
    Array(Rc<ArrayType>),
    /// Integer subrange
    Subrange(Rc<SubrangeType>),
    /// Function or method pointer
    Function,
}

impl Type {
    /// Resolve one of the built-in scalar type names
    pub fn from_builtin_name(name: &str) -> Option<Type> {
        match name.to_ascii_lowercase().as_str() {
            "integer" | "int64" | "cardinal" => Some(Type::Integer),
            "float" | "double" | "real" => Some(Type::Float),
            "string" => Some(Type::String),
            "boolean" => Some(Type::Boolean),
            "variant" => Some(Type::Variant),
            "tmethod" | "tprocedure" | "tfunction" => Some(Type::Function),
            _ => None,
        }
    }

    /// Canonical lowercase name of a scalar type
    pub fn builtin_name(&self) -> Option<&'static str> {
        match self {
            Type::Integer => Some("integer"),
            Type::Float => Some("float"),
            Type::String => Some("string"),
            Type::Boolean => Some("boolean"),
            Type::Variant => Some("variant"),
            _ => None,
        }
    }

    /// Dynamic array of `element`
    pub fn array_of(element: Type) -> Type {
        Type::Array(Rc::new(ArrayType {
            element,
            bounds: None,
        }))
    }
}
