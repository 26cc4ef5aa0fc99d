//! Built-in library boundary
//!
//! The object model only routes intrinsic helper methods and built-in
//! functions by identifier; the primitives themselves live behind
//! [`BuiltinLibrary`]. [`DefaultBuiltins`] covers what the intrinsic helpers
//! registered here need plus a handful of common functions.

use crate::ident::normalize;
use crate::registry::{BuiltinAccessor, PropertyInfo, TypeRegistry};
use crate::runtime::{Type, Value};
use std::rc::Rc;

/// Host-provided primitives
pub trait BuiltinLibrary {
    /// Run an intrinsic helper method such as `__array_add`
    fn call_method(&mut self, id: &str, receiver: &Value, args: &[Value]) -> Result<Value, String>;

    /// Run a built-in function by name; `None` when the name is unknown
    fn call_function(&mut self, name: &str, args: &[Value]) -> Option<Result<Value, String>>;
}

/// Default primitive set
#[derive(Debug, Default)]
pub struct DefaultBuiltins;

impl DefaultBuiltins {
    /// Create the default library
    pub fn new() -> Self {
        Self
    }
}

fn expect_args(id: &str, args: &[Value], count: usize) -> Result<(), String> {
    if args.len() != count {
        return Err(format!(
            "{} expects {} argument(s), got {}",
            id,
            count,
            args.len()
        ));
    }
    Ok(())
}

fn format_float(value: f64, precision: Option<i64>) -> String {
    match precision {
        Some(digits) => format!("{:.*}", digits.clamp(0, 32) as usize, value),
        None => Value::Float(value).to_string(),
    }
}

impl BuiltinLibrary for DefaultBuiltins {
    fn call_method(&mut self, id: &str, receiver: &Value, args: &[Value]) -> Result<Value, String> {
        match (id, receiver) {
            ("__array_add", Value::Array(arr)) => {
                let mut arr = arr.borrow_mut();
                if arr.bounds.is_some() {
                    return Err("cannot add to a static array".to_string());
                }
                arr.elements.extend(args.iter().cloned());
                Ok(Value::Nil)
            }
            ("__array_setlength", Value::Array(arr)) => {
                expect_args("SetLength", args, 1)?;
                let length = args[0]
                    .as_integer()
                    .filter(|n| *n >= 0)
                    .ok_or_else(|| "SetLength expects a non-negative integer".to_string())?;
                let mut arr = arr.borrow_mut();
                if arr.bounds.is_some() {
                    return Err("cannot resize a static array".to_string());
                }
                let zero = arr.zero.clone();
                arr.elements.resize(length as usize, zero);
                Ok(Value::Nil)
            }
            ("__string_array_join", Value::Array(arr)) => {
                expect_args("Join", args, 1)?;
                let separator = args[0]
                    .as_str()
                    .ok_or_else(|| "Join expects a string separator".to_string())?;
                let parts: Vec<String> = arr.borrow().elements.iter().map(|v| v.to_string()).collect();
                Ok(Value::string(parts.join(separator)))
            }
            ("__string_toupper", Value::String(s)) => Ok(Value::string(s.to_uppercase())),
            ("__string_tolower", Value::String(s)) => Ok(Value::string(s.to_lowercase())),
            ("__integer_tostring", Value::Integer(n)) => Ok(Value::string(n.to_string())),
            ("__float_tostring", Value::Float(f)) => {
                let precision = args.first().and_then(Value::as_integer);
                Ok(Value::string(format_float(*f, precision)))
            }
            ("__boolean_tostring", Value::Boolean(_)) => Ok(Value::string(receiver.to_string())),
            _ => Err(format!(
                "intrinsic '{}' is not applicable to {}",
                id,
                receiver.type_tag()
            )),
        }
    }

    fn call_function(&mut self, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
        let result = match normalize(name).as_str() {
            "inttostr" => expect_args("IntToStr", args, 1).and_then(|_| {
                args[0]
                    .as_integer()
                    .map(|n| Value::string(n.to_string()))
                    .ok_or_else(|| "IntToStr expects an integer".to_string())
            }),
            "floattostr" => expect_args("FloatToStr", args, 1).and_then(|_| {
                args[0]
                    .as_float()
                    .map(|f| Value::string(format_float(f, None)))
                    .ok_or_else(|| "FloatToStr expects a number".to_string())
            }),
            "strtoint" => expect_args("StrToInt", args, 1).and_then(|_| {
                let text = args[0]
                    .as_str()
                    .ok_or_else(|| "StrToInt expects a string".to_string())?;
                text.trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| format!("'{}' is not a valid integer value", text))
            }),
            "length" => expect_args("Length", args, 1).and_then(|_| match &args[0] {
                Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                Value::Array(arr) => Ok(Value::Integer(arr.borrow().len() as i64)),
                other => Err(format!("Length is not applicable to {}", other.type_tag())),
            }),
            "uppercase" => expect_args("UpperCase", args, 1).and_then(|_| {
                args[0]
                    .as_str()
                    .map(|s| Value::string(s.to_uppercase()))
                    .ok_or_else(|| "UpperCase expects a string".to_string())
            }),
            "lowercase" => expect_args("LowerCase", args, 1).and_then(|_| {
                args[0]
                    .as_str()
                    .map(|s| Value::string(s.to_lowercase()))
                    .ok_or_else(|| "LowerCase expects a string".to_string())
            }),
            "ord" => expect_args("Ord", args, 1).and_then(|_| match &args[0] {
                Value::Enum(e) => Ok(Value::Integer(e.ordinal)),
                Value::Integer(n) => Ok(Value::Integer(*n)),
                Value::Boolean(b) => Ok(Value::Integer(*b as i64)),
                Value::String(s) if s.chars().count() == 1 => {
                    Ok(Value::Integer(s.chars().next().map_or(0, |c| c as i64)))
                }
                other => Err(format!("Ord is not applicable to {}", other.type_tag())),
            }),
            "abs" => expect_args("Abs", args, 1).and_then(|_| match &args[0] {
                Value::Integer(n) => Ok(Value::Integer(n.wrapping_abs())),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(format!("Abs is not applicable to {}", other.type_tag())),
            }),
            "assigned" => expect_args("Assigned", args, 1).map(|_| Value::Boolean(!args[0].is_nil())),
            _ => return None,
        };
        Some(result)
    }
}

/// Register the helpers every program sees for arrays, strings, enums and
/// the numeric and boolean types
pub fn register_intrinsic_helpers(registry: &mut TypeRegistry) {
    let array = registry.add_helper("TArrayHelper", None, "array");
    {
        let info = registry.helper_mut(array);
        for (name, accessor) in [
            ("Length", BuiltinAccessor::ArrayLength),
            ("High", BuiltinAccessor::ArrayHigh),
            ("Low", BuiltinAccessor::ArrayLow),
            ("Count", BuiltinAccessor::ArrayCount),
        ] {
            info.properties.insert(
                normalize(name),
                Rc::new(PropertyInfo::builtin(name, Type::Integer, accessor)),
            );
        }
        info.builtin_methods.insert("add".into(), "__array_add".into());
        info.builtin_methods.insert("push".into(), "__array_add".into());
        info.builtin_methods
            .insert("setlength".into(), "__array_setlength".into());
    }

    let strings = Type::array_of(Type::String);
    let string_array = registry.add_helper("TStringArrayHelper", Some(strings), "array of string");
    registry.helper_mut(string_array).parent = Some(array);
    registry
        .helper_mut(string_array)
        .builtin_methods
        .insert("join".into(), "__string_array_join".into());

    let string = registry.add_helper("TStringHelper", Some(Type::String), "string");
    {
        let info = registry.helper_mut(string);
        info.properties.insert(
            "length".into(),
            Rc::new(PropertyInfo::builtin("Length", Type::Integer, BuiltinAccessor::StringLength)),
        );
        info.builtin_methods.insert("toupper".into(), "__string_toupper".into());
        info.builtin_methods.insert("tolower".into(), "__string_tolower".into());
    }

    for (name, ty, key, id) in [
        ("TIntegerHelper", Type::Integer, "integer", "__integer_tostring"),
        ("TFloatHelper", Type::Float, "float", "__float_tostring"),
        ("TBooleanHelper", Type::Boolean, "boolean", "__boolean_tostring"),
    ] {
        let helper = registry.add_helper(name, Some(ty), key);
        registry
            .helper_mut(helper)
            .builtin_methods
            .insert("tostring".into(), id.into());
    }

    let enums = registry.add_helper("TEnumHelper", None, "enum");
    let info = registry.helper_mut(enums);
    for (name, accessor) in [
        ("Value", BuiltinAccessor::EnumValue),
        ("Name", BuiltinAccessor::EnumName),
        ("QualifiedName", BuiltinAccessor::EnumQualifiedName),
    ] {
        let ty = if accessor == BuiltinAccessor::EnumValue {
            Type::Integer
        } else {
            Type::String
        };
        info.properties
            .insert(normalize(name), Rc::new(PropertyInfo::builtin(name, ty, accessor)));
    }
    tracing::trace!("registered intrinsic helpers");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ArrayValue;

    fn empty_array(element: Type, zero: Value) -> Value {
        Value::array(ArrayValue::dynamic(element, zero, Vec::new()))
    }

    #[test]
    fn test_array_add_and_setlength() {
        let mut lib = DefaultBuiltins::new();
        let arr = empty_array(Type::Integer, Value::Integer(0));
        lib.call_method("__array_add", &arr, &[Value::Integer(7)]).unwrap();
        lib.call_method("__array_setlength", &arr, &[Value::Integer(3)]).unwrap();
        match &arr {
            Value::Array(a) => {
                let a = a.borrow();
                assert_eq!(a.elements, vec![Value::Integer(7), Value::Integer(0), Value::Integer(0)]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_function_is_none() {
        let mut lib = DefaultBuiltins::new();
        assert!(lib.call_function("NoSuchThing", &[]).is_none());
        assert_eq!(
            lib.call_function("IntToStr", &[Value::Integer(42)]),
            Some(Ok(Value::string("42")))
        );
    }

    #[test]
    fn test_intrinsic_type_mismatch() {
        let mut lib = DefaultBuiltins::new();
        let err = lib
            .call_method("__string_toupper", &Value::Integer(1), &[])
            .unwrap_err();
        assert!(err.contains("not applicable"));
    }
}
