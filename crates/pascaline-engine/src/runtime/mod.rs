//! Runtime primitives shared by the registry and the interpreter
//!
//! - `value`: tagged runtime values
//! - `types`: resolved type descriptors and registry handles
//! - `environment`: lexical scopes
//! - `call_stack`: recursion guard
//! - `error`: error taxonomy
//! - `options`: engine configuration

pub mod call_stack;
pub mod environment;
pub mod error;
pub mod options;
pub mod types;
pub mod value;

pub use call_stack::{CallStack, Frame};
pub use environment::Environment;
pub use error::{EvalResult, RuntimeError};
pub use options::{EngineOptions, OptionsError};
pub use types::{ArrayType, ClassId, EnumId, HelperId, InterfaceId, RecordId, SubrangeType, Type};
pub use value::{
    ArrayRef, ArrayValue, EnumValue, FunctionPointer, ObjectInstance, ObjectRef, RecordValue,
    Value,
};
