//! Helper and enum metadata

use super::{MethodRef, PropertyInfo};
use crate::runtime::{EnumId, HelperId, Type, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A type extension
///
/// Helpers form their own inheritance chain through `parent`, separate from
/// class inheritance. `target` is `None` for helpers that apply to a whole
/// structural kind (every dynamic array, every enum).
#[derive(Debug, Clone)]
pub struct HelperInfo {
    /// Handle of this helper
    pub id: HelperId,
    /// Declared name
    pub name: String,
    /// Extended type
    pub target: Option<Type>,
    /// Registry key the helper is filed under (`string`, `array`, `tpoint`)
    pub target_key: String,
    /// Parent helper
    pub parent: Option<HelperId>,
    /// `record helper`
    pub is_record_helper: bool,
    /// Method overloads keyed by normalized name
    pub methods: FxHashMap<String, Vec<MethodRef>>,
    /// Properties
    pub properties: FxHashMap<String, Rc<PropertyInfo>>,
    /// Class variable storage
    pub class_vars: FxHashMap<String, Value>,
    /// Evaluated constants
    pub constants: FxHashMap<String, Value>,
    /// Method names routed to intrinsic operations (`add` to `__array_add`)
    pub builtin_methods: FxHashMap<String, String>,
}

impl HelperInfo {
    /// Empty helper
    pub fn new(id: HelperId, name: impl Into<String>, target: Option<Type>, target_key: String) -> Self {
        Self {
            id,
            name: name.into(),
            target,
            target_key,
            parent: None,
            is_record_helper: false,
            methods: FxHashMap::default(),
            properties: FxHashMap::default(),
            class_vars: FxHashMap::default(),
            constants: FxHashMap::default(),
            builtin_methods: FxHashMap::default(),
        }
    }
}

/// An enumeration type
#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    /// Handle of this enum
    pub id: EnumId,
    /// Declared name
    pub name: String,
    /// Members in declaration order with their ordinals
    pub members: Vec<(String, i64)>,
}

impl EnumInfo {
    /// Member name for an ordinal
    pub fn name_of(&self, ordinal: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, value)| *value == ordinal)
            .map(|(name, _)| name.as_str())
    }

    /// Ordinal of a member (case-insensitive)
    pub fn ordinal_of(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(member, _)| member.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    /// Ordinal of the first member
    pub fn first_ordinal(&self) -> i64 {
        self.members.first().map(|(_, v)| *v).unwrap_or(0)
    }
}
