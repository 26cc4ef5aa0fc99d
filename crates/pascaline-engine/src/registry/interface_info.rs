//! Interface metadata
//!
//! Interfaces inherit by delegation: a child stores only its own methods and
//! the registry walks the parent chain for lookups.

use super::PropertyInfo;
use crate::ast::FunctionDecl;
use crate::runtime::InterfaceId;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Everything known about one declared interface
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Handle of this interface
    pub id: InterfaceId,
    /// Declared name
    pub name: String,
    /// Parent interface
    pub parent: Option<InterfaceId>,
    /// Own method signatures keyed by normalized name
    pub methods: FxHashMap<String, Rc<FunctionDecl>>,
    /// Own method keys in declaration order
    pub method_order: Vec<String>,
    /// Own properties
    pub properties: FxHashMap<String, Rc<PropertyInfo>>,
}

impl InterfaceInfo {
    /// Empty interface info
    pub fn new(id: InterfaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            methods: FxHashMap::default(),
            method_order: Vec::new(),
            properties: FxHashMap::default(),
        }
    }
}
