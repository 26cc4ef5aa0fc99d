//! Interface declarations

use super::PropertyOwner;
use crate::ast::InterfaceDecl;
use crate::ident::normalize;
use crate::interp::Interpreter;
use crate::runtime::{EvalResult, InterfaceId, RuntimeError};
use std::rc::Rc;

impl Interpreter {
    /// Declare an interface
    ///
    /// Only the interface's own methods are stored; inherited signatures are
    /// found by walking the parent chain.
    pub fn declare_interface(&mut self, decl: &InterfaceDecl) -> EvalResult<InterfaceId> {
        if self.registry.has_type(&decl.name) {
            return Err(RuntimeError::declaration(
                format!("type '{}' already declared", decl.name),
                decl.span,
            ));
        }
        let parent = match &decl.parent {
            Some(name) => Some(self.registry.find_interface(name).ok_or_else(|| {
                RuntimeError::declaration(
                    format!("parent interface '{}' not found", name),
                    decl.span,
                )
            })?),
            None => None,
        };

        let id = self.registry.add_interface(&decl.name);
        self.registry.interface_mut(id).parent = parent;
        for method in &decl.methods {
            let key = normalize(&method.name);
            let info = self.registry.interface_mut(id);
            if !info.methods.contains_key(&key) {
                info.method_order.push(key.clone());
            }
            info.methods.insert(key, Rc::new(method.clone()));
        }
        for property in &decl.properties {
            let info = self.build_property(PropertyOwner::Interface, property)?;
            self.registry
                .interface_mut(id)
                .properties
                .insert(normalize(&property.name), Rc::new(info));
        }

        tracing::debug!(
            interface = %decl.name,
            methods = decl.methods.len(),
            "declared interface"
        );
        Ok(id)
    }
}
