//! Helper declarations

use super::PropertyOwner;
use crate::ast::{FunctionDecl, HelperDecl};
use crate::ident::normalize;
use crate::interp::{Context, Interpreter};
use crate::registry::{MethodOwner, MethodRef};
use crate::runtime::{EvalResult, HelperId, RuntimeError};
use std::rc::Rc;

impl Interpreter {
    /// Declare a class or record helper
    #[tracing::instrument(level = "debug", skip_all, fields(helper = %decl.name))]
    pub fn declare_helper(&mut self, decl: &HelperDecl) -> EvalResult<HelperId> {
        if self.registry.find_helper(&decl.name).is_some() {
            return Err(RuntimeError::declaration(
                format!("helper '{}' already declared", decl.name),
                decl.span,
            ));
        }
        let target = self.registry.resolve_type(&decl.for_type).ok_or_else(|| {
            RuntimeError::declaration(
                format!("helper target type '{}' not found", decl.for_type),
                decl.span,
            )
        })?;
        let parent = match &decl.parent {
            Some(name) => Some(self.registry.find_helper(name).ok_or_else(|| {
                RuntimeError::declaration(format!("parent helper '{}' not found", name), decl.span)
            })?),
            None => None,
        };

        let key = self.helper_target_key(&target);
        let id = self.registry.add_helper(&decl.name, Some(target), &key);
        {
            let info = self.registry.helper_mut(id);
            info.is_record_helper = decl.is_record_helper;
            info.parent = parent;
        }
        let context = Context {
            helper: Some(id),
            ..Default::default()
        };

        for constant in &decl.constants {
            let mut value = self.eval_isolated(context.clone(), &constant.value)?;
            if let Some(ty) = &constant.ty {
                let ty = self.resolve_type_expr(ty, constant.span)?;
                value = self.coerce(value, &ty, constant.span)?;
            }
            self.registry
                .helper_mut(id)
                .constants
                .insert(normalize(&constant.name), value);
        }

        for field in &decl.class_vars {
            let ty = self.field_type(
                &field.name,
                field.ty.as_ref(),
                field.init.as_ref(),
                context.clone(),
                field.span,
            )?;
            let value = match &field.init {
                Some(init) => {
                    let value = self.eval_isolated(context.clone(), init)?;
                    self.coerce(value, &ty, field.span)?
                }
                None => self.zero_value(&ty)?,
            };
            self.registry
                .helper_mut(id)
                .class_vars
                .insert(normalize(&field.name), value);
        }

        for method in &decl.methods {
            let entry = Self::method_ref(method.clone(), MethodOwner::Helper(id));
            let list = self
                .registry
                .helper_mut(id)
                .methods
                .entry(normalize(&method.name))
                .or_default();
            Self::upsert_overload(list, entry);
        }

        for property in &decl.properties {
            let info = self.build_property(PropertyOwner::Helper(id), property)?;
            self.registry
                .helper_mut(id)
                .properties
                .insert(normalize(&property.name), Rc::new(info));
        }

        tracing::debug!(helper = %decl.name, target = %key, "declared helper");
        Ok(id)
    }

    /// Attach an out-of-line body to a declared helper method
    pub(crate) fn register_helper_implementation(
        &mut self,
        id: HelperId,
        implementation: &FunctionDecl,
    ) -> EvalResult<()> {
        let key = normalize(&implementation.name);
        let info = self.registry.helper(id);
        let declared: Vec<MethodRef> = info.methods.get(&key).cloned().unwrap_or_default();
        let name = info.name.clone();
        let merged = self.merge_implementation(&declared, implementation, &name)?;
        let list = self
            .registry
            .helper_mut(id)
            .methods
            .entry(key)
            .or_default();
        Self::upsert_overload(list, Self::method_ref(merged, MethodOwner::Helper(id)));
        tracing::debug!(helper = %name, method = %implementation.name, "registered method implementation");
        Ok(())
    }
}
