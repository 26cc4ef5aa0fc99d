//! Record declarations

use super::PropertyOwner;
use crate::ast::RecordDecl;
use crate::ident::normalize;
use crate::interp::{Context, Interpreter};
use crate::registry::{FieldInfo, MethodOwner};
use crate::runtime::{EvalResult, RecordId, RuntimeError};
use std::rc::Rc;

impl Interpreter {
    /// Declare a record type
    ///
    /// Constants are evaluated in declaration order so later constants can
    /// refer to earlier ones. Class variables are evaluated once here.
    #[tracing::instrument(level = "debug", skip_all, fields(record = %decl.name))]
    pub fn declare_record(&mut self, decl: &RecordDecl) -> EvalResult<RecordId> {
        if self.registry.has_type(&decl.name) {
            return Err(RuntimeError::declaration(
                format!("type '{}' already declared", decl.name),
                decl.span,
            ));
        }
        let id = self.registry.add_record(&decl.name);

        for constant in &decl.constants {
            let mut value = self.eval_isolated(Context::record(id), &constant.value)?;
            if let Some(ty) = &constant.ty {
                let ty = self.resolve_type_expr(ty, constant.span)?;
                value = self.coerce(value, &ty, constant.span)?;
            }
            self.registry
                .record_mut(id)
                .constants
                .insert(normalize(&constant.name), value);
        }

        for field in &decl.fields {
            let ty = self.field_type(
                &field.name,
                field.ty.as_ref(),
                field.init.as_ref(),
                Context::record(id),
                field.span,
            )?;
            let key = normalize(&field.name);
            if field.is_class_var {
                let value = match &field.init {
                    Some(init) => {
                        let value = self.eval_isolated(Context::record(id), init)?;
                        self.coerce(value, &ty, field.span)?
                    }
                    None => self.zero_value(&ty)?,
                };
                let info = self.registry.record_mut(id);
                info.class_vars.insert(key.clone(), value);
                info.class_var_types.insert(key, ty);
            } else {
                self.registry.record_mut(id).add_field(FieldInfo {
                    name: field.name.clone(),
                    ty,
                    init: field.init.clone().map(Rc::new),
                });
            }
        }

        for method in &decl.methods {
            let is_static = method.flags.is_class_method;
            let entry = Self::method_ref(method.clone(), MethodOwner::Record(id));
            self.registry
                .record_mut(id)
                .upsert_method(normalize(&method.name), entry, is_static);
        }

        for property in &decl.properties {
            let info = self.build_property(PropertyOwner::Record(id), property)?;
            self.registry
                .record_mut(id)
                .properties
                .insert(normalize(&property.name), Rc::new(info));
        }

        tracing::debug!(
            record = %decl.name,
            fields = self.registry.record(id).fields.len(),
            methods = decl.methods.len(),
            "declared record"
        );
        Ok(id)
    }
}
