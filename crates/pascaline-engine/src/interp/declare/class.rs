//! Class declarations and inheritance merge

use super::PropertyOwner;
use crate::ast::{ClassDecl, FieldDecl, FunctionDecl, Span};
use crate::ident::{normalize, same};
use crate::interp::{Context, Interpreter};
use crate::registry::{FieldInfo, MethodOwner, MethodRef};
use crate::runtime::{ClassId, EvalResult, RuntimeError};
use std::rc::Rc;

impl Interpreter {
    /// Declare the root class every class without an explicit parent extends
    pub(crate) fn declare_root_class(&mut self) -> EvalResult<ClassId> {
        let root = ClassDecl::new("TObject")
            .method(FunctionDecl::constructor("Create"))
            .method(FunctionDecl::destructor("Destroy").virtual_());
        self.declare_class(&root)
    }

    /// Declare (or extend, for partial classes) a class
    #[tracing::instrument(level = "debug", skip_all, fields(class = %decl.name))]
    pub fn declare_class(&mut self, decl: &ClassDecl) -> EvalResult<ClassId> {
        let span = decl.span;
        let qualified = match self.enclosing_class {
            Some(outer) => format!("{}.{}", self.registry.class(outer).name, decl.name),
            None => decl.name.clone(),
        };

        // Register before anything else so initializers can refer to the class
        let id = match self.registry.find_class(&qualified) {
            Some(existing) => {
                let partial = self.registry.class(existing).flags.is_partial;
                if !(partial || decl.is_partial) {
                    return Err(RuntimeError::declaration(
                        format!("class '{}' already declared", qualified),
                        span,
                    ));
                }
                existing
            }
            None => self.registry.add_class(&qualified),
        };
        {
            let flags = &mut self.registry.class_mut(id).flags;
            flags.is_abstract |= decl.is_abstract;
            flags.is_external |= decl.is_external;
            flags.is_partial |= decl.is_partial;
        }
        if let Some(outer) = self.enclosing_class {
            self.registry.class_mut(id).enclosing = Some(outer);
            self.registry
                .class_mut(outer)
                .nested
                .insert(normalize(&decl.name), id);
        }

        // Nested types first so field initializers can resolve them
        let saved = self.enclosing_class.replace(id);
        let nested = decl
            .nested
            .iter()
            .try_for_each(|inner| self.declare_class(inner).map(|_| ()));
        self.enclosing_class = saved;
        nested?;

        self.resolve_parent(id, decl)?;

        for name in &decl.interfaces {
            let iface = self.registry.find_interface(name).ok_or_else(|| {
                RuntimeError::declaration(format!("interface '{}' not found", name), span)
            })?;
            let class = self.registry.class_mut(id);
            if !class.interfaces.contains(&iface) {
                class.interfaces.push(iface);
            }
        }

        for constant in &decl.constants {
            let key = normalize(&constant.name);
            let class = self.registry.class_mut(id);
            if !class.constants.contains_key(&key) {
                class.constant_order.push(key.clone());
            }
            class.constant_values.remove(&key);
            class.constants.insert(key, Rc::new(constant.clone()));
        }

        for field in &decl.fields {
            self.declare_class_field(id, field)?;
        }

        for method in &decl.methods {
            self.declare_class_method(id, method)?;
        }
        self.synthesize_default_constructors(id);

        for property in &decl.properties {
            let info = self.build_property(PropertyOwner::Class(id), property)?;
            self.registry
                .class_mut(id)
                .properties
                .insert(normalize(&property.name), Rc::new(info));
        }
        if let Some(parent) = self.registry.class(id).parent {
            let inherited = self.registry.class(parent).properties.clone();
            let class = self.registry.class_mut(id);
            for (key, property) in inherited {
                class.properties.entry(key).or_insert(property);
            }
        }

        for operator in &decl.operators {
            self.declare_class_operator(id, operator)?;
        }

        self.build_vmt(id);

        if !decl.is_partial {
            self.check_interfaces(id, span)?;
        }

        self.registry.register_class_name(&qualified, id);
        tracing::debug!(
            class = %qualified,
            fields = self.registry.class(id).fields.len(),
            methods = decl.methods.len(),
            "declared class"
        );
        Ok(id)
    }

    fn resolve_parent(&mut self, id: ClassId, decl: &ClassDecl) -> EvalResult<()> {
        let parent = match &decl.parent {
            Some(name) => Some(self.resolve_class_name(name).ok_or_else(|| {
                RuntimeError::declaration(format!("parent class '{}' not found", name), decl.span)
            })?),
            None if same(&decl.name, "TObject") || decl.is_external => None,
            None => self.registry.find_class("TObject"),
        };
        let Some(parent) = parent else {
            return Ok(());
        };
        match self.registry.class(id).parent {
            Some(current) if current == parent => return Ok(()),
            Some(current) if decl.parent.is_some() => {
                return Err(RuntimeError::declaration(
                    format!(
                        "class '{}' already inherits from '{}'",
                        decl.name,
                        self.registry.class(current).name
                    ),
                    decl.span,
                ))
            }
            Some(_) => return Ok(()),
            None => {}
        }
        if self.registry.inherits_from(parent, id) {
            return Err(RuntimeError::declaration(
                format!("circular inheritance involving class '{}'", decl.name),
                decl.span,
            ));
        }
        self.registry.class_mut(id).parent = Some(parent);
        self.inherit_from_parent(id, parent);
        Ok(())
    }

    /// Resolve a class name, preferring nested classes of the enclosing class
    pub(crate) fn resolve_class_name(&self, name: &str) -> Option<ClassId> {
        if let Some(outer) = self.enclosing_class {
            if let Some(nested) = self.registry.find_nested(outer, &normalize(name)) {
                return Some(nested);
            }
        }
        self.registry.find_class(name)
    }

    /// Copy the parent's inheritable state into a newly parented class
    fn inherit_from_parent(&mut self, id: ClassId, parent: ClassId) {
        let source = self.registry.class(parent).clone();
        let class = self.registry.class_mut(id);

        let own_order = std::mem::take(&mut class.field_order);
        for key in &source.field_order {
            if let Some(field) = source.fields.get(key) {
                class.fields.entry(key.clone()).or_insert_with(|| field.clone());
                class.field_order.push(key.clone());
            }
        }
        for key in own_order {
            if !class.field_order.contains(&key) {
                class.field_order.push(key);
            }
        }

        for (key, method) in &source.methods {
            class.methods.entry(key.clone()).or_insert_with(|| method.clone());
        }
        for (key, method) in &source.class_methods {
            class
                .class_methods
                .entry(key.clone())
                .or_insert_with(|| method.clone());
        }
        if class.destructor.is_none() {
            class.destructor = source.destructor.clone();
        }
        if class.operators.is_empty() {
            class.operators = source.operators.clone();
        }
    }

    fn declare_class_field(&mut self, id: ClassId, field: &FieldDecl) -> EvalResult<()> {
        let ty = self.field_type(
            &field.name,
            field.ty.as_ref(),
            field.init.as_ref(),
            Context::class(id),
            field.span,
        )?;
        let key = normalize(&field.name);
        if field.is_class_var {
            let value = match &field.init {
                Some(init) => {
                    let value = self.eval_isolated(Context::class(id), init)?;
                    self.coerce(value, &ty, field.span)?
                }
                None => self.zero_value(&ty)?,
            };
            let class = self.registry.class_mut(id);
            class.class_vars.insert(key.clone(), value);
            class.class_var_types.insert(key, ty);
        } else {
            self.registry.class_mut(id).add_field(FieldInfo {
                name: field.name.clone(),
                ty,
                init: field.init.clone().map(Rc::new),
            });
        }
        Ok(())
    }

    fn declare_class_method(&mut self, id: ClassId, method: &FunctionDecl) -> EvalResult<()> {
        let mut decl = method.clone();
        let class_name = self.registry.class(id).name.clone();

        // `function Create: TFoo` is a constructor in disguise
        let returns_self = decl.return_type.as_ref().is_some_and(|ty| {
            let name = ty.display_name();
            same(&name, &class_name) || class_name.rsplit('.').next().is_some_and(|s| same(&name, s))
        });
        if !decl.flags.is_constructor && same(&decl.name, "Create") && returns_self {
            decl.flags.is_constructor = true;
            decl.return_type = None;
        }

        let key = normalize(&decl.name);
        let flags = decl.flags;
        let entry = MethodRef::new(Rc::new(decl), MethodOwner::Class(id));
        let class = self.registry.class_mut(id);

        if flags.is_constructor {
            Self::upsert_overload(class.constructor_overloads.entry(key).or_default(), entry);
        } else if flags.is_destructor {
            class.destructor = Some(entry.clone());
            class.methods.insert(key.clone(), entry.clone());
            Self::upsert_overload(class.method_overloads.entry(key).or_default(), entry);
        } else if flags.is_class_method {
            class.class_methods.insert(key.clone(), entry.clone());
            Self::upsert_overload(class.class_method_overloads.entry(key).or_default(), entry);
        } else {
            class.methods.insert(key.clone(), entry.clone());
            Self::upsert_overload(class.method_overloads.entry(key).or_default(), entry);
        }
        Ok(())
    }

    /// Add a parameterless constructor where overloaded constructors lack one
    ///
    /// A parameterless constructor of the same name anywhere up the
    /// hierarchy counts.
    fn synthesize_default_constructors(&mut self, id: ClassId) {
        let owner = MethodOwner::Class(id);
        let missing: Vec<(String, String)> = self
            .registry
            .class(id)
            .constructor_overloads
            .iter()
            .filter(|(_, list)| list.iter().any(|c| c.owner == owner && c.decl.flags.is_overload))
            .filter(|(key, _)| {
                !self
                    .registry
                    .collect_constructors(id, key)
                    .iter()
                    .any(|c| c.decl.params.is_empty())
            })
            .filter_map(|(key, list)| Some((key.clone(), list.first()?.decl.name.clone())))
            .collect();
        for (key, name) in missing {
            tracing::trace!(constructor = %key, "synthesized parameterless constructor");
            let ctor = MethodRef::new(Rc::new(FunctionDecl::constructor(name).overload()), owner);
            if let Some(list) = self.registry.class_mut(id).constructor_overloads.get_mut(&key) {
                list.push(ctor);
            }
        }
    }

    /// Every method of every listed interface must exist in the hierarchy
    fn check_interfaces(&self, id: ClassId, span: Span) -> EvalResult<()> {
        let chain = self.registry.ancestors(id);
        for iface in &self.registry.class(id).interfaces {
            for method in self.registry.interface_all_methods(*iface) {
                let key = normalize(&method.name);
                let provided = chain.iter().any(|c| {
                    let class = self.registry.class(*c);
                    class.declares_method(&key) || class.find_method(&key).is_some()
                });
                if !provided {
                    return Err(RuntimeError::declaration(
                        format!(
                            "class '{}' does not implement interface method '{}.{}'",
                            self.registry.class(id).name,
                            self.registry.interface(*iface).name,
                            method.name
                        ),
                        span,
                    ));
                }
            }
        }
        Ok(())
    }
}
