//! Declaration builder
//!
//! One entry point per declaration kind. Each returns `Value::Nil` (or the
//! new handle) on success and a declaration error otherwise.

mod class;
mod helper;
mod interface;
mod operator;
mod record;

use super::{Context, Interpreter};
use crate::ast::{
    ArrayTypeDecl, EnumDecl, Expr, FunctionDecl, PropertyDecl, Span, SubrangeDecl, TypeAliasDecl,
    TypeExpr,
};
use crate::ident::normalize;
use crate::registry::{MethodOwner, MethodRef, PropertyAccess, PropertyInfo};
use crate::runtime::{
    ClassId, EnumId, EnumValue, EvalResult, HelperId, RecordId, RuntimeError, SubrangeType, Type,
    Value,
};
use std::rc::Rc;

/// Type that owns a property being declared
#[derive(Debug, Clone, Copy)]
pub(crate) enum PropertyOwner {
    Class(ClassId),
    Record(RecordId),
    Helper(HelperId),
    Interface,
}

impl Interpreter {
    // ========================================================================
    // Functions
    // ========================================================================

    /// Declare a global function or attach an out-of-line method body
    ///
    /// A bodied declaration replaces a body-less forward declaration with the
    /// same parameter signature; otherwise it is added as a new overload.
    pub fn declare_function(&mut self, decl: &FunctionDecl) -> EvalResult<Value> {
        if let Some(owner) = &decl.owner {
            return self.declare_method_implementation(owner, decl);
        }
        let key = normalize(&decl.name);
        let list = self.functions.entry(key).or_default();
        let replace = list
            .iter()
            .position(|f| !f.has_body() && f.params_match(decl));
        match replace {
            Some(index) if decl.has_body() => list[index] = Rc::new(decl.clone()),
            _ => list.push(Rc::new(decl.clone())),
        }
        tracing::trace!(function = %decl.name, "declared function");
        Ok(Value::Nil)
    }

    fn declare_method_implementation(&mut self, owner: &str, decl: &FunctionDecl) -> EvalResult<Value> {
        if let Some(class) = self.registry.find_class(owner) {
            self.register_method_implementation(class, decl)?;
            return Ok(Value::Nil);
        }
        if let Some(record) = self.registry.find_record(owner) {
            self.register_record_implementation(record, decl)?;
            return Ok(Value::Nil);
        }
        if let Some(helper) = self.registry.find_helper(owner) {
            self.register_helper_implementation(helper, decl)?;
            return Ok(Value::Nil);
        }
        Err(RuntimeError::declaration(
            format!(
                "type '{}' not found for method implementation '{}.{}'",
                owner, owner, decl.name
            ),
            decl.span,
        ))
    }

    // ========================================================================
    // Enums, arrays, subranges, aliases
    // ========================================================================

    /// Declare an enumeration; members become global constants
    pub fn declare_enum(&mut self, decl: &EnumDecl) -> EvalResult<EnumId> {
        if self.registry.has_type(&decl.name) {
            return Err(RuntimeError::declaration(
                format!("type '{}' already declared", decl.name),
                decl.span,
            ));
        }
        let mut next = 0i64;
        let mut members = Vec::with_capacity(decl.members.len());
        for member in &decl.members {
            let ordinal = member.value.unwrap_or(next);
            members.push((member.name.clone(), ordinal));
            next = ordinal + 1;
        }
        let id = self.registry.add_enum(&decl.name, members.clone());
        for (name, ordinal) in members {
            self.globals.define(
                &name,
                Value::Enum(EnumValue {
                    enum_id: id,
                    ordinal,
                }),
            );
        }
        tracing::debug!(name = %decl.name, members = decl.members.len(), "declared enum");
        Ok(id)
    }

    /// Declare a named array type
    pub fn declare_array_type(&mut self, decl: &ArrayTypeDecl) -> EvalResult<Value> {
        match self.resolve_type_expr(&decl.ty, decl.span)? {
            Type::Array(array) => self.registry.add_array_type(&decl.name, array),
            other => self.registry.add_alias(&decl.name, other),
        }
        tracing::debug!(name = %decl.name, "declared array type");
        Ok(Value::Nil)
    }

    /// Declare an integer subrange type
    pub fn declare_subrange(&mut self, decl: &SubrangeDecl) -> EvalResult<Value> {
        if decl.low > decl.high {
            return Err(RuntimeError::declaration(
                format!(
                    "subrange '{}' has lower bound {} above upper bound {}",
                    decl.name, decl.low, decl.high
                ),
                decl.span,
            ));
        }
        self.registry.add_subrange(SubrangeType {
            name: decl.name.clone(),
            low: decl.low,
            high: decl.high,
        });
        tracing::debug!(name = %decl.name, low = decl.low, high = decl.high, "declared subrange");
        Ok(Value::Nil)
    }

    /// Declare a type alias
    pub fn declare_type_alias(&mut self, decl: &TypeAliasDecl) -> EvalResult<Value> {
        let target = self.resolve_type_expr(&decl.target, decl.span)?;
        self.registry.add_alias(&decl.name, target);
        tracing::debug!(name = %decl.name, target = %decl.target, "declared type alias");
        Ok(Value::Nil)
    }

    // ========================================================================
    // Shared member processing
    // ========================================================================

    /// Resolve a field's type from its annotation or its initializer's value
    pub(crate) fn field_type(
        &mut self,
        name: &str,
        ty: Option<&TypeExpr>,
        init: Option<&Expr>,
        context: Context,
        span: Span,
    ) -> EvalResult<Type> {
        match (ty, init) {
            (Some(ty), _) => self.registry.resolve_type(ty).ok_or_else(|| {
                RuntimeError::declaration(
                    format!("unknown or invalid type for field '{}'", name),
                    span,
                )
            }),
            (None, Some(init)) => {
                let value = self.eval_isolated(context, init)?;
                Ok(self.type_of_value(&value))
            }
            (None, None) => Err(RuntimeError::declaration(
                format!("field '{}' has no type annotation or initializer", name),
                span,
            )),
        }
    }

    /// Build a property descriptor
    ///
    /// Identifiers that already name a method of the owner become `Method`
    /// accessors; other identifiers stay `Field` and are classified on access.
    pub(crate) fn build_property(&mut self, owner: PropertyOwner, decl: &PropertyDecl) -> EvalResult<PropertyInfo> {
        let ty = self.registry.resolve_type(&decl.ty).ok_or_else(|| {
            RuntimeError::declaration(
                format!("unknown type '{}' for property '{}'", decl.ty, decl.name),
                decl.span,
            )
        })?;
        let indexed = !decl.index_params.is_empty();

        let read = match &decl.read {
            None => PropertyAccess::None,
            Some(Expr::Ident(name, _)) => self.classify_accessor(owner, name, indexed),
            Some(expr) if indexed => {
                return Err(RuntimeError::declaration(
                    format!(
                        "indexed property '{}' cannot use an expression getter",
                        decl.name
                    ),
                    expr.span(),
                ))
            }
            Some(expr) => PropertyAccess::Expression(Rc::new(expr.clone())),
        };
        let write = match &decl.write {
            None => PropertyAccess::None,
            Some(Expr::Ident(name, _)) => self.classify_accessor(owner, name, indexed),
            Some(expr) => {
                return Err(RuntimeError::declaration(
                    format!(
                        "write specifier of property '{}' must name a field or method",
                        decl.name
                    ),
                    expr.span(),
                ))
            }
        };
        let index_value = match &decl.index_value {
            Some(expr) => Some(self.eval_isolated(Context::default(), expr)?),
            None => None,
        };

        Ok(PropertyInfo {
            name: decl.name.clone(),
            ty,
            read,
            write,
            index_param_count: decl.index_params.len(),
            is_default: decl.is_default,
            is_class_property: decl.is_class_property,
            index_value,
        })
    }

    fn classify_accessor(&self, owner: PropertyOwner, name: &str, indexed: bool) -> PropertyAccess {
        if indexed {
            return PropertyAccess::Indexed(name.to_string());
        }
        let key = normalize(name);
        let is_method = match owner {
            PropertyOwner::Class(id) => {
                let class = self.registry.class(id);
                class.find_method(&key).is_some() || class.declares_method(&key)
            }
            PropertyOwner::Record(id) => self.registry.record(id).has_method(&key),
            PropertyOwner::Helper(id) => self
                .registry
                .helper_chain(id)
                .into_iter()
                .any(|h| self.registry.helper(h).methods.contains_key(&key)),
            PropertyOwner::Interface => false,
        };
        if is_method {
            PropertyAccess::Method(name.to_string())
        } else {
            PropertyAccess::Field(name.to_string())
        }
    }

    /// Replace the overload with the same signature, or append
    pub(crate) fn upsert_overload(list: &mut Vec<MethodRef>, method: MethodRef) {
        match list.iter_mut().find(|m| m.decl.params_match(&method.decl)) {
            Some(slot) => *slot = method,
            None => list.push(method),
        }
    }

    /// Merge an out-of-line body into its declaration
    ///
    /// The declaration keeps its modifiers and signature; the implementation
    /// contributes the body. An implementation without parameters matches a
    /// lone declaration of that name whatever its parameters.
    pub(crate) fn merge_implementation(
        &self,
        declared: &[MethodRef],
        implementation: &FunctionDecl,
        owner_name: &str,
    ) -> EvalResult<FunctionDecl> {
        let found = declared
            .iter()
            .find(|m| m.decl.params_match(implementation))
            .or_else(|| {
                (implementation.params.is_empty() && declared.len() == 1).then(|| &declared[0])
            })
            .ok_or_else(|| {
                RuntimeError::declaration(
                    format!(
                        "method '{}.{}' is not declared in '{}'",
                        owner_name, implementation.name, owner_name
                    ),
                    implementation.span,
                )
            })?;
        let mut merged = (*found.decl).clone();
        merged.body = implementation.body.clone();
        merged.owner = None;
        merged.span = implementation.span;
        Ok(merged)
    }

    pub(crate) fn method_ref(decl: FunctionDecl, owner: MethodOwner) -> MethodRef {
        MethodRef::new(Rc::new(decl), owner)
    }
}
