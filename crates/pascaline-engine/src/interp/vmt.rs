//! Virtual method tables
//!
//! A VMT maps `name|signature` to the most derived entry that has a body.
//! Declarations may arrive before their bodies (interface/implementation
//! split), so registering a body re-links the declaring class and every
//! descendant that still points at the old stub.

use super::Interpreter;
use crate::ast::FunctionDecl;
use crate::ident::normalize;
use crate::registry::{ClassInfo, MethodOwner, MethodRef};
use crate::runtime::{ClassId, EvalResult};
use rustc_hash::FxHashMap;

impl Interpreter {
    /// Rebuild the VMT of one class from its ancestor chain
    pub(crate) fn build_vmt(&mut self, id: ClassId) {
        let mut vmt: FxHashMap<String, MethodRef> = FxHashMap::default();
        for class in self.registry.ancestors(id).into_iter().rev() {
            let info = self.registry.class(class);
            let own = info
                .method_overloads
                .values()
                .chain(info.class_method_overloads.values())
                .flatten();
            for method in own {
                let key = method.vmt_key();
                // A stub never shadows an inherited body
                if vmt.get(&key).is_some_and(|m| m.has_body()) && !method.has_body() {
                    continue;
                }
                vmt.insert(key, method.clone());
            }
        }
        tracing::trace!(
            class = %self.registry.class(id).name,
            entries = vmt.len(),
            "rebuilt vmt"
        );
        self.registry.class_mut(id).vmt = vmt;
    }

    /// Attach an out-of-line body to a declared class method
    ///
    /// The merged entry replaces the stub in the declaring class, then in
    /// every descendant that inherited the stub instead of overriding it.
    pub(crate) fn register_method_implementation(
        &mut self,
        class: ClassId,
        implementation: &FunctionDecl,
    ) -> EvalResult<()> {
        let key = normalize(&implementation.name);
        let info = self.registry.class(class);
        let owner = MethodOwner::Class(class);

        let mut declared: Vec<MethodRef> = Vec::new();
        declared.extend(info.own_overloads(&key, false).iter().cloned());
        declared.extend(info.own_overloads(&key, true).iter().cloned());
        if let Some(list) = info.constructor_overloads.get(&key) {
            declared.extend(list.iter().filter(|c| c.owner == owner).cloned());
        }
        if let Some(dtor) = &info.destructor {
            if dtor.owner == owner && normalize(dtor.name()) == key && !declared.iter().any(|m| m.decl.flags.is_destructor) {
                declared.push(dtor.clone());
            }
        }
        let class_name = info.name.clone();

        let merged = self.merge_implementation(&declared, implementation, &class_name)?;
        let merged = Self::method_ref(merged, owner);

        relink(self.registry.class_mut(class), class, &merged);
        self.build_vmt(class);

        let descendants: Vec<ClassId> = self
            .registry
            .class_ids()
            .filter(|d| self.registry.is_descendant_of(*d, class))
            .collect();
        for descendant in &descendants {
            relink(self.registry.class_mut(*descendant), class, &merged);
            self.build_vmt(*descendant);
        }

        tracing::debug!(
            class = %class_name,
            method = %implementation.name,
            descendants = descendants.len(),
            "registered method implementation"
        );
        Ok(())
    }
}

/// Replace every entry that still refers to `from`'s declaration of `method`
///
/// Entries owned by another class are overrides and stay untouched.
fn relink(info: &mut ClassInfo, from: ClassId, method: &MethodRef) {
    let key = normalize(method.name());
    let stale = |entry: &MethodRef| {
        entry.owner == MethodOwner::Class(from)
            && normalize(entry.name()) == key
            && entry.decl.params_match(&method.decl)
    };
    let replace = |slot: &mut MethodRef| {
        if stale(slot) {
            *slot = method.clone();
        }
    };

    info.methods.values_mut().for_each(replace);
    info.class_methods.values_mut().for_each(replace);
    for list in info
        .method_overloads
        .values_mut()
        .chain(info.class_method_overloads.values_mut())
        .chain(info.constructor_overloads.values_mut())
    {
        list.iter_mut().for_each(replace);
    }
    if let Some(slot) = info.destructor.as_mut() {
        replace(slot);
    }
}
