//! Lexical scopes
//!
//! A scope is a shared, mutable name table with an optional parent. Method
//! invocations create an enclosed child of the global scope, bind `Self`,
//! parameters and `Result`, run the body and drop the child again.
//!
//! A binding may be an alias for another name in the same scope. This is how a
//! function's own name refers to `Result` inside its body.

use crate::ident::normalize;
use crate::runtime::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Binding {
    Value(Value),
    Alias(String),
}

#[derive(Debug, Default)]
struct Scope {
    vars: FxHashMap<String, Binding>,
    parent: Option<Environment>,
}

impl Scope {
    /// Follow an alias to its target key within this scope
    fn resolve_key<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        match self.vars.get(key)? {
            Binding::Value(_) => Some(key),
            Binding::Alias(target) => match self.vars.get(target.as_str()) {
                Some(Binding::Value(_)) => Some(target.as_str()),
                _ => None,
            },
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        let key = self.resolve_key(key)?;
        match self.vars.get(key) {
            Some(Binding::Value(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: Value) -> bool {
        let Some(target) = self.resolve_key(key).map(str::to_string) else {
            return false;
        };
        self.vars.insert(target, Binding::Value(value));
        true
    }
}

/// Handle to a scope
#[derive(Debug, Clone, Default)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// Create a root scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child scope of `parent`
    pub fn enclosed(parent: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            vars: FxHashMap::default(),
            parent: Some(parent.clone()),
        })))
    }

    /// Parent scope
    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// Whether both handles point at the same scope
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Define (or redefine) a name in this scope
    pub fn define(&self, name: &str, value: Value) {
        self.0
            .borrow_mut()
            .vars
            .insert(normalize(name), Binding::Value(value));
    }

    /// Make `name` an alias of `target` in this scope
    pub fn define_alias(&self, name: &str, target: &str) {
        self.0
            .borrow_mut()
            .vars
            .insert(normalize(name), Binding::Alias(normalize(target)));
    }

    /// Look a name up through the scope chain
    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_until(name, None)
    }

    /// Look a name up, stopping before `stop` (which is not searched)
    pub fn get_until(&self, name: &str, stop: Option<&Environment>) -> Option<Value> {
        let key = normalize(name);
        let mut current = Some(self.clone());
        while let Some(env) = current {
            if stop.is_some_and(|s| s.ptr_eq(&env)) {
                return None;
            }
            if let Some(value) = env.0.borrow().get(&key) {
                return Some(value);
            }
            current = env.parent();
        }
        None
    }

    /// Look a name up in this scope only
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.0.borrow().get(&normalize(name))
    }

    /// Whether this scope itself binds `name`
    pub fn has_local(&self, name: &str) -> bool {
        self.0.borrow().vars.contains_key(&normalize(name))
    }

    /// Assign to an existing binding found through the scope chain
    ///
    /// Returns false when no scope binds the name.
    pub fn set(&self, name: &str, value: Value) -> bool {
        self.set_until(name, value, None)
    }

    /// Assign to an existing binding, not searching `stop` or its ancestors
    pub fn set_until(&self, name: &str, value: Value, stop: Option<&Environment>) -> bool {
        let key = normalize(name);
        let mut current = Some(self.clone());
        while let Some(env) = current {
            if stop.is_some_and(|s| s.ptr_eq(&env)) {
                return false;
            }
            if env.0.borrow_mut().set(&key, value.clone()) {
                return true;
            }
            current = env.parent();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get_case_insensitive() {
        let env = Environment::new();
        env.define("Count", Value::Integer(3));
        assert_eq!(env.get("COUNT"), Some(Value::Integer(3)));
        assert_eq!(env.get("missing"), None);
    }

    #[test]
    fn test_child_sees_parent_and_shadows() {
        let parent = Environment::new();
        parent.define("x", Value::Integer(1));
        let child = Environment::enclosed(&parent);
        assert_eq!(child.get("x"), Some(Value::Integer(1)));

        child.define("x", Value::Integer(2));
        assert_eq!(child.get("x"), Some(Value::Integer(2)));
        assert_eq!(parent.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_set_updates_defining_scope() {
        let parent = Environment::new();
        parent.define("x", Value::Integer(1));
        let child = Environment::enclosed(&parent);
        assert!(child.set("x", Value::Integer(5)));
        assert_eq!(parent.get("x"), Some(Value::Integer(5)));
        assert!(!child.set("y", Value::Integer(5)));
    }

    #[test]
    fn test_alias_reads_and_writes_target() {
        let env = Environment::new();
        env.define("Result", Value::Integer(0));
        env.define_alias("GetValue", "Result");

        assert!(env.set("GetValue", Value::Integer(7)));
        assert_eq!(env.get_local("Result"), Some(Value::Integer(7)));

        env.set("Result", Value::Integer(9));
        assert_eq!(env.get("getvalue"), Some(Value::Integer(9)));
    }

    #[test]
    fn test_get_until_skips_stop_scope() {
        let globals = Environment::new();
        globals.define("x", Value::Integer(1));
        let local = Environment::enclosed(&globals);
        assert_eq!(local.get_until("x", Some(&globals)), None);
        local.define("x", Value::Integer(2));
        assert_eq!(local.get_until("x", Some(&globals)), Some(Value::Integer(2)));
        assert!(!local.set_until("y", Value::Nil, Some(&globals)));
    }
}
