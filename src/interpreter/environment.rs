// File: src/interpreter/environment.rs
//
// Runtime environments for the Sprig interpreter.
// Each environment holds its own bindings and an optional parent. Function
// calls and executed blocks get a fresh child; lookups walk the parent chain
// outward, so inner bindings shadow outer ones.

use super::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to an environment; closures keep their defining one alive
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    name: String,
    values: AHashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Environment { name: name.into(), values: AHashMap::new(), parent: None }
    }

    pub fn with_parent(name: impl Into<String>, parent: EnvRef) -> Self {
        Environment { name: name.into(), values: AHashMap::new(), parent: Some(parent) }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Diagnostic name, e.g. `root`, `BLOCK`, `FUNC-add`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<EnvRef> {
        self.parent.clone()
    }

    /// True if `name` is bound in this environment itself
    pub fn owns(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Look `name` up here, then in each enclosing environment
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        let mut cursor = self.parent.clone();
        while let Some(env) = cursor {
            let env = env.borrow();
            if let Some(value) = env.values.get(name) {
                return Some(value.clone());
            }
            cursor = env.parent.clone();
        }
        None
    }

    /// Bind `name` in this environment, shadowing any outer binding
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Rebind `name` in the nearest environment that owns it,
    /// or create it here if no environment does
    pub fn set(&mut self, name: &str, value: Value) {
        if self.owns(name) {
            self.values.insert(name.to_string(), value);
            return;
        }
        let mut cursor = self.parent.clone();
        while let Some(env) = cursor {
            if env.borrow().owns(name) {
                env.borrow_mut().define(name, value);
                return;
            }
            cursor = env.borrow().parent.clone();
        }
        self.define(name, value);
    }

    /// Names bound in this environment, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every name visible from here, sorted and deduplicated
    pub fn visible_names(&self) -> Vec<String> {
        let mut names = self.names();
        let mut cursor = self.parent.clone();
        while let Some(env) = cursor {
            names.extend(env.borrow().values.keys().cloned());
            cursor = env.borrow().parent.clone();
        }
        names.sort();
        names.dedup();
        names
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_sees_and_shadows_parent() {
        let root = Environment::new("root").into_ref();
        root.borrow_mut().define("x", Value::Int(1));

        let mut child = Environment::with_parent("BLOCK", root.clone());
        assert_eq!(child.get("x"), Some(Value::Int(1)));

        child.define("x", Value::Int(2));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(root.borrow().get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn test_set_rebinds_nearest_owner() {
        let root = Environment::new("root").into_ref();
        root.borrow_mut().define("count", Value::Int(0));

        let block = Environment::with_parent("BLOCK", root.clone()).into_ref();
        let mut inner = Environment::with_parent("BLOCK", block.clone());
        inner.set("count", Value::Int(5));

        assert!(!inner.owns("count"));
        assert!(!block.borrow().owns("count"));
        assert_eq!(root.borrow().get("count"), Some(Value::Int(5)));
    }

    #[test]
    fn test_set_defines_locally_when_unbound() {
        let root = Environment::new("root").into_ref();
        let mut child = Environment::with_parent("FUNC-f", root.clone());
        child.set("fresh", Value::Bool(true));

        assert!(child.owns("fresh"));
        assert_eq!(root.borrow().get("fresh"), None);
    }

    #[test]
    fn test_visible_names_spans_the_chain() {
        let root = Environment::new("root").into_ref();
        root.borrow_mut().define("b", Value::Int(1));
        let mut child = Environment::with_parent("BLOCK", root);
        child.define("a", Value::Int(2));
        child.define("b", Value::Int(3));

        assert_eq!(child.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(child.visible_names(), vec!["a".to_string(), "b".to_string()]);
    }
}
