// ABOUTME: Lexically nested environments; the root additionally owns the
// module registry and the module-loading stack used for cycle detection

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::lexer::SourcePos;
use crate::values::Value;

pub type EnvRef = Rc<Environment>;

pub struct Environment {
    map: RefCell<HashMap<String, Value>>,
    parent: Option<EnvRef>,
    modules: RefCell<HashMap<String, EnvRef>>,
    module_stack: RefCell<Vec<String>>,
}

impl Environment {
    pub fn new() -> EnvRef {
        Rc::new(Environment {
            map: RefCell::new(HashMap::new()),
            parent: None,
            modules: RefCell::new(HashMap::new()),
            module_stack: RefCell::new(Vec::new()),
        })
    }

    /// Create a child scope of the given environment.
    pub fn with_parent(parent: &EnvRef) -> EnvRef {
        Rc::new(Environment {
            map: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
            modules: RefCell::new(HashMap::new()),
            module_stack: RefCell::new(Vec::new()),
        })
    }

    /// The root of the parent chain, owner of the module registry.
    pub fn base_of(env: &EnvRef) -> EnvRef {
        let mut current = env.clone();
        loop {
            let parent = match &current.parent {
                Some(parent) => parent.clone(),
                None => break,
            };
            current = parent;
        }
        current
    }

    /// Define or overwrite a binding in this scope.
    pub fn put(&self, name: &str, value: Value) {
        self.map.borrow_mut().insert(name.to_string(), value);
    }

    /// Update the nearest existing binding in the chain.
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.map.borrow().contains_key(name) {
            self.map.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.set(name, value),
            None => Err(RuntimeError::without_pos(format!(
                "{} is not defined",
                name
            ))),
        }
    }

    pub fn remove(&self, name: &str) {
        self.map.borrow_mut().remove(name);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        if self.map.borrow().contains_key(name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_defined(name),
            None => false,
        }
    }

    pub fn get(&self, name: &str, pos: &SourcePos) -> Result<Value, RuntimeError> {
        if let Some(value) = self.map.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name, pos),
            None => Err(RuntimeError::new(
                format!("Symbol '{}' not defined", name),
                pos,
            )),
        }
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.map.borrow().get(name).cloned()
    }

    pub fn local_symbols(&self) -> Vec<String> {
        self.map.borrow().keys().cloned().collect()
    }

    /// All visible symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut result = BTreeSet::new();
        self.collect_symbols(&mut result);
        result.into_iter().collect()
    }

    fn collect_symbols(&self, result: &mut BTreeSet<String>) {
        if let Some(parent) = &self.parent {
            parent.collect_symbols(result);
        }
        for name in self.map.borrow().keys() {
            result.insert(name.clone());
        }
    }

    // ------------------------------------------------------------------
    // Module registry (lives on the root environment)
    // ------------------------------------------------------------------

    pub fn lookup_module(env: &EnvRef, identifier: &str) -> Option<EnvRef> {
        Environment::base_of(env).modules.borrow().get(identifier).cloned()
    }

    pub fn store_module(env: &EnvRef, identifier: &str, module_env: EnvRef) {
        Environment::base_of(env)
            .modules
            .borrow_mut()
            .insert(identifier.to_string(), module_env);
    }

    pub fn push_module_stack(
        env: &EnvRef,
        identifier: &str,
        pos: &SourcePos,
    ) -> Result<(), RuntimeError> {
        let base = Environment::base_of(env);
        let mut stack = base.module_stack.borrow_mut();
        if stack.iter().any(|entry| entry == identifier) {
            return Err(RuntimeError::new(
                format!("Found circular module dependency ({})", identifier),
                pos,
            ));
        }
        stack.push(identifier.to_string());
        Ok(())
    }

    pub fn pop_module_stack(env: &EnvRef) {
        Environment::base_of(env).module_stack.borrow_mut().pop();
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<environment {} symbols>", self.map.borrow().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let env = Environment::new();
        env.put("x", Value::int(42));
        assert_eq!(env.get("x", &SourcePos::unknown()).unwrap(), Value::int(42));
    }

    #[test]
    fn test_undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("missing", &SourcePos::unknown()).is_err());
        assert!(!env.is_defined("missing"));
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.put("x", Value::int(1));
        let child = Environment::with_parent(&parent);
        child.put("x", Value::int(2));
        assert_eq!(child.get("x", &SourcePos::unknown()).unwrap(), Value::int(2));
        assert_eq!(
            parent.get("x", &SourcePos::unknown()).unwrap(),
            Value::int(1)
        );
    }

    #[test]
    fn test_set_walks_parent_chain() {
        let parent = Environment::new();
        parent.put("x", Value::int(1));
        let child = Environment::with_parent(&parent);
        child.set("x", Value::int(5)).unwrap();
        assert_eq!(
            parent.get("x", &SourcePos::unknown()).unwrap(),
            Value::int(5)
        );
        assert!(child.set("y", Value::int(1)).is_err());
    }

    #[test]
    fn test_base_resolves_root() {
        let root = Environment::new();
        let child = Environment::with_parent(&Environment::with_parent(&root));
        assert!(Rc::ptr_eq(&Environment::base_of(&child), &root));
    }

    #[test]
    fn test_module_stack_detects_cycles() {
        let root = Environment::new();
        let child = Environment::with_parent(&root);
        Environment::push_module_stack(&child, "m", &SourcePos::unknown()).unwrap();
        assert!(Environment::push_module_stack(&child, "m", &SourcePos::unknown()).is_err());
        Environment::pop_module_stack(&child);
        assert!(Environment::push_module_stack(&child, "m", &SourcePos::unknown()).is_ok());
    }
}
