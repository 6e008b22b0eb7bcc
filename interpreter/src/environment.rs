use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime_value::RuntimeValue;

/// A single scope level: a block, a function body, or the global scope.
struct Scope {
    variables: HashMap<String, RuntimeValue>,
    parent: Option<Environment>,
    /// `var` declarations land in the nearest scope with this set.
    function_boundary: bool,
}

/// A handle to a scope and, through its parents, everything visible from it.
///
/// Cloning the handle shares the scope; closures keep their defining
/// environment alive this way.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// A fresh, empty global scope.
    pub fn global() -> Self {
        Environment::with_parent(None, true)
    }

    fn with_parent(parent: Option<Environment>, function_boundary: bool) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            variables: HashMap::new(),
            parent,
            function_boundary,
        })))
    }

    /// A nested block scope (`let`/`const` live here).
    pub fn child(&self) -> Self {
        Environment::with_parent(Some(self.clone()), false)
    }

    /// A nested function scope (`var`, parameters and `arguments` live here).
    pub fn function_scope(&self) -> Self {
        Environment::with_parent(Some(self.clone()), true)
    }

    /// Declare (or redeclare) a variable in this scope.
    pub fn declare(&self, name: &str, value: RuntimeValue) {
        self.0.borrow_mut().variables.insert(name.to_string(), value);
    }

    /// `var` semantics: declare in the nearest function scope. Without a value an
    /// existing binding is left alone.
    pub fn declare_var(&self, name: &str, value: Option<RuntimeValue>) {
        let target = self.nearest_function_scope();
        let mut scope = target.0.borrow_mut();
        match value {
            Some(value) => {
                scope.variables.insert(name.to_string(), value);
            }
            None => {
                scope
                    .variables
                    .entry(name.to_string())
                    .or_insert(RuntimeValue::Undefined);
            }
        }
    }

    fn nearest_function_scope(&self) -> Environment {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.0.borrow();
                if scope.function_boundary {
                    return current.clone();
                }
                scope.parent.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Look up a variable, searching from innermost scope outward.
    pub fn get(&self, name: &str) -> Option<RuntimeValue> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.0.borrow();
                if let Some(value) = scope.variables.get(name) {
                    return Some(value.clone());
                }
                scope.parent.clone()
            };
            current = parent?;
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Assign to the innermost binding of `name`; an undeclared name becomes a
    /// global.
    pub fn assign(&self, name: &str, value: RuntimeValue) {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut scope = current.0.borrow_mut();
                if let Some(slot) = scope.variables.get_mut(name) {
                    *slot = value;
                    return;
                }
                match scope.parent.clone() {
                    Some(parent) => parent,
                    None => {
                        scope.variables.insert(name.to_string(), value);
                        return;
                    }
                }
            };
            current = parent;
        }
    }

    /// Names declared directly in this scope, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().variables.keys().cloned().collect();
        names.sort();
        names
    }
}
