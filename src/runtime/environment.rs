//! Lexical scope chain (spec.md §3.5).
//!
//! `this`, `arguments` and the home object for `super` are kept as
//! dedicated fields rather than ordinary bindings (SPEC_FULL.md §9,
//! "`this` binding") so they can't collide with user identifiers of the
//! same name and so arrow functions can transparently skip them when
//! walking up for `this`/`arguments`/`super` resolution.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::ErrorKind;
use crate::runtime::object::Object;
use crate::runtime::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Param,
}

#[derive(Debug, Clone)]
struct Binding {
    kind: BindingKind,
    value: Value,
    initialized: bool,
}

struct EnvData {
    parent: Option<Environment>,
    is_block: bool,
    bindings: HashMap<String, Binding>,
    this_value: Option<Value>,
    home_object: Option<Object>,
    is_arrow: bool,
}

/// A scope frame. Cheap to clone (shares the underlying frame via `Rc`),
/// which is how closures capture "the environment live at definition
/// time" without copying bindings.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvData>>);

/// Failure modes `Environment` operations can produce; converted to a
/// thrown `Error` object by the interpreter (spec.md §7).
#[derive(Debug, Clone)]
pub struct EnvError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EnvError {
    fn reference(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ReferenceError,
            message: message.into(),
        }
    }

    fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    fn syntax(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::SyntaxError,
            message: message.into(),
        }
    }
}

impl Environment {
    pub fn new_global() -> Self {
        Self(Rc::new(RefCell::new(EnvData {
            parent: None,
            is_block: false,
            bindings: HashMap::new(),
            this_value: Some(Value::Undefined),
            home_object: None,
            is_arrow: false,
        })))
    }

    pub fn child_block(&self) -> Self {
        Self(Rc::new(RefCell::new(EnvData {
            parent: Some(self.clone()),
            is_block: true,
            bindings: HashMap::new(),
            this_value: None,
            home_object: None,
            is_arrow: false,
        })))
    }

    pub fn child_function(&self, this_value: Value, home_object: Option<Object>, is_arrow: bool) -> Self {
        Self(Rc::new(RefCell::new(EnvData {
            parent: Some(self.clone()),
            is_block: false,
            bindings: HashMap::new(),
            this_value: if is_arrow { None } else { Some(this_value) },
            home_object,
            is_arrow,
        })))
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_block(&self) -> bool {
        self.0.borrow().is_block
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// `GetFunctionScope()` (spec.md §3.5): walk up until a non-block frame.
    pub fn function_scope(&self) -> Environment {
        let mut env = self.clone();
        loop {
            if !env.is_block() {
                return env;
            }
            let parent = env.parent();
            match parent {
                Some(p) => env = p,
                None => return env,
            }
        }
    }

    /// Declare a new binding in *this* frame. Redeclaring a lexical
    /// (`let`/`const`/`function`) name in the same frame is a
    /// `SyntaxError` at evaluation time (spec.md §3.5).
    pub fn declare(&self, name: &str, kind: BindingKind, value: Value) -> Result<(), EnvError> {
        let mut data = self.0.borrow_mut();
        if matches!(kind, BindingKind::Let | BindingKind::Const | BindingKind::Function) {
            if let Some(existing) = data.bindings.get(name) {
                let existing_lexical = matches!(
                    existing.kind,
                    BindingKind::Let | BindingKind::Const | BindingKind::Function
                );
                if existing_lexical {
                    return Err(EnvError::syntax(format!(
                        "Identifier '{name}' has already been declared"
                    )));
                }
            }
        }
        // No temporal-dead-zone tracking: bindings are initialized eagerly.
        data.bindings.insert(
            name.to_string(),
            Binding {
                kind,
                value,
                initialized: true,
            },
        );
        Ok(())
    }

    /// `var` bindings install at the nearest function scope, matching
    /// spec.md §3.5; re-declaring an existing `var`/function binding with
    /// another `var` is a no-op overwrite of its kind.
    pub fn declare_var(&self, name: &str, value: Value) {
        let scope = self.function_scope();
        let mut data = scope.0.borrow_mut();
        match data.bindings.get_mut(name) {
            Some(existing) if matches!(existing.kind, BindingKind::Var) => {
                if !matches!(value, Value::Undefined) {
                    existing.value = value;
                }
            }
            Some(existing) => {
                existing.value = value;
            }
            None => {
                data.bindings.insert(
                    name.to_string(),
                    Binding {
                        kind: BindingKind::Var,
                        value,
                        initialized: true,
                    },
                );
            }
        }
    }

    /// Own bindings in this frame as `(name, kind, value)` — used to copy a
    /// `let`/`const` loop variable's current value into a fresh
    /// per-iteration frame (spec.md `CreatePerIterationEnvironment`).
    pub fn own_bindings(&self) -> Vec<(String, BindingKind, Value)> {
        self.0
            .borrow()
            .bindings
            .iter()
            .map(|(name, b)| (name.clone(), b.kind, b.value.clone()))
            .collect()
    }

    pub fn has_own_binding(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// The kind of an existing binding in *this* frame only, used by Annex
    /// B block-function hoisting to avoid clobbering a parameter of the
    /// same name (spec.md §4.4).
    pub fn own_binding_kind(&self, name: &str) -> Option<BindingKind> {
        self.0.borrow().bindings.get(name).map(|b| b.kind)
    }

    pub fn get(&self, name: &str) -> Result<Value, EnvError> {
        if let Some(b) = self.0.borrow().bindings.get(name) {
            return Ok(b.value.clone());
        }
        match self.parent() {
            Some(p) => p.get(name),
            None => Err(EnvError::reference(format!("{name} is not defined"))),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        if self.has_own_binding(name) {
            return true;
        }
        match self.parent() {
            Some(p) => p.has(name),
            None => false,
        }
    }

    pub fn set(&self, name: &str, value: Value) -> Result<(), EnvError> {
        {
            let mut data = self.0.borrow_mut();
            if let Some(b) = data.bindings.get_mut(name) {
                if matches!(b.kind, BindingKind::Const) {
                    return Err(EnvError::type_error(format!(
                        "Assignment to constant variable '{name}'."
                    )));
                }
                b.value = value;
                b.initialized = true;
                return Ok(());
            }
        }
        match self.parent() {
            Some(p) => p.set(name, value),
            None => Err(EnvError::reference(format!("{name} is not defined"))),
        }
    }

    pub fn this(&self) -> Value {
        let data = self.0.borrow();
        if data.is_arrow {
            return self
                .parent()
                .map(|p| p.this())
                .unwrap_or(Value::Undefined);
        }
        if let Some(v) = &data.this_value {
            return v.clone();
        }
        match self.parent() {
            Some(p) => p.this(),
            None => Value::Undefined,
        }
    }

    pub fn home_object(&self) -> Option<Object> {
        let data = self.0.borrow();
        if data.is_arrow {
            return self.parent().and_then(|p| p.home_object());
        }
        if data.home_object.is_some() {
            return data.home_object.clone();
        }
        self.parent().and_then(|p| p.home_object())
    }
}
