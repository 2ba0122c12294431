//! The tree-walking interpreter (spec.md §4.3): `Program` + `Environment`
//! in, `Value` or a thrown `Value` out.
//!
//! Split by concern across sibling files the way the dispatch naturally
//! separates: [`statements`] implements `exec_statement`, [`expressions`]
//! implements `eval_expression`, [`functions`] implements the call/
//! construct/bind machinery of spec.md §4.3.4, and [`classes`] implements
//! the `class` desugaring of §4.3.5. All four are `impl Interpreter`
//! blocks over the single struct defined here.

mod classes;
mod expressions;
mod functions;
mod statements;

use std::collections::HashMap;

use crate::error::ErrorKind;
use crate::frontend::ast::Program;
use crate::runtime::environment::Environment;
use crate::runtime::object::{Object, OType};
use crate::runtime::value::{Symbol, Value};

/// The interpreter's non-value control-flow channel (spec.md §4.3.1).
/// Never implemented via host exceptions: loops, `switch`, labeled
/// statements and `try`/`finally` all inspect and re-propagate this value
/// explicitly so `finally` can override it cleanly.
#[derive(Debug, Clone)]
pub enum Signal {
    None,
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Value),
}

impl Signal {
    pub fn is_none(&self) -> bool {
        matches!(self, Signal::None)
    }
}

/// Well-known prototypes and process-wide runtime state. Built by
/// [`crate::engine::Engine`], which populates the prototypes' methods via
/// `runtime::builtins` after constructing this.
pub struct Interpreter {
    pub global: Environment,
    pub object_proto: Object,
    pub function_proto: Object,
    pub array_proto: Object,
    pub string_proto: Object,
    pub number_proto: Object,
    pub boolean_proto: Object,
    pub error_proto: Object,
    pub error_subtype_protos: HashMap<ErrorKind, Object>,
    pub regexp_proto: Object,
    pub map_proto: Object,
    pub set_proto: Object,
    pub weakmap_proto: Object,
    pub weakset_proto: Object,
    pub promise_proto: Object,
    pub date_proto: Object,
    pub symbol_proto: Object,
    pub symbol_iterator: Symbol,
    pub symbol_async_iterator: Symbol,
    /// Tags the global `eval` binding so a direct call to the bare
    /// identifier `eval` can be told apart from any other reference to
    /// the same function (SPEC_FULL.md §9, "Direct vs indirect eval").
    pub eval_marker: Object,
}

impl Interpreter {
    pub fn new() -> Self {
        let object_proto = Object::new(OType::Ordinary, None);
        let function_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let array_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let string_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let number_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let boolean_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let error_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let regexp_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let map_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let set_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let weakmap_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let weakset_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let promise_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let date_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let symbol_proto = Object::new(OType::Ordinary, Some(object_proto.clone()));
        let eval_marker = Object::new(OType::Function, Some(function_proto.clone()));

        Self {
            global: Environment::new_global(),
            object_proto,
            function_proto,
            array_proto,
            string_proto,
            number_proto,
            boolean_proto,
            error_proto,
            error_subtype_protos: HashMap::new(),
            regexp_proto,
            map_proto,
            set_proto,
            weakmap_proto,
            weakset_proto,
            promise_proto,
            date_proto,
            symbol_proto,
            symbol_iterator: Symbol::new(Some("Symbol.iterator".to_string())),
            symbol_async_iterator: Symbol::new(Some("Symbol.asyncIterator".to_string())),
            eval_marker,
        }
    }

    pub fn error_proto_for(&self, kind: ErrorKind) -> Object {
        self.error_subtype_protos
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| self.error_proto.clone())
    }

    /// Construct a proper `Error` object of the given subtype, prototype
    /// chained correctly so `instanceof TypeError` etc. works (spec.md
    /// §7 "Propagation").
    pub fn make_error(&self, kind: ErrorKind, message: impl Into<String>) -> Value {
        let message = message.into();
        let obj = Object::new(OType::Error, Some(self.error_proto_for(kind)));
        obj.set_own(
            crate::runtime::object::Key::str("message"),
            crate::runtime::object::Property::data(Value::string(message.clone()), true, false, true),
        );
        obj.set_own(
            crate::runtime::object::Key::str("name"),
            crate::runtime::object::Property::data(Value::string(kind.name()), true, false, true),
        );
        obj.set_own(
            crate::runtime::object::Key::str("stack"),
            crate::runtime::object::Property::data(
                Value::string(format!("{}: {message}", kind.name())),
                true,
                false,
                true,
            ),
        );
        Value::Object(obj)
    }

    pub fn throw(&self, kind: ErrorKind, message: impl Into<String>) -> Value {
        self.make_error(kind, message)
    }

    /// Host-boundary conversion (spec.md §7): a `"Kind: message"`-prefixed
    /// Rust `Err(String)` from a built-in becomes a properly-typed thrown
    /// Error object.
    pub fn throw_prefixed(&self, message: &str) -> Value {
        let (kind, rest) = ErrorKind::parse_prefixed(message);
        self.make_error(kind, rest)
    }

    /// Evaluate a full program against the global environment (the
    /// `engine.Eval` contract of spec.md §6.1).
    pub fn eval_program(&mut self, program: &Program) -> Result<Value, Value> {
        let env = self.global.clone();
        let hoist = crate::runtime::hoist::hoist(&program.body);
        self.install_hoisted(&env, &hoist)?;
        let mut last = Value::Undefined;
        for stmt in &program.body {
            let (value, signal) = self.exec_statement(stmt, &env);
            if let Some(v) = value {
                last = v;
            }
            match signal {
                Signal::None => {}
                Signal::Throw(v) => return Err(v),
                Signal::Return(v) => return Ok(v),
                Signal::Break(_) | Signal::Continue(_) => {
                    return Err(self.throw(ErrorKind::SyntaxError, "Illegal break/continue statement"));
                }
            }
        }
        Ok(last)
    }

    pub(crate) fn install_hoisted(
        &mut self,
        env: &Environment,
        hoist: &crate::runtime::hoist::HoistResult,
    ) -> Result<(), Value> {
        for name in &hoist.var_names {
            if !env.has_own_binding(name) {
                env.declare_var(name, Value::Undefined);
            }
        }
        for function in &hoist.functions {
            let func_value = self.make_function(function, env, false);
            env.declare(
                function.name.as_deref().unwrap_or(""),
                crate::runtime::environment::BindingKind::Function,
                func_value,
            )
            .map_err(|e| self.make_error(e.kind, e.message))?;
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
