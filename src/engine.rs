//! The embedding driver (spec.md §6.1): construct an [`Engine`], feed it
//! source text, get a [`Value`] back or a thrown one.
//!
//! `Engine` owns the [`Interpreter`] and is the only thing callers outside
//! this crate need to touch; `runtime::builtins` populates the
//! interpreter's prototypes and global bindings once, at construction.

use crate::error::EngineError;
use crate::frontend::ast::Program;
use crate::frontend::parser::Parser;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::Key;
use crate::runtime::value::Value;

/// A ready-to-use JavaScript engine: prototypes built, globals installed.
pub struct Engine {
    interpreter: Interpreter,
}

impl Engine {
    /// Build a fresh engine with the full built-in surface installed
    /// (spec.md §6.2).
    pub fn new() -> Self {
        let mut interpreter = Interpreter::new();
        crate::runtime::builtins::install(&mut interpreter);
        Self { interpreter }
    }

    /// Parse and evaluate `source` against this engine's global scope.
    /// Bindings created by one `eval` call are visible to the next, the
    /// same way a REPL or `<script>` tag accumulates global state.
    pub fn eval(&mut self, source: &str) -> Result<Value, EngineError> {
        tracing::debug!(bytes = source.len(), "evaluating script");
        let program = self.parse(source)?;
        self.interpreter.eval_program(&program).map_err(|thrown| {
            let message = self.describe_thrown(&thrown);
            tracing::warn!(%message, "script threw an uncaught value");
            EngineError::Uncaught(message)
        })
    }

    /// Parse without evaluating, for callers that want to inspect the AST
    /// (the conformance runner's `--dump-ast`-shaped needs, the CLI's
    /// `ast` subcommand).
    pub fn parse(&self, source: &str) -> Result<Program, EngineError> {
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        if let Some(first) = parser.errors().first() {
            return Err(EngineError::Parse(format!(
                "{}:{}: {}",
                first.line, first.column, first.message
            )));
        }
        Ok(program)
    }

    /// `engine.RegisterNative(name, func)` (spec.md §6.1): expose a Rust
    /// closure as a global function, the same mechanism host embedders use
    /// to add capabilities the built-in surface doesn't cover.
    pub fn register_native(
        &mut self,
        name: &str,
        length: usize,
        f: crate::runtime::object::NativeFn,
    ) {
        let func = self.interpreter.make_native(name, length, f);
        self.interpreter.global.declare_var(name, func);
    }

    /// Direct access to the underlying interpreter, for callers (the
    /// conformance runner) that need to reach into prototypes or install
    /// harness-specific globals like test262's `$DONE`.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Best-effort `Error: message` rendering of a thrown value for
    /// display at the CLI boundary (SPEC_FULL.md §7 "Host-boundary
    /// conversion").
    fn describe_thrown(&mut self, value: &Value) -> String {
        if let Value::Object(o) = value {
            let name = o
                .get_property(&Key::str("name"))
                .and_then(|p| p.get_value())
                .map(|v| v.to_string());
            let message = o
                .get_property(&Key::str("message"))
                .and_then(|p| p.get_value())
                .map(|v| v.to_string());
            if let (Some(name), Some(message)) = (name, message) {
                return if message.is_empty() {
                    name
                } else {
                    format!("{name}: {message}")
                };
            }
        }
        value.to_string()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
