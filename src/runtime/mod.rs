//! The shared value/object/environment model and the tree-walking
//! interpreter that evaluates a [`crate::frontend::ast::Program`] against it.

pub mod builtins;
pub mod environment;
pub mod hoist;
pub mod interpreter;
pub mod object;
pub mod value;

pub use environment::Environment;
pub use interpreter::{Interpreter, Signal};
pub use object::{Object, OType, Property};
pub use value::Value;
