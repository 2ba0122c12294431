//! Crate-level error types.
//!
//! Two channels exist, deliberately kept apart (see SPEC_FULL.md §7):
//!
//! - [`EngineError`] is a conventional Rust error for failures outside the
//!   JS exception model (bad CLI invocation, unreadable source, an
//!   internal invariant violation). It is the `Err` arm of
//!   [`crate::Engine::eval`]'s outer `Result`.
//! - JS-visible exceptions never become an `EngineError`; they travel as
//!   `Signal::Throw(Value)` (see [`crate::runtime::interpreter::Signal`])
//!   and are only converted to a displayable form at the CLI boundary.

use thiserror::Error;

/// The standard ECMA-262 error subtypes a built-in or the interpreter can
/// throw. Used both to pick an Error object's prototype and to parse the
/// `"Kind: message"` prefix convention host-implemented built-ins use to
/// signal which subtype they intend (SPEC_FULL.md §7, "Host-boundary
/// conversion").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Generic `Error`.
    Error,
    TypeError,
    ReferenceError,
    SyntaxError,
    RangeError,
    UriError,
    EvalError,
}

impl ErrorKind {
    /// The constructor/prototype name this kind corresponds to.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::UriError => "URIError",
            ErrorKind::EvalError => "EvalError",
        }
    }

    /// Recover a kind from a `"Kind: message"` prefix, defaulting to
    /// generic `Error` if no recognized prefix is present.
    pub fn parse_prefixed(message: &str) -> (ErrorKind, &str) {
        let kinds = [
            ErrorKind::TypeError,
            ErrorKind::ReferenceError,
            ErrorKind::SyntaxError,
            ErrorKind::RangeError,
            ErrorKind::UriError,
            ErrorKind::EvalError,
        ];
        for kind in kinds {
            let prefix = format!("{}: ", kind.name());
            if let Some(rest) = message.strip_prefix(&prefix) {
                return (kind, rest);
            }
        }
        (ErrorKind::Error, message)
    }
}

/// Rust-level failures that are not part of the JS exception model.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not read source file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("uncaught exception: {0}")]
    Uncaught(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}
