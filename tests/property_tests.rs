//! Property-based and generative tests complementing the fixed-input
//! checks in `tests/invariants.rs` and `tests/scenarios.rs`.

use proptest::prelude::*;
use quickcheck_macros::quickcheck;

use corvus::{Engine, Lexer, Parser, Value};

// Property: the lexer never panics, regardless of input bytes.
proptest! {
    #[test]
    fn lexer_never_panics(input in ".*") {
        let _ = Lexer::tokenize(&input);
    }
}

// Property: re-lexing any source twice gives the same token stream — the
// lexer has no hidden mutable state that makes it non-deterministic.
proptest! {
    #[test]
    fn lexer_is_deterministic(input in "[a-zA-Z0-9 \\+\\-\\*/\\(\\)\\{\\}\\[\\];,.=<>!]{0,40}") {
        let first = Lexer::tokenize(&input);
        let second = Lexer::tokenize(&input);
        prop_assert_eq!(first, second);
    }
}

// Property: parsing arbitrary bytes never panics, it only ever produces a
// `Program` (possibly with collected parse errors).
proptest! {
    #[test]
    fn parser_never_panics(input in ".*") {
        let mut parser = Parser::new(&input);
        let _ = parser.parse_program();
    }
}

/// `Number(n).toString()` then `Number(...)` round-trips any finite `i32`
/// through the engine's decimal formatting and `parseFloat`.
#[quickcheck]
fn number_round_trips_through_string_and_parse_float(n: i32) -> bool {
    let src = format!("parseFloat(({n}).toString()) === {n}");
    matches!(Engine::new().eval(&src), Ok(v) if v == Value::Boolean(true))
}

/// Wrapping a string literal in `String(...)` is the identity for any
/// sequence of ASCII letters and digits (no escaping involved).
#[quickcheck]
fn string_wrapper_is_identity_for_plain_text(s: String) -> bool {
    let plain: String = s.chars().filter(char::is_ascii_alphanumeric).collect();
    let src = format!("String({plain:?}) === {plain:?}");
    matches!(Engine::new().eval(&src), Ok(v) if v == Value::Boolean(true))
}
