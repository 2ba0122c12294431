//! Snapshot tests for `JSON.stringify`'s insertion-ordered output. Inline
//! snapshots (`@"..."`) rather than on-disk `.snap` baselines, since a
//! baseline can't be generated or reviewed without running the toolchain.

use insta::assert_snapshot;

use corvus::{Engine, Value};

fn stringify(src: &str) -> String {
    match Engine::new().eval(src).expect("script should not throw") {
        Value::String(s) => s.to_string(),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn stringify_preserves_insertion_order_over_alphabetical() {
    let out = stringify(r#"JSON.stringify({b: 2, a: [1, 2], c: null})"#);
    assert_snapshot!(out, @r#"{"b":2,"a":[1,2],"c":null}"#);
}

#[test]
fn stringify_nested_array_of_objects() {
    let out = stringify(r#"JSON.stringify([{x: true}, {y: false}])"#);
    assert_snapshot!(out, @r#"[{"x":true},{"y":false}]"#);
}
