//! The eight end-to-end scenarios from spec.md §8, each run against a
//! fresh [`Engine`] and checked against its expected observable value.

use corvus::{Engine, Value};

fn eval(src: &str) -> Value {
    Engine::new().eval(src).unwrap_or_else(|e| panic!("{src}\n  threw: {e}"))
}

#[test]
fn e1_var_hoisting_in_for_loop() {
    assert_eq!(eval("var x = 0; for (var i=0;i<5;i++) x += i; x"), Value::Number(10.0));
}

#[test]
fn e2_default_parameters() {
    let result = eval("function f(a,b=a*2){return b} JSON.stringify([f(3), f(3,1)])");
    assert_eq!(result, Value::string("[6,1]"));
}

#[test]
fn e3_super_method_call() {
    let src = "class A{f(){return 1}} class B extends A{f(){return super.f()+2}} new B().f()";
    assert_eq!(eval(src), Value::Number(3.0));
}

#[test]
fn e4_let_loop_captures_per_iteration_binding() {
    let src = "var xs=[]; for (let i=0;i<3;i++) xs.push(()=>i); JSON.stringify(xs.map(f=>f()))";
    assert_eq!(eval(src), Value::string("[0,1,2]"));
}

#[test]
fn e5_catch_binds_thrown_error() {
    let src = r#"try{throw new TypeError("x")}catch(e){e instanceof TypeError && e.message}"#;
    assert_eq!(eval(src), Value::string("x"));
}

#[test]
fn e6_stringify_drops_undefined_and_functions_preserves_insertion_order() {
    // Property enumeration order for string keys is insertion order
    // (ECMA-262 OrdinaryOwnPropertyKeys), so `b` precedes `a` here.
    let src = "JSON.stringify({b:2,a:1,c:undefined,d:function(){}})";
    assert_eq!(eval(src), Value::string(r#"{"b":2,"a":1}"#));
}

#[test]
fn e7_map_uses_samevaluezero_for_nan_keys() {
    let src = "let m=new Map(); m.set(NaN,1); m.get(NaN)";
    assert_eq!(eval(src), Value::Number(1.0));
}

#[test]
fn e8_split_empty_reverse_join() {
    assert_eq!(eval(r#""hello".split("").reverse().join("")"#), Value::string("olleh"));
}
