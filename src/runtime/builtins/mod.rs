//! The built-in object surface (spec.md §6.2): one module per concern,
//! mirroring the teacher's `math_builtins`/`system_builtins`/
//! `utility_builtins`/`input_builtins` split. Each module exposes an
//! `install(interp: &mut Interpreter)` that wires its methods onto the
//! relevant prototype and/or declares its constructor in global scope;
//! [`install`] below just calls all of them in dependency order (`Object`
//! and `Function` first, since every other prototype chains to
//! `object_proto` and every constructor is itself a function).

mod array;
mod boolean;
mod collections;
mod console;
mod date;
mod error;
mod function;
mod globals;
mod json;
mod math;
mod number;
mod object;
mod promise;
mod regexp;
mod string;
mod symbol;

use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, NativeFn, Object, Property};
use crate::runtime::value::Value;

/// Populate every prototype and global binding a fresh [`crate::Engine`]
/// needs (spec.md §6.2).
pub fn install(interp: &mut Interpreter) {
    object::install(interp);
    function::install(interp);
    array::install(interp);
    string::install(interp);
    number::install(interp);
    boolean::install(interp);
    symbol::install(interp);
    error::install(interp);
    regexp::install(interp);
    collections::install(interp);
    promise::install(interp);
    math::install(interp);
    json::install(interp);
    date::install(interp);
    console::install(interp);
    globals::install(interp);
}

/// Define a non-enumerable, writable, configurable data property — the
/// shape of every built-in method and most built-in constants.
pub(crate) fn define_value(target: &Object, name: &str, value: Value) {
    target.set_own(Key::str(name), Property::data(value, true, false, true));
}

/// Define a method built via `interp.make_native`, installed non-enumerable
/// per spec.md §6.2.
pub(crate) fn method(interp: &mut Interpreter, target: &Object, name: &str, length: usize, f: NativeFn) {
    let func = interp.make_native(name, length, f);
    define_value(target, name, func);
}

/// A read-only constant (e.g. `Math.PI`, `Number.EPSILON`): non-writable,
/// non-enumerable, non-configurable.
pub(crate) fn define_const(target: &Object, name: &str, value: Value) {
    target.set_own(Key::str(name), Property::data(value, false, false, false));
}

/// Extract the nth argument or `Value::Undefined`.
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

/// Build a one-shot `{ next(): {value, done} }` iterator over a snapshot
/// of `items`, also wearing `Symbol.iterator` so `for-of`/spread can drive
/// it directly (spec.md §6.2's `keys`/`values`/`entries` family across
/// Array, Map and Set all bottom out here).
pub(crate) fn make_list_iterator(interp: &mut Interpreter, items: Vec<Value>) -> Value {
    let index = std::cell::Cell::new(0usize);
    let items = std::rc::Rc::new(items);
    let obj = Object::new(crate::runtime::object::OType::Iterator, Some(interp.object_proto.clone()));

    let next = interp.make_native("next", 0, std::rc::Rc::new(move |interp, _this, _args| {
        let result = Object::new(crate::runtime::object::OType::Ordinary, Some(interp.object_proto.clone()));
        let i = index.get();
        if i < items.len() {
            index.set(i + 1);
            define_value(&result, "value", items[i].clone());
            define_value(&result, "done", Value::Boolean(false));
        } else {
            define_value(&result, "value", Value::Undefined);
            define_value(&result, "done", Value::Boolean(true));
        }
        Ok(Value::Object(result))
    }));
    define_value(&obj, "next", next);

    let self_obj = obj.clone();
    let iter_fn = interp.make_native("[Symbol.iterator]", 0, std::rc::Rc::new(move |_interp, _this, _args| {
        Ok(Value::Object(self_obj.clone()))
    }));
    obj.set_own(
        Key::Symbol(interp.symbol_iterator.clone()),
        Property::data(iter_fn, true, false, true),
    );
    Value::Object(obj)
}
