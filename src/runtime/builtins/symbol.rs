//! `Symbol` constructor/statics and `Symbol.prototype` (spec.md §6.2).
//! `Symbol` itself is not constructible with `new` (mirrors `BigInt`'s
//! callable-only shape, not `Object`'s).

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::{symbol_for, symbol_key_for, Symbol, Value};

use super::{arg, define_value, method};

fn this_symbol(interp: &mut Interpreter, this: &Value) -> Result<Symbol, Value> {
    match this {
        Value::Symbol(s) => Ok(s.clone()),
        _ => Err(interp.throw(ErrorKind::TypeError, "Symbol.prototype method called on incompatible receiver")),
    }
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.symbol_proto.clone();

    method(interp, &proto, "toString", 0, std::rc::Rc::new(|interp, this, _args| {
        let s = this_symbol(interp, &this)?;
        Ok(Value::string(format!("Symbol({})", s.0.description.as_deref().unwrap_or(""))))
    }));
    method(interp, &proto, "valueOf", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::Symbol(this_symbol(interp, &this)?))
    }));

    let ctor = interp.make_native("Symbol", 0, std::rc::Rc::new(|interp, _this, args| {
        let desc = match args.first() {
            None | Some(Value::Undefined) => None,
            Some(v) => Some(interp.to_display_string(v)?),
        };
        Ok(Value::Symbol(Symbol::new(desc)))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    define_value(ctor_obj, "iterator", Value::Symbol(interp.symbol_iterator.clone()));
    define_value(ctor_obj, "asyncIterator", Value::Symbol(interp.symbol_async_iterator.clone()));

    method(interp, ctor_obj, "for", 1, std::rc::Rc::new(|interp, _this, args| {
        let key = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::Symbol(symbol_for(&key)))
    }));
    method(interp, ctor_obj, "keyFor", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Symbol(sym) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "not a symbol"));
        };
        Ok(symbol_key_for(&sym).map_or(Value::Undefined, Value::string))
    }));

    interp.global.declare_var("Symbol", ctor);
}
