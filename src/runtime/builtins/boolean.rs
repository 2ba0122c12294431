//! `Boolean` constructor and `Boolean.prototype` (spec.md §6.2).

use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;

use super::{arg, define_value, method};

fn this_bool(this: &Value) -> bool {
    match this {
        Value::Boolean(b) => *b,
        other => other.to_boolean(),
    }
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.boolean_proto.clone();

    method(interp, &proto, "toString", 0, std::rc::Rc::new(|_interp, this, _args| {
        Ok(Value::string(if this_bool(&this) { "true" } else { "false" }))
    }));
    method(interp, &proto, "valueOf", 0, std::rc::Rc::new(|_interp, this, _args| {
        Ok(Value::Boolean(this_bool(&this)))
    }));

    let ctor = interp.make_native("Boolean", 1, std::rc::Rc::new(|_interp, _this, args| {
        Ok(Value::Boolean(arg(args, 0).to_boolean()))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    interp.global.declare_var("Boolean", ctor);
}
