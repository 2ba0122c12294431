//! `Error` and the standard subtype constructors (spec.md §6.2:
//! `TypeError`/`ReferenceError`/`SyntaxError`/`RangeError`/`URIError`/
//! `EvalError`), each chaining to its own prototype off `Error.prototype`
//! so `instanceof` and `Error.prototype.toString` work uniformly.

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, OType, Object};
use crate::runtime::value::Value;

use super::{define_value, method};

fn make_ctor(interp: &mut Interpreter, kind: ErrorKind, proto: Object) -> Value {
    let name = kind.name();
    let ctor = interp.make_native(name, 1, std::rc::Rc::new(move |interp, _this, args| {
        let message = match args.first() {
            None | Some(Value::Undefined) => String::new(),
            Some(v) => interp.to_display_string(v)?,
        };
        Ok(interp.make_error(kind, message))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());
    define_value(&proto, "name", Value::string(name));
    define_value(&proto, "message", Value::string(""));
    ctor
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.error_proto.clone();

    method(interp, &proto, "toString", 0, std::rc::Rc::new(|interp, this, _args| {
        if !this.is_object() {
            return Ok(Value::string("Error"));
        }
        let name = interp
            .get_property_value(&this, &Key::str("name"))?
            .to_string();
        let message = interp
            .get_property_value(&this, &Key::str("message"))?
            .to_string();
        Ok(Value::string(if message.is_empty() {
            name
        } else {
            format!("{name}: {message}")
        }))
    }));

    let error_ctor = make_ctor(interp, ErrorKind::Error, proto.clone());
    let Value::Object(error_ctor_obj) = &error_ctor else { unreachable!() };
    interp.global.declare_var("Error", error_ctor.clone());

    for kind in [
        ErrorKind::TypeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::RangeError,
        ErrorKind::UriError,
        ErrorKind::EvalError,
    ] {
        let subtype_proto = Object::new(OType::Ordinary, Some(proto.clone()));
        interp.error_subtype_protos.insert(kind, subtype_proto.clone());
        let ctor = make_ctor(interp, kind, subtype_proto);
        let Value::Object(ctor_obj) = &ctor else { unreachable!() };
        ctor_obj.set_prototype(Some(error_ctor_obj.clone()));
        interp.global.declare_var(kind.name(), ctor);
    }
}
