//! `Function.prototype` (`call`/`apply`/`bind`/`toString`). Not named as
//! its own bullet in spec.md §6.2, but every other built-in method call
//! goes through it, matching how thoroughly the teacher's dispatch tables
//! lean on a handful of shared primitives.

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;

use super::{arg, method};

pub fn install(interp: &mut Interpreter) {
    let proto = interp.function_proto.clone();

    method(interp, &proto, "call", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(f) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "Function.prototype.call called on non-function"));
        };
        let call_this = arg(args, 0);
        let rest = if args.is_empty() { &[][..] } else { &args[1..] };
        interp.call_function(f, call_this, rest)
    }));
    method(interp, &proto, "apply", 2, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(f) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "Function.prototype.apply called on non-function"));
        };
        let call_this = arg(args, 0);
        let call_args = match arg(args, 1) {
            Value::Undefined | Value::Null => Vec::new(),
            v => interp.iterate_to_vec(&v)?,
        };
        interp.call_function(f, call_this, &call_args)
    }));
    method(interp, &proto, "bind", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(f) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "Function.prototype.bind called on non-function"));
        };
        let bound_this = arg(args, 0);
        let bound_args = args.get(1..).unwrap_or(&[]).to_vec();
        Ok(interp.make_bound_function(f.clone(), bound_this, bound_args))
    }));
    method(interp, &proto, "toString", 0, std::rc::Rc::new(|_interp, this, _args| {
        let Value::Object(f) = &this else {
            return Ok(Value::string("function () { [native code] }"));
        };
        Ok(Value::string(f.to_display_string()))
    }));
}
