//! `RegExp` constructor and `RegExp.prototype` (spec.md §6.2). Patterns are
//! translated to the `regex` crate's syntax on each `compile`; JS flags with
//! no crate equivalent (`g`, `y`, `u`, `s` affecting `.`) are handled by the
//! call sites (`exec`/`test`/`String.prototype.split`/`replace`) rather than
//! baked into the compiled automaton, since `regex` has no native concept of
//! a sticky cursor.

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, OType, Object, Property, Slot};
use crate::runtime::value::Value;

use super::{arg, define_value, method};

/// Translate a JS regex source into `regex` crate syntax, applying
/// case-insensitive/multiline/dot-all flags via the crate's inline syntax.
pub(crate) fn compile(source: &str, flags: &str) -> Result<regex::Regex, String> {
    let mut inline = String::new();
    if flags.contains('i') {
        inline.push('i');
    }
    if flags.contains('m') {
        inline.push('m');
    }
    if flags.contains('s') {
        inline.push('s');
    }
    let pattern = if inline.is_empty() {
        source.to_string()
    } else {
        format!("(?{inline}){source}")
    };
    regex::Regex::new(&pattern).map_err(|e| e.to_string())
}

fn this_regexp(this: &Value) -> Option<(Object, String, String)> {
    let Value::Object(o) = this else { return None };
    match o.get_slot("regexp") {
        Some(Slot::RegExp { source, flags }) => Some((o.clone(), source, flags)),
        _ => None,
    }
}

fn build_match_array(interp: &mut Interpreter, m: &regex::Captures, input: &str) -> Value {
    let whole = m.get(0).unwrap();
    let mut groups: Vec<Value> = Vec::with_capacity(m.len());
    for i in 0..m.len() {
        groups.push(m.get(i).map_or(Value::Undefined, |g| Value::string(g.as_str())));
    }
    let arr = Object::new_array(Some(interp.array_proto.clone()), groups);
    define_value(&arr, "index", Value::Number(whole.start() as f64));
    define_value(&arr, "input", Value::string(input));
    Value::Object(arr)
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.regexp_proto.clone();

    method(interp, &proto, "test", 1, std::rc::Rc::new(|interp, this, args| {
        let Some((obj, source, flags)) = this_regexp(&this) else {
            return Err(interp.throw(ErrorKind::TypeError, "RegExp.prototype.test called on incompatible receiver"));
        };
        let input = interp.to_display_string(&arg(args, 0))?;
        let regex = compile(&source, &flags).map_err(|e| interp.throw(ErrorKind::SyntaxError, e))?;
        if flags.contains('g') || flags.contains('y') {
            let last = interp
                .get_property_value(&Value::Object(obj.clone()), &Key::str("lastIndex"))?;
            let last = interp.to_number(&last)? as usize;
            let found = regex.find_at(&input, last.min(input.len()));
            match found {
                Some(m) => {
                    obj.set_own(Key::str("lastIndex"), Property::value(Value::Number(m.end() as f64)));
                    Ok(Value::Boolean(true))
                }
                None => {
                    obj.set_own(Key::str("lastIndex"), Property::value(Value::Number(0.0)));
                    Ok(Value::Boolean(false))
                }
            }
        } else {
            Ok(Value::Boolean(regex.is_match(&input)))
        }
    }));

    method(interp, &proto, "exec", 1, std::rc::Rc::new(|interp, this, args| {
        let Some((obj, source, flags)) = this_regexp(&this) else {
            return Err(interp.throw(ErrorKind::TypeError, "RegExp.prototype.exec called on incompatible receiver"));
        };
        let input = interp.to_display_string(&arg(args, 0))?;
        let regex = compile(&source, &flags).map_err(|e| interp.throw(ErrorKind::SyntaxError, e))?;
        let global = flags.contains('g') || flags.contains('y');
        let start = if global {
            let last = interp.get_property_value(&Value::Object(obj.clone()), &Key::str("lastIndex"))?;
            interp.to_number(&last)? as usize
        } else {
            0
        };
        if start > input.len() {
            if global {
                obj.set_own(Key::str("lastIndex"), Property::value(Value::Number(0.0)));
            }
            return Ok(Value::Null);
        }
        match regex.captures_at(&input, start) {
            Some(caps) => {
                if global {
                    let end = caps.get(0).unwrap().end();
                    obj.set_own(Key::str("lastIndex"), Property::value(Value::Number(end as f64)));
                }
                Ok(build_match_array(interp, &caps, &input))
            }
            None => {
                if global {
                    obj.set_own(Key::str("lastIndex"), Property::value(Value::Number(0.0)));
                }
                Ok(Value::Null)
            }
        }
    }));

    method(interp, &proto, "toString", 0, std::rc::Rc::new(|interp, this, _args| {
        let Some((_, source, flags)) = this_regexp(&this) else {
            return Err(interp.throw(ErrorKind::TypeError, "RegExp.prototype.toString called on incompatible receiver"));
        };
        Ok(Value::string(format!("/{source}/{flags}")))
    }));

    let ctor = interp.make_native("RegExp", 2, std::rc::Rc::new(|interp, _this, args| {
        let (source, flags) = match arg(args, 0) {
            Value::Object(o) if o.otype() == OType::RegExp => {
                let Some(Slot::RegExp { source, flags }) = o.get_slot("regexp") else {
                    unreachable!()
                };
                (source, flags)
            }
            v => (interp.to_display_string(&v)?, String::new()),
        };
        let flags = if args.len() > 1 {
            interp.to_display_string(&arg(args, 1))?
        } else {
            flags
        };
        compile(&source, &flags).map_err(|e| interp.throw(ErrorKind::SyntaxError, e))?;
        Ok(interp.make_regexp(&source, &flags))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    interp.global.declare_var("RegExp", ctor);
}
