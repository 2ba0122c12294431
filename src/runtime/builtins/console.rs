//! `console` (spec.md §6.2): `log`/`info`/`debug` to stdout,
//! `warn`/`error` to stderr, matching the teacher's `colored`-backed CLI
//! output conventions elsewhere in this crate.

use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, Object, OType};
use crate::runtime::value::Value;

use super::method;

/// `console.log`'s inspection format: closer to Node's `util.inspect`
/// than `String(value)` — strings print quoted, arrays/objects print
/// their structure rather than going through `toString`.
fn inspect(interp: &mut Interpreter, value: &Value, seen: &mut Vec<*const ()>) -> Result<String, Value> {
    Ok(match value {
        Value::String(s) => format!("'{s}'"),
        Value::Object(o) if o.is_array() => {
            let ptr = std::rc::Rc::as_ptr(&o.0).cast::<()>();
            if seen.contains(&ptr) {
                return Ok("[Circular]".to_string());
            }
            seen.push(ptr);
            let items = o.array_snapshot();
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(inspect(interp, item, seen)?);
            }
            seen.pop();
            format!("[ {} ]", parts.join(", "))
        }
        Value::Object(o) if o.is_callable() => {
            let name = interp.get_property_value(value, &Key::str("name"))?;
            format!("[Function: {}]", if name.to_string().is_empty() { "anonymous".to_string() } else { name.to_string() })
        }
        Value::Object(o) if o.otype() == OType::Error => interp.to_display_string(value)?,
        Value::Object(o) => {
            let ptr = std::rc::Rc::as_ptr(&o.0).cast::<()>();
            if seen.contains(&ptr) {
                return Ok("[Circular]".to_string());
            }
            seen.push(ptr);
            let keys = o.own_enumerable_string_keys();
            let mut parts = Vec::with_capacity(keys.len());
            for key in keys {
                let v = interp.get_property_value(value, &Key::String(key.clone()))?;
                parts.push(format!("{key}: {}", inspect(interp, &v, seen)?));
            }
            seen.pop();
            if parts.is_empty() {
                "{}".to_string()
            } else {
                format!("{{ {} }}", parts.join(", "))
            }
        }
        other => other.to_string(),
    })
}

fn format_args(interp: &mut Interpreter, args: &[Value]) -> Result<String, Value> {
    let mut parts = Vec::with_capacity(args.len());
    for a in args {
        parts.push(inspect(interp, a, &mut Vec::new())?);
    }
    Ok(parts.join(" "))
}

pub fn install(interp: &mut Interpreter) {
    let console = Object::new(OType::Ordinary, Some(interp.object_proto.clone()));

    for name in ["log", "info", "debug"] {
        method(interp, &console, name, 0, std::rc::Rc::new(|interp, _this, args| {
            println!("{}", format_args(interp, args)?);
            Ok(Value::Undefined)
        }));
    }
    for name in ["warn", "error"] {
        method(interp, &console, name, 0, std::rc::Rc::new(|interp, _this, args| {
            eprintln!("{}", format_args(interp, args)?);
            Ok(Value::Undefined)
        }));
    }
    method(interp, &console, "assert", 0, std::rc::Rc::new(|interp, _this, args| {
        let ok = args.first().is_some_and(Value::to_boolean);
        if !ok {
            let rest = args.get(1..).unwrap_or(&[]);
            eprintln!("Assertion failed: {}", format_args(interp, rest)?);
        }
        Ok(Value::Undefined)
    }));
    method(interp, &console, "trace", 0, std::rc::Rc::new(|interp, _this, args| {
        eprintln!("Trace: {}", format_args(interp, args)?);
        Ok(Value::Undefined)
    }));
    method(interp, &console, "table", 0, std::rc::Rc::new(|interp, _this, args| {
        println!("{}", format_args(interp, args)?);
        Ok(Value::Undefined)
    }));
    method(interp, &console, "group", 0, std::rc::Rc::new(|interp, _this, args| {
        println!("{}", format_args(interp, args)?);
        Ok(Value::Undefined)
    }));
    method(interp, &console, "groupEnd", 0, std::rc::Rc::new(|_interp, _this, _args| Ok(Value::Undefined)));

    interp.global.declare_var("console", Value::Object(console));
}
