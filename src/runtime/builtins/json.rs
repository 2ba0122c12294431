//! `JSON.parse`/`JSON.stringify` (spec.md §6.2), built on `serde_json`'s
//! `Value` as an intermediate representation and converted to/from the
//! engine's own `Value` at the boundary.

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, Object, OType};
use crate::runtime::value::Value;

use super::{arg, method};

fn from_json(interp: &Interpreter, json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(items) => {
            let values = items.iter().map(|v| from_json(interp, v)).collect();
            Value::Object(Object::new_array(Some(interp.array_proto.clone()), values))
        }
        serde_json::Value::Object(map) => {
            let obj = Object::new(OType::Ordinary, Some(interp.object_proto.clone()));
            for (k, v) in map {
                obj.set_own(Key::str(k.as_str()), crate::runtime::object::Property::value(from_json(interp, v)));
            }
            Value::Object(obj)
        }
    }
}

/// Honors a `toJSON` method on the value itself (spec.md §6.2's
/// `JSON.stringify` contract); returns `None` for values `stringify`
/// must skip (`undefined`, functions, symbols).
fn to_json(interp: &mut Interpreter, value: &Value) -> Result<Option<serde_json::Value>, Value> {
    if let Value::Object(o) = value {
        let to_json_fn = interp.get_property_value(value, &Key::str("toJSON"))?;
        if let Value::Object(f) = &to_json_fn {
            if f.is_callable() {
                let replaced = interp.call_function(f, value.clone(), &[])?;
                return to_json(interp, &replaced);
            }
        }
        if o.is_callable() {
            return Ok(None);
        }
        if let Some(len) = o.array_len() {
            let mut items = Vec::with_capacity(len);
            for i in 0..len {
                let element = o.array_get(i).unwrap_or(Value::Undefined);
                items.push(to_json(interp, &element)?.unwrap_or(serde_json::Value::Null));
            }
            return Ok(Some(serde_json::Value::Array(items)));
        }
        let mut map = serde_json::Map::new();
        for key in o.own_enumerable_string_keys() {
            let v = interp.get_property_value(value, &Key::String(key.clone()))?;
            if let Some(json) = to_json(interp, &v)? {
                map.insert(key.to_string(), json);
            }
        }
        return Ok(Some(serde_json::Value::Object(map)));
    }
    Ok(match value {
        Value::Undefined | Value::Symbol(_) => None,
        Value::Null => Some(serde_json::Value::Null),
        Value::Boolean(b) => Some(serde_json::Value::Bool(*b)),
        Value::Number(n) => Some(if n.is_finite() {
            serde_json::Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number)
        } else {
            serde_json::Value::Null
        }),
        Value::String(s) => Some(serde_json::Value::String(s.to_string())),
        Value::Object(_) => unreachable!(),
    })
}

pub fn install(interp: &mut Interpreter) {
    let json = Object::new(OType::Ordinary, Some(interp.object_proto.clone()));

    method(interp, &json, "parse", 2, std::rc::Rc::new(|interp, _this, args| {
        let text = interp.to_display_string(&arg(args, 0))?;
        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| interp.throw(ErrorKind::SyntaxError, format!("Unexpected token in JSON: {e}")))?;
        Ok(from_json(interp, &parsed))
    }));
    method(interp, &json, "stringify", 3, std::rc::Rc::new(|interp, _this, args| {
        let value = arg(args, 0);
        let Some(json) = to_json(interp, &value)? else {
            return Ok(Value::Undefined);
        };
        let indent = match arg(args, 2) {
            Value::Number(n) => " ".repeat(n as usize),
            Value::String(s) => s.to_string(),
            _ => String::new(),
        };
        let text = if indent.is_empty() {
            serde_json::to_string(&json)
        } else {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            serde::Serialize::serialize(&json, &mut ser).map(|()| String::from_utf8(buf).unwrap())
        }
        .map_err(|e| interp.throw(ErrorKind::TypeError, e.to_string()))?;
        Ok(Value::string(text))
    }));

    interp.global.declare_var("JSON", Value::Object(json));
}
