//! `String.prototype` and the `String` constructor/statics (spec.md §6.2).
//! Indices and `length` are UTF-16 code units throughout, matching
//! `runtime::interpreter::expressions::get_string_property` (SPEC_FULL.md
//! §9, "UTF-16 string semantics").

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, OType, Slot};
use crate::runtime::value::Value;

use super::{arg, define_value, method};

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn from_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

fn this_string(interp: &mut Interpreter, this: &Value) -> Result<String, Value> {
    match this {
        Value::String(s) => Ok(s.to_string()),
        other => interp.to_display_string(other),
    }
}

/// Negative-aware clamp to `[0, len]`, shared by `slice`/`substring`.
fn clamp(n: f64, len: usize) -> usize {
    if n.is_nan() {
        return 0;
    }
    let len = len as i64;
    let i = if n < 0.0 { (len + n as i64).max(0) } else { (n as i64).min(len) };
    i.clamp(0, len) as usize
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.string_proto.clone();

    method(interp, &proto, "charAt", 1, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let i = interp.to_number(&arg(args, 0))?;
        if i.is_nan() || i < 0.0 {
            return Ok(Value::string(""));
        }
        let i = i as usize;
        Ok(Value::string(s.get(i).map_or(String::new(), |u| from_units(&[*u]))))
    }));
    method(interp, &proto, "charCodeAt", 1, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let i = interp.to_number(&arg(args, 0))?;
        if i.is_nan() || i < 0.0 {
            return Ok(Value::Number(f64::NAN));
        }
        Ok(s.get(i as usize).map_or(Value::Number(f64::NAN), |u| Value::Number(f64::from(*u))))
    }));
    method(interp, &proto, "codePointAt", 1, std::rc::Rc::new(|interp, this, args| {
        let text = this_string(interp, &this)?;
        let i = interp.to_number(&arg(args, 0))?;
        if i.is_nan() || i < 0.0 {
            return Ok(Value::Undefined);
        }
        let i = i as usize;
        Ok(text.chars().scan(0usize, |pos, c| {
            let start = *pos;
            *pos += c.len_utf16();
            Some((start, c))
        }).find(|(start, _)| *start == i).map_or(Value::Undefined, |(_, c)| Value::Number(f64::from(c as u32))))
    }));
    method(interp, &proto, "indexOf", 1, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let needle = units(&interp.to_display_string(&arg(args, 0))?);
        let start = args.get(1).map_or(Ok(0.0), |v| interp.to_number(v))?;
        let start = clamp(start, s.len());
        Ok(Value::Number(find_units(&s, &needle, start).map_or(-1.0, |i| i as f64)))
    }));
    method(interp, &proto, "lastIndexOf", 1, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let needle = units(&interp.to_display_string(&arg(args, 0))?);
        let mut found = None;
        let mut i = 0;
        while let Some(at) = find_units(&s, &needle, i) {
            found = Some(at);
            i = at + 1;
        }
        Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
    }));
    method(interp, &proto, "includes", 1, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let needle = units(&interp.to_display_string(&arg(args, 0))?);
        Ok(Value::Boolean(find_units(&s, &needle, 0).is_some()))
    }));
    method(interp, &proto, "startsWith", 1, std::rc::Rc::new(|interp, this, args| {
        let s = this_string(interp, &this)?;
        let needle = interp.to_display_string(&arg(args, 0))?;
        let start = args.get(1).map_or(Ok(0.0), |v| interp.to_number(v))? as usize;
        let s_units = units(&s);
        let from = s_units.get(start.min(s_units.len())..).map(from_units).unwrap_or_default();
        Ok(Value::Boolean(from.starts_with(&needle)))
    }));
    method(interp, &proto, "endsWith", 1, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let needle = units(&interp.to_display_string(&arg(args, 0))?);
        let end = args.get(1).map_or(Ok(s.len() as f64), |v| interp.to_number(v))?;
        let end = clamp(end, s.len());
        let slice = &s[..end];
        Ok(Value::Boolean(slice.ends_with(needle.as_slice())))
    }));
    method(interp, &proto, "slice", 2, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let start = clamp(interp.to_number(&arg(args, 0))?, s.len());
        let end = if matches!(arg(args, 1), Value::Undefined) {
            s.len()
        } else {
            clamp(interp.to_number(&arg(args, 1))?, s.len())
        };
        Ok(Value::string(if start < end { from_units(&s[start..end]) } else { String::new() }))
    }));
    method(interp, &proto, "substring", 2, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let a = clamp(interp.to_number(&arg(args, 0))?.max(0.0), s.len());
        let b = if matches!(arg(args, 1), Value::Undefined) {
            s.len()
        } else {
            clamp(interp.to_number(&arg(args, 1))?.max(0.0), s.len())
        };
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Ok(Value::string(from_units(&s[start..end])))
    }));
    method(interp, &proto, "substr", 2, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let start = interp.to_number(&arg(args, 0))?;
        let start = clamp(start, s.len());
        let len = if matches!(arg(args, 1), Value::Undefined) {
            s.len() - start
        } else {
            (interp.to_number(&arg(args, 1))?.max(0.0) as usize).min(s.len() - start)
        };
        Ok(Value::string(from_units(&s[start..start + len])))
    }));
    method(interp, &proto, "toUpperCase", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(this_string(interp, &this)?.to_uppercase()))
    }));
    method(interp, &proto, "toLowerCase", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(this_string(interp, &this)?.to_lowercase()))
    }));
    method(interp, &proto, "trim", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(this_string(interp, &this)?.trim().to_string()))
    }));
    method(interp, &proto, "trimStart", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(this_string(interp, &this)?.trim_start().to_string()))
    }));
    method(interp, &proto, "trimEnd", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(this_string(interp, &this)?.trim_end().to_string()))
    }));
    method(interp, &proto, "repeat", 1, std::rc::Rc::new(|interp, this, args| {
        let s = this_string(interp, &this)?;
        let n = interp.to_number(&arg(args, 0))?;
        if n < 0.0 || n.is_infinite() {
            return Err(interp.throw(ErrorKind::RangeError, "Invalid count value"));
        }
        Ok(Value::string(s.repeat(n as usize)))
    }));
    method(interp, &proto, "padStart", 2, std::rc::Rc::new(|interp, this, args| {
        let s = this_string(interp, &this)?;
        let target = interp.to_number(&arg(args, 0))? as usize;
        let pad = match arg(args, 1) {
            Value::Undefined => " ".to_string(),
            v => interp.to_display_string(&v)?,
        };
        Ok(Value::string(pad_string(&s, target, &pad, true)))
    }));
    method(interp, &proto, "padEnd", 2, std::rc::Rc::new(|interp, this, args| {
        let s = this_string(interp, &this)?;
        let target = interp.to_number(&arg(args, 0))? as usize;
        let pad = match arg(args, 1) {
            Value::Undefined => " ".to_string(),
            v => interp.to_display_string(&v)?,
        };
        Ok(Value::string(pad_string(&s, target, &pad, false)))
    }));
    method(interp, &proto, "concat", 1, std::rc::Rc::new(|interp, this, args| {
        let mut s = this_string(interp, &this)?;
        for a in args {
            s.push_str(&interp.to_display_string(a)?);
        }
        Ok(Value::string(s))
    }));
    method(interp, &proto, "at", 1, std::rc::Rc::new(|interp, this, args| {
        let s = units(&this_string(interp, &this)?);
        let n = interp.to_number(&arg(args, 0))? as i64;
        let idx = if n < 0 { s.len() as i64 + n } else { n };
        Ok(usize::try_from(idx).ok().and_then(|i| s.get(i)).map_or(Value::Undefined, |u| Value::string(from_units(&[*u]))))
    }));
    method(interp, &proto, "split", 2, std::rc::Rc::new(|interp, this, args| {
        let s = this_string(interp, &this)?;
        let limit = args.get(1).map_or(Ok(u32::MAX as f64), |v| interp.to_number(v))? as usize;
        let parts: Vec<Value> = match arg(args, 0) {
            Value::Undefined => vec![Value::string(s)],
            Value::Object(re) if re.otype() == OType::RegExp => {
                let pattern = regex_from_object(&re);
                let regex = crate::runtime::builtins::regexp::compile(&pattern.0, &pattern.1)
                    .map_err(|e| interp.throw(ErrorKind::SyntaxError, e))?;
                regex.split(&s).map(Value::string).collect()
            }
            sep => {
                let sep = interp.to_display_string(&sep)?;
                if sep.is_empty() {
                    s.chars().map(|c| Value::string(c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(Value::string).collect()
                }
            }
        };
        let truncated: Vec<Value> = parts.into_iter().take(limit).collect();
        Ok(Value::Object(crate::runtime::object::Object::new_array(Some(interp.array_proto.clone()), truncated)))
    }));
    method(interp, &proto, "replace", 2, std::rc::Rc::new(|interp, this, args| {
        do_replace(interp, &this, args, false)
    }));
    method(interp, &proto, "replaceAll", 2, std::rc::Rc::new(|interp, this, args| {
        do_replace(interp, &this, args, true)
    }));
    method(interp, &proto, "match", 1, std::rc::Rc::new(|interp, this, args| {
        let s = this_string(interp, &this)?;
        let Value::Object(re) = arg(args, 0) else {
            return Ok(Value::Null);
        };
        let (pattern, flags) = regex_from_object(&re);
        let regex = crate::runtime::builtins::regexp::compile(&pattern, &flags)
            .map_err(|e| interp.throw(ErrorKind::SyntaxError, e))?;
        if flags.contains('g') {
            let matches: Vec<Value> = regex.find_iter(&s).map(|m| Value::string(m.as_str())).collect();
            if matches.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(Value::Object(crate::runtime::object::Object::new_array(Some(interp.array_proto.clone()), matches)));
        }
        match regex.find(&s) {
            Some(m) => Ok(Value::Object(crate::runtime::object::Object::new_array(
                Some(interp.array_proto.clone()),
                vec![Value::string(m.as_str())],
            ))),
            None => Ok(Value::Null),
        }
    }));
    method(interp, &proto, "toString", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(this_string(interp, &this)?))
    }));
    method(interp, &proto, "valueOf", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(this_string(interp, &this)?))
    }));

    let ctor = interp.make_native("String", 1, std::rc::Rc::new(|interp, _this, args| {
        Ok(Value::string(match args.first() {
            None => String::new(),
            Some(v) => interp.to_display_string(v)?,
        }))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    method(interp, ctor_obj, "fromCharCode", 1, std::rc::Rc::new(|interp, _this, args| {
        let mut out = Vec::with_capacity(args.len());
        for a in args {
            out.push(interp.to_number(a)? as u16);
        }
        Ok(Value::string(from_units(&out)))
    }));
    method(interp, ctor_obj, "fromCodePoint", 1, std::rc::Rc::new(|interp, _this, args| {
        let mut out = String::new();
        for a in args {
            let code = interp.to_number(a)? as u32;
            out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
        }
        Ok(Value::string(out))
    }));
    method(interp, ctor_obj, "raw", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(template) = arg(args, 0) else {
            return Ok(Value::string(""));
        };
        let raw_prop = interp.get_property_value(&Value::Object(template), &Key::str("raw"))?;
        let Value::Object(raw) = raw_prop else { return Ok(Value::string("")) };
        let parts = raw.array_snapshot();
        let subs = args.get(1..).unwrap_or(&[]);
        let mut out = String::new();
        for (i, part) in parts.iter().enumerate() {
            out.push_str(&interp.to_display_string(part)?);
            if let Some(sub) = subs.get(i) {
                out.push_str(&interp.to_display_string(sub)?);
            }
        }
        Ok(Value::string(out))
    }));

    interp.global.declare_var("String", ctor);
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if from >= haystack.len() {
        return None;
    }
    haystack[from..].windows(needle.len()).position(|w| w == needle).map(|i| i + from)
}

fn pad_string(s: &str, target_len: usize, pad: &str, start: bool) -> String {
    let current = s.encode_utf16().count();
    if current >= target_len || pad.is_empty() {
        return s.to_string();
    }
    let need = target_len - current;
    let pad_units: Vec<u16> = pad.encode_utf16().cycle().take(need).collect();
    let filler = from_units(&pad_units);
    if start {
        format!("{filler}{s}")
    } else {
        format!("{s}{filler}")
    }
}

fn regex_from_object(o: &crate::runtime::object::Object) -> (String, String) {
    match o.get_slot("regexp") {
        Some(Slot::RegExp { source, flags }) => (source, flags),
        _ => (String::new(), String::new()),
    }
}

fn do_replace(interp: &mut Interpreter, this: &Value, args: &[Value], all: bool) -> Result<Value, Value> {
    let s = this_string(interp, this)?;
    let pattern = arg(args, 0);
    let replacement = arg(args, 1);

    if let Value::Object(re) = &pattern {
        if re.otype() == OType::RegExp {
            let (src, flags) = regex_from_object(re);
            let regex = crate::runtime::builtins::regexp::compile(&src, &flags)
                .map_err(|e| interp.throw(ErrorKind::SyntaxError, e))?;
            let global = all || flags.contains('g');
            return replace_with(interp, &s, &regex, &replacement, global);
        }
    }

    let needle = interp.to_display_string(&pattern)?;
    if needle.is_empty() {
        return replace_literal(interp, &s, &needle, &replacement, all, None);
    }
    replace_literal(interp, &s, &needle, &replacement, all, None)
}

fn replace_literal(
    interp: &mut Interpreter,
    s: &str,
    needle: &str,
    replacement: &Value,
    all: bool,
    _unused: Option<()>,
) -> Result<Value, Value> {
    if let Value::Object(f) = replacement {
        if f.is_callable() {
            let mut out = String::new();
            let mut rest = s;
            loop {
                match rest.find(needle) {
                    Some(pos) if !needle.is_empty() || !rest.is_empty() || out.is_empty() => {
                        out.push_str(&rest[..pos]);
                        let matched = &rest[pos..pos + needle.len().max(if needle.is_empty() { 0 } else { needle.len() })];
                        let result = interp.call_function(
                            f,
                            Value::Undefined,
                            &[Value::string(matched), Value::Number(pos as f64), Value::string(s)],
                        )?;
                        out.push_str(&interp.to_display_string(&result)?);
                        rest = &rest[pos + needle.len().max(1).min(rest.len() - pos)..];
                        if !all {
                            out.push_str(rest);
                            return Ok(Value::string(out));
                        }
                        if needle.is_empty() && rest.is_empty() {
                            break;
                        }
                    }
                    _ => {
                        out.push_str(rest);
                        break;
                    }
                }
            }
            return Ok(Value::string(out));
        }
    }
    let replacement = interp.to_display_string(replacement)?;
    Ok(Value::string(if all {
        s.replace(needle, &replacement)
    } else {
        s.replacen(needle, &replacement, 1)
    }))
}

fn replace_with(
    interp: &mut Interpreter,
    s: &str,
    regex: &regex::Regex,
    replacement: &Value,
    global: bool,
) -> Result<Value, Value> {
    if let Value::Object(f) = replacement {
        if f.is_callable() {
            let mut out = String::new();
            let mut last = 0;
            for m in regex.find_iter(s) {
                out.push_str(&s[last..m.start()]);
                let result = interp.call_function(
                    f,
                    Value::Undefined,
                    &[Value::string(m.as_str()), Value::Number(m.start() as f64), Value::string(s)],
                )?;
                out.push_str(&interp.to_display_string(&result)?);
                last = m.end();
                if !global {
                    break;
                }
            }
            out.push_str(&s[last..]);
            return Ok(Value::string(out));
        }
    }
    let template = interp.to_display_string(replacement)?;
    let rust_template = expand_dollar_refs(&template);
    Ok(Value::string(if global {
        regex.replace_all(s, rust_template.as_str()).into_owned()
    } else {
        regex.replace(s, rust_template.as_str()).into_owned()
    }))
}

/// `$1`-style backreferences become `regex`'s `${1}` syntax; `$&`/`$$`
/// pass through to the crate's own conventions.
fn expand_dollar_refs(template: &str) -> String {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            match chars.peek() {
                Some(d) if d.is_ascii_digit() => {
                    let mut num = String::new();
                    while let Some(d) = chars.peek() {
                        if d.is_ascii_digit() {
                            num.push(*d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str("${");
                    out.push_str(&num);
                    out.push('}');
                    continue;
                }
                Some('&') => {
                    chars.next();
                    out.push_str("${0}");
                    continue;
                }
                Some('$') => {
                    chars.next();
                    out.push('$');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}
