//! Free-standing global functions (spec.md §6.2): numeric parsing, URI
//! en/decoding, and direct `eval`.

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;

use super::arg;

/// `parseFloat`: leading run of a valid float literal, ignoring anything
/// after it; `NaN` if no valid prefix exists.
pub(crate) fn parse_float_str(s: &str) -> f64 {
    let s = s.trim_start();
    if let Some(rest) = s.strip_prefix("Infinity").or_else(|| s.strip_prefix("+Infinity")) {
        let _ = rest;
        return f64::INFINITY;
    }
    if let Some(rest) = s.strip_prefix("-Infinity") {
        let _ = rest;
        return f64::NEG_INFINITY;
    }
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => {
                seen_digit = true;
                i += 1;
                end = i;
            }
            b'.' if !seen_dot && !seen_exp => {
                seen_dot = true;
                i += 1;
                if seen_digit {
                    end = i;
                }
            }
            b'e' | b'E' if seen_digit && !seen_exp => {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                let exp_start = j;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > exp_start {
                    seen_exp = true;
                    end = j;
                    i = j;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

/// `parseInt`: optional `0x`/`0X` prefix selects radix 16 when `radix` is
/// 0 or unspecified; otherwise parses in the given radix (2-36).
pub(crate) fn parse_int_str(s: &str, mut radix: u32) -> f64 {
    let s = s.trim_start();
    let (sign, s) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let mut s = s;
    if radix == 0 {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            radix = 16;
            s = rest;
        } else {
            radix = 10;
        }
    } else if radix == 16 {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
        }
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let end = s.find(|c: char| !c.is_digit(radix)).unwrap_or(s.len());
    if end == 0 {
        return f64::NAN;
    }
    i64::from_str_radix(&s[..end], radix).map_or(f64::NAN, |n| sign * n as f64)
}

pub fn install(interp: &mut Interpreter) {
    let parse_float = interp.make_native("parseFloat", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::Number(parse_float_str(&s)))
    }));
    interp.global.declare_var("parseFloat", parse_float);

    let parse_int = interp.make_native("parseInt", 2, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        let radix = args.get(1).map_or(Ok(0.0), |v| interp.to_number(v))? as u32;
        Ok(Value::Number(parse_int_str(&s, radix)))
    }));
    interp.global.declare_var("parseInt", parse_int);

    let is_nan = interp.make_native("isNaN", 1, std::rc::Rc::new(|interp, _this, args| {
        Ok(Value::Boolean(interp.to_number(&arg(args, 0))?.is_nan()))
    }));
    interp.global.declare_var("isNaN", is_nan);

    let is_finite = interp.make_native("isFinite", 1, std::rc::Rc::new(|interp, _this, args| {
        Ok(Value::Boolean(interp.to_number(&arg(args, 0))?.is_finite()))
    }));
    interp.global.declare_var("isFinite", is_finite);

    let encode_uri = interp.make_native("encodeURI", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::string(uri_encode(&s, "A-Za-z0-9;,/?:@&=+$-_.!~*'()#")))
    }));
    interp.global.declare_var("encodeURI", encode_uri);

    let encode_component = interp.make_native("encodeURIComponent", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::string(uri_encode(&s, "A-Za-z0-9-_.!~*'()")))
    }));
    interp.global.declare_var("encodeURIComponent", encode_component);

    let decode_uri = interp.make_native("decodeURI", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        uri_decode(&s).map(Value::string).map_err(|e| interp.throw(ErrorKind::UriError, e))
    }));
    interp.global.declare_var("decodeURI", decode_uri);

    let decode_component = interp.make_native("decodeURIComponent", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        uri_decode(&s).map(Value::string).map_err(|e| interp.throw(ErrorKind::UriError, e))
    }));
    interp.global.declare_var("decodeURIComponent", decode_component);

    let escape = interp.make_native("escape", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::string(escape_utf16(&s)))
    }));
    interp.global.declare_var("escape", escape);

    let unescape = interp.make_native("unescape", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::string(unescape_utf16(&s)))
    }));
    interp.global.declare_var("unescape", unescape);

    let eval_marker = interp.eval_marker.clone();
    eval_marker.set_call(crate::runtime::object::Callable::Native(std::rc::Rc::new(|interp, _this, args| {
        indirect_eval(interp, args)
    })));
    interp.global.declare_var("eval", Value::Object(eval_marker));
}

/// `eval` called other than as the bare identifier `eval(...)` runs in
/// global scope rather than the caller's (SPEC_FULL.md §9, "Direct vs
/// indirect eval"); the direct-call fast path lives in
/// `runtime::interpreter::expressions::eval_call`.
fn indirect_eval(interp: &mut Interpreter, args: &[Value]) -> Result<Value, Value> {
    let Some(Value::String(src)) = args.first() else {
        return Ok(args.first().cloned().unwrap_or(Value::Undefined));
    };
    let mut parser = crate::frontend::parser::Parser::new(src);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        return Err(interp.throw(ErrorKind::SyntaxError, parser.errors()[0].message.clone()));
    }
    interp.eval_program(&program)
}

fn is_unreserved(c: char, extra: &str) -> bool {
    c.is_ascii_alphanumeric() || extra.contains(c)
}

fn uri_encode(s: &str, unreserved: &str) -> String {
    let mut out = String::new();
    for byte in s.bytes() {
        let c = byte as char;
        if byte < 0x80 && is_unreserved(c, unreserved) {
            out.push(c);
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}

/// `escape` (Annex B): operates on UTF-16 code units, not UTF-8 bytes —
/// units below 0x100 become `%XX`, the rest `%uXXXX`.
fn escape_utf16(s: &str) -> String {
    const UNRESERVED: &str = "@*_+-./";
    let mut out = String::new();
    for unit in s.encode_utf16() {
        if unit < 0x80 && is_unreserved(unit as u8 as char, UNRESERVED) {
            out.push(unit as u8 as char);
        } else if unit < 0x100 {
            out.push_str(&format!("%{unit:02X}"));
        } else {
            out.push_str(&format!("%u{unit:04X}"));
        }
    }
    out
}

/// `unescape` (Annex B): the inverse of [`escape_utf16`].
fn unescape_utf16(s: &str) -> String {
    let units: Vec<u16> = s.encode_utf16().collect();
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        if units[i] == u16::from(b'%') {
            if units.get(i + 1) == Some(&u16::from(b'u')) && i + 6 <= units.len() {
                let hex: String = units[i + 2..i + 6].iter().filter_map(|&u| u8::try_from(u).ok()).map(char::from).collect();
                if let Ok(code) = u16::from_str_radix(&hex, 16) {
                    out.push(code);
                    i += 6;
                    continue;
                }
            } else if i + 3 <= units.len() {
                let hex: String = units[i + 1..i + 3].iter().filter_map(|&u| u8::try_from(u).ok()).map(char::from).collect();
                if let Ok(code) = u8::from_str_radix(&hex, 16) {
                    out.push(u16::from(code));
                    i += 3;
                    continue;
                }
            }
        }
        out.push(units[i]);
        i += 1;
    }
    String::from_utf16_lossy(&out)
}

fn uri_decode(s: &str) -> Result<String, String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return Err("URIError: URI malformed".to_string());
            }
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).map_err(|_| "URIError: URI malformed".to_string())?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| "URIError: URI malformed".to_string())?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| "URIError: URI malformed".to_string())
}
