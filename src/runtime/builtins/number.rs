//! `Number` constructor/statics and `Number.prototype` (spec.md §6.2).

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::{format_number, Value};

use super::{arg, define_const, define_value, method};

fn this_number(interp: &mut Interpreter, this: &Value) -> Result<f64, Value> {
    match this {
        Value::Number(n) => Ok(*n),
        other => interp.to_number(other),
    }
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.number_proto.clone();

    method(interp, &proto, "toString", 1, std::rc::Rc::new(|interp, this, args| {
        let n = this_number(interp, &this)?;
        let radix = args.first().map_or(Ok(10.0), |v| interp.to_number(v))? as u32;
        if radix == 10 {
            return Ok(Value::string(format_number(n)));
        }
        if !(2..=36).contains(&radix) {
            return Err(interp.throw(ErrorKind::RangeError, "toString() radix must be between 2 and 36"));
        }
        Ok(Value::string(to_radix_string(n, radix)))
    }));
    method(interp, &proto, "valueOf", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::Number(this_number(interp, &this)?))
    }));
    method(interp, &proto, "toFixed", 1, std::rc::Rc::new(|interp, this, args| {
        let n = this_number(interp, &this)?;
        let digits = args.first().map_or(Ok(0.0), |v| interp.to_number(v))? as usize;
        if n.is_nan() {
            return Ok(Value::string("NaN"));
        }
        Ok(Value::string(format!("{n:.digits$}")))
    }));
    method(interp, &proto, "toPrecision", 1, std::rc::Rc::new(|interp, this, args| {
        let n = this_number(interp, &this)?;
        match args.first() {
            None | Some(Value::Undefined) => Ok(Value::string(format_number(n))),
            Some(v) => {
                let precision = interp.to_number(v)? as usize;
                Ok(Value::string(format!("{n:.precision$e}").replacen('e', "e+", 1).replace("e+-", "e-")))
            }
        }
    }));
    method(interp, &proto, "toExponential", 1, std::rc::Rc::new(|interp, this, args| {
        let n = this_number(interp, &this)?;
        let digits = args.first().map_or(Ok(6.0), |v| interp.to_number(v))? as usize;
        Ok(Value::string(format!("{n:.digits$e}")))
    }));
    method(interp, &proto, "toLocaleString", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::string(format_number(this_number(interp, &this)?)))
    }));

    let ctor = interp.make_native("Number", 1, std::rc::Rc::new(|interp, _this, args| {
        Ok(Value::Number(match args.first() {
            None => 0.0,
            Some(v) => interp.to_number(v)?,
        }))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    define_const(ctor_obj, "MAX_SAFE_INTEGER", Value::Number(9_007_199_254_740_991.0));
    define_const(ctor_obj, "MIN_SAFE_INTEGER", Value::Number(-9_007_199_254_740_991.0));
    define_const(ctor_obj, "MAX_VALUE", Value::Number(f64::MAX));
    define_const(ctor_obj, "MIN_VALUE", Value::Number(f64::MIN_POSITIVE));
    define_const(ctor_obj, "EPSILON", Value::Number(f64::EPSILON));
    define_const(ctor_obj, "POSITIVE_INFINITY", Value::Number(f64::INFINITY));
    define_const(ctor_obj, "NEGATIVE_INFINITY", Value::Number(f64::NEG_INFINITY));
    define_const(ctor_obj, "NaN", Value::Number(f64::NAN));

    method(interp, ctor_obj, "isInteger", 1, std::rc::Rc::new(|_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_finite() && n.fract() == 0.0)))
    }));
    method(interp, ctor_obj, "isSafeInteger", 1, std::rc::Rc::new(|_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n)
            if n.is_finite() && n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0)))
    }));
    method(interp, ctor_obj, "isFinite", 1, std::rc::Rc::new(|_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_finite())))
    }));
    method(interp, ctor_obj, "isNaN", 1, std::rc::Rc::new(|_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_nan())))
    }));
    method(interp, ctor_obj, "parseFloat", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::Number(super::globals::parse_float_str(s.trim())))
    }));
    method(interp, ctor_obj, "parseInt", 2, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        let radix = args.get(1).map_or(Ok(0.0), |v| interp.to_number(v))? as u32;
        Ok(Value::Number(super::globals::parse_int_str(s.trim(), radix)))
    }));

    interp.global.declare_var("Number", ctor);
}

fn to_radix_string(mut n: f64, radix: u32) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    let negative = n < 0.0;
    n = n.abs();
    let mut int_part = n.trunc() as u64;
    let mut frac_part = n.fract();
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut int_digits = Vec::new();
    if int_part == 0 {
        int_digits.push(b'0');
    }
    while int_part > 0 {
        int_digits.push(DIGITS[(int_part % u64::from(radix)) as usize]);
        int_part /= u64::from(radix);
    }
    int_digits.reverse();
    let mut out = String::from_utf8(int_digits).unwrap();
    if frac_part > 0.0 {
        out.push('.');
        for _ in 0..20 {
            if frac_part <= 0.0 {
                break;
            }
            frac_part *= f64::from(radix);
            let digit = frac_part.trunc() as usize;
            out.push(DIGITS[digit] as char);
            frac_part -= frac_part.trunc();
        }
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}
