//! `Date` (spec.md §6.2). A `Date` object is plain `OType::Ordinary` with
//! its epoch-millisecond timestamp stashed in a `"date"` slot; `chrono`
//! (per the dependency ledger) does the calendar math on each accessor
//! call rather than being cached, since the source timestamp is the only
//! state that needs to round-trip.

use chrono::{Datelike, TimeZone, Timelike, Utc};

use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Object, OType, Slot};
use crate::runtime::value::Value;

use super::{arg, define_value, method};

fn epoch_ms(o: &Object) -> f64 {
    match o.get_slot("date") {
        Some(Slot::Number(ms)) => ms,
        _ => f64::NAN,
    }
}

fn to_datetime(ms: f64) -> Option<chrono::DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(ms as i64).single()
}

fn this_date(interp: &mut Interpreter, this: &Value, label: &str) -> Result<Object, Value> {
    match this {
        Value::Object(o) if o.get_slot("date").is_some() => Ok(o.clone()),
        _ => Err(interp.throw(
            crate::error::ErrorKind::TypeError,
            format!("Method Date.prototype.{label} called on incompatible receiver"),
        )),
    }
}

fn current_time_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

/// Shared by the multi-arg `Date` constructor and `Date.UTC`: both take
/// `(year, month, day?, hours?, minutes?, seconds?, ms?)` and there is no
/// local time zone here (SPEC_FULL.md's Date model is UTC-only), so the
/// two compute the same epoch-millisecond value.
fn ymd_to_ms(interp: &mut Interpreter, args: &[Value]) -> Result<f64, Value> {
    let year = interp.to_number(&arg(args, 0))? as i32;
    let month = interp.to_number(&arg(args, 1))? as i32;
    let day = args.get(2).map_or(Ok(1.0), |v| interp.to_number(v))? as u32;
    let hour = args.get(3).map_or(Ok(0.0), |v| interp.to_number(v))? as u32;
    let min = args.get(4).map_or(Ok(0.0), |v| interp.to_number(v))? as u32;
    let sec = args.get(5).map_or(Ok(0.0), |v| interp.to_number(v))? as u32;
    let milli = args.get(6).map_or(Ok(0.0), |v| interp.to_number(v))? as u32;
    Ok(chrono::NaiveDate::from_ymd_opt(year, (month + 1).max(1) as u32, day.max(1))
        .and_then(|d| d.and_hms_milli_opt(hour, min, sec, milli))
        .map_or(f64::NAN, |dt| Utc.from_utc_datetime(&dt).timestamp_millis() as f64))
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.date_proto.clone();

    macro_rules! field_getter {
        ($name:expr, $extract:expr) => {
            method(interp, &proto, $name, 0, std::rc::Rc::new(|interp, this, _args| {
                let o = this_date(interp, &this, $name)?;
                let ms = epoch_ms(&o);
                let extract: fn(chrono::DateTime<Utc>) -> f64 = $extract;
                Ok(Value::Number(to_datetime(ms).map_or(f64::NAN, extract)))
            }));
        };
    }

    field_getter!("getFullYear", |dt| f64::from(dt.year()));
    field_getter!("getMonth", |dt| f64::from(dt.month0()));
    field_getter!("getDate", |dt| f64::from(dt.day()));
    field_getter!("getDay", |dt| f64::from(dt.weekday().num_days_from_sunday()));
    field_getter!("getHours", |dt| f64::from(dt.hour()));
    field_getter!("getMinutes", |dt| f64::from(dt.minute()));
    field_getter!("getSeconds", |dt| f64::from(dt.second()));
    field_getter!("getMilliseconds", |dt| f64::from(dt.timestamp_subsec_millis()));
    field_getter!("getUTCFullYear", |dt| f64::from(dt.year()));
    field_getter!("getUTCMonth", |dt| f64::from(dt.month0()));
    field_getter!("getUTCDate", |dt| f64::from(dt.day()));
    field_getter!("getUTCHours", |dt| f64::from(dt.hour()));
    field_getter!("getUTCMinutes", |dt| f64::from(dt.minute()));
    field_getter!("getUTCSeconds", |dt| f64::from(dt.second()));

    method(interp, &proto, "getTime", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::Number(epoch_ms(&this_date(interp, &this, "getTime")?)))
    }));
    method(interp, &proto, "valueOf", 0, std::rc::Rc::new(|interp, this, _args| {
        Ok(Value::Number(epoch_ms(&this_date(interp, &this, "valueOf")?)))
    }));
    method(interp, &proto, "getTimezoneOffset", 0, std::rc::Rc::new(|_interp, _this, _args| {
        Ok(Value::Number(0.0))
    }));
    method(interp, &proto, "setTime", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_date(interp, &this, "setTime")?;
        let ms = interp.to_number(&arg(args, 0))?;
        o.set_slot("date", Slot::Number(ms));
        Ok(Value::Number(ms))
    }));
    method(interp, &proto, "toISOString", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_date(interp, &this, "toISOString")?;
        let ms = epoch_ms(&o);
        let Some(dt) = to_datetime(ms) else {
            return Err(interp.throw(crate::error::ErrorKind::RangeError, "Invalid time value"));
        };
        Ok(Value::string(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()))
    }));
    method(interp, &proto, "toString", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_date(interp, &this, "toString")?;
        let ms = epoch_ms(&o);
        Ok(match to_datetime(ms) {
            Some(dt) => Value::string(dt.format("%a %b %d %Y %H:%M:%S GMT+0000").to_string()),
            None => Value::string("Invalid Date"),
        })
    }));
    method(interp, &proto, "toJSON", 0, std::rc::Rc::new(|interp, this, args| {
        let to_iso = interp.get_property_value(&this, &crate::runtime::object::Key::str("toISOString"))?;
        let Value::Object(f) = &to_iso else {
            return Ok(Value::Null);
        };
        interp.call_function(f, this, args)
    }));

    let ctor = interp.make_native("Date", 7, std::rc::Rc::new(|interp, _this, args| {
        let ms = match args.len() {
            0 => current_time_ms(),
            1 => match &args[0] {
                Value::String(s) => parse_date_string(s),
                v => interp.to_number(v)?,
            },
            _ => ymd_to_ms(interp, args)?,
        };
        let obj = Object::new(OType::Ordinary, Some(interp.date_proto.clone()));
        obj.set_slot("date", Slot::Number(ms));
        Ok(Value::Object(obj))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    method(interp, ctor_obj, "now", 0, std::rc::Rc::new(|_interp, _this, _args| {
        Ok(Value::Number(current_time_ms()))
    }));
    method(interp, ctor_obj, "parse", 1, std::rc::Rc::new(|interp, _this, args| {
        let s = interp.to_display_string(&arg(args, 0))?;
        Ok(Value::Number(parse_date_string(&s)))
    }));
    method(interp, ctor_obj, "UTC", 7, std::rc::Rc::new(|interp, _this, args| {
        Ok(Value::Number(ymd_to_ms(interp, args)?))
    }));

    interp.global.declare_var("Date", ctor);
}

fn parse_date_string(s: &str) -> f64 {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp_millis() as f64)
        .unwrap_or(f64::NAN)
}
