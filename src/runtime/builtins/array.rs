//! `Array` constructor, statics and `Array.prototype` (spec.md §6.2).

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, OType, Object};
use crate::runtime::value::Value;

use super::{arg, define_value, make_list_iterator, method};

fn this_array(interp: &mut Interpreter, this: &Value) -> Result<Object, Value> {
    match this {
        Value::Object(o) if o.is_array() => Ok(o.clone()),
        _ => Err(interp.throw(ErrorKind::TypeError, "method called on a non-array value")),
    }
}

fn new_array(interp: &Interpreter, items: Vec<Value>) -> Value {
    Value::Object(Object::new_array(Some(interp.array_proto.clone()), items))
}

/// Negative-index-aware `start`/`end` clamp shared by `slice`/`splice`/
/// `copyWithin`/`fill` (spec.md §6.2 "Array").
fn clamp_index(n: f64, len: usize) -> usize {
    if n.is_nan() {
        return 0;
    }
    let len = len as i64;
    let i = if n < 0.0 { (len + n as i64).max(0) } else { (n as i64).min(len) };
    i.clamp(0, len) as usize
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.array_proto.clone();

    method(interp, &proto, "push", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        arr.extend_from_slice(args);
        let len = arr.len();
        o.set_array_snapshot(arr);
        Ok(Value::Number(len as f64))
    }));
    method(interp, &proto, "pop", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        let popped = arr.pop().unwrap_or(Value::Undefined);
        o.set_array_snapshot(arr);
        Ok(popped)
    }));
    method(interp, &proto, "shift", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        if arr.is_empty() {
            return Ok(Value::Undefined);
        }
        let shifted = arr.remove(0);
        o.set_array_snapshot(arr);
        Ok(shifted)
    }));
    method(interp, &proto, "unshift", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        for (i, v) in args.iter().enumerate() {
            arr.insert(i, v.clone());
        }
        let len = arr.len();
        o.set_array_snapshot(arr);
        Ok(Value::Number(len as f64))
    }));
    method(interp, &proto, "splice", 2, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        let len = arr.len();
        let start = clamp_index(interp.to_number(&arg(args, 0))?, len);
        let delete_count = if args.len() < 2 {
            len - start
        } else {
            (interp.to_number(&arg(args, 1))?.max(0.0) as usize).min(len - start)
        };
        let items: Vec<Value> = args.get(2..).unwrap_or(&[]).to_vec();
        let removed: Vec<Value> = arr.splice(start..start + delete_count, items).collect();
        o.set_array_snapshot(arr);
        Ok(new_array(interp, removed))
    }));
    method(interp, &proto, "slice", 2, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let len = arr.len();
        let start = clamp_index(interp.to_number(&arg(args, 0))?, len);
        let end = if matches!(arg(args, 1), Value::Undefined) {
            len
        } else {
            clamp_index(interp.to_number(&arg(args, 1))?, len)
        };
        let slice = if start < end { arr[start..end].to_vec() } else { Vec::new() };
        Ok(new_array(interp, slice))
    }));
    method(interp, &proto, "concat", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let mut out = o.array_snapshot();
        for a in args {
            match a {
                Value::Object(other) if other.is_array() => out.extend(other.array_snapshot()),
                other => out.push(other.clone()),
            }
        }
        Ok(new_array(interp, out))
    }));
    method(interp, &proto, "indexOf", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let target = arg(args, 0);
        let start = args.get(1).map_or(Ok(0.0), |v| interp.to_number(v))?;
        let start = clamp_index(start, arr.len());
        Ok(Value::Number(
            arr[start..]
                .iter()
                .position(|v| v.strict_eq(&target))
                .map_or(-1.0, |i| (i + start) as f64),
        ))
    }));
    method(interp, &proto, "lastIndexOf", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let target = arg(args, 0);
        Ok(Value::Number(
            arr.iter().rposition(|v| v.strict_eq(&target)).map_or(-1.0, |i| i as f64),
        ))
    }));
    method(interp, &proto, "includes", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let target = arg(args, 0);
        Ok(Value::Boolean(arr.iter().any(|v| v.same_value_zero(&target))))
    }));
    method(interp, &proto, "find", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        for (i, v) in arr.iter().enumerate() {
            let keep = interp
                .call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?
                .to_boolean();
            if keep {
                return Ok(v.clone());
            }
        }
        Ok(Value::Undefined)
    }));
    method(interp, &proto, "findIndex", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        for (i, v) in arr.iter().enumerate() {
            let keep = interp
                .call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?
                .to_boolean();
            if keep {
                return Ok(Value::Number(i as f64));
            }
        }
        Ok(Value::Number(-1.0))
    }));
    method(interp, &proto, "forEach", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        for (i, v) in arr.iter().enumerate() {
            interp.call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?;
        }
        Ok(Value::Undefined)
    }));
    method(interp, &proto, "map", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        let mut out = Vec::with_capacity(arr.len());
        for (i, v) in arr.iter().enumerate() {
            out.push(interp.call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?);
        }
        Ok(new_array(interp, out))
    }));
    method(interp, &proto, "filter", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        let mut out = Vec::new();
        for (i, v) in arr.iter().enumerate() {
            let keep = interp
                .call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?
                .to_boolean();
            if keep {
                out.push(v.clone());
            }
        }
        Ok(new_array(interp, out))
    }));
    method(interp, &proto, "reduce", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let mut iter = arr.iter().enumerate();
        let mut acc = if args.len() > 1 {
            arg(args, 1)
        } else {
            match iter.next() {
                Some((_, v)) => v.clone(),
                None => return Err(interp.throw(ErrorKind::TypeError, "Reduce of empty array with no initial value")),
            }
        };
        for (i, v) in iter {
            acc = interp.call_function(&cb, Value::Undefined, &[acc, v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?;
        }
        Ok(acc)
    }));
    method(interp, &proto, "reduceRight", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let mut iter = arr.iter().enumerate().rev();
        let mut acc = if args.len() > 1 {
            arg(args, 1)
        } else {
            match iter.next() {
                Some((_, v)) => v.clone(),
                None => return Err(interp.throw(ErrorKind::TypeError, "Reduce of empty array with no initial value")),
            }
        };
        for (i, v) in iter {
            acc = interp.call_function(&cb, Value::Undefined, &[acc, v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?;
        }
        Ok(acc)
    }));
    method(interp, &proto, "every", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        for (i, v) in arr.iter().enumerate() {
            let keep = interp
                .call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?
                .to_boolean();
            if !keep {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    }));
    method(interp, &proto, "some", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        for (i, v) in arr.iter().enumerate() {
            let keep = interp
                .call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?
                .to_boolean();
            if keep {
                return Ok(Value::Boolean(true));
            }
        }
        Ok(Value::Boolean(false))
    }));
    method(interp, &proto, "sort", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        let comparator = match arg(args, 0) {
            Value::Object(f) if f.is_callable() => Some(f),
            _ => None,
        };
        // Undefined elements always sort to the end (spec.md §6.2 "Array").
        let (mut defined, undef_count) = {
            let mut defined = Vec::with_capacity(arr.len());
            let mut undef = 0usize;
            for v in arr.drain(..) {
                if matches!(v, Value::Undefined) {
                    undef += 1;
                } else {
                    defined.push(v);
                }
            }
            (defined, undef)
        };
        let mut sort_err = None;
        if let Some(cmp) = comparator {
            merge_sort(&mut defined, &mut |a, b| {
                if sort_err.is_some() {
                    return std::cmp::Ordering::Equal;
                }
                match interp.call_function(&cmp, Value::Undefined, &[a.clone(), b.clone()]) {
                    Ok(result) => {
                        let n = interp.to_number(&result).unwrap_or(0.0);
                        if n < 0.0 {
                            std::cmp::Ordering::Less
                        } else if n > 0.0 {
                            std::cmp::Ordering::Greater
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    }
                    Err(e) => {
                        sort_err = Some(e);
                        std::cmp::Ordering::Equal
                    }
                }
            });
        } else {
            let mut strs: Vec<(String, Value)> = Vec::with_capacity(defined.len());
            for v in defined.drain(..) {
                let s = interp.to_display_string(&v)?;
                strs.push((s, v));
            }
            strs.sort_by(|a, b| a.0.cmp(&b.0));
            defined = strs.into_iter().map(|(_, v)| v).collect();
        }
        if let Some(e) = sort_err {
            return Err(e);
        }
        defined.extend(std::iter::repeat(Value::Undefined).take(undef_count));
        o.set_array_snapshot(defined);
        Ok(Value::Object(o))
    }));
    method(interp, &proto, "reverse", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        arr.reverse();
        o.set_array_snapshot(arr);
        Ok(Value::Object(o))
    }));
    method(interp, &proto, "fill", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        let len = arr.len();
        let value = arg(args, 0);
        let start = args.get(1).map_or(Ok(0.0), |v| interp.to_number(v))?;
        let start = clamp_index(start, len);
        let end = if args.len() > 2 { clamp_index(interp.to_number(&arg(args, 2))?, len) } else { len };
        for slot in arr.iter_mut().take(end).skip(start) {
            *slot = value.clone();
        }
        o.set_array_snapshot(arr);
        Ok(Value::Object(o))
    }));
    method(interp, &proto, "copyWithin", 2, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let mut arr = o.array_snapshot();
        let len = arr.len();
        let target = clamp_index(interp.to_number(&arg(args, 0))?, len);
        let start = args.get(1).map_or(Ok(0.0), |v| interp.to_number(v))?;
        let start = clamp_index(start, len);
        let end = if args.len() > 2 { clamp_index(interp.to_number(&arg(args, 2))?, len) } else { len };
        let slice: Vec<Value> = if start < end { arr[start..end].to_vec() } else { Vec::new() };
        for (i, v) in slice.into_iter().enumerate() {
            if target + i >= len {
                break;
            }
            arr[target + i] = v;
        }
        o.set_array_snapshot(arr);
        Ok(Value::Object(o))
    }));
    method(interp, &proto, "join", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let sep = match arg(args, 0) {
            Value::Undefined => ",".to_string(),
            v => interp.to_display_string(&v)?,
        };
        let mut parts = Vec::with_capacity(arr.len());
        for v in &arr {
            parts.push(if v.is_nullish() { String::new() } else { interp.to_display_string(v)? });
        }
        Ok(Value::string(parts.join(&sep)))
    }));
    method(interp, &proto, "flat", 0, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let depth = args.first().map_or(Ok(1.0), |v| interp.to_number(v))?;
        let depth = if depth.is_infinite() { usize::MAX } else { depth.max(0.0) as usize };
        let arr = o.array_snapshot();
        Ok(new_array(interp, flatten(&arr, depth)))
    }));
    method(interp, &proto, "flatMap", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let this_arg = arg(args, 1);
        let mut mapped = Vec::with_capacity(arr.len());
        for (i, v) in arr.iter().enumerate() {
            mapped.push(interp.call_function(&cb, this_arg.clone(), &[v.clone(), Value::Number(i as f64), Value::Object(o.clone())])?);
        }
        Ok(new_array(interp, flatten(&mapped, 1)))
    }));
    method(interp, &proto, "keys", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        let items = (0..o.array_len().unwrap_or(0)).map(|i| Value::Number(i as f64)).collect();
        Ok(make_list_iterator(interp, items))
    }));
    method(interp, &proto, "values", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        Ok(make_list_iterator(interp, o.array_snapshot()))
    }));
    method(interp, &proto, "entries", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let items = arr
            .into_iter()
            .enumerate()
            .map(|(i, v)| new_array(interp, vec![Value::Number(i as f64), v]))
            .collect();
        Ok(make_list_iterator(interp, items))
    }));
    method(interp, &proto, "at", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_array(interp, &this)?;
        let arr = o.array_snapshot();
        let n = interp.to_number(&arg(args, 0))? as i64;
        let idx = if n < 0 { arr.len() as i64 + n } else { n };
        Ok(usize::try_from(idx).ok().and_then(|i| arr.get(i).cloned()).unwrap_or(Value::Undefined))
    }));
    method(interp, &proto, "toString", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        let join = interp.get_property_value(&Value::Object(o.clone()), &Key::str("join"))?;
        if let Value::Object(f) = join {
            return interp.call_function(&f, Value::Object(o), &[]);
        }
        Ok(Value::string(o.to_display_string()))
    }));

    let symbol_iterator_key = Key::Symbol(interp.symbol_iterator.clone());
    let values_fn = interp.make_native("[Symbol.iterator]", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_array(interp, &this)?;
        Ok(make_list_iterator(interp, o.array_snapshot()))
    }));
    proto.set_own(symbol_iterator_key, crate::runtime::object::Property::data(values_fn, true, false, true));

    let ctor = interp.make_native("Array", 1, std::rc::Rc::new(|interp, _this, args| {
        if args.len() == 1 {
            if let Value::Number(n) = args[0] {
                if n.fract() != 0.0 || n < 0.0 || n > u32::MAX as f64 {
                    return Err(interp.throw(ErrorKind::RangeError, "Invalid array length"));
                }
                return Ok(new_array(interp, vec![Value::Undefined; n as usize]));
            }
        }
        Ok(new_array(interp, args.to_vec()))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    ctor_obj.set_construct(ctor_obj.call_callable().unwrap());
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    method(interp, ctor_obj, "isArray", 1, std::rc::Rc::new(|_interp, _this, args| {
        Ok(Value::Boolean(matches!(arg(args, 0), Value::Object(o) if o.is_array())))
    }));
    method(interp, ctor_obj, "from", 1, std::rc::Rc::new(|interp, _this, args| {
        let source = arg(args, 0);
        let map_fn = match arg(args, 1) {
            Value::Object(f) if f.is_callable() => Some(f),
            _ => None,
        };
        let items = match &source {
            Value::Object(o) if !o.is_array() && !o.has_property(&Key::Symbol(interp.symbol_iterator.clone())) => {
                // array-like: has a numeric `length` but no iterator protocol.
                let len_value = interp.get_property_value(&source, &Key::str("length"))?;
                let len = interp.to_number(&len_value)? as usize;
                let mut out = Vec::with_capacity(len);
                for i in 0..len {
                    out.push(interp.get_property_value(&source, &Key::str(i.to_string()))?);
                }
                out
            }
            Value::String(_) => interp.iterate_to_vec(&source)?,
            _ => interp.iterate_to_vec(&source)?,
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, v) in items.into_iter().enumerate() {
            out.push(match &map_fn {
                Some(f) => interp.call_function(f, Value::Undefined, &[v, Value::Number(i as f64)])?,
                None => v,
            });
        }
        Ok(new_array(interp, out))
    }));
    method(interp, ctor_obj, "of", 0, std::rc::Rc::new(|interp, _this, args| Ok(new_array(interp, args.to_vec()))));

    interp.global.declare_var("Array", ctor);
}

fn flatten(items: &[Value], depth: usize) -> Vec<Value> {
    let mut out = Vec::new();
    for v in items {
        match v {
            Value::Object(o) if o.is_array() && depth > 0 => {
                out.extend(flatten(&o.array_snapshot(), depth - 1));
            }
            other => out.push(other.clone()),
        }
    }
    out
}

/// Stable sort via merge sort (spec.md §6.2 "Array": `sort` must be
/// stable); `Vec::sort_by` is already stable but the comparator here needs
/// to short-circuit on a thrown error, which `sort_by`'s `Ordering`-only
/// closure can't propagate, so the comparator stashes the error itself.
fn merge_sort<F: FnMut(&Value, &Value) -> std::cmp::Ordering>(arr: &mut Vec<Value>, cmp: &mut F) {
    let len = arr.len();
    if len <= 1 {
        return;
    }
    let mid = len / 2;
    let mut left: Vec<Value> = arr[..mid].to_vec();
    let mut right: Vec<Value> = arr[mid..].to_vec();
    merge_sort(&mut left, cmp);
    merge_sort(&mut right, cmp);
    let (mut i, mut j, mut k) = (0, 0, 0);
    while i < left.len() && j < right.len() {
        if cmp(&left[i], &right[j]) != std::cmp::Ordering::Greater {
            arr[k] = left[i].clone();
            i += 1;
        } else {
            arr[k] = right[j].clone();
            j += 1;
        }
        k += 1;
    }
    while i < left.len() {
        arr[k] = left[i].clone();
        i += 1;
        k += 1;
    }
    while j < right.len() {
        arr[k] = right[j].clone();
        j += 1;
        k += 1;
    }
}
