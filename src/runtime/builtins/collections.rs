//! `Map`/`Set`/`WeakMap`/`WeakSet` (spec.md §6.2), all keyed by
//! SameValueZero equality and backed by the `Slot::*Entries` variants on
//! `ObjectData` rather than the generic property map, since their keys can
//! be arbitrary values (including objects), not just property keys.

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Key, OType, Object, Slot};
use crate::runtime::value::Value;

use super::{arg, define_value, make_list_iterator, method};

fn map_entries(o: &Object) -> Vec<(Value, Value)> {
    match o.get_slot("map") {
        Some(Slot::MapEntries(entries)) => entries,
        _ => Vec::new(),
    }
}

fn set_entries(o: &Object) -> Vec<Value> {
    match o.get_slot("set") {
        Some(Slot::SetEntries(entries)) => entries,
        _ => Vec::new(),
    }
}

fn this_map(interp: &mut Interpreter, this: &Value, label: &str) -> Result<Object, Value> {
    match this {
        Value::Object(o) if o.otype() == OType::Map => Ok(o.clone()),
        _ => Err(interp.throw(ErrorKind::TypeError, format!("Method Map.prototype.{label} called on incompatible receiver"))),
    }
}

fn this_set(interp: &mut Interpreter, this: &Value, label: &str) -> Result<Object, Value> {
    match this {
        Value::Object(o) if o.otype() == OType::Set => Ok(o.clone()),
        _ => Err(interp.throw(ErrorKind::TypeError, format!("Method Set.prototype.{label} called on incompatible receiver"))),
    }
}

pub fn install(interp: &mut Interpreter) {
    install_map(interp);
    install_set(interp);
    install_weakmap(interp);
    install_weakset(interp);
}

fn install_map(interp: &mut Interpreter) {
    let proto = interp.map_proto.clone();

    method(interp, &proto, "get", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_map(interp, &this, "get")?;
        let key = arg(args, 0);
        Ok(map_entries(&o)
            .into_iter()
            .find(|(k, _)| k.same_value_zero(&key))
            .map_or(Value::Undefined, |(_, v)| v))
    }));
    method(interp, &proto, "set", 2, std::rc::Rc::new(|interp, this, args| {
        let o = this_map(interp, &this, "set")?;
        let key = arg(args, 0);
        let value = arg(args, 1);
        let mut entries = map_entries(&o);
        match entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
        o.set_slot("map", Slot::MapEntries(entries));
        Ok(this)
    }));
    method(interp, &proto, "has", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_map(interp, &this, "has")?;
        let key = arg(args, 0);
        Ok(Value::Boolean(map_entries(&o).iter().any(|(k, _)| k.same_value_zero(&key))))
    }));
    method(interp, &proto, "delete", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_map(interp, &this, "delete")?;
        let key = arg(args, 0);
        let mut entries = map_entries(&o);
        let len_before = entries.len();
        entries.retain(|(k, _)| !k.same_value_zero(&key));
        let removed = entries.len() != len_before;
        o.set_slot("map", Slot::MapEntries(entries));
        Ok(Value::Boolean(removed))
    }));
    method(interp, &proto, "clear", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_map(interp, &this, "clear")?;
        o.set_slot("map", Slot::MapEntries(Vec::new()));
        Ok(Value::Undefined)
    }));
    method(interp, &proto, "forEach", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_map(interp, &this, "forEach")?;
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let cb_this = arg(args, 1);
        for (k, v) in map_entries(&o) {
            interp.call_function(&cb, cb_this.clone(), &[v, k, this.clone()])?;
        }
        Ok(Value::Undefined)
    }));
    method(interp, &proto, "keys", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_map(interp, &this, "keys")?;
        Ok(make_list_iterator(interp, map_entries(&o).into_iter().map(|(k, _)| k).collect()))
    }));
    method(interp, &proto, "values", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_map(interp, &this, "values")?;
        Ok(make_list_iterator(interp, map_entries(&o).into_iter().map(|(_, v)| v).collect()))
    }));
    method(interp, &proto, "entries", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_map(interp, &this, "entries")?;
        let array_proto = interp.array_proto.clone();
        let items = map_entries(&o)
            .into_iter()
            .map(|(k, v)| Value::Object(Object::new_array(Some(array_proto.clone()), vec![k, v])))
            .collect();
        Ok(make_list_iterator(interp, items))
    }));
    let size_getter = interp.make_native("size", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_map(interp, &this, "size")?;
        Ok(Value::Number(map_entries(&o).len() as f64))
    }));
    let Value::Object(size_getter_obj) = &size_getter else { unreachable!() };
    proto.set_own(
        Key::str("size"),
        crate::runtime::object::Property {
            kind: crate::runtime::object::PropertyKind::Accessor { get: Some(size_getter_obj.clone()), set: None },
            enumerable: false,
            configurable: true,
            specified: Default::default(),
        },
    );

    let ctor = interp.make_native("Map", 0, std::rc::Rc::new(|interp, _this, args| {
        let obj = Object::new(OType::Map, Some(interp.map_proto.clone()));
        obj.set_slot("map", Slot::MapEntries(Vec::new()));
        if let Some(iterable) = args.first() {
            if !iterable.is_nullish() {
                for entry in interp.iterate_to_vec(iterable)? {
                    let pair = interp.iterate_to_vec(&entry)?;
                    let key = pair.first().cloned().unwrap_or(Value::Undefined);
                    let value = pair.get(1).cloned().unwrap_or(Value::Undefined);
                    let mut entries = map_entries(&obj);
                    entries.push((key, value));
                    obj.set_slot("map", Slot::MapEntries(entries));
                }
            }
        }
        Ok(Value::Object(obj))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());
    interp.global.declare_var("Map", ctor);
}

fn install_set(interp: &mut Interpreter) {
    let proto = interp.set_proto.clone();

    method(interp, &proto, "add", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_set(interp, &this, "add")?;
        let value = arg(args, 0);
        let mut entries = set_entries(&o);
        if !entries.iter().any(|v| v.same_value_zero(&value)) {
            entries.push(value);
        }
        o.set_slot("set", Slot::SetEntries(entries));
        Ok(this)
    }));
    method(interp, &proto, "has", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_set(interp, &this, "has")?;
        let value = arg(args, 0);
        Ok(Value::Boolean(set_entries(&o).iter().any(|v| v.same_value_zero(&value))))
    }));
    method(interp, &proto, "delete", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_set(interp, &this, "delete")?;
        let value = arg(args, 0);
        let mut entries = set_entries(&o);
        let len_before = entries.len();
        entries.retain(|v| !v.same_value_zero(&value));
        let removed = entries.len() != len_before;
        o.set_slot("set", Slot::SetEntries(entries));
        Ok(Value::Boolean(removed))
    }));
    method(interp, &proto, "clear", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_set(interp, &this, "clear")?;
        o.set_slot("set", Slot::SetEntries(Vec::new()));
        Ok(Value::Undefined)
    }));
    method(interp, &proto, "forEach", 1, std::rc::Rc::new(|interp, this, args| {
        let o = this_set(interp, &this, "forEach")?;
        let Value::Object(cb) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "callback is not a function"));
        };
        let cb_this = arg(args, 1);
        for v in set_entries(&o) {
            interp.call_function(&cb, cb_this.clone(), &[v.clone(), v, this.clone()])?;
        }
        Ok(Value::Undefined)
    }));
    method(interp, &proto, "values", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_set(interp, &this, "values")?;
        Ok(make_list_iterator(interp, set_entries(&o)))
    }));
    method(interp, &proto, "keys", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_set(interp, &this, "keys")?;
        Ok(make_list_iterator(interp, set_entries(&o)))
    }));
    method(interp, &proto, "entries", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_set(interp, &this, "entries")?;
        let array_proto = interp.array_proto.clone();
        let items = set_entries(&o)
            .into_iter()
            .map(|v| Value::Object(Object::new_array(Some(array_proto.clone()), vec![v.clone(), v])))
            .collect();
        Ok(make_list_iterator(interp, items))
    }));
    let size_getter = interp.make_native("size", 0, std::rc::Rc::new(|interp, this, _args| {
        let o = this_set(interp, &this, "size")?;
        Ok(Value::Number(set_entries(&o).len() as f64))
    }));
    let Value::Object(size_getter_obj) = &size_getter else { unreachable!() };
    proto.set_own(
        Key::str("size"),
        crate::runtime::object::Property {
            kind: crate::runtime::object::PropertyKind::Accessor { get: Some(size_getter_obj.clone()), set: None },
            enumerable: false,
            configurable: true,
            specified: Default::default(),
        },
    );

    let ctor = interp.make_native("Set", 0, std::rc::Rc::new(|interp, _this, args| {
        let obj = Object::new(OType::Set, Some(interp.set_proto.clone()));
        obj.set_slot("set", Slot::SetEntries(Vec::new()));
        if let Some(iterable) = args.first() {
            if !iterable.is_nullish() {
                for value in interp.iterate_to_vec(iterable)? {
                    let mut entries = set_entries(&obj);
                    if !entries.iter().any(|v| v.same_value_zero(&value)) {
                        entries.push(value);
                    }
                    obj.set_slot("set", Slot::SetEntries(entries));
                }
            }
        }
        Ok(Value::Object(obj))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());
    interp.global.declare_var("Set", ctor);
}

type WeakObj = std::rc::Weak<std::cell::RefCell<crate::runtime::object::ObjectData>>;

fn weak_upgrade(w: &WeakObj) -> Option<Object> {
    w.upgrade().map(Object)
}

fn weak_matches(w: &WeakObj, key: &Object) -> bool {
    weak_upgrade(w).is_some_and(|k| k.ptr_eq(key))
}

fn weakmap_entries(o: &Object) -> Vec<(WeakObj, Value)> {
    match o.get_slot("weakmap") {
        Some(Slot::WeakMapEntries(entries)) => entries,
        _ => Vec::new(),
    }
}

fn weakset_entries(o: &Object) -> Vec<WeakObj> {
    match o.get_slot("weakset") {
        Some(Slot::WeakSetEntries(entries)) => entries,
        _ => Vec::new(),
    }
}

fn install_weakmap(interp: &mut Interpreter) {
    let proto = interp.weakmap_proto.clone();

    method(interp, &proto, "set", 2, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "WeakMap.prototype.set called on incompatible receiver"));
        };
        let Value::Object(key) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Invalid value used as weak map key"));
        };
        let value = arg(args, 1);
        let mut entries = weakmap_entries(o);
        entries.retain(|(w, _)| weak_upgrade(w).is_some());
        match entries.iter_mut().find(|(w, _)| weak_matches(w, &key)) {
            Some(slot) => slot.1 = value,
            None => entries.push((key.downgrade(), value)),
        }
        o.set_slot("weakmap", Slot::WeakMapEntries(entries));
        Ok(this.clone())
    }));
    method(interp, &proto, "get", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "WeakMap.prototype.get called on incompatible receiver"));
        };
        let Value::Object(key) = arg(args, 0) else {
            return Ok(Value::Undefined);
        };
        Ok(weakmap_entries(o)
            .into_iter()
            .find(|(w, _)| weak_matches(w, &key))
            .map_or(Value::Undefined, |(_, v)| v))
    }));
    method(interp, &proto, "has", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "WeakMap.prototype.has called on incompatible receiver"));
        };
        let Value::Object(key) = arg(args, 0) else {
            return Ok(Value::Boolean(false));
        };
        Ok(Value::Boolean(weakmap_entries(o).iter().any(|(w, _)| weak_matches(w, &key))))
    }));
    method(interp, &proto, "delete", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "WeakMap.prototype.delete called on incompatible receiver"));
        };
        let Value::Object(key) = arg(args, 0) else {
            return Ok(Value::Boolean(false));
        };
        let mut entries = weakmap_entries(o);
        let len_before = entries.len();
        entries.retain(|(w, _)| !weak_matches(w, &key));
        let removed = entries.len() != len_before;
        o.set_slot("weakmap", Slot::WeakMapEntries(entries));
        Ok(Value::Boolean(removed))
    }));

    let ctor = interp.make_native("WeakMap", 0, std::rc::Rc::new(|interp, _this, args| {
        let obj = Object::new(OType::WeakMap, Some(interp.weakmap_proto.clone()));
        obj.set_slot("weakmap", Slot::WeakMapEntries(Vec::new()));
        if let Some(iterable) = args.first() {
            if !iterable.is_nullish() {
                for entry in interp.iterate_to_vec(iterable)? {
                    let pair = interp.iterate_to_vec(&entry)?;
                    let Some(Value::Object(key)) = pair.first() else {
                        return Err(interp.throw(ErrorKind::TypeError, "Invalid value used as weak map key"));
                    };
                    let value = pair.get(1).cloned().unwrap_or(Value::Undefined);
                    let mut entries = weakmap_entries(&obj);
                    entries.push((key.downgrade(), value));
                    obj.set_slot("weakmap", Slot::WeakMapEntries(entries));
                }
            }
        }
        Ok(Value::Object(obj))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());
    interp.global.declare_var("WeakMap", ctor);
}

fn install_weakset(interp: &mut Interpreter) {
    let proto = interp.weakset_proto.clone();

    method(interp, &proto, "add", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "WeakSet.prototype.add called on incompatible receiver"));
        };
        let Value::Object(value) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Invalid value used in weak set"));
        };
        let mut entries = weakset_entries(o);
        entries.retain(|w| weak_upgrade(w).is_some());
        if !entries.iter().any(|w| weak_matches(w, &value)) {
            entries.push(value.downgrade());
        }
        o.set_slot("weakset", Slot::WeakSetEntries(entries));
        Ok(this.clone())
    }));
    method(interp, &proto, "has", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "WeakSet.prototype.has called on incompatible receiver"));
        };
        let Value::Object(value) = arg(args, 0) else {
            return Ok(Value::Boolean(false));
        };
        Ok(Value::Boolean(weakset_entries(o).iter().any(|w| weak_matches(w, &value))))
    }));
    method(interp, &proto, "delete", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else {
            return Err(interp.throw(ErrorKind::TypeError, "WeakSet.prototype.delete called on incompatible receiver"));
        };
        let Value::Object(value) = arg(args, 0) else {
            return Ok(Value::Boolean(false));
        };
        let mut entries = weakset_entries(o);
        let len_before = entries.len();
        entries.retain(|w| !weak_matches(w, &value));
        let removed = entries.len() != len_before;
        o.set_slot("weakset", Slot::WeakSetEntries(entries));
        Ok(Value::Boolean(removed))
    }));

    let ctor = interp.make_native("WeakSet", 0, std::rc::Rc::new(|interp, _this, args| {
        let obj = Object::new(OType::WeakSet, Some(interp.weakset_proto.clone()));
        obj.set_slot("weakset", Slot::WeakSetEntries(Vec::new()));
        if let Some(iterable) = args.first() {
            if !iterable.is_nullish() {
                for value in interp.iterate_to_vec(iterable)? {
                    let Value::Object(value) = value else {
                        return Err(interp.throw(ErrorKind::TypeError, "Invalid value used in weak set"));
                    };
                    let mut entries = weakset_entries(&obj);
                    entries.push(value.downgrade());
                    obj.set_slot("weakset", Slot::WeakSetEntries(entries));
                }
            }
        }
        Ok(Value::Object(obj))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());
    interp.global.declare_var("WeakSet", ctor);
}
