//! `Object` constructor, statics and `Object.prototype` (spec.md §6.2).

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{AttrsSpecified, Key, OType, Property, PropertyKind};
use crate::runtime::value::Value;

use super::{arg, define_value, method};

pub fn install(interp: &mut Interpreter) {
    let proto = interp.object_proto.clone();

    method(interp, &proto, "hasOwnProperty", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else { return Ok(Value::Boolean(false)) };
        let key = interp.to_property_key(&arg(args, 0))?;
        Ok(Value::Boolean(o.has_own(&key)))
    }));
    method(interp, &proto, "isPrototypeOf", 1, std::rc::Rc::new(|_interp, this, args| {
        let (Value::Object(target), Value::Object(candidate)) = (&this, &arg(args, 0)) else {
            return Ok(Value::Boolean(false));
        };
        let mut current = candidate.prototype();
        while let Some(p) = current {
            if p.ptr_eq(target) {
                return Ok(Value::Boolean(true));
            }
            current = p.prototype();
        }
        Ok(Value::Boolean(false))
    }));
    method(interp, &proto, "propertyIsEnumerable", 1, std::rc::Rc::new(|interp, this, args| {
        let Value::Object(o) = &this else { return Ok(Value::Boolean(false)) };
        let key = interp.to_property_key(&arg(args, 0))?;
        Ok(Value::Boolean(o.get_own(&key).is_some_and(|p| p.enumerable)))
    }));
    method(interp, &proto, "toString", 0, std::rc::Rc::new(|_interp, this, _args| {
        let tag = match &this {
            Value::Undefined => "Undefined",
            Value::Null => "Null",
            Value::Object(o) if o.is_array() => "Array",
            Value::Object(o) if o.is_callable() => "Function",
            Value::Object(o) if o.otype() == OType::Error => "Error",
            _ => "Object",
        };
        Ok(Value::string(format!("[object {tag}]")))
    }));
    method(interp, &proto, "valueOf", 0, std::rc::Rc::new(|_interp, this, _args| Ok(this)));

    let ctor = interp.make_native("Object", 1, std::rc::Rc::new(|interp, _this, args| {
        match arg(args, 0) {
            Value::Undefined | Value::Null => {
                Ok(Value::Object(crate::runtime::object::Object::new(
                    OType::Ordinary,
                    Some(interp.object_proto.clone()),
                )))
            }
            v @ Value::Object(_) => Ok(v),
            _ => Ok(Value::Object(crate::runtime::object::Object::new(
                OType::Ordinary,
                Some(interp.object_proto.clone()),
            ))),
        }
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    ctor_obj.set_construct(ctor_obj.call_callable().unwrap());
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    method(interp, ctor_obj, "keys", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.keys called on non-object"));
        };
        let keys: Vec<Value> = o.own_enumerable_string_keys().into_iter().map(Value::string).collect();
        Ok(Value::Object(crate::runtime::object::Object::new_array(Some(interp.array_proto.clone()), keys)))
    }));
    method(interp, ctor_obj, "values", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.values called on non-object"));
        };
        let mut values = Vec::new();
        for k in o.own_enumerable_string_keys() {
            values.push(interp.get_property_value(&Value::Object(o.clone()), &Key::str(k))?);
        }
        Ok(Value::Object(crate::runtime::object::Object::new_array(Some(interp.array_proto.clone()), values)))
    }));
    method(interp, ctor_obj, "entries", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.entries called on non-object"));
        };
        let mut entries = Vec::new();
        for k in o.own_enumerable_string_keys() {
            let v = interp.get_property_value(&Value::Object(o.clone()), &Key::str(k.clone()))?;
            let pair = crate::runtime::object::Object::new_array(
                Some(interp.array_proto.clone()),
                vec![Value::string(k), v],
            );
            entries.push(Value::Object(pair));
        }
        Ok(Value::Object(crate::runtime::object::Object::new_array(Some(interp.array_proto.clone()), entries)))
    }));
    method(interp, ctor_obj, "assign", 2, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(target) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.assign target must be an object"));
        };
        for source in args.iter().skip(1) {
            let Value::Object(src) = source else { continue };
            for k in src.own_enumerable_string_keys() {
                let v = interp.get_property_value(source, &Key::str(k.clone()))?;
                interp.set_property_value(&Value::Object(target.clone()), Key::str(k), v)?;
            }
        }
        Ok(Value::Object(target))
    }));
    method(interp, ctor_obj, "create", 2, std::rc::Rc::new(|interp, _this, args| {
        let proto = match arg(args, 0) {
            Value::Object(p) => Some(p),
            Value::Null => None,
            _ => return Err(interp.throw(ErrorKind::TypeError, "Object prototype may only be an Object or null")),
        };
        let obj = crate::runtime::object::Object::new(OType::Ordinary, proto);
        if let Value::Object(descriptors) = arg(args, 1) {
            apply_descriptors(interp, &obj, &descriptors)?;
        }
        Ok(Value::Object(obj))
    }));
    method(interp, ctor_obj, "defineProperty", 3, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.defineProperty called on non-object"));
        };
        let key = interp.to_property_key(&arg(args, 1))?;
        let descriptor = arg(args, 2);
        define_one(interp, &o, key, &descriptor)?;
        Ok(Value::Object(o))
    }));
    method(interp, ctor_obj, "defineProperties", 2, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.defineProperties called on non-object"));
        };
        if let Value::Object(descriptors) = arg(args, 1) {
            apply_descriptors(interp, &o, &descriptors)?;
        }
        Ok(Value::Object(o))
    }));
    method(interp, ctor_obj, "getOwnPropertyDescriptor", 2, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else { return Ok(Value::Undefined) };
        let key = interp.to_property_key(&arg(args, 1))?;
        Ok(match o.get_own(&key) {
            Some(p) => Value::Object(descriptor_to_object(interp, &p)),
            None => Value::Undefined,
        })
    }));
    method(interp, ctor_obj, "getOwnPropertyNames", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.getOwnPropertyNames called on non-object"));
        };
        let names: Vec<Value> = o
            .own_keys_ordered()
            .into_iter()
            .filter_map(|k| k.as_str().map(|s| Value::string(s.to_string())))
            .collect();
        Ok(Value::Object(crate::runtime::object::Object::new_array(Some(interp.array_proto.clone()), names)))
    }));
    method(interp, ctor_obj, "getPrototypeOf", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.getPrototypeOf called on non-object"));
        };
        Ok(o.prototype().map(Value::Object).unwrap_or(Value::Null))
    }));
    method(interp, ctor_obj, "setPrototypeOf", 2, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Object.setPrototypeOf called on non-object"));
        };
        match arg(args, 1) {
            Value::Object(p) => o.set_prototype(Some(p)),
            Value::Null => o.set_prototype(None),
            _ => {}
        }
        Ok(Value::Object(o))
    }));
    method(interp, ctor_obj, "freeze", 1, std::rc::Rc::new(|_interp, _this, args| {
        if let Value::Object(o) = arg(args, 0) {
            o.prevent_extensions();
            for key in o.own_keys_ordered() {
                if let Some(mut p) = o.get_own(&key) {
                    p.configurable = false;
                    if let PropertyKind::Data { writable, .. } = &mut p.kind {
                        *writable = false;
                    }
                    o.set_own(key, p);
                }
            }
            Ok(Value::Object(o))
        } else {
            Ok(arg(args, 0))
        }
    }));
    method(interp, ctor_obj, "seal", 1, std::rc::Rc::new(|_interp, _this, args| {
        if let Value::Object(o) = arg(args, 0) {
            o.prevent_extensions();
            for key in o.own_keys_ordered() {
                if let Some(mut p) = o.get_own(&key) {
                    p.configurable = false;
                    o.set_own(key, p);
                }
            }
            Ok(Value::Object(o))
        } else {
            Ok(arg(args, 0))
        }
    }));
    method(interp, ctor_obj, "isFrozen", 1, std::rc::Rc::new(|_interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else { return Ok(Value::Boolean(true)) };
        if o.is_extensible() {
            return Ok(Value::Boolean(false));
        }
        let frozen = o.own_keys_ordered().into_iter().all(|key| {
            o.get_own(&key).map_or(true, |p| {
                !p.configurable
                    && match p.kind {
                        PropertyKind::Data { writable, .. } => !writable,
                        PropertyKind::Accessor { .. } => true,
                    }
            })
        });
        Ok(Value::Boolean(frozen))
    }));
    method(interp, ctor_obj, "isSealed", 1, std::rc::Rc::new(|_interp, _this, args| {
        let Value::Object(o) = arg(args, 0) else { return Ok(Value::Boolean(true)) };
        if o.is_extensible() {
            return Ok(Value::Boolean(false));
        }
        let sealed = o
            .own_keys_ordered()
            .into_iter()
            .all(|key| o.get_own(&key).map_or(true, |p| !p.configurable));
        Ok(Value::Boolean(sealed))
    }));
    method(interp, ctor_obj, "is", 2, std::rc::Rc::new(|_interp, _this, args| {
        Ok(Value::Boolean(arg(args, 0).same_value(&arg(args, 1))))
    }));

    interp.global.declare_var("Object", ctor);
}

fn apply_descriptors(
    interp: &mut Interpreter,
    obj: &crate::runtime::object::Object,
    descriptors: &crate::runtime::object::Object,
) -> Result<(), Value> {
    for k in descriptors.own_enumerable_string_keys() {
        let descriptor = interp.get_property_value(&Value::Object(descriptors.clone()), &Key::str(k.clone()))?;
        define_one(interp, obj, Key::str(k), &descriptor)?;
    }
    Ok(())
}

fn define_one(
    interp: &mut Interpreter,
    obj: &crate::runtime::object::Object,
    key: Key,
    descriptor: &Value,
) -> Result<(), Value> {
    let Value::Object(d) = descriptor else {
        return Err(interp.throw(ErrorKind::TypeError, "Property description must be an object"));
    };
    let existing = obj.get_own(&key);
    let mut specified = AttrsSpecified::default();
    let has = |name: &str| d.has_property(&Key::str(name));

    let mut enumerable = existing.as_ref().map_or(false, |p| p.enumerable);
    if has("enumerable") {
        enumerable = interp.get_property_value(descriptor, &Key::str("enumerable"))?.to_boolean();
        specified.enumerable = true;
    }
    let mut configurable = existing.as_ref().map_or(false, |p| p.configurable);
    if has("configurable") {
        configurable = interp.get_property_value(descriptor, &Key::str("configurable"))?.to_boolean();
        specified.configurable = true;
    }

    let is_accessor_descriptor = has("get") || has("set");
    let kind = if is_accessor_descriptor {
        let get = match interp.get_property_value(descriptor, &Key::str("get"))? {
            Value::Object(f) if f.is_callable() => Some(f),
            _ => None,
        };
        let set = match interp.get_property_value(descriptor, &Key::str("set"))? {
            Value::Object(f) if f.is_callable() => Some(f),
            _ => None,
        };
        specified.get = has("get");
        specified.set = has("set");
        PropertyKind::Accessor { get, set }
    } else {
        let value = if has("value") {
            specified.value = true;
            interp.get_property_value(descriptor, &Key::str("value"))?
        } else {
            existing.as_ref().and_then(Property::get_value).unwrap_or(Value::Undefined)
        };
        let mut writable = existing.as_ref().is_some_and(|p| matches!(p.kind, PropertyKind::Data { writable: true, .. }));
        if has("writable") {
            writable = interp.get_property_value(descriptor, &Key::str("writable"))?.to_boolean();
            specified.writable = true;
        }
        PropertyKind::Data { value, writable }
    };

    obj.set_own(
        key,
        Property {
            kind,
            enumerable,
            configurable,
            specified,
        },
    );
    Ok(())
}

fn descriptor_to_object(interp: &mut Interpreter, p: &Property) -> crate::runtime::object::Object {
    let d = crate::runtime::object::Object::new(OType::Ordinary, Some(interp.object_proto.clone()));
    match &p.kind {
        PropertyKind::Data { value, writable } => {
            d.set_own(Key::str("value"), Property::value(value.clone()));
            d.set_own(Key::str("writable"), Property::value(Value::Boolean(*writable)));
        }
        PropertyKind::Accessor { get, set } => {
            d.set_own(Key::str("get"), Property::value(get.clone().map(Value::Object).unwrap_or(Value::Undefined)));
            d.set_own(Key::str("set"), Property::value(set.clone().map(Value::Object).unwrap_or(Value::Undefined)));
        }
    }
    d.set_own(Key::str("enumerable"), Property::value(Value::Boolean(p.enumerable)));
    d.set_own(Key::str("configurable"), Property::value(Value::Boolean(p.configurable)));
    d
}
