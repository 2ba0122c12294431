//! `Promise` (spec.md §6.2, §5 "synchronous settling"): no event loop or
//! microtask queue backs this engine, so a promise settles the moment
//! `resolve`/`reject` runs and `.then`/`.catch`/`.finally` callbacks fire
//! immediately rather than being deferred to a queued turn.

use crate::error::ErrorKind;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Object, OType, PromiseState, Slot};
use crate::runtime::value::Value;

use super::{arg, define_value, method};

fn promise_state(o: &Object) -> PromiseState {
    match o.get_slot("promise") {
        Some(Slot::Promise { state, .. }) => state,
        _ => PromiseState::Pending,
    }
}

/// Settle `promise` and fire any callbacks queued by `.then` while it was
/// pending (there can be queued callbacks even under synchronous settling,
/// since `.then` may run before the executor calls `resolve`/`reject` if
/// the executor itself stashes the resolver for later).
fn settle(interp: &mut Interpreter, promise: &Object, state: PromiseState) -> Result<(), Value> {
    if !matches!(promise_state(promise), PromiseState::Pending) {
        return Ok(());
    }
    let (on_fulfill, on_reject) = match promise.get_slot("promise") {
        Some(Slot::Promise { on_fulfill, on_reject, .. }) => (on_fulfill, on_reject),
        _ => (Vec::new(), Vec::new()),
    };
    promise.set_slot(
        "promise",
        Slot::Promise { state: state.clone(), on_fulfill: Vec::new(), on_reject: Vec::new() },
    );
    match state {
        PromiseState::Fulfilled(value) => {
            for cb in on_fulfill {
                interp.call_function(&cb, Value::Undefined, &[value.clone()])?;
            }
        }
        PromiseState::Rejected(reason) => {
            for cb in on_reject {
                interp.call_function(&cb, Value::Undefined, &[reason.clone()])?;
            }
        }
        PromiseState::Pending => {}
    }
    Ok(())
}

fn new_promise(interp: &Interpreter) -> Object {
    let obj = Object::new(OType::Promise, Some(interp.promise_proto.clone()));
    obj.set_slot(
        "promise",
        Slot::Promise { state: PromiseState::Pending, on_fulfill: Vec::new(), on_reject: Vec::new() },
    );
    obj
}

/// Resolve `promise` with `value`; if `value` is itself a thenable, chains
/// through its `.then` instead of wrapping it (spec.md §6.2 "Promise
/// resolution procedure").
fn resolve_promise(interp: &mut Interpreter, promise: &Object, value: Value) -> Result<(), Value> {
    if let Value::Object(inner) = &value {
        if inner.ptr_eq(promise) {
            let err = interp.throw(ErrorKind::TypeError, "Chaining cycle detected for promise");
            return settle(interp, promise, PromiseState::Rejected(err));
        }
        let then = interp.get_property_value(&value, &crate::runtime::object::Key::str("then"))?;
        if let Value::Object(then_fn) = &then {
            if then_fn.is_callable() {
                let promise_clone = promise.clone();
                let promise_clone2 = promise.clone();
                let on_fulfill = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
                    resolve_promise(interp, &promise_clone, arg(args, 0))?;
                    Ok(Value::Undefined)
                }));
                let on_reject = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
                    settle(interp, &promise_clone2, PromiseState::Rejected(arg(args, 0)))?;
                    Ok(Value::Undefined)
                }));
                return interp.call_function(then_fn, value, &[on_fulfill, on_reject]).map(|_| ());
            }
        }
    }
    settle(interp, promise, PromiseState::Fulfilled(value))
}

fn this_promise(interp: &mut Interpreter, this: &Value, label: &str) -> Result<Object, Value> {
    match this {
        Value::Object(o) if o.otype() == OType::Promise => Ok(o.clone()),
        _ => Err(interp.throw(ErrorKind::TypeError, format!("Method Promise.prototype.{label} called on incompatible receiver"))),
    }
}

fn then_impl(interp: &mut Interpreter, this: &Value, on_fulfilled: Value, on_rejected: Value) -> Result<Value, Value> {
    let source = this_promise(interp, this, "then")?;
    let result = new_promise(interp);
    let result_fulfill = result.clone();
    let result_reject = result.clone();

    let fulfill_handler = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
        let value = arg(args, 0);
        match &on_fulfilled {
            Value::Object(f) if f.is_callable() => match interp.call_function(f, Value::Undefined, &[value]) {
                Ok(v) => resolve_promise(interp, &result_fulfill, v).map(|()| Value::Undefined),
                Err(e) => settle(interp, &result_fulfill, PromiseState::Rejected(e)).map(|()| Value::Undefined),
            },
            _ => resolve_promise(interp, &result_fulfill, value).map(|()| Value::Undefined),
        }
    }));
    let reject_handler = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
        let reason = arg(args, 0);
        match &on_rejected {
            Value::Object(f) if f.is_callable() => match interp.call_function(f, Value::Undefined, &[reason]) {
                Ok(v) => resolve_promise(interp, &result_reject, v).map(|()| Value::Undefined),
                Err(e) => settle(interp, &result_reject, PromiseState::Rejected(e)).map(|()| Value::Undefined),
            },
            _ => settle(interp, &result_reject, PromiseState::Rejected(reason)).map(|()| Value::Undefined),
        }
    }));

    let Value::Object(fulfill_obj) = &fulfill_handler else { unreachable!() };
    let Value::Object(reject_obj) = &reject_handler else { unreachable!() };

    match promise_state(&source) {
        PromiseState::Fulfilled(value) => {
            interp.call_function(fulfill_obj, Value::Undefined, &[value])?;
        }
        PromiseState::Rejected(reason) => {
            interp.call_function(reject_obj, Value::Undefined, &[reason])?;
        }
        PromiseState::Pending => {
            if let Some(Slot::Promise { state, mut on_fulfill, mut on_reject }) = source.get_slot("promise") {
                on_fulfill.push(fulfill_obj.clone());
                on_reject.push(reject_obj.clone());
                source.set_slot("promise", Slot::Promise { state, on_fulfill, on_reject });
            }
        }
    }

    Ok(Value::Object(result))
}

pub fn install(interp: &mut Interpreter) {
    let proto = interp.promise_proto.clone();

    method(interp, &proto, "then", 2, std::rc::Rc::new(|interp, this, args| {
        then_impl(interp, &this, arg(args, 0), arg(args, 1))
    }));
    method(interp, &proto, "catch", 1, std::rc::Rc::new(|interp, this, args| {
        then_impl(interp, &this, Value::Undefined, arg(args, 0))
    }));
    method(interp, &proto, "finally", 1, std::rc::Rc::new(|interp, this, args| {
        let on_finally = arg(args, 0);
        let on_finally2 = on_finally.clone();
        let run_then = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
            if let Value::Object(f) = &on_finally {
                if f.is_callable() {
                    interp.call_function(f, Value::Undefined, &[])?;
                }
            }
            Ok(arg(args, 0))
        }));
        let run_catch = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
            if let Value::Object(f) = &on_finally2 {
                if f.is_callable() {
                    interp.call_function(f, Value::Undefined, &[])?;
                }
            }
            Err(arg(args, 0))
        }));
        then_impl(interp, &this, run_then, run_catch)
    }));

    let ctor = interp.make_native("Promise", 1, std::rc::Rc::new(|interp, _this, args| {
        let Value::Object(executor) = arg(args, 0) else {
            return Err(interp.throw(ErrorKind::TypeError, "Promise resolver is not a function"));
        };
        if !executor.is_callable() {
            return Err(interp.throw(ErrorKind::TypeError, "Promise resolver is not a function"));
        }
        let promise = new_promise(interp);
        let resolve_target = promise.clone();
        let reject_target = promise.clone();
        let resolve_fn = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
            resolve_promise(interp, &resolve_target, arg(args, 0)).map(|()| Value::Undefined)
        }));
        let reject_fn = interp.make_native("", 1, std::rc::Rc::new(move |interp, _this, args| {
            settle(interp, &reject_target, PromiseState::Rejected(arg(args, 0))).map(|()| Value::Undefined)
        }));
        if let Err(e) = interp.call_function(&executor, Value::Undefined, &[resolve_fn, reject_fn]) {
            settle(interp, &promise, PromiseState::Rejected(e))?;
        }
        Ok(Value::Object(promise))
    }));
    let Value::Object(ctor_obj) = &ctor else { unreachable!() };
    define_value(ctor_obj, "prototype", Value::Object(proto.clone()));
    define_value(&proto, "constructor", ctor.clone());

    method(interp, ctor_obj, "resolve", 1, std::rc::Rc::new(|interp, _this, args| {
        let value = arg(args, 0);
        if let Value::Object(o) = &value {
            if o.otype() == OType::Promise {
                return Ok(value);
            }
        }
        let promise = new_promise(interp);
        resolve_promise(interp, &promise, value)?;
        Ok(Value::Object(promise))
    }));
    method(interp, ctor_obj, "reject", 1, std::rc::Rc::new(|interp, _this, args| {
        let promise = new_promise(interp);
        settle(interp, &promise, PromiseState::Rejected(arg(args, 0)))?;
        Ok(Value::Object(promise))
    }));
    method(interp, ctor_obj, "all", 1, std::rc::Rc::new(|interp, _this, args| {
        let items = interp.iterate_to_vec(&arg(args, 0))?;
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let settled = await_sync(&item);
            match settled {
                Ok(v) => results.push(v),
                Err(e) => {
                    let promise = new_promise(interp);
                    settle(interp, &promise, PromiseState::Rejected(e))?;
                    return Ok(Value::Object(promise));
                }
            }
        }
        let promise = new_promise(interp);
        let array = Object::new_array(Some(interp.array_proto.clone()), results);
        settle(interp, &promise, PromiseState::Fulfilled(Value::Object(array)))?;
        Ok(Value::Object(promise))
    }));
    method(interp, ctor_obj, "allSettled", 1, std::rc::Rc::new(|interp, _this, args| {
        let items = interp.iterate_to_vec(&arg(args, 0))?;
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let entry = Object::new(OType::Ordinary, Some(interp.object_proto.clone()));
            match await_sync(&item) {
                Ok(v) => {
                    define_value(&entry, "status", Value::string("fulfilled"));
                    define_value(&entry, "value", v);
                }
                Err(e) => {
                    define_value(&entry, "status", Value::string("rejected"));
                    define_value(&entry, "reason", e);
                }
            }
            results.push(Value::Object(entry));
        }
        let promise = new_promise(interp);
        let array = Object::new_array(Some(interp.array_proto.clone()), results);
        settle(interp, &promise, PromiseState::Fulfilled(Value::Object(array)))?;
        Ok(Value::Object(promise))
    }));
    method(interp, ctor_obj, "race", 1, std::rc::Rc::new(|interp, _this, args| {
        let items = interp.iterate_to_vec(&arg(args, 0))?;
        let promise = new_promise(interp);
        if let Some(first) = items.into_iter().next() {
            match await_sync(&first) {
                Ok(v) => settle(interp, &promise, PromiseState::Fulfilled(v))?,
                Err(e) => settle(interp, &promise, PromiseState::Rejected(e))?,
            }
        }
        Ok(Value::Object(promise))
    }));

    interp.global.declare_var("Promise", ctor);
}

/// Read a value already settled (plain values settle instantly since
/// nothing here defers): wraps a non-promise in `Ok`, or unwraps an
/// already-fulfilled/rejected promise's state. A still-pending promise
/// built from callbacks this engine can't drive further resolves as `Ok`
/// with the pending promise itself, matching "only synchronous chains
/// settle" (spec.md §5).
fn await_sync(value: &Value) -> Result<Value, Value> {
    if let Value::Object(o) = value {
        if o.otype() == OType::Promise {
            return match promise_state(o) {
                PromiseState::Fulfilled(v) => Ok(v),
                PromiseState::Rejected(e) => Err(e),
                PromiseState::Pending => Ok(value.clone()),
            };
        }
    }
    Ok(value.clone())
}
