//! Function model: creation, invocation, `new`, and `Function.prototype.bind`
//! (spec.md §4.3.4).

use std::rc::Rc;

use crate::error::ErrorKind;
use crate::frontend::ast::{FunctionBody, FunctionNode, Pattern};
use crate::runtime::environment::{BindingKind, Environment};
use crate::runtime::object::{Callable, Key, NativeFn, Object, OType, Property, Slot, UserFunction};
use crate::runtime::value::Value;

use super::{Interpreter, Signal};

impl Interpreter {
    /// Build a function Object from an AST node, capturing `env` as its
    /// closure (spec.md §4.3.4).
    pub fn make_function(&mut self, node: &FunctionNode, env: &Environment, is_arrow: bool) -> Value {
        let home_object = if is_arrow { env.home_object() } else { None };
        let user_fn = Rc::new(UserFunction {
            node: Rc::new(node.clone()),
            closure: env.clone(),
            is_arrow,
            home_object,
        });
        let func_obj = Object::new(OType::Function, Some(self.function_proto.clone()));
        func_obj.set_call(Callable::User(user_fn.clone()));
        if !is_arrow {
            func_obj.set_construct(Callable::User(user_fn));
            let proto = Object::new(OType::Ordinary, Some(self.object_proto.clone()));
            proto.set_own(
                Key::str("constructor"),
                Property::data(Value::Object(func_obj.clone()), true, false, true),
            );
            func_obj.set_own(
                Key::str("prototype"),
                Property::data(Value::Object(proto), true, false, false),
            );
        }
        let length = node
            .params
            .iter()
            .zip(node.defaults.iter())
            .take_while(|(_, default)| default.is_none())
            .count();
        func_obj.set_own(
            Key::str("length"),
            Property::data(Value::Number(length as f64), false, false, true),
        );
        func_obj.set_own(
            Key::str("name"),
            Property::data(
                Value::string(node.name.clone().unwrap_or_default()),
                false,
                false,
                true,
            ),
        );
        Value::Object(func_obj)
    }

    /// Build a class method/constructor/accessor function, captured with an
    /// explicit `home_object` so `super.x`/`super()` inside its body resolve
    /// against the class's prototype chain rather than the lexical one
    /// (spec.md §4.3.5 "Classes"). Not constructible unless `constructible`.
    pub fn make_method(
        &mut self,
        node: &FunctionNode,
        env: &Environment,
        home_object: Object,
        constructible: bool,
    ) -> Value {
        let user_fn = Rc::new(UserFunction {
            node: Rc::new(node.clone()),
            closure: env.clone(),
            is_arrow: false,
            home_object: Some(home_object),
        });
        let func_obj = Object::new(OType::Function, Some(self.function_proto.clone()));
        func_obj.set_call(Callable::User(user_fn.clone()));
        if constructible {
            func_obj.set_construct(Callable::User(user_fn));
        }
        func_obj.set_own(
            Key::str("length"),
            Property::data(Value::Number(node.params.len() as f64), false, false, true),
        );
        func_obj.set_own(
            Key::str("name"),
            Property::data(
                Value::string(node.name.clone().unwrap_or_default()),
                false,
                false,
                true,
            ),
        );
        Value::Object(func_obj)
    }

    /// Wrap a Rust closure as a callable native function Object (the
    /// `engine.RegisterNative` contract of spec.md §6.1 and the mechanism
    /// `runtime::builtins` uses for every method body).
    pub fn make_native(&self, name: &str, length: usize, f: NativeFn) -> Value {
        let obj = Object::new(OType::Function, Some(self.function_proto.clone()));
        obj.set_call(Callable::Native(f));
        obj.set_own(
            Key::str("name"),
            Property::data(Value::string(name), false, false, true),
        );
        obj.set_own(
            Key::str("length"),
            Property::data(Value::Number(length as f64), false, false, true),
        );
        Value::Object(obj)
    }

    /// Invoke `callee` as a function call (not `new`). `this_val` is the
    /// receiver computed by the call-site (spec.md §4.3.3 "Call").
    pub fn call_function(
        &mut self,
        callee: &Object,
        this_val: Value,
        args: &[Value],
    ) -> Result<Value, Value> {
        let Some(callable) = callee.call_callable() else {
            return Err(self.throw(ErrorKind::TypeError, "value is not a function"));
        };
        self.invoke_callable(&callable, this_val, args, None)
    }

    fn invoke_callable(
        &mut self,
        callable: &Callable,
        this_val: Value,
        args: &[Value],
        new_target: Option<&Object>,
    ) -> Result<Value, Value> {
        match callable {
            Callable::Native(f) => f(self, this_val, args),
            Callable::User(user) => {
                if user.is_arrow {
                    return self.call_user_function(user, None, args, new_target);
                }
                self.call_user_function(user, Some(this_val), args, new_target)
            }
        }
    }

    fn call_user_function(
        &mut self,
        user: &UserFunction,
        this_val: Option<Value>,
        args: &[Value],
        new_target: Option<&Object>,
    ) -> Result<Value, Value> {
        let env = user.closure.child_function(
            this_val.unwrap_or(Value::Undefined),
            user.home_object.clone(),
            user.is_arrow,
        );
        if !user.is_arrow {
            let arguments = Object::new_array(Some(self.array_proto.clone()), args.to_vec());
            env.declare_var("arguments", Value::Object(arguments));
            if let Some(target) = new_target {
                env.declare_var("new.target", Value::Object(target.clone()));
            }
        }
        self.bind_params(&user.node, &env, args)?;

        match &user.node.body {
            FunctionBody::Expression(expr) => self.eval_expression(expr, &env),
            FunctionBody::Block(body) => {
                let hoist = crate::runtime::hoist::hoist(body);
                self.install_hoisted(&env, &hoist)?;
                self.run_annex_b(&env, body);
                for stmt in body {
                    let (_, signal) = self.exec_statement(stmt, &env);
                    match signal {
                        Signal::None => {}
                        Signal::Return(v) => return Ok(v),
                        Signal::Throw(v) => return Err(v),
                        Signal::Break(_) | Signal::Continue(_) => {
                            return Err(self.throw(
                                ErrorKind::SyntaxError,
                                "Illegal break/continue statement",
                            ));
                        }
                    }
                }
                Ok(Value::Undefined)
            }
        }
    }

    fn bind_params(
        &mut self,
        node: &FunctionNode,
        env: &Environment,
        args: &[Value],
    ) -> Result<(), Value> {
        for (i, pattern) in node.params.iter().enumerate() {
            let mut value = args.get(i).cloned().unwrap_or(Value::Undefined);
            if matches!(value, Value::Undefined) {
                if let Some(Some(default)) = node.defaults.get(i) {
                    value = self.eval_expression(default, env)?;
                }
            }
            self.bind_pattern(pattern, value, env, BindingKind::Param)?;
        }
        if let Some(rest) = &node.rest {
            let rest_values = if args.len() > node.params.len() {
                args[node.params.len()..].to_vec()
            } else {
                Vec::new()
            };
            let arr = Object::new_array(Some(self.array_proto.clone()), rest_values);
            self.bind_pattern(rest, Value::Object(arr), env, BindingKind::Param)?;
        }
        Ok(())
    }

    /// Destructure `value` into `pattern`, declaring bindings of `kind` in
    /// `env` (spec.md §4.2.2 "Destructuring patterns").
    pub fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Environment,
        kind: BindingKind,
    ) -> Result<(), Value> {
        match pattern {
            Pattern::Identifier(name, _) => {
                env.declare(name, kind, value)
                    .map_err(|e| self.make_error(e.kind, e.message))?;
            }
            Pattern::Assignment(inner, default, _) => {
                let value = if matches!(value, Value::Undefined) {
                    self.eval_expression(default, env)?
                } else {
                    value
                };
                self.bind_pattern(inner, value, env, kind)?;
            }
            Pattern::Rest(inner, _) => {
                self.bind_pattern(inner, value, env, kind)?;
            }
            Pattern::Array(elements, _) => {
                let items = self.iterate_to_vec(&value)?;
                for (i, el) in elements.iter().enumerate() {
                    match el {
                        None => {}
                        Some(Pattern::Rest(inner, _)) => {
                            let rest: Vec<Value> = items.get(i..).map(<[Value]>::to_vec).unwrap_or_default();
                            let arr = Object::new_array(Some(self.array_proto.clone()), rest);
                            self.bind_pattern(inner, Value::Object(arr), env, kind)?;
                        }
                        Some(p) => {
                            let v = items.get(i).cloned().unwrap_or(Value::Undefined);
                            self.bind_pattern(p, v, env, kind)?;
                        }
                    }
                }
            }
            Pattern::Object(entries, _) => {
                for entry in entries {
                    let key = self.property_key_value(&entry.key, env)?;
                    let v = self.get_property_value(&value, &key)?;
                    self.bind_pattern(&entry.value, v, env, kind)?;
                }
            }
        }
        Ok(())
    }

    /// `new Callee(args)` (spec.md §4.3.3 "New").
    pub fn construct(&mut self, callee: &Object, args: &[Value]) -> Result<Value, Value> {
        let Some(callable) = callee.construct_callable() else {
            return Err(self.throw(ErrorKind::TypeError, "value is not a constructor"));
        };
        if let Callable::Native(f) = &callable {
            return f(self, Value::Undefined, args);
        }
        let proto = match callee.get_own(&Key::str("prototype")).and_then(|p| p.get_value()) {
            Some(Value::Object(p)) => Some(p),
            _ => Some(self.object_proto.clone()),
        };
        let instance = Object::new(OType::Ordinary, proto);
        let this_val = Value::Object(instance.clone());
        let result = self.invoke_callable(&callable, this_val, args, Some(callee))?;
        match result {
            Value::Object(o) => Ok(Value::Object(o)),
            _ => Ok(Value::Object(instance)),
        }
    }

    /// `Function.prototype.bind` (spec.md §4.3.4 "Bound functions").
    pub fn make_bound_function(&self, target: Object, this_arg: Value, bound_args: Vec<Value>) -> Value {
        let obj = Object::new(OType::Function, Some(self.function_proto.clone()));
        obj.set_slot(
            "bound",
            Slot::BoundData {
                target: target.clone(),
                this_arg: this_arg.clone(),
                args: bound_args.clone(),
            },
        );
        let call_target = target.clone();
        let call_this = this_arg.clone();
        let call_bound = bound_args.clone();
        obj.set_call(Callable::Native(Rc::new(move |interp, _this, args| {
            let mut full = call_bound.clone();
            full.extend_from_slice(args);
            interp.call_function(&call_target, call_this.clone(), &full)
        })));
        if target.construct_callable().is_some() {
            let ctor_target = target.clone();
            let ctor_bound = bound_args.clone();
            obj.set_construct(Callable::Native(Rc::new(move |interp, _this, args| {
                let mut full = ctor_bound.clone();
                full.extend_from_slice(args);
                interp.construct(&ctor_target, &full)
            })));
        }
        obj.set_own(
            Key::str("name"),
            Property::data(Value::string("bound function"), false, false, true),
        );
        Value::Object(obj)
    }
}
