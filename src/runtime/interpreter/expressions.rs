//! Expression evaluation (spec.md §4.3.3).

use crate::error::ErrorKind;
use crate::frontend::ast::{
    AssignOp, BinaryOp, Expr, LogicalOp, ObjectProperty, PropertyKey, UnaryOp, UpdateOp,
};
use crate::runtime::environment::Environment;
use crate::runtime::object::{Key, Object, OType, Property, PropertyKind, Slot};
use crate::runtime::value::{format_number, Value};

use super::Interpreter;

impl Interpreter {
    pub fn eval_expression(&mut self, expr: &Expr, env: &Environment) -> Result<Value, Value> {
        match expr {
            Expr::Identifier { name, .. } => env
                .get(name)
                .map_err(|e| self.make_error(e.kind, e.message)),
            Expr::NumberLiteral { value, .. } => Ok(Value::Number(*value)),
            Expr::StringLiteral { value, .. } => Ok(Value::string(value.clone())),
            Expr::BooleanLiteral { value, .. } => Ok(Value::Boolean(*value)),
            Expr::NullLiteral { .. } => Ok(Value::Null),
            Expr::UndefinedLiteral { .. } => Ok(Value::Undefined),
            Expr::This { .. } => Ok(env.this()),
            Expr::Super { .. } => Ok(Value::Undefined),
            Expr::RegExpLiteral { pattern, flags, .. } => Ok(self.make_regexp(pattern, flags)),
            Expr::ArrayLiteral { elements, .. } => self.eval_array_literal(elements, env),
            Expr::ObjectLiteral { properties, .. } => self.eval_object_literal(properties, env),
            Expr::FunctionExpression { function, .. } => Ok(self.make_function(function, env, false)),
            Expr::ArrowFunctionExpression { function, .. } => {
                Ok(self.make_function(function, env, true))
            }
            Expr::ClassExpression { name, superclass, body, .. } => {
                self.eval_class(name.clone(), superclass.as_deref(), body, env)
            }
            Expr::Unary { op, argument, span: _ } => self.eval_unary(*op, argument, env),
            Expr::Update { op, argument, prefix, .. } => self.eval_update(*op, argument, *prefix, env),
            Expr::Binary { op, left, right, .. } => {
                let l = self.eval_expression(left, env)?;
                let r = self.eval_expression(right, env)?;
                self.apply_binary(*op, &l, &r)
            }
            Expr::Logical { op, left, right, .. } => self.eval_logical(*op, left, right, env),
            Expr::Assignment { op, target, value, .. } => self.eval_assignment(*op, target, value, env),
            Expr::Conditional { test, consequent, alternate, .. } => {
                if self.eval_expression(test, env)?.to_boolean() {
                    self.eval_expression(consequent, env)
                } else {
                    self.eval_expression(alternate, env)
                }
            }
            Expr::Call { callee, arguments, optional, .. } => {
                self.eval_call(callee, arguments, *optional, env)
            }
            Expr::Member { object, property, computed, optional, .. } => {
                let (_, value) = self.eval_member(object, property, *computed, *optional, env)?;
                Ok(value)
            }
            Expr::New { callee, arguments, .. } => {
                let callee_val = self.eval_expression(callee, env)?;
                let args = self.eval_arguments(arguments, env)?;
                match callee_val {
                    Value::Object(o) => self.construct(&o, &args),
                    _ => Err(self.throw(ErrorKind::TypeError, "not a constructor")),
                }
            }
            Expr::Sequence { expressions, .. } => {
                let mut last = Value::Undefined;
                for e in expressions {
                    last = self.eval_expression(e, env)?;
                }
                Ok(last)
            }
            Expr::TemplateLiteral { quasis, expressions, .. } => {
                let mut out = String::new();
                for (i, quasi) in quasis.iter().enumerate() {
                    out.push_str(&quasi.cooked);
                    if let Some(e) = expressions.get(i) {
                        let v = self.eval_expression(e, env)?;
                        out.push_str(&self.to_display_string(&v)?);
                    }
                }
                Ok(Value::string(out))
            }
            Expr::TaggedTemplate { tag, quasi, .. } => self.eval_tagged_template(tag, quasi, env),
            Expr::Spread { argument, .. } => self.eval_expression(argument, env),
            Expr::Yield { argument, .. } => match argument {
                Some(a) => self.eval_expression(a, env),
                None => Ok(Value::Undefined),
            },
            Expr::Await { argument, .. } => self.eval_expression(argument, env),
            Expr::ObjectPattern { .. }
            | Expr::ArrayPattern { .. }
            | Expr::AssignmentPattern { .. }
            | Expr::RestElement { .. } => {
                Err(self.throw(ErrorKind::SyntaxError, "pattern used outside a binding position"))
            }
            Expr::ComputedPropertyName { expr, .. } => self.eval_expression(expr, env),
        }
    }

    fn eval_array_literal(
        &mut self,
        elements: &[Option<Expr>],
        env: &Environment,
    ) -> Result<Value, Value> {
        let mut out = Vec::with_capacity(elements.len());
        for el in elements {
            match el {
                None => out.push(Value::Undefined),
                Some(Expr::Spread { argument, .. }) => {
                    let v = self.eval_expression(argument, env)?;
                    out.extend(self.iterate_to_vec(&v)?);
                }
                Some(e) => out.push(self.eval_expression(e, env)?),
            }
        }
        Ok(Value::Object(Object::new_array(Some(self.array_proto.clone()), out)))
    }

    fn eval_object_literal(
        &mut self,
        properties: &[ObjectProperty],
        env: &Environment,
    ) -> Result<Value, Value> {
        let obj = Object::new(OType::Ordinary, Some(self.object_proto.clone()));
        for prop in properties {
            match prop {
                ObjectProperty::Data { key, value, .. } => {
                    let k = self.property_key_value(key, env)?;
                    let v = self.eval_expression(value, env)?;
                    obj.set_own(k, Property::value(v));
                }
                ObjectProperty::Method { key, kind, function } => {
                    let k = self.property_key_value(key, env)?;
                    let func = self.make_function(function, env, false);
                    use crate::frontend::ast::MethodKind;
                    match kind {
                        MethodKind::Get => {
                            let getter = match &func {
                                Value::Object(o) => o.clone(),
                                _ => unreachable!(),
                            };
                            self.define_accessor(&obj, k, Some(getter), None);
                        }
                        MethodKind::Set => {
                            let setter = match &func {
                                Value::Object(o) => o.clone(),
                                _ => unreachable!(),
                            };
                            self.define_accessor(&obj, k, None, Some(setter));
                        }
                        MethodKind::Method | MethodKind::Constructor => {
                            obj.set_own(k, Property::value(func));
                        }
                    }
                }
                ObjectProperty::Spread(expr) => {
                    let v = self.eval_expression(expr, env)?;
                    if let Value::Object(src) = &v {
                        for key in src.own_keys_ordered() {
                            if let Some(p) = src.get_own(&key) {
                                if p.enumerable {
                                    let value = self.get_property_value(&v, &key)?;
                                    obj.set_own(key, Property::value(value));
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(Value::Object(obj))
    }

    pub(super) fn define_accessor(&self, obj: &Object, key: Key, get: Option<Object>, set: Option<Object>) {
        if let Some(existing) = obj.get_own(&key) {
            if let PropertyKind::Accessor { get: g, set: s } = existing.kind {
                let new_get = get.or(g);
                let new_set = set.or(s);
                obj.set_own(
                    key,
                    Property {
                        kind: PropertyKind::Accessor { get: new_get, set: new_set },
                        enumerable: true,
                        configurable: true,
                        specified: Default::default(),
                    },
                );
                return;
            }
        }
        obj.set_own(
            key,
            Property {
                kind: PropertyKind::Accessor { get, set },
                enumerable: true,
                configurable: true,
                specified: Default::default(),
            },
        );
    }

    pub fn property_key_value(&mut self, key: &PropertyKey, env: &Environment) -> Result<Key, Value> {
        if key.computed {
            let v = self.eval_expression(&key.expr, env)?;
            self.to_property_key(&v)
        } else {
            match &key.expr {
                Expr::Identifier { name, .. } => Ok(Key::str(name.clone())),
                Expr::StringLiteral { value, .. } => Ok(Key::str(value.clone())),
                Expr::NumberLiteral { value, .. } => Ok(Key::str(format_number(*value))),
                other => {
                    let v = self.eval_expression(other, env)?;
                    self.to_property_key(&v)
                }
            }
        }
    }

    pub fn to_property_key(&mut self, value: &Value) -> Result<Key, Value> {
        match value {
            Value::Symbol(s) => Ok(Key::Symbol(s.clone())),
            other => Ok(Key::str(self.to_display_string(other)?)),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, argument: &Expr, env: &Environment) -> Result<Value, Value> {
        if op == UnaryOp::Typeof {
            if let Expr::Identifier { name, .. } = argument {
                return Ok(match env.get(name) {
                    Ok(v) => Value::string(v.type_of()),
                    Err(_) => Value::string("undefined"),
                });
            }
        }
        if op == UnaryOp::Delete {
            if let Expr::Member { object, property, computed, .. } = argument {
                let obj_val = self.eval_expression(object, env)?;
                let key = self.member_key(property, *computed, env)?;
                if let Value::Object(o) = obj_val {
                    return Ok(Value::Boolean(o.delete_own(&key)));
                }
                return Ok(Value::Boolean(true));
            }
            return Ok(Value::Boolean(true));
        }
        let v = self.eval_expression(argument, env)?;
        Ok(match op {
            UnaryOp::Minus => Value::Number(-self.to_number(&v)?),
            UnaryOp::Plus => Value::Number(self.to_number(&v)?),
            UnaryOp::Not => Value::Boolean(!v.to_boolean()),
            UnaryOp::BitNot => Value::Number(!(to_i32(self.to_number(&v)?)) as f64),
            UnaryOp::Void => Value::Undefined,
            UnaryOp::Typeof => Value::string(v.type_of()),
            UnaryOp::Delete => unreachable!(),
        })
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        argument: &Expr,
        prefix: bool,
        env: &Environment,
    ) -> Result<Value, Value> {
        let old = self.eval_expression(argument, env)?;
        let old_num = self.to_number(&old)?;
        let new_num = match op {
            UpdateOp::Increment => old_num + 1.0,
            UpdateOp::Decrement => old_num - 1.0,
        };
        self.assign_to_target(argument, Value::Number(new_num), env)?;
        Ok(Value::Number(if prefix { new_num } else { old_num }))
    }

    fn eval_logical(
        &mut self,
        op: LogicalOp,
        left: &Expr,
        right: &Expr,
        env: &Environment,
    ) -> Result<Value, Value> {
        let l = self.eval_expression(left, env)?;
        match op {
            LogicalOp::And => {
                if l.to_boolean() {
                    self.eval_expression(right, env)
                } else {
                    Ok(l)
                }
            }
            LogicalOp::Or => {
                if l.to_boolean() {
                    Ok(l)
                } else {
                    self.eval_expression(right, env)
                }
            }
            LogicalOp::Nullish => {
                if l.is_nullish() {
                    self.eval_expression(right, env)
                } else {
                    Ok(l)
                }
            }
        }
    }

    fn eval_assignment(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        env: &Environment,
    ) -> Result<Value, Value> {
        let new_value = match op {
            AssignOp::Assign => {
                if is_pattern_like(target) {
                    let v = self.eval_expression(value, env)?;
                    self.destructure_assign(target, v.clone(), env)?;
                    return Ok(v);
                }
                self.eval_expression(value, env)?
            }
            AssignOp::Compound(bin_op) => {
                let current = self.eval_expression(target, env)?;
                let rhs = self.eval_expression(value, env)?;
                self.apply_binary(bin_op, &current, &rhs)?
            }
            AssignOp::LogicalCompound(logical_op) => {
                let current = self.eval_expression(target, env)?;
                match logical_op {
                    LogicalOp::And => {
                        if !current.to_boolean() {
                            return Ok(current);
                        }
                        self.eval_expression(value, env)?
                    }
                    LogicalOp::Or => {
                        if current.to_boolean() {
                            return Ok(current);
                        }
                        self.eval_expression(value, env)?
                    }
                    LogicalOp::Nullish => {
                        if !current.is_nullish() {
                            return Ok(current);
                        }
                        self.eval_expression(value, env)?
                    }
                }
            }
        };
        self.assign_to_target(target, new_value.clone(), env)?;
        Ok(new_value)
    }

    fn assign_to_target(&mut self, target: &Expr, value: Value, env: &Environment) -> Result<(), Value> {
        match target {
            Expr::Identifier { name, .. } => {
                if !env.has(name) {
                    env.declare_var(name, value);
                    return Ok(());
                }
                env.set(name, value).map_err(|e| self.make_error(e.kind, e.message))
            }
            Expr::Member { object, property, computed, .. } => {
                let obj_val = self.eval_expression(object, env)?;
                let key = self.member_key(property, *computed, env)?;
                self.set_property_value(&obj_val, key, value)
            }
            _ => Err(self.throw(ErrorKind::SyntaxError, "invalid assignment target")),
        }
    }

    fn member_key(&mut self, property: &Expr, computed: bool, env: &Environment) -> Result<Key, Value> {
        if computed {
            let v = self.eval_expression(property, env)?;
            self.to_property_key(&v)
        } else if let Expr::Identifier { name, .. } = property {
            Ok(Key::str(name.clone()))
        } else {
            let v = self.eval_expression(property, env)?;
            self.to_property_key(&v)
        }
    }

    /// Evaluate `object.property` / `object[property]`, returning both the
    /// resolved base object (for `this`-binding on calls) and the value
    /// (spec.md §4.3.3 "Member access").
    pub fn eval_member(
        &mut self,
        object: &Expr,
        property: &Expr,
        computed: bool,
        optional: bool,
        env: &Environment,
    ) -> Result<(Value, Value), Value> {
        let obj_val = if matches!(object, Expr::Super { .. }) {
            env.this()
        } else {
            self.eval_expression(object, env)?
        };
        if optional && obj_val.is_nullish() {
            return Ok((Value::Undefined, Value::Undefined));
        }
        if obj_val.is_nullish() {
            let name = if computed {
                "property".to_string()
            } else if let Expr::Identifier { name, .. } = property {
                name.clone()
            } else {
                "property".to_string()
            };
            return Err(self.throw(
                ErrorKind::TypeError,
                format!("Cannot read properties of {} (reading '{name}')", obj_val),
            ));
        }
        if matches!(object, Expr::Super { .. }) {
            let home = env.home_object();
            let proto = home.and_then(|h| h.prototype());
            let key = self.member_key(property, computed, env)?;
            let value = match proto {
                Some(p) => self.get_property_value_with_receiver(&Value::Object(p), &key, &obj_val)?,
                None => Value::Undefined,
            };
            return Ok((obj_val, value));
        }
        let key = self.member_key(property, computed, env)?;
        let value = self.get_property_value(&obj_val, &key)?;
        Ok((obj_val, value))
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        arguments: &[Expr],
        optional: bool,
        env: &Environment,
    ) -> Result<Value, Value> {
        if let Expr::Member { object, property, computed, optional: member_opt, .. } = callee {
            let (this_val, func_val) =
                self.eval_member(object, property, *computed, *member_opt, env)?;
            if (*member_opt || optional) && func_val.is_nullish() {
                return Ok(Value::Undefined);
            }
            let args = self.eval_arguments(arguments, env)?;
            return match func_val {
                Value::Object(o) => self.call_function(&o, this_val, &args),
                _ => Err(self.throw(ErrorKind::TypeError, "callee is not a function")),
            };
        }

        if let Expr::Identifier { name, .. } = callee {
            if name == "eval" {
                if let Ok(Value::Object(o)) = env.get(name) {
                    if o.ptr_eq(&self.eval_marker) {
                        let args = self.eval_arguments(arguments, env)?;
                        return self.direct_eval(&args, env);
                    }
                }
            }
        }

        if matches!(callee, Expr::Super { .. }) {
            let args = self.eval_arguments(arguments, env)?;
            return self.call_super_constructor(env, &args);
        }

        let func_val = self.eval_expression(callee, env)?;
        if optional && func_val.is_nullish() {
            return Ok(Value::Undefined);
        }
        let args = self.eval_arguments(arguments, env)?;
        match func_val {
            Value::Object(o) => self.call_function(&o, Value::Undefined, &args),
            _ => Err(self.throw(ErrorKind::TypeError, "callee is not a function")),
        }
    }

    /// `super(...)` inside a derived class constructor. Resolves the
    /// superclass constructor off the current method's home object
    /// (`proto.constructor`'s prototype's `.constructor`), since no
    /// separate "active function object" slot is tracked (spec.md §4.3.5
    /// "super calls").
    fn call_super_constructor(&mut self, env: &Environment, args: &[Value]) -> Result<Value, Value> {
        let this_val = env.this();
        let home = env
            .home_object()
            .ok_or_else(|| self.throw(ErrorKind::SyntaxError, "'super' keyword is only valid inside a class"))?;
        let super_proto = home
            .prototype()
            .ok_or_else(|| self.throw(ErrorKind::TypeError, "class has no superclass"))?;
        let super_ctor = match super_proto.get_own(&Key::str("constructor")).and_then(|p| p.get_value()) {
            Some(Value::Object(o)) => o,
            _ => return Err(self.throw(ErrorKind::TypeError, "super constructor is not callable")),
        };
        match super_ctor.call_callable() {
            Some(crate::runtime::object::Callable::Native(_)) => {
                let built = self.construct(&super_ctor, args)?;
                if let (Value::Object(src), Value::Object(dst)) = (&built, &this_val) {
                    for key in src.own_keys_ordered() {
                        if let Some(prop) = src.get_own(&key) {
                            dst.set_own(key, prop);
                        }
                    }
                }
                Ok(Value::Undefined)
            }
            Some(crate::runtime::object::Callable::User(_)) => {
                self.call_function(&super_ctor, this_val, args)
            }
            None => Err(self.throw(ErrorKind::TypeError, "super constructor is not callable")),
        }
    }

    fn eval_arguments(&mut self, arguments: &[Expr], env: &Environment) -> Result<Vec<Value>, Value> {
        let mut out = Vec::with_capacity(arguments.len());
        for arg in arguments {
            match arg {
                Expr::Spread { argument, .. } => {
                    let v = self.eval_expression(argument, env)?;
                    out.extend(self.iterate_to_vec(&v)?);
                }
                other => out.push(self.eval_expression(other, env)?),
            }
        }
        Ok(out)
    }

    fn eval_tagged_template(&mut self, tag: &Expr, quasi: &Expr, env: &Environment) -> Result<Value, Value> {
        let Expr::TemplateLiteral { quasis, expressions, .. } = quasi else {
            return Err(self.throw(ErrorKind::SyntaxError, "invalid tagged template"));
        };
        let strings: Vec<Value> = quasis.iter().map(|q| Value::string(q.cooked.clone())).collect();
        let raw: Vec<Value> = quasis.iter().map(|q| Value::string(q.raw.clone())).collect();
        let strings_arr = Object::new_array(Some(self.array_proto.clone()), strings);
        let raw_arr = Object::new_array(Some(self.array_proto.clone()), raw);
        strings_arr.set_own(Key::str("raw"), Property::value(Value::Object(raw_arr)));
        let mut args = vec![Value::Object(strings_arr)];
        for e in expressions {
            args.push(self.eval_expression(e, env)?);
        }
        let (this_val, func_val) = if let Expr::Member { object, property, computed, optional, .. } = tag {
            self.eval_member(object, property, *computed, *optional, env)?
        } else {
            (Value::Undefined, self.eval_expression(tag, env)?)
        };
        match func_val {
            Value::Object(o) => self.call_function(&o, this_val, &args),
            _ => Err(self.throw(ErrorKind::TypeError, "tag is not a function")),
        }
    }

    fn direct_eval(&mut self, args: &[Value], env: &Environment) -> Result<Value, Value> {
        let Some(Value::String(src)) = args.first() else {
            return Ok(args.first().cloned().unwrap_or(Value::Undefined));
        };
        let mut parser = crate::frontend::parser::Parser::new(src);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            return Err(self.throw(ErrorKind::SyntaxError, parser.errors()[0].message.clone()));
        }
        let hoist = crate::runtime::hoist::hoist(&program.body);
        self.install_hoisted(env, &hoist)?;
        let mut last = Value::Undefined;
        for stmt in &program.body {
            let (value, signal) = self.exec_statement(stmt, env);
            if let Some(v) = value {
                last = v;
            }
            match signal {
                super::Signal::None => {}
                super::Signal::Throw(v) => return Err(v),
                super::Signal::Return(v) => return Ok(v),
                _ => {}
            }
        }
        Ok(last)
    }

    fn destructure_assign(&mut self, target: &Expr, value: Value, env: &Environment) -> Result<(), Value> {
        match target {
            Expr::ArrayPattern { elements, .. } => {
                let items = self.iterate_to_vec(&value)?;
                for (i, el) in elements.iter().enumerate() {
                    match el {
                        None => {}
                        Some(Expr::RestElement { argument, .. }) => {
                            let rest: Vec<Value> = items.get(i..).map(<[Value]>::to_vec).unwrap_or_default();
                            let arr = Object::new_array(Some(self.array_proto.clone()), rest);
                            self.destructure_assign(argument, Value::Object(arr), env)?;
                        }
                        Some(e) => {
                            let v = items.get(i).cloned().unwrap_or(Value::Undefined);
                            self.destructure_assign(e, v, env)?;
                        }
                    }
                }
                Ok(())
            }
            Expr::ObjectPattern { properties, .. } => {
                for prop in properties {
                    let key = self.property_key_value(&prop.key, env)?;
                    let v = self.get_property_value(&value, &key)?;
                    self.destructure_assign(&prop.value, v, env)?;
                }
                Ok(())
            }
            Expr::AssignmentPattern { left, right, .. } => {
                let value = if matches!(value, Value::Undefined) {
                    self.eval_expression(right, env)?
                } else {
                    value
                };
                self.destructure_assign(left, value, env)
            }
            _ => self.assign_to_target(target, value, env),
        }
    }

    /// Property read honoring string/number wrapper prototypes and
    /// accessor getters (spec.md §4.3.3 "Member access").
    pub fn get_property_value(&mut self, base: &Value, key: &Key) -> Result<Value, Value> {
        self.get_property_value_with_receiver(base, key, base)
    }

    fn get_property_value_with_receiver(
        &mut self,
        base: &Value,
        key: &Key,
        receiver: &Value,
    ) -> Result<Value, Value> {
        match base {
            Value::Object(o) => {
                if o.is_array() {
                    if let Some(idx) = key.as_array_index() {
                        return Ok(o.array_get(idx as usize).unwrap_or(Value::Undefined));
                    }
                    if key.as_str() == Some("length") {
                        return Ok(Value::Number(o.array_len().unwrap_or(0) as f64));
                    }
                }
                if key.as_str() == Some("__proto__") {
                    return Ok(o.prototype().map(Value::Object).unwrap_or(Value::Null));
                }
                match o.get_property(key) {
                    Some(prop) => match prop.kind {
                        PropertyKind::Data { value, .. } => Ok(value),
                        PropertyKind::Accessor { get: Some(getter), .. } => {
                            self.call_function(&getter, receiver.clone(), &[])
                        }
                        PropertyKind::Accessor { get: None, .. } => Ok(Value::Undefined),
                    },
                    None => Ok(Value::Undefined),
                }
            }
            Value::String(s) => self.get_string_property(s, key),
            Value::Number(_) | Value::Boolean(_) => {
                let proto = if matches!(base, Value::Number(_)) {
                    &self.number_proto
                } else {
                    &self.boolean_proto
                };
                match proto.get_property(key) {
                    Some(prop) => match prop.kind {
                        PropertyKind::Data { value, .. } => Ok(value),
                        PropertyKind::Accessor { get: Some(getter), .. } => {
                            self.call_function(&getter, receiver.clone(), &[])
                        }
                        _ => Ok(Value::Undefined),
                    },
                    None => Ok(Value::Undefined),
                }
            }
            Value::Symbol(_) => Ok(Value::Undefined),
            Value::Undefined | Value::Null => {
                Err(self.throw(ErrorKind::TypeError, "Cannot read properties of null/undefined"))
            }
        }
    }

    fn get_string_property(&mut self, s: &std::rc::Rc<str>, key: &Key) -> Result<Value, Value> {
        if key.as_str() == Some("length") {
            return Ok(Value::Number(s.encode_utf16().count() as f64));
        }
        if let Some(idx) = key.as_array_index() {
            let units: Vec<u16> = s.encode_utf16().collect();
            return Ok(match units.get(idx as usize) {
                Some(&u) => Value::string(String::from_utf16_lossy(&[u])),
                None => Value::Undefined,
            });
        }
        match self.string_proto.get_property(key) {
            Some(prop) => Ok(prop.get_value().unwrap_or(Value::Undefined)),
            None => Ok(Value::Undefined),
        }
    }

    pub fn set_property_value(&mut self, base: &Value, key: Key, value: Value) -> Result<(), Value> {
        match base {
            Value::Object(o) => {
                if o.is_array() {
                    if let Some(idx) = key.as_array_index() {
                        let mut arr = o.array_snapshot();
                        let idx = idx as usize;
                        if idx >= arr.len() {
                            arr.resize(idx + 1, Value::Undefined);
                        }
                        arr[idx] = value;
                        o.set_array_snapshot(arr);
                        return Ok(());
                    }
                    if key.as_str() == Some("length") {
                        let new_len = self.to_number(&value)? as usize;
                        let mut arr = o.array_snapshot();
                        arr.resize(new_len, Value::Undefined);
                        o.set_array_snapshot(arr);
                        return Ok(());
                    }
                }
                if let Some(existing) = o.get_property(&key) {
                    if let PropertyKind::Accessor { set, .. } = &existing.kind {
                        if let Some(setter) = set {
                            self.call_function(setter, base.clone(), &[value])?;
                            return Ok(());
                        }
                        return Ok(());
                    }
                    if let PropertyKind::Data { writable: false, .. } = existing.kind {
                        if o.has_own(&key) {
                            return Ok(());
                        }
                    }
                }
                o.set_own(key, Property::value(value));
                Ok(())
            }
            Value::Undefined | Value::Null => {
                Err(self.throw(ErrorKind::TypeError, "Cannot set properties of null/undefined"))
            }
            _ => Ok(()),
        }
    }

    /// For-of/array-spread/destructuring source materialization
    /// (spec.md §4.3.2 "For-of"). Prefers the `Symbol.iterator` protocol so
    /// `Map`/`Set`/user-defined iterables work; falls back to a bare
    /// `next()` method for objects that already are an iterator.
    pub fn iterate_to_vec(&mut self, value: &Value) -> Result<Vec<Value>, Value> {
        match value {
            Value::Object(o) if o.is_array() => Ok(o.array_snapshot()),
            Value::String(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            Value::Object(_) => {
                let iterator = self.get_iterator(value)?;
                self.drain_iterator(&iterator)
            }
            _ => Err(self.throw(ErrorKind::TypeError, "value is not iterable")),
        }
    }

    fn get_iterator(&mut self, value: &Value) -> Result<Value, Value> {
        let key = Key::Symbol(self.symbol_iterator.clone());
        let iter_fn = self.get_property_value(value, &key)?;
        if let Value::Object(f) = &iter_fn {
            if f.is_callable() {
                return self.call_function(f, value.clone(), &[]);
            }
        }
        if let Value::Object(o) = value {
            if o.has_property(&Key::str("next")) {
                return Ok(value.clone());
            }
        }
        Err(self.throw(ErrorKind::TypeError, "value is not iterable"))
    }

    fn drain_iterator(&mut self, iterator: &Value) -> Result<Vec<Value>, Value> {
        let mut out = Vec::new();
        loop {
            let next_fn = self.get_property_value(iterator, &Key::str("next"))?;
            let Value::Object(f) = next_fn else {
                return Err(self.throw(ErrorKind::TypeError, "iterator has no next method"));
            };
            let result = self.call_function(&f, iterator.clone(), &[])?;
            let done = self
                .get_property_value(&result, &Key::str("done"))?
                .to_boolean();
            if done {
                break;
            }
            out.push(self.get_property_value(&result, &Key::str("value"))?);
        }
        Ok(out)
    }

    pub fn to_number(&mut self, value: &Value) -> Result<f64, Value> {
        Ok(match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
                    i64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN)
                } else {
                    t.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::Symbol(_) => return Err(self.throw(ErrorKind::TypeError, "Cannot convert a Symbol value to a number")),
            Value::Object(_) => {
                let prim = self.to_primitive(value)?;
                if matches!(prim, Value::Object(_)) {
                    f64::NAN
                } else {
                    self.to_number(&prim)?
                }
            }
        })
    }

    /// ToPrimitive via `valueOf`/`toString`, used by `+` and relational
    /// comparisons (spec.md §4.3.3).
    pub fn to_primitive(&mut self, value: &Value) -> Result<Value, Value> {
        let Value::Object(o) = value else {
            return Ok(value.clone());
        };
        for method_name in ["valueOf", "toString"] {
            let method = self.get_property_value(value, &Key::str(method_name))?;
            if let Value::Object(f) = &method {
                if f.is_callable() {
                    let result = self.call_function(f, value.clone(), &[])?;
                    if !matches!(result, Value::Object(_)) {
                        return Ok(result);
                    }
                }
            }
        }
        Ok(Value::string(o.to_display_string()))
    }

    pub fn to_display_string(&mut self, value: &Value) -> Result<String, Value> {
        match value {
            Value::Object(_) => {
                let prim = self.to_primitive(value)?;
                if matches!(prim, Value::Object(_)) {
                    Ok(value.to_string())
                } else {
                    Ok(prim.to_string())
                }
            }
            other => Ok(other.to_string()),
        }
    }

    pub fn apply_binary(&mut self, op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Value> {
        use BinaryOp::*;
        Ok(match op {
            Add => {
                let lp = self.to_primitive(l)?;
                let rp = self.to_primitive(r)?;
                if matches!(lp, Value::String(_)) || matches!(rp, Value::String(_)) {
                    Value::string(format!(
                        "{}{}",
                        self.to_display_string(&lp)?,
                        self.to_display_string(&rp)?
                    ))
                } else {
                    Value::Number(self.to_number(&lp)? + self.to_number(&rp)?)
                }
            }
            Sub => Value::Number(self.to_number(l)? - self.to_number(r)?),
            Mul => Value::Number(self.to_number(l)? * self.to_number(r)?),
            Div => Value::Number(self.to_number(l)? / self.to_number(r)?),
            Mod => Value::Number(self.to_number(l)? % self.to_number(r)?),
            Pow => Value::Number(self.to_number(l)?.powf(self.to_number(r)?)),
            Lt | Gt | Le | Ge => self.apply_relational(op, l, r)?,
            Eq => Value::Boolean(self.loose_eq(l, r)?),
            NotEq => Value::Boolean(!self.loose_eq(l, r)?),
            StrictEq => Value::Boolean(l.strict_eq(r)),
            StrictNotEq => Value::Boolean(!l.strict_eq(r)),
            BitAnd => Value::Number((to_i32(self.to_number(l)?) & to_i32(self.to_number(r)?)) as f64),
            BitOr => Value::Number((to_i32(self.to_number(l)?) | to_i32(self.to_number(r)?)) as f64),
            BitXor => Value::Number((to_i32(self.to_number(l)?) ^ to_i32(self.to_number(r)?)) as f64),
            Shl => Value::Number(
                (to_i32(self.to_number(l)?).wrapping_shl(to_u32(self.to_number(r)?) & 31)) as f64,
            ),
            Shr => Value::Number(
                (to_i32(self.to_number(l)?).wrapping_shr(to_u32(self.to_number(r)?) & 31)) as f64,
            ),
            UShr => Value::Number(
                ((to_i32(self.to_number(l)?) as u32).wrapping_shr(to_u32(self.to_number(r)?) & 31)) as f64,
            ),
            In => match r {
                Value::Object(o) => {
                    let key = self.to_property_key(l)?;
                    Value::Boolean(o.has_property(&key))
                }
                _ => return Err(self.throw(ErrorKind::TypeError, "Cannot use 'in' operator")),
            },
            Instanceof => Value::Boolean(self.instance_of(l, r)?),
        })
    }

    fn apply_relational(&mut self, op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Value> {
        let lp = self.to_primitive(l)?;
        let rp = self.to_primitive(r)?;
        let result = if let (Value::String(a), Value::String(b)) = (&lp, &rp) {
            match op {
                BinaryOp::Lt => a < b,
                BinaryOp::Gt => a > b,
                BinaryOp::Le => a <= b,
                BinaryOp::Ge => a >= b,
                _ => unreachable!(),
            }
        } else {
            let a = self.to_number(&lp)?;
            let b = self.to_number(&rp)?;
            if a.is_nan() || b.is_nan() {
                false
            } else {
                match op {
                    BinaryOp::Lt => a < b,
                    BinaryOp::Gt => a > b,
                    BinaryOp::Le => a <= b,
                    BinaryOp::Ge => a >= b,
                    _ => unreachable!(),
                }
            }
        };
        Ok(Value::Boolean(result))
    }

    /// `==` (spec.md §4.3.3 "Equality").
    fn loose_eq(&mut self, l: &Value, r: &Value) -> Result<bool, Value> {
        Ok(match (l, r) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Boolean(_), Value::Boolean(_))
            | (Value::Object(_), Value::Object(_))
            | (Value::Symbol(_), Value::Symbol(_)) => l.strict_eq(r),
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                (self.to_number(l)? - self.to_number(r)?).abs() == 0.0
                    || self.to_number(l)? == self.to_number(r)?
            }
            (Value::Boolean(_), _) => {
                let ln = self.to_number(l)?;
                self.loose_eq(&Value::Number(ln), r)?
            }
            (_, Value::Boolean(_)) => {
                let rn = self.to_number(r)?;
                self.loose_eq(l, &Value::Number(rn))?
            }
            (Value::Object(_), Value::Number(_) | Value::String(_)) => {
                let lp = self.to_primitive(l)?;
                self.loose_eq(&lp, r)?
            }
            (Value::Number(_) | Value::String(_), Value::Object(_)) => {
                let rp = self.to_primitive(r)?;
                self.loose_eq(l, &rp)?
            }
            _ => false,
        })
    }

    fn instance_of(&mut self, l: &Value, r: &Value) -> Result<bool, Value> {
        let Value::Object(ctor) = r else {
            return Err(self.throw(ErrorKind::TypeError, "Right-hand side of 'instanceof' is not callable"));
        };
        if !ctor.is_callable() {
            return Err(self.throw(ErrorKind::TypeError, "Right-hand side of 'instanceof' is not callable"));
        }
        let Value::Object(obj) = l else {
            return Ok(false);
        };
        let target_proto = match ctor.get_own(&Key::str("prototype")).and_then(|p| p.get_value()) {
            Some(Value::Object(p)) => p,
            _ => return Ok(false),
        };
        let mut current = obj.prototype();
        while let Some(p) = current {
            if p.ptr_eq(&target_proto) {
                return Ok(true);
            }
            current = p.prototype();
        }
        Ok(false)
    }
}

impl Interpreter {
    /// `/pattern/flags` literal evaluation; shared with the `RegExp`
    /// constructor built in `runtime::builtins` (spec.md §6.2 "RegExp").
    pub fn make_regexp(&self, pattern: &str, flags: &str) -> Value {
        let obj = Object::new(OType::RegExp, Some(self.regexp_proto.clone()));
        obj.set_slot(
            "regexp",
            Slot::RegExp {
                source: pattern.to_string(),
                flags: flags.to_string(),
            },
        );
        obj.set_own(Key::str("source"), Property::data(Value::string(pattern), false, false, true));
        obj.set_own(Key::str("flags"), Property::data(Value::string(flags), false, false, true));
        obj.set_own(Key::str("global"), Property::data(Value::Boolean(flags.contains('g')), false, false, true));
        obj.set_own(
            Key::str("ignoreCase"),
            Property::data(Value::Boolean(flags.contains('i')), false, false, true),
        );
        obj.set_own(
            Key::str("multiline"),
            Property::data(Value::Boolean(flags.contains('m')), false, false, true),
        );
        obj.set_own(Key::str("lastIndex"), Property::value(Value::Number(0.0)));
        Value::Object(obj)
    }
}

fn is_pattern_like(expr: &Expr) -> bool {
    matches!(expr, Expr::ArrayPattern { .. } | Expr::ObjectPattern { .. })
}

pub(super) fn to_i32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let n = n.trunc();
    let m = n.rem_euclid(4294967296.0);
    if m >= 2147483648.0 {
        (m - 4294967296.0) as i32
    } else {
        m as i32
    }
}

fn to_u32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32
}
