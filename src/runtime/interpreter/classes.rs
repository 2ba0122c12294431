//! `class` desugaring (spec.md §4.3.5): a constructor function, an
//! ordinary prototype object chained to the superclass's prototype, and
//! static members installed on the constructor object itself.

use crate::error::ErrorKind;
use crate::frontend::ast::{
    ClassMember, Expr, FunctionBody, FunctionNode, MethodKind, Pattern, Span, Statement,
};
use crate::runtime::environment::{BindingKind, Environment};
use crate::runtime::object::{Key, Object, OType, Property, PropertyKind};
use crate::runtime::value::Value;

use super::Interpreter;

impl Interpreter {
    pub fn eval_class(
        &mut self,
        name: Option<String>,
        superclass: Option<&Expr>,
        body: &[ClassMember],
        env: &Environment,
    ) -> Result<Value, Value> {
        let super_ctor = match superclass {
            Some(e) => match self.eval_expression(e, env)? {
                Value::Object(o) => Some(o),
                Value::Null => None,
                _ => {
                    return Err(self.throw(
                        ErrorKind::TypeError,
                        "Class extends value is not a constructor or null",
                    ))
                }
            },
            None => None,
        };
        let extends_null = superclass.is_some() && super_ctor.is_none();

        let proto_parent = if let Some(sc) = &super_ctor {
            match sc.get_own(&Key::str("prototype")).and_then(|p| p.get_value()) {
                Some(Value::Object(p)) => Some(p),
                _ => None,
            }
        } else if extends_null {
            None
        } else {
            Some(self.object_proto.clone())
        };
        let proto = Object::new(OType::Ordinary, proto_parent);

        let class_env = env.child_block();

        let constructor_member = body.iter().find(|m| matches!(m.kind, MethodKind::Constructor));
        let ctor_value = match constructor_member {
            Some(member) => self.make_method(&member.function, &class_env, proto.clone(), true),
            None => {
                let node = default_constructor_node(super_ctor.is_some());
                self.make_method(&node, &class_env, proto.clone(), true)
            }
        };
        let ctor_obj = match &ctor_value {
            Value::Object(o) => o.clone(),
            _ => unreachable!(),
        };

        ctor_obj.set_prototype(Some(match &super_ctor {
            Some(sc) => sc.clone(),
            None => self.function_proto.clone(),
        }));
        ctor_obj.set_own(
            Key::str("prototype"),
            Property::data(Value::Object(proto.clone()), false, false, false),
        );
        ctor_obj.set_own(
            Key::str("name"),
            Property::data(Value::string(name.clone().unwrap_or_default()), false, false, true),
        );
        proto.set_own(
            Key::str("constructor"),
            Property::data(ctor_value.clone(), true, false, true),
        );

        if let Some(n) = &name {
            // Lets the class body (static methods, nested default params)
            // refer to the class by its own name.
            class_env
                .declare(n, BindingKind::Const, ctor_value.clone())
                .map_err(|e| self.make_error(e.kind, e.message))?;
        }

        for member in body {
            if matches!(member.kind, MethodKind::Constructor) {
                continue;
            }
            let target = if member.is_static { &ctor_obj } else { &proto };
            let key = self.property_key_value(&member.key, &class_env)?;
            match member.kind {
                MethodKind::Method => {
                    let func = self.make_method(&member.function, &class_env, target.clone(), false);
                    target.set_own(
                        key,
                        Property {
                            kind: PropertyKind::Data { value: func, writable: true },
                            enumerable: false,
                            configurable: true,
                            specified: Default::default(),
                        },
                    );
                }
                MethodKind::Get => {
                    let getter = match self.make_method(&member.function, &class_env, target.clone(), false) {
                        Value::Object(o) => o,
                        _ => unreachable!(),
                    };
                    self.define_accessor(target, key, Some(getter), None);
                }
                MethodKind::Set => {
                    let setter = match self.make_method(&member.function, &class_env, target.clone(), false) {
                        Value::Object(o) => o,
                        _ => unreachable!(),
                    };
                    self.define_accessor(target, key, None, Some(setter));
                }
                MethodKind::Constructor => unreachable!(),
            }
        }

        Ok(ctor_value)
    }
}

/// The synthetic AST for a class with no explicit `constructor` member: a
/// no-op for a base class, `constructor(...args) { super(...args); }` for a
/// derived one. Built as real AST rather than a native closure so it goes
/// through the same `construct()` instance-creation path as any other
/// user-defined constructor (spec.md §4.3.3 "New").
fn default_constructor_node(has_super: bool) -> FunctionNode {
    let span = Span::default();
    if !has_super {
        return FunctionNode {
            name: None,
            params: Vec::new(),
            defaults: Vec::new(),
            rest: None,
            body: FunctionBody::Block(Vec::new()),
            is_async: false,
            is_generator: false,
            span,
        };
    }
    let rest = Pattern::Identifier("args".to_string(), span);
    let call = Expr::Call {
        callee: Box::new(Expr::Super { span }),
        arguments: vec![Expr::Spread {
            argument: Box::new(Expr::Identifier { name: "args".to_string(), span }),
            span,
        }],
        optional: false,
        span,
    };
    let body = FunctionBody::Block(vec![Statement::ExpressionStatement { expr: call, span }]);
    FunctionNode {
        name: None,
        params: Vec::new(),
        defaults: Vec::new(),
        rest: Some(Box::new(rest)),
        body,
        is_async: false,
        is_generator: false,
        span,
    }
}
