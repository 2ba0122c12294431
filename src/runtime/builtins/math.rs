//! The `Math` namespace object (spec.md §6.2): constants plus the standard
//! library of `f64` transcendental functions, with `rand` backing
//! `Math.random` per the dependency ledger.

use rand::Rng;

use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{Object, OType};
use crate::runtime::value::Value;

use super::{arg, define_const, method};

fn num1(interp: &mut Interpreter, args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value, Value> {
    Ok(Value::Number(f(interp.to_number(&arg(args, 0))?)))
}

pub fn install(interp: &mut Interpreter) {
    let math = Object::new(OType::Ordinary, Some(interp.object_proto.clone()));

    define_const(&math, "E", Value::Number(std::f64::consts::E));
    define_const(&math, "LN10", Value::Number(std::f64::consts::LN_10));
    define_const(&math, "LN2", Value::Number(std::f64::consts::LN_2));
    define_const(&math, "LOG10E", Value::Number(std::f64::consts::LOG10_E));
    define_const(&math, "LOG2E", Value::Number(std::f64::consts::LOG2_E));
    define_const(&math, "PI", Value::Number(std::f64::consts::PI));
    define_const(&math, "SQRT1_2", Value::Number(std::f64::consts::FRAC_1_SQRT_2));
    define_const(&math, "SQRT2", Value::Number(std::f64::consts::SQRT_2));

    method(interp, &math, "abs", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::abs)));
    method(interp, &math, "floor", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::floor)));
    method(interp, &math, "ceil", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::ceil)));
    method(interp, &math, "trunc", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::trunc)));
    method(interp, &math, "round", 1, std::rc::Rc::new(|interp, _this, args| {
        num1(interp, args, |n| if n.is_nan() { n } else { (n + 0.5).floor() })
    }));
    method(interp, &math, "sign", 1, std::rc::Rc::new(|interp, _this, args| {
        num1(interp, args, |n| if n.is_nan() { n } else if n > 0.0 { 1.0 } else if n < 0.0 { -1.0 } else { n })
    }));
    method(interp, &math, "sqrt", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::sqrt)));
    method(interp, &math, "cbrt", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::cbrt)));
    method(interp, &math, "exp", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::exp)));
    method(interp, &math, "log", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::ln)));
    method(interp, &math, "log2", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::log2)));
    method(interp, &math, "log10", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::log10)));
    method(interp, &math, "sin", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::sin)));
    method(interp, &math, "cos", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::cos)));
    method(interp, &math, "tan", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::tan)));
    method(interp, &math, "asin", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::asin)));
    method(interp, &math, "acos", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::acos)));
    method(interp, &math, "atan", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::atan)));
    method(interp, &math, "sinh", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::sinh)));
    method(interp, &math, "cosh", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::cosh)));
    method(interp, &math, "tanh", 1, std::rc::Rc::new(|interp, _this, args| num1(interp, args, f64::tanh)));
    method(interp, &math, "atan2", 2, std::rc::Rc::new(|interp, _this, args| {
        let y = interp.to_number(&arg(args, 0))?;
        let x = interp.to_number(&arg(args, 1))?;
        Ok(Value::Number(y.atan2(x)))
    }));
    method(interp, &math, "pow", 2, std::rc::Rc::new(|interp, _this, args| {
        let base = interp.to_number(&arg(args, 0))?;
        let exp = interp.to_number(&arg(args, 1))?;
        Ok(Value::Number(base.powf(exp)))
    }));
    method(interp, &math, "hypot", 2, std::rc::Rc::new(|interp, _this, args| {
        let mut sum = 0.0;
        for a in args {
            let n = interp.to_number(a)?;
            sum += n * n;
        }
        Ok(Value::Number(sum.sqrt()))
    }));
    method(interp, &math, "max", 2, std::rc::Rc::new(|interp, _this, args| {
        let mut m = f64::NEG_INFINITY;
        for a in args {
            let n = interp.to_number(a)?;
            if n.is_nan() {
                return Ok(Value::Number(f64::NAN));
            }
            if n > m {
                m = n;
            }
        }
        Ok(Value::Number(m))
    }));
    method(interp, &math, "min", 2, std::rc::Rc::new(|interp, _this, args| {
        let mut m = f64::INFINITY;
        for a in args {
            let n = interp.to_number(a)?;
            if n.is_nan() {
                return Ok(Value::Number(f64::NAN));
            }
            if n < m {
                m = n;
            }
        }
        Ok(Value::Number(m))
    }));
    method(interp, &math, "random", 0, std::rc::Rc::new(|_interp, _this, _args| {
        Ok(Value::Number(rand::thread_rng().gen_range(0.0..1.0)))
    }));

    interp.global.declare_var("Math", Value::Object(math));
}
