//! Math built-in object.
//!
//! Provides mathematical constants and functions. Every argument goes
//! through ToNumber first, so `Math.abs("-3")` is `3`.

use crate::runner::ds::error::EvalError;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        .add_property("E", JsValue::number(std::f64::consts::E))
        .add_property("PI", JsValue::number(std::f64::consts::PI))
        .add_method("log", &["x"], math_log)
        .add_method("abs", &["x"], math_abs)
        .add_method("floor", &["x"], math_floor)
        .add_method("ceil", &["x"], math_ceil)
        .add_method("sqrt", &["x"], math_sqrt)
        .add_method("pow", &["x", "y"], math_pow)
        .add_method("max", &["value1", "value2"], math_max)
        .add_method("min", &["value1", "value2"], math_min);

    registry.register_object(math);
}

fn unary(
    ctx: &mut EvalContext,
    args: &[JsValue],
    op: fn(f64) -> f64,
) -> Result<JsValue, EvalError> {
    let x = to_number(ctx, &arg(args, 0))?;
    if x.is_nan() {
        return Ok(JsValue::number(f64::NAN));
    }
    Ok(JsValue::number(op(x)))
}

/// Math.log
fn math_log(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
    unary(ctx, &args, f64::ln)
}

fn math_abs(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
    unary(ctx, &args, f64::abs)
}

fn math_floor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    unary(ctx, &args, f64::floor)
}

fn math_ceil(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
    unary(ctx, &args, f64::ceil)
}

fn math_sqrt(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
    unary(ctx, &args, f64::sqrt)
}

/// Math.pow
fn math_pow(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
    let base = to_number(ctx, &arg(&args, 0))?;
    let exponent = to_number(ctx, &arg(&args, 1))?;
    // powf says 1^NaN is 1; here it is NaN.
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return Ok(JsValue::number(f64::NAN));
    }
    Ok(JsValue::number(base.powf(exponent)))
}

/// Math.max and Math.min: every argument is converted, NaN wins.
fn fold_numbers(
    ctx: &mut EvalContext,
    args: &[JsValue],
    start: f64,
    pick: fn(f64, f64) -> f64,
) -> Result<JsValue, EvalError> {
    let mut result = start;
    let mut saw_nan = false;
    for value in args {
        let n = to_number(ctx, value)?;
        if n.is_nan() {
            saw_nan = true;
        } else {
            result = pick(result, n);
        }
    }
    if saw_nan {
        return Ok(JsValue::number(f64::NAN));
    }
    Ok(JsValue::number(result))
}

fn math_max(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
    fold_numbers(ctx, &args, f64::NEG_INFINITY, f64::max)
}

fn math_min(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
    fold_numbers(ctx, &args, f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: JsValue) -> f64 {
        match v {
            JsValue::Number(n) => n.to_f64(),
            other => panic!("not a number: {:?}", other),
        }
    }

    #[test]
    fn log_of_e_is_one() {
        let mut ctx = EvalContext::new();
        let r = math_log(&mut ctx, JsValue::Undefined, vec![JsValue::number(std::f64::consts::E)]);
        assert!((num(r.unwrap()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log_of_non_numeric_is_nan() {
        let mut ctx = EvalContext::new();
        let r = math_log(&mut ctx, JsValue::Undefined, vec![JsValue::string("x")]).unwrap();
        assert!(num(r).is_nan());
        let r = math_log(&mut ctx, JsValue::Undefined, vec![]).unwrap();
        assert!(num(r).is_nan());
    }

    #[test]
    fn max_and_min_without_arguments() {
        let mut ctx = EvalContext::new();
        let r = math_max(&mut ctx, JsValue::Undefined, vec![]).unwrap();
        assert_eq!(num(r), f64::NEG_INFINITY);
        let r = math_min(&mut ctx, JsValue::Undefined, vec![]).unwrap();
        assert_eq!(num(r), f64::INFINITY);
    }

    #[test]
    fn max_propagates_nan() {
        let mut ctx = EvalContext::new();
        let r = math_max(
            &mut ctx,
            JsValue::Undefined,
            vec![JsValue::integer(1), JsValue::string("a"), JsValue::integer(3)],
        )
        .unwrap();
        assert!(num(r).is_nan());
    }

    #[test]
    fn pow_of_one_to_nan() {
        let mut ctx = EvalContext::new();
        let r = math_pow(&mut ctx, JsValue::Undefined, vec![JsValue::integer(1), JsValue::Undefined]);
        assert!(num(r.unwrap()).is_nan());
        let r = math_pow(&mut ctx, JsValue::Undefined, vec![JsValue::integer(2), JsValue::integer(10)]);
        assert_eq!(r.unwrap(), JsValue::integer(1024));
    }
}
