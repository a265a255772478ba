use std::rc::Rc;

use crate::runner::ds::error::EvalError;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::type_conversion::{to_number, to_primitive, PreferredType};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

fn is_same_number(a: f64, b: f64, zeros_differ: bool, nan_equal: bool) -> bool {
    if a.is_nan() || b.is_nan() {
        return nan_equal && a.is_nan() && b.is_nan();
    }
    if zeros_differ && a == 0.0 && b == 0.0 {
        return a.is_sign_negative() == b.is_sign_negative();
    }
    a == b
}

fn is_same_value(a: &JsValue, b: &JsValue, strict_mode: bool) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::Number(x), JsValue::Number(y)) => {
            is_same_number(x.to_f64(), y.to_f64(), !strict_mode, !strict_mode)
        }
        (JsValue::Object(x), JsValue::Object(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// SameValue: `NaN` equals itself and `+0` differs from `-0`.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    is_same_value(a, b, false)
}

/// The `===` operator.
pub fn strict_equality_comparison(a: &JsValue, b: &JsValue) -> bool {
    is_same_value(a, b, true)
}

pub fn same_optional_object(a: &Option<JsObjectType>, b: &Option<JsObjectType>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

pub fn is_callable(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().is_callable(),
        _ => false,
    }
}

pub fn is_constructor(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().is_constructor(),
        _ => false,
    }
}

/// The `==` operator.
pub fn abstract_equality_comparison(
    ctx: &mut EvalContext,
    a: &JsValue,
    b: &JsValue,
) -> Result<bool, EvalError> {
    Ok(match (a, b) {
        (JsValue::Undefined, JsValue::Null) | (JsValue::Null, JsValue::Undefined) => true,
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            let x = to_number(ctx, a)?;
            let y = to_number(ctx, b)?;
            is_same_number(x, y, false, false)
        }
        (JsValue::Boolean(_), _) => {
            let x = JsValue::number(to_number(ctx, a)?);
            abstract_equality_comparison(ctx, &x, b)?
        }
        (_, JsValue::Boolean(_)) => {
            let y = JsValue::number(to_number(ctx, b)?);
            abstract_equality_comparison(ctx, a, &y)?
        }
        (JsValue::Number(_), JsValue::Object(_)) | (JsValue::String(_), JsValue::Object(_)) => {
            let y = to_primitive(ctx, b, PreferredType::Default)?;
            abstract_equality_comparison(ctx, a, &y)?
        }
        (JsValue::Object(_), JsValue::Number(_)) | (JsValue::Object(_), JsValue::String(_)) => {
            let x = to_primitive(ctx, a, PreferredType::Default)?;
            abstract_equality_comparison(ctx, &x, b)?
        }
        _ => strict_equality_comparison(a, b),
    })
}

/// Abstract relational comparison `a < b`. `None` stands for the
/// `undefined` outcome when either side is `NaN`. Operands are converted in
/// source order, which `left_first` describes.
pub fn abstract_relational_comparison(
    ctx: &mut EvalContext,
    a: &JsValue,
    b: &JsValue,
    left_first: bool,
) -> Result<Option<bool>, EvalError> {
    let (px, py) = if left_first {
        let px = to_primitive(ctx, a, PreferredType::Number)?;
        let py = to_primitive(ctx, b, PreferredType::Number)?;
        (px, py)
    } else {
        let py = to_primitive(ctx, b, PreferredType::Number)?;
        let px = to_primitive(ctx, a, PreferredType::Number)?;
        (px, py)
    };
    if let (JsValue::String(x), JsValue::String(y)) = (&px, &py) {
        return Ok(Some(x.encode_utf16().lt(y.encode_utf16())));
    }
    let nx = to_number(ctx, &px)?;
    let ny = to_number(ctx, &py)?;
    if nx.is_nan() || ny.is_nan() {
        Ok(None)
    } else {
        Ok(Some(nx < ny))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_distinguishes_zeros_and_equates_nan() {
        assert!(same_value(&JsValue::number(f64::NAN), &JsValue::number(f64::NAN)));
        assert!(!same_value(&JsValue::number(-0.0), &JsValue::integer(0)));
        assert!(!strict_equality_comparison(
            &JsValue::number(f64::NAN),
            &JsValue::number(f64::NAN)
        ));
        assert!(strict_equality_comparison(&JsValue::number(-0.0), &JsValue::integer(0)));
    }

    #[test]
    fn loose_equality_coerces() {
        let mut ctx = EvalContext::new();
        assert!(abstract_equality_comparison(&mut ctx, &JsValue::Null, &JsValue::Undefined).unwrap());
        assert!(
            abstract_equality_comparison(&mut ctx, &JsValue::string("1"), &JsValue::integer(1))
                .unwrap()
        );
        assert!(
            abstract_equality_comparison(&mut ctx, &JsValue::Boolean(true), &JsValue::string("1"))
                .unwrap()
        );
        assert!(!abstract_equality_comparison(&mut ctx, &JsValue::Null, &JsValue::integer(0)).unwrap());
    }

    #[test]
    fn strings_compare_by_code_units() {
        let mut ctx = EvalContext::new();
        assert_eq!(
            abstract_relational_comparison(
                &mut ctx,
                &JsValue::string("a"),
                &JsValue::string("b"),
                true
            )
            .unwrap(),
            Some(true)
        );
        assert_eq!(
            abstract_relational_comparison(
                &mut ctx,
                &JsValue::integer(1),
                &JsValue::number(f64::NAN),
                true
            )
            .unwrap(),
            None
        );
    }
}
