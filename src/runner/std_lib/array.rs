//! Array built-in.
//!
//! Provides the Array constructor, `Array.isArray` and a handful of
//! prototype methods.

use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyDescriptorSetter;
use crate::runner::ds::operations::object::{create_array_from_list, get, set};
use crate::runner::ds::operations::type_conversion::{to_number, to_object, to_string};
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(&["item1"], array_constructor)
        .add_method("isArray", &["arg"], is_array)
        .add_prototype_method("join", &["separator"], array_join)
        .add_prototype_method("push", &["item1"], array_push)
        .add_prototype_method("toString", &[], array_to_string);

    registry.register_object(array);
}

/// `Array(len)` makes a sparse array of that length, any other argument list
/// becomes the elements.
fn array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let len = n.to_f64();
        if len < 0.0 || len.fract() != 0.0 || len > u32::MAX as f64 || n.is_nan() {
            return Err(JErrorType::RangeError("Invalid array length".to_string()).into());
        }
        let mut array =
            ObjectType::new_array(ctx.realm.intrinsic(WellKnownIntrinsics::ArrayPrototype));
        array.define_own_property(
            "length".to_string(),
            PropertyDescriptorSetter::value_only(JsValue::number(len)),
        );
        return Ok(JsValue::Object(array.into_ref()));
    }
    Ok(JsValue::Object(create_array_from_list(ctx, args)))
}

fn is_array(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let result = match arg(&args, 0) {
        JsValue::Object(o) => matches!(&*o.borrow(), ObjectType::Array(_)),
        _ => false,
    };
    Ok(JsValue::Boolean(result))
}

/// Longest string `join` builds, in bytes.
const MAX_STRING_LENGTH: usize = (1 << 30) - 25;

fn invalid_string_length() -> EvalError {
    JErrorType::RangeError("Invalid string length".to_string()).into()
}

/// ToLength of `o.length`, clamped to what an array index can address.
fn length_of(ctx: &mut EvalContext, o: &JsObjectType) -> Result<u32, EvalError> {
    let len = get(ctx, o, "length")?;
    let len = to_number(ctx, &len)?;
    if len.is_nan() || len <= 0.0 {
        return Ok(0);
    }
    Ok(len.floor().min(u32::MAX as f64) as u32)
}

/// Array.prototype.join
fn array_join(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let o = to_object(ctx, &this)?;
    let len = length_of(ctx, &o)?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        v => to_string(ctx, &v)?,
    };
    let separators = (len as usize).saturating_sub(1);
    if separators.saturating_mul(separator.len()) > MAX_STRING_LENGTH {
        return Err(invalid_string_length());
    }
    let mut joined = String::new();
    for index in 0..len {
        if index > 0 {
            joined.push_str(&separator);
        }
        match get(ctx, &o, &index.to_string())? {
            JsValue::Undefined | JsValue::Null => {}
            v => joined.push_str(&to_string(ctx, &v)?),
        }
        if joined.len() > MAX_STRING_LENGTH {
            return Err(invalid_string_length());
        }
    }
    Ok(JsValue::String(joined))
}

/// Array.prototype.push
fn array_push(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let o = to_object(ctx, &this)?;
    let receiver = JsValue::Object(o.clone());
    let mut len = length_of(ctx, &o)? as u64;
    for value in args {
        if !set(ctx, &o, &len.to_string(), value, &receiver)? {
            return Err(JErrorType::TypeError(format!(
                "Cannot add property {}, object is not extensible",
                len
            ))
            .into());
        }
        len += 1;
    }
    let new_len = JsValue::Number(JsNumberType::Integer(len as i64));
    if !set(ctx, &o, "length", new_len.clone(), &receiver)? {
        return Err(
            JErrorType::TypeError("Cannot assign to read only property 'length'".to_string())
                .into(),
        );
    }
    Ok(new_len)
}

/// Array.prototype.toString
fn array_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    array_join(ctx, this, vec![])
}
