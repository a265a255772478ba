use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::object::{call, get};
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::types::EvalContext;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// The result of the `typeof` operator.
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if o.borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferredType {
    Default,
    String,
    Number,
}

pub fn to_primitive(
    ctx: &mut EvalContext,
    v: &JsValue,
    preferred_type: PreferredType,
) -> Result<JsValue, EvalError> {
    let o = match v {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(v.clone()),
    };
    let method_names = match preferred_type {
        PreferredType::String => ["toString", "valueOf"],
        PreferredType::Default | PreferredType::Number => ["valueOf", "toString"],
    };
    for name in method_names.iter() {
        let method = get(ctx, &o, name)?;
        if is_callable(&method) {
            let result = call(ctx, &method, v.clone(), vec![])?;
            if result.as_object().is_none() {
                return Ok(result);
            }
        }
    }
    Err(JErrorType::TypeError("Cannot convert object to primitive value".to_string()).into())
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Number(n) => {
            let n = n.to_f64();
            !(n == 0.0 || n.is_nan())
        }
        JsValue::Object(_) => true,
    }
}

pub fn to_number(ctx: &mut EvalContext, v: &JsValue) -> Result<f64, EvalError> {
    Ok(match v {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::String(s) => string_to_number(s),
        JsValue::Number(n) => n.to_f64(),
        JsValue::Object(_) => {
            let pv = to_primitive(ctx, v, PreferredType::Number)?;
            to_number(ctx, &pv)?
        }
    })
}

/// StringToNumber: surrounding white space is ignored, the empty string is
/// `0`, anything that is not a complete numeric literal is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return if !hex.is_empty() && hex.chars().all(|c: char| c.is_ascii_hexdigit()) {
            hex.chars().fold(0.0, |acc, c| {
                acc * 16.0 + c.to_digit(16).map_or(0.0, |d| d as f64)
            })
        } else {
            f64::NAN
        };
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !s
        .chars()
        .all(|c: char| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn to_string(ctx: &mut EvalContext, v: &JsValue) -> Result<String, EvalError> {
    Ok(match v {
        JsValue::Object(_) => {
            let pv = to_primitive(ctx, v, PreferredType::String)?;
            to_string(ctx, &pv)?
        }
        _ => primitive_to_string(v),
    })
}

/// ToString for values that never need to call back into script code.
/// Objects are rendered by their class tag.
pub fn primitive_to_string(v: &JsValue) -> String {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::String(s) => s.clone(),
        JsValue::Number(n) => number_to_string(n.to_f64()),
        JsValue::Object(o) => format!("[object {}]", o.borrow().class_name()),
    }
}

/// Number::toString for radix 10.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.find('e') {
            Some(pos) if !formatted[pos + 1..].starts_with('-') => {
                format!("{}e+{}", &formatted[..pos], &formatted[pos + 1..])
            }
            _ => formatted,
        };
    }
    format!("{}", n)
}

pub fn to_property_key(ctx: &mut EvalContext, v: &JsValue) -> Result<String, EvalError> {
    match v {
        JsValue::String(s) => Ok(s.clone()),
        JsValue::Number(JsNumberType::Integer(i)) => Ok(i.to_string()),
        _ => to_string(ctx, v),
    }
}

pub fn f64_to_int32(n: f64) -> i32 {
    f64_to_uint32(n) as i32
}

pub fn f64_to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32
}

pub fn to_int32(ctx: &mut EvalContext, v: &JsValue) -> Result<i32, EvalError> {
    Ok(f64_to_int32(to_number(ctx, v)?))
}

pub fn to_uint32(ctx: &mut EvalContext, v: &JsValue) -> Result<u32, EvalError> {
    Ok(f64_to_uint32(to_number(ctx, v)?))
}

/// ToObject. Without wrapper classes a primitive becomes a plain object: a
/// string exposes its characters as indexed properties and its `length`.
pub fn to_object(ctx: &mut EvalContext, v: &JsValue) -> Result<JsObjectType, EvalError> {
    match v {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot convert {} to object",
            primitive_to_string(v)
        ))
        .into()),
        JsValue::Object(o) => Ok(o.clone()),
        JsValue::String(s) => {
            let proto = ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype);
            let mut o = ObjectType::new_ordinary(proto);
            let units: Vec<u16> = s.encode_utf16().collect();
            for (i, unit) in units.iter().enumerate() {
                o.insert_property(
                    i.to_string(),
                    PropertyDescriptor::Data {
                        value: JsValue::String(String::from_utf16_lossy(&[*unit])),
                        writable: false,
                        enumerable: true,
                        configurable: false,
                    },
                );
            }
            o.insert_property(
                "length",
                PropertyDescriptor::Data {
                    value: JsValue::integer(units.len() as i64),
                    writable: false,
                    enumerable: false,
                    configurable: false,
                },
            );
            o.base_mut().prevent_extensions();
            Ok(o.into_ref())
        }
        JsValue::Boolean(_) | JsValue::Number(_) => {
            let proto = ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype);
            Ok(ObjectType::new_ordinary(proto).into_ref())
        }
    }
}
