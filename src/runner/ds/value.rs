use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::operations::type_conversion::{
    number_to_string, TYPE_STR_NULL, TYPE_STR_UNDEFINED,
};

#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    String(String),
    Number(JsNumberType),
    Object(JsObjectType),
}
impl JsValue {
    pub fn number(n: f64) -> Self {
        JsValue::Number(JsNumberType::from_f64(n))
    }

    pub fn integer(i: i64) -> Self {
        JsValue::Number(JsNumberType::from_f64(i as f64))
    }

    pub fn string(s: impl Into<String>) -> Self {
        JsValue::String(s.into())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn as_object(&self) -> Option<&JsObjectType> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }
}
impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "{}", TYPE_STR_UNDEFINED),
            JsValue::Null => write!(f, "{}", TYPE_STR_NULL),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::String(s) => write!(f, "{}", s),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::Object(o) => match &*o.borrow() {
                ObjectType::Function(func) => write!(f, "function {}() {{ ... }}", func.name()),
                ObjectType::Array(_) => write!(f, "[object Array]"),
                ObjectType::Error(_) => write!(f, "[object Error]"),
                ObjectType::Arguments(_) => write!(f, "[object Arguments]"),
                ObjectType::Ordinary(_) => write!(f, "[object Object]"),
            },
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Number(n) => write!(f, "JsValue::Number({:?})", n),
            JsValue::Object(_) => write!(f, "JsValue::Object(...)"),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Numbers keep integral values as `Integer` so that the common case of
/// counters and indices never goes through floating point formatting.
/// Every constructor goes through [`JsNumberType::from_f64`], which picks the
/// canonical variant, so a value has exactly one representation. `-0` is
/// always `Float(-0.0)`.
#[derive(Debug, Clone, Copy)]
pub enum JsNumberType {
    Integer(i64),
    Float(f64),
    NaN,
    PositiveInfinity,
    NegativeInfinity,
}
impl JsNumberType {
    const MAX_SAFE: f64 = 9007199254740991.0;

    pub fn from_f64(n: f64) -> Self {
        if n.is_nan() {
            JsNumberType::NaN
        } else if n == f64::INFINITY {
            JsNumberType::PositiveInfinity
        } else if n == f64::NEG_INFINITY {
            JsNumberType::NegativeInfinity
        } else if n.fract() == 0.0
            && n.abs() <= Self::MAX_SAFE
            && !(n == 0.0 && n.is_sign_negative())
        {
            JsNumberType::Integer(n as i64)
        } else {
            JsNumberType::Float(n)
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            JsNumberType::Integer(i) => *i as f64,
            JsNumberType::Float(f) => *f,
            JsNumberType::NaN => f64::NAN,
            JsNumberType::PositiveInfinity => f64::INFINITY,
            JsNumberType::NegativeInfinity => f64::NEG_INFINITY,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, JsNumberType::NaN)
    }
}
impl Display for JsNumberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", number_to_string(self.to_f64()))
    }
}
/// Compares by numeric value. Unlike the `===` operator, `NaN` equals `NaN`
/// here so that test assertions on values stay reflexive.
impl PartialEq for JsNumberType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsNumberType::NaN, JsNumberType::NaN) => true,
            (JsNumberType::NaN, _) | (_, JsNumberType::NaN) => false,
            (JsNumberType::Integer(a), JsNumberType::Integer(b)) => a == b,
            (a, b) => a.to_f64() == b.to_f64(),
        }
    }
}
