//! Object built-in.
//!
//! Provides the Object constructor, a few static helpers and the methods of
//! `Object.prototype`.

use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::PropertyDescriptorSetter;
use crate::runner::ds::operations::object::{
    create_array_from_list, define_property_or_throw, enumerable_own_keys, get, has_own_property,
    has_property, object_create,
};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_object, to_property_key};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_constructor(&["value"], object_constructor)
        .add_method("keys", &["o"], object_keys)
        .add_method("freeze", &["o"], object_freeze)
        .add_method("isFrozen", &["o"], object_is_frozen)
        .add_method("defineProperty", &["o", "p", "attributes"], object_define_property)
        .add_method("getPrototypeOf", &["o"], object_get_prototype_of)
        .add_prototype_method("hasOwnProperty", &["v"], object_has_own_property)
        .add_prototype_method("toString", &[], object_to_string)
        .add_prototype_method("valueOf", &[], object_value_of);

    registry.register_object(object);
}

/// `Object(value)` and `new Object(value)`.
fn object_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let value = arg(&args, 0);
    if value.is_nullish() {
        return Ok(JsValue::Object(object_create(ctx)));
    }
    Ok(JsValue::Object(to_object(ctx, &value)?))
}

fn object_keys(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let o = to_object(ctx, &arg(&args, 0))?;
    let keys = enumerable_own_keys(&o)
        .into_iter()
        .map(JsValue::String)
        .collect();
    Ok(JsValue::Object(create_array_from_list(ctx, keys)))
}

/// Makes every own property read-only and non-configurable and stops new
/// ones from being added. Primitives are returned unchanged.
fn object_freeze(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let value = arg(&args, 0);
    let o = match &value {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(value),
    };
    let keys = o.borrow().own_keys();
    for key in keys {
        let is_data = o
            .borrow()
            .get_own_property(&key)
            .map_or(false, |d| d.is_data_descriptor());
        let desc = PropertyDescriptorSetter {
            configurable: Some(false),
            writable: if is_data { Some(false) } else { None },
            ..PropertyDescriptorSetter::default()
        };
        define_property_or_throw(&o, &key, desc)?;
    }
    o.borrow_mut().base_mut().prevent_extensions();
    Ok(value)
}

fn object_is_frozen(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let o = match arg(&args, 0) {
        JsValue::Object(o) => o,
        _ => return Ok(JsValue::Boolean(true)),
    };
    let o = o.borrow();
    if o.base().is_extensible() {
        return Ok(JsValue::Boolean(false));
    }
    let frozen = o.own_keys().iter().all(|k| match o.get_own_property(k) {
        Some(d) => !d.is_configurable() && !(d.is_data_descriptor() && d.is_writable()),
        None => true,
    });
    Ok(JsValue::Boolean(frozen))
}

fn object_define_property(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let target = arg(&args, 0);
    let o = match &target {
        JsValue::Object(o) => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Object.defineProperty called on non-object".to_string(),
            )
            .into())
        }
    };
    let key = to_property_key(ctx, &arg(&args, 1))?;
    let attributes = match arg(&args, 2) {
        JsValue::Object(a) => a,
        _ => {
            return Err(
                JErrorType::TypeError("Property description must be an object".to_string()).into(),
            )
        }
    };
    let desc = to_property_descriptor(ctx, &attributes)?;
    define_property_or_throw(&o, &key, desc)?;
    Ok(target)
}

/// ToPropertyDescriptor.
fn to_property_descriptor(
    ctx: &mut EvalContext,
    attributes: &JsObjectType,
) -> Result<PropertyDescriptorSetter, EvalError> {
    let mut desc = PropertyDescriptorSetter::default();
    if has_property(attributes, "enumerable") {
        desc.enumerable = Some(to_boolean(&get(ctx, attributes, "enumerable")?));
    }
    if has_property(attributes, "configurable") {
        desc.configurable = Some(to_boolean(&get(ctx, attributes, "configurable")?));
    }
    if has_property(attributes, "value") {
        desc.value = Some(get(ctx, attributes, "value")?);
    }
    if has_property(attributes, "writable") {
        desc.writable = Some(to_boolean(&get(ctx, attributes, "writable")?));
    }
    if has_property(attributes, "get") {
        desc.get = Some(to_accessor(get(ctx, attributes, "get")?, "Getter")?);
    }
    if has_property(attributes, "set") {
        desc.set = Some(to_accessor(get(ctx, attributes, "set")?, "Setter")?);
    }
    if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
        return Err(JErrorType::TypeError(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
                .to_string(),
        )
        .into());
    }
    Ok(desc)
}

fn to_accessor(value: JsValue, what: &str) -> Result<Option<JsObjectType>, EvalError> {
    match value {
        JsValue::Undefined => Ok(None),
        JsValue::Object(f) if f.borrow().is_callable() => Ok(Some(f)),
        other => Err(JErrorType::TypeError(format!("{} must be a function: {}", what, other)).into()),
    }
}

fn object_get_prototype_of(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let o = to_object(ctx, &arg(&args, 0))?;
    let proto = o.borrow().get_prototype_of();
    Ok(proto.map_or(JsValue::Null, JsValue::Object))
}

fn object_has_own_property(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let key = to_property_key(ctx, &arg(&args, 0))?;
    let o = to_object(ctx, &this)?;
    Ok(JsValue::Boolean(has_own_property(&o, &key)))
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
        JsValue::Object(o) => o.borrow().class_name(),
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf
fn object_value_of(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    match this {
        JsValue::Object(_) => Ok(this),
        _ => Ok(JsValue::Object(to_object(ctx, &this)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::ObjectType;
    use crate::runner::ds::object_property::PropertyDescriptor;

    #[test]
    fn freeze_makes_properties_read_only() {
        let mut ctx = EvalContext::new();
        let o = object_create(&ctx);
        o.borrow_mut()
            .insert_property("a", PropertyDescriptor::new_data(JsValue::integer(1)));
        let v = JsValue::Object(o.clone());
        object_freeze(&mut ctx, JsValue::Undefined, vec![v.clone()]).unwrap();
        assert_eq!(
            object_is_frozen(&mut ctx, JsValue::Undefined, vec![v]).unwrap(),
            JsValue::Boolean(true)
        );
        let d = o.borrow().get_own_property("a").cloned().unwrap();
        assert!(!d.is_writable());
        assert!(!d.is_configurable());
    }

    #[test]
    fn to_string_reports_class() {
        let mut ctx = EvalContext::new();
        let array = JsValue::Object(ObjectType::new_array(None).into_ref());
        assert_eq!(
            object_to_string(&mut ctx, array, vec![]).unwrap(),
            JsValue::string("[object Array]")
        );
        assert_eq!(
            object_to_string(&mut ctx, JsValue::Null, vec![]).unwrap(),
            JsValue::string("[object Null]")
        );
    }
}
