use tracing::trace;

use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::test_and_comparison::is_callable;
use crate::runner::ds::operations::type_conversion::primitive_to_string;
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_script_function;
use crate::runner::plugin::types::EvalContext;
use crate::stack::ensure_sufficient_stack;

pub fn get(ctx: &mut EvalContext, o: &JsObjectType, key: &str) -> Result<JsValue, EvalError> {
    get_with_receiver(ctx, o, key, &JsValue::Object(o.clone()))
}

/// `[[Get]]` with an explicit receiver, which becomes `this` for a getter.
pub fn get_with_receiver(
    ctx: &mut EvalContext,
    o: &JsObjectType,
    key: &str,
    receiver: &JsValue,
) -> Result<JsValue, EvalError> {
    let desc = o.borrow().lookup_property(key);
    match desc {
        None => Ok(JsValue::Undefined),
        Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
        Some(PropertyDescriptor::Accessor { get: None, .. }) => Ok(JsValue::Undefined),
        Some(PropertyDescriptor::Accessor { get: Some(getter), .. }) => {
            call(ctx, &JsValue::Object(getter), receiver.clone(), vec![])
        }
    }
}

/// Property read on any value. Primitives read through `Object.prototype`,
/// strings additionally expose `length` and their code units.
pub fn get_v(ctx: &mut EvalContext, v: &JsValue, key: &str) -> Result<JsValue, EvalError> {
    match v {
        JsValue::Object(o) => get(ctx, o, key),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read property '{}' of {}",
            key,
            primitive_to_string(v)
        ))
        .into()),
        _ => {
            if let JsValue::String(s) = v {
                if key == "length" {
                    return Ok(JsValue::integer(s.encode_utf16().count() as i64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    if index.to_string() == key {
                        // Strings are UTF-8, so a lone surrogate unit reads as U+FFFD.
                        if let Some(unit) = s.encode_utf16().nth(index) {
                            return Ok(JsValue::String(String::from_utf16_lossy(&[unit])));
                        }
                    }
                }
            }
            match ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype) {
                Some(proto) => get_with_receiver(ctx, &proto, key, v),
                None => Ok(JsValue::Undefined),
            }
        }
    }
}

/// `[[Set]]` following OrdinarySet. Returns `false` when the assignment was
/// refused (read-only data property, accessor without setter,
/// non-extensible receiver).
pub fn set(
    ctx: &mut EvalContext,
    o: &JsObjectType,
    key: &str,
    value: JsValue,
    receiver: &JsValue,
) -> Result<bool, EvalError> {
    let desc = o.borrow().lookup_property(key);
    match desc {
        Some(PropertyDescriptor::Data {
            writable: false, ..
        }) => Ok(false),
        Some(PropertyDescriptor::Accessor { set: None, .. }) => Ok(false),
        Some(PropertyDescriptor::Accessor {
            set: Some(setter), ..
        }) => {
            call(ctx, &JsValue::Object(setter), receiver.clone(), vec![value])?;
            Ok(true)
        }
        _ => {
            let receiver = match receiver {
                JsValue::Object(r) => r,
                _ => return Ok(false),
            };
            let mut r = receiver.borrow_mut();
            let own = r.get_own_property(key).cloned();
            Ok(match own {
                Some(PropertyDescriptor::Data { writable: true, .. }) => {
                    r.define_own_property(key.to_string(), PropertyDescriptorSetter::value_only(value))
                }
                Some(_) => false,
                None => r.define_own_property(
                    key.to_string(),
                    PropertyDescriptorSetter::new_from_property_descriptor(
                        PropertyDescriptor::new_data(value),
                    ),
                ),
            })
        }
    }
}

/// PutValue on a property reference: refused writes throw in strict code
/// and are dropped otherwise.
pub fn put_v(
    ctx: &mut EvalContext,
    base: &JsValue,
    key: &str,
    value: JsValue,
    strict: bool,
) -> Result<(), EvalError> {
    match base {
        JsValue::Object(o) => {
            if !set(ctx, o, key, value, base)? && strict {
                return Err(JErrorType::TypeError(format!(
                    "Cannot assign to read only property '{}' of object",
                    key
                ))
                .into());
            }
            Ok(())
        }
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set property '{}' of {}",
            key,
            primitive_to_string(base)
        ))
        .into()),
        _ => {
            if strict {
                Err(JErrorType::TypeError(format!(
                    "Cannot create property '{}' on {} '{}'",
                    key,
                    crate::runner::ds::operations::type_conversion::get_type(base),
                    primitive_to_string(base)
                ))
                .into())
            } else {
                Ok(())
            }
        }
    }
}

pub fn has_property(o: &JsObjectType, key: &str) -> bool {
    o.borrow().has_property(key)
}

pub fn has_own_property(o: &JsObjectType, key: &str) -> bool {
    o.borrow().get_own_property(key).is_some()
}

/// CreateDataProperty: a writable, enumerable, configurable own property.
pub fn create_data_property(o: &JsObjectType, key: &str, value: JsValue) -> bool {
    o.borrow_mut().define_own_property(
        key.to_string(),
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_data(
            value,
        )),
    )
}

pub fn define_property_or_throw(
    o: &JsObjectType,
    key: &str,
    desc: PropertyDescriptorSetter,
) -> Result<(), EvalError> {
    if o.borrow_mut().define_own_property(key.to_string(), desc) {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!("Cannot redefine property: {}", key)).into())
    }
}

/// Own enumerable string keys in insertion order, as `Object.keys` reports.
pub fn enumerable_own_keys(o: &JsObjectType) -> Vec<String> {
    let o = o.borrow();
    o.own_keys()
        .into_iter()
        .filter(|k| o.get_own_property(k).map_or(false, |d| d.is_enumerable()))
        .collect()
}

/// The names a `for-in` loop visits: enumerable keys of the object and then
/// of each prototype, each name once. A name shadowed by a non-enumerable
/// property closer to the object is not visited.
pub fn for_in_keys(o: &JsObjectType) -> Vec<String> {
    let mut visited: Vec<String> = vec![];
    let mut keys: Vec<String> = vec![];
    let mut current = Some(o.clone());
    while let Some(obj) = current {
        let b = obj.borrow();
        for k in b.own_keys() {
            if visited.contains(&k) {
                continue;
            }
            if b.get_own_property(&k).map_or(false, |d| d.is_enumerable()) {
                keys.push(k.clone());
            }
            visited.push(k);
        }
        current = b.get_prototype_of();
    }
    keys
}

/// Whether `key` is still reachable as an enumerable property, checked
/// before each `for-in` iteration so deleted keys are skipped.
pub fn is_enumerable_in_chain(o: &JsObjectType, key: &str) -> bool {
    let mut current = Some(o.clone());
    while let Some(obj) = current {
        let b = obj.borrow();
        if let Some(d) = b.get_own_property(key) {
            return d.is_enumerable();
        }
        current = b.get_prototype_of();
    }
    false
}

pub fn create_array_from_list(ctx: &EvalContext, values: Vec<JsValue>) -> JsObjectType {
    let mut array = ObjectType::new_array(ctx.realm.intrinsic(WellKnownIntrinsics::ArrayPrototype));
    for (i, v) in values.into_iter().enumerate() {
        array.insert_property(i.to_string(), PropertyDescriptor::new_data(v));
    }
    array.into_ref()
}

pub fn object_create(ctx: &EvalContext) -> JsObjectType {
    ObjectType::new_ordinary(ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype)).into_ref()
}

/// Calls `f` with the native calling convention. Every call, script or
/// native, counts against the configured call depth.
pub fn call(
    ctx: &mut EvalContext,
    f: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let fobj = match f {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                primitive_to_string(f)
            ))
            .into())
        }
    };
    let native = match fobj.borrow().as_function().map(|func| &func.kind) {
        Some(FunctionKind::Native { function, name, .. }) => Some((function.clone(), name.clone())),
        _ => None,
    };
    match native {
        Some((function, name)) => {
            trace!(function = %name, argc = args.len(), "native call");
            ctx.enter_call()?;
            let result = ensure_sufficient_stack(|| function.call(ctx, this, args));
            ctx.leave_call();
            result
        }
        None => call_script_function(ctx, &fobj, this, args),
    }
}

/// `[[Construct]]`: a fresh object inheriting from `F.prototype` is passed
/// as `this`; an object returned by `F` replaces it.
pub fn construct(
    ctx: &mut EvalContext,
    f: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let fobj = match f {
        JsValue::Object(o) if o.borrow().is_constructor() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a constructor",
                primitive_to_string(f)
            ))
            .into())
        }
    };
    let prototype = match get(ctx, &fobj, "prototype")? {
        JsValue::Object(p) => Some(p),
        _ => ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype),
    };
    let this_obj = JsValue::Object(ObjectType::new_ordinary(prototype).into_ref());
    let result = call(ctx, f, this_obj.clone(), args)?;
    Ok(match result {
        JsValue::Object(_) => result,
        _ => this_obj,
    })
}

/// OrdinaryHasInstance, the `instanceof` operator.
pub fn ordinary_has_instance(
    ctx: &mut EvalContext,
    c: &JsValue,
    o: &JsValue,
) -> Result<bool, EvalError> {
    if !is_callable(c) {
        return Err(JErrorType::TypeError(
            "Right-hand side of 'instanceof' is not callable".to_string(),
        )
        .into());
    }
    let o = match o {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(false),
    };
    let prototype = match c {
        JsValue::Object(cobj) => get(ctx, cobj, "prototype")?,
        _ => JsValue::Undefined,
    };
    let prototype = match prototype {
        JsValue::Object(p) => p,
        _ => {
            return Err(JErrorType::TypeError(
                "Function has non-object prototype in instanceof check".to_string(),
            )
            .into())
        }
    };
    let mut current = o.borrow().get_prototype_of();
    while let Some(p) = current {
        if std::rc::Rc::ptr_eq(&p, &prototype) {
            return Ok(true);
        }
        current = p.borrow().get_prototype_of();
    }
    Ok(false)
}
