//! Error built-in objects.
//!
//! Error and the four native error constructors the engine raises:
//! TypeError, ReferenceError, SyntaxError and RangeError. Their prototypes
//! are the realm's intrinsics, so `e instanceof TypeError` holds for errors
//! raised by the engine as well as for script-constructed ones.

use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::object::get_v;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeFn};

use super::arg;

/// Register all error types with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_object(
        BuiltInObject::new("Error")
            .with_constructor(&["message"], error_constructor)
            .add_prototype_method("toString", &[], error_to_string),
    );

    let native_errors: [(&str, NativeFn); 4] = [
        ("TypeError", type_error_constructor),
        ("ReferenceError", reference_error_constructor),
        ("SyntaxError", syntax_error_constructor),
        ("RangeError", range_error_constructor),
    ];
    for (name, constructor) in native_errors.iter() {
        registry.register_object(
            BuiltInObject::new(*name)
                .with_prototype("Error")
                .with_constructor(&["message"], *constructor),
        );
    }
}

/// Builds the error object. Under `new`, `this` is a fresh object already
/// linked to the constructor's `prototype`; as a plain call it is not, and
/// the realm intrinsic is used.
fn create_error(
    ctx: &mut EvalContext,
    this: &JsValue,
    fallback: WellKnownIntrinsics,
    args: &[JsValue],
) -> Result<JsValue, EvalError> {
    let prototype = match this {
        JsValue::Object(o) if is_fresh_receiver(o) => o.borrow().get_prototype_of(),
        _ => None,
    }
    .or_else(|| ctx.realm.intrinsic(fallback));

    let mut error = ObjectType::Error(ObjectBase::new(prototype));
    let message = arg(args, 0);
    if !message.is_undefined() {
        let message = to_string(ctx, &message)?;
        error.insert_property("message", PropertyDescriptor::new_hidden(JsValue::String(message)));
    }
    Ok(JsValue::Object(error.into_ref()))
}

fn is_fresh_receiver(o: &JsObjectType) -> bool {
    let o = o.borrow();
    matches!(&*o, ObjectType::Ordinary(_)) && o.own_keys().is_empty()
}

fn error_constructor(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    create_error(ctx, &this, WellKnownIntrinsics::ErrorPrototype, &args)
}

fn type_error_constructor(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    create_error(ctx, &this, WellKnownIntrinsics::TypeErrorPrototype, &args)
}

fn reference_error_constructor(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    create_error(ctx, &this, WellKnownIntrinsics::ReferenceErrorPrototype, &args)
}

fn syntax_error_constructor(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    create_error(ctx, &this, WellKnownIntrinsics::SyntaxErrorPrototype, &args)
}

fn range_error_constructor(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    create_error(ctx, &this, WellKnownIntrinsics::RangeErrorPrototype, &args)
}

/// Error.prototype.toString
fn error_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    if this.as_object().is_none() {
        return Err(JErrorType::TypeError(
            "Error.prototype.toString called on non-object".to_string(),
        )
        .into());
    }
    let name = match get_v(ctx, &this, "name")? {
        JsValue::Undefined => "Error".to_string(),
        v => to_string(ctx, &v)?,
    };
    let message = match get_v(ctx, &this, "message")? {
        JsValue::Undefined => String::new(),
        v => to_string(ctx, &v)?,
    };
    Ok(JsValue::String(if name.is_empty() {
        message
    } else if message.is_empty() {
        name
    } else {
        format!("{}: {}", name, message)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::plugin::registry::BuiltInRegistry;

    #[test]
    fn called_without_new_uses_the_intrinsic_prototype() {
        let mut ctx = EvalContext::new();
        BuiltInRegistry::with_core().install(&mut ctx);
        let e = type_error_constructor(&mut ctx, JsValue::Undefined, vec![JsValue::string("bad")])
            .unwrap();
        let proto = e.as_object().unwrap().borrow().get_prototype_of().unwrap();
        let expected = ctx
            .realm
            .intrinsic(WellKnownIntrinsics::TypeErrorPrototype)
            .unwrap();
        assert!(std::rc::Rc::ptr_eq(&proto, &expected));
        assert_eq!(
            error_to_string(&mut ctx, e, vec![]).unwrap(),
            JsValue::string("TypeError: bad")
        );
    }

    #[test]
    fn message_is_optional() {
        let mut ctx = EvalContext::new();
        BuiltInRegistry::with_core().install(&mut ctx);
        let e = error_constructor(&mut ctx, JsValue::Undefined, vec![]).unwrap();
        assert_eq!(error_to_string(&mut ctx, e, vec![]).unwrap(), JsValue::string("Error"));
    }
}
