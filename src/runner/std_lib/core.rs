//! Core built-ins registration.

use crate::runner::ds::error::EvalError;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

use super::{arg, array, error, function, math, object};

/// Register all core built-in objects with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    // Object first: the others hang their prototypes off Object.prototype.
    object::register(registry);
    function::register(registry);
    array::register(registry);
    error::register(registry);
    math::register(registry);

    registry.register_global_function("isNaN", &["number"], global_is_nan);
    registry.register_global_value("NaN", JsValue::Number(JsNumberType::NaN));
    registry.register_global_value("Infinity", JsValue::Number(JsNumberType::PositiveInfinity));
    registry.register_global_value("undefined", JsValue::Undefined);
}

fn global_is_nan(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let n = to_number(ctx, &arg(&args, 0))?;
    Ok(JsValue::Boolean(n.is_nan()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_nan_converts_its_argument() {
        let mut ctx = EvalContext::new();
        let r = global_is_nan(&mut ctx, JsValue::Undefined, vec![JsValue::string("abc")]);
        assert_eq!(r.unwrap(), JsValue::Boolean(true));
        let r = global_is_nan(&mut ctx, JsValue::Undefined, vec![JsValue::string(" 12 ")]);
        assert_eq!(r.unwrap(), JsValue::Boolean(false));
        let r = global_is_nan(&mut ctx, JsValue::Undefined, vec![]);
        assert_eq!(r.unwrap(), JsValue::Boolean(true));
    }
}
