//! Function built-in: the `Function` constructor and the `call`, `apply` and
//! `toString` methods every function inherits.

use tracing::debug;

use crate::runner::compiler::compile;
use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::{call, get};
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::CompletionType;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Function built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let function = BuiltInObject::new("Function")
        .with_constructor(&["p1", "body"], function_constructor)
        .add_prototype_method("call", &["thisArg"], function_call)
        .add_prototype_method("apply", &["thisArg", "argArray"], function_apply)
        .add_prototype_method("toString", &[], function_to_string);

    registry.register_object(function);
}

/// `Function(p1, …, pn, body)`: every argument but the last is a parameter
/// list. The function is created in the global scope, never in the caller's.
fn function_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let mut texts = Vec::with_capacity(args.len());
    for value in &args {
        texts.push(to_string(ctx, value)?);
    }
    let body = texts.pop().unwrap_or_default();
    let source = format!(
        "(function anonymous({}\n) {{\n{}\n}})",
        texts.join(","),
        body
    );

    let program = compile(&source, "anonymous").map_err(|e| {
        debug!(error = %e, "Function constructor rejected its source");
        let message = e
            .first()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| e.to_string());
        EvalError::from(JErrorType::SyntaxError(message))
    })?;

    let global_env = ctx.global_env();
    let completion = ctx.execute_in(&program, global_env)?;
    match completion.completion_type {
        CompletionType::Throw => Err(EvalError::Throw(completion.value_or_undefined())),
        _ => Ok(completion.value_or_undefined()),
    }
}

fn this_function(this: &JsValue, method: &str) -> Result<JsObjectType, EvalError> {
    match this {
        JsValue::Object(o) if o.borrow().is_callable() => Ok(o.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "Function.prototype.{} called on a value that is not a function",
            method
        ))
        .into()),
    }
}

/// Function.prototype.call
fn function_call(
    ctx: &mut EvalContext,
    this: JsValue,
    mut args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let f = this_function(&this, "call")?;
    let this_arg = if args.is_empty() {
        JsValue::Undefined
    } else {
        args.remove(0)
    };
    call(ctx, &JsValue::Object(f), this_arg, args)
}

/// Function.prototype.apply: `argArray` may be any array-like object.
fn function_apply(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let f = this_function(&this, "apply")?;
    let this_arg = arg(&args, 0);
    let call_args = match arg(&args, 1) {
        JsValue::Undefined | JsValue::Null => vec![],
        JsValue::Object(list) => create_list_from_array_like(ctx, &list)?,
        _ => {
            return Err(JErrorType::TypeError(
                "CreateListFromArrayLike called on non-object".to_string(),
            )
            .into())
        }
    };
    call(ctx, &JsValue::Object(f), this_arg, call_args)
}

/// Most arguments `apply` spreads into a call.
pub const MAX_APPLY_ARGUMENTS: usize = 65_535;

fn create_list_from_array_like(
    ctx: &mut EvalContext,
    list: &JsObjectType,
) -> Result<Vec<JsValue>, EvalError> {
    let len = get(ctx, list, "length")?;
    let len = to_number(ctx, &len)?;
    let len = if len.is_nan() || len <= 0.0 {
        0
    } else {
        len.floor() as usize
    };
    if len > MAX_APPLY_ARGUMENTS {
        return Err(JErrorType::RangeError("Too many arguments in function call".to_string()).into());
    }
    let mut values = Vec::new();
    for index in 0..len {
        values.push(get(ctx, list, &index.to_string())?);
    }
    Ok(values)
}

/// Function.prototype.toString. Script functions render their signature
/// only; the body text is not kept after compilation.
fn function_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    let f = this_function(&this, "toString")?;
    let f = f.borrow();
    let text = match f.as_function().map(|func| &func.kind) {
        Some(FunctionKind::Script { code, .. }) => {
            let params: Vec<&str> = code.params.iter().map(|p| p.name.as_str()).collect();
            format!("function {}({}) {{ [code] }}", code.name(), params.join(", "))
        }
        Some(FunctionKind::Native { name, .. }) => format!("function {}() {{ [native code] }}", name),
        None => String::new(),
    };
    Ok(JsValue::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::plugin::registry::BuiltInRegistry;

    fn context() -> EvalContext {
        let mut ctx = EvalContext::new();
        BuiltInRegistry::with_core().install(&mut ctx);
        ctx
    }

    #[test]
    fn constructor_builds_callable_function() {
        let mut ctx = context();
        let f = function_constructor(
            &mut ctx,
            JsValue::Undefined,
            vec![JsValue::string("a"), JsValue::string("b"), JsValue::string("return a * b")],
        )
        .unwrap();
        let r = call(&mut ctx, &f, JsValue::Undefined, vec![JsValue::integer(6), JsValue::integer(7)]);
        assert_eq!(r.unwrap(), JsValue::integer(42));
    }

    #[test]
    fn constructor_reports_syntax_errors() {
        let mut ctx = context();
        let r = function_constructor(&mut ctx, JsValue::Undefined, vec![JsValue::string("return )")]);
        assert!(matches!(r, Err(EvalError::Error(JErrorType::SyntaxError(_)))));
    }

    #[test]
    fn apply_spreads_array_like() {
        let mut ctx = context();
        let f = function_constructor(
            &mut ctx,
            JsValue::Undefined,
            vec![JsValue::string("return arguments.length")],
        )
        .unwrap();
        let list = crate::runner::ds::operations::object::create_array_from_list(
            &ctx,
            vec![JsValue::integer(1), JsValue::integer(2)],
        );
        let r = function_apply(&mut ctx, f, vec![JsValue::Null, JsValue::Object(list)]);
        assert_eq!(r.unwrap(), JsValue::integer(2));
    }
}
