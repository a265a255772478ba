//! Function objects created from script code, and calling them.

use std::rc::Rc;

use tracing::trace;

use crate::parser::ast::FunctionData;
use crate::runner::ds::error::{EvalError, InternalFault};
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::function_object::{FunctionKind, FunctionObject};
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::type_conversion::to_object;
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{install_function_properties, EvalContext};
use crate::stack::ensure_sufficient_stack;

use super::statement::{execute_statement_list, instantiate_lexical_declarations};
use super::types::{CompletionType, ValueResult};

/// Creates a function object closing over `env`. `name` overrides the
/// declared name, which is how anonymous function expressions pick up the
/// name of the binding they are assigned to.
pub fn instantiate_function(
    ctx: &EvalContext,
    code: &Rc<FunctionData>,
    env: JsLexEnvironmentType,
    name: Option<&str>,
) -> JsObjectType {
    let func = FunctionObject::new_script_function(
        code.clone(),
        env,
        ctx.realm.intrinsic(WellKnownIntrinsics::FunctionPrototype),
    );
    let arity = func.arity();
    let mut o = ObjectType::Function(func);
    install_function_properties(&mut o, name.unwrap_or_else(|| code.name()), arity);
    let f = o.into_ref();

    let prototype =
        ObjectType::new_ordinary(ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype))
            .into_ref();
    prototype.borrow_mut().insert_property(
        "constructor",
        PropertyDescriptor::new_hidden(JsValue::Object(f.clone())),
    );
    f.borrow_mut().insert_property(
        "prototype",
        PropertyDescriptor::Data {
            value: JsValue::Object(prototype),
            writable: true,
            enumerable: false,
            configurable: false,
        },
    );
    f
}

/// A function expression. A named one gets its own scope holding an
/// immutable binding of its name, so the body can refer to itself.
pub fn instantiate_function_expression(
    ctx: &EvalContext,
    code: &Rc<FunctionData>,
    name_hint: Option<&str>,
) -> Result<JsObjectType, EvalError> {
    let scope = ctx.lex_env();
    match &code.id {
        None => Ok(instantiate_function(ctx, code, scope, name_hint)),
        Some(id) => {
            let func_env = LexEnvironment::new_declarative_environment(Some(scope));
            let f = instantiate_function(ctx, code, func_env.clone(), None);
            {
                let mut env = func_env.borrow_mut();
                let record = env.inner.as_env_record_mut();
                record.create_immutable_binding(id.name.to_string(), false)?;
                record.initialize_binding(&id.name, JsValue::Object(f.clone()))?;
            }
            Ok(f)
        }
    }
}

/// `[[Call]]` of a script function.
pub fn call_script_function(
    ctx: &mut EvalContext,
    fobj: &JsObjectType,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let (code, closure, strict) = match fobj.borrow().as_function().map(|f| &f.kind) {
        Some(FunctionKind::Script {
            code,
            environment,
            strict,
        }) => (code.clone(), environment.clone(), *strict),
        _ => return Err(InternalFault::new("script call on a non-script function").into()),
    };
    ctx.enter_call()?;
    trace!(function = code.name(), argc = args.len(), depth = ctx.call_depth(), "call");
    let result = ensure_sufficient_stack(|| {
        run_function_body(ctx, fobj, &code, closure, strict, this, args)
    });
    ctx.leave_call();
    result
}

fn run_function_body(
    ctx: &mut EvalContext,
    fobj: &JsObjectType,
    code: &Rc<FunctionData>,
    closure: JsLexEnvironmentType,
    strict: bool,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let this_binding = if strict {
        this
    } else if this.is_nullish() {
        JsValue::Object(ctx.global_object())
    } else {
        match this {
            JsValue::Object(_) => this,
            primitive => JsValue::Object(to_object(ctx, &primitive)?),
        }
    };

    let var_env = LexEnvironment::new_declarative_environment(Some(closure));
    ctx.ctx_stack.push_execution_ctx(ExecutionContext {
        function: Some(fobj.clone()),
        lex_env: var_env.clone(),
        var_env: var_env.clone(),
        this_binding,
        strict,
    });
    let depth = ctx.ctx_stack.len();

    let result = function_declaration_instantiation(ctx, fobj, code, &var_env, strict, args)
        .and_then(|lex_env| {
            ctx.set_lex_env(lex_env);
            execute_statement_list(&code.body.statements, ctx)
        });

    while ctx.ctx_stack.len() >= depth {
        ctx.ctx_stack.pop_running_execution_ctx();
    }

    let completion = result?;
    match completion.completion_type {
        CompletionType::Return => Ok(completion.value_or_undefined()),
        CompletionType::Normal => Ok(JsValue::Undefined),
        CompletionType::Throw => Err(EvalError::Throw(completion.value_or_undefined())),
        CompletionType::Break | CompletionType::Continue => Err(InternalFault::new(
            "break or continue escaped a function body",
        )
        .into()),
    }
}

/// Binds parameters, `arguments`, hoisted vars and function declarations in
/// the function's variable environment and returns the lexical environment
/// the body runs in.
fn function_declaration_instantiation(
    ctx: &mut EvalContext,
    fobj: &JsObjectType,
    code: &Rc<FunctionData>,
    var_env: &JsLexEnvironmentType,
    strict: bool,
    args: Vec<JsValue>,
) -> Result<JsLexEnvironmentType, EvalError> {
    let scope = &code.body.scope;
    let parameter_names: Vec<&str> = code.params.iter().map(|p| p.name.as_str()).collect();
    let function_names: Vec<&str> = scope.functions.iter().map(|f| f.name()).collect();

    let needs_arguments = !parameter_names.contains(&"arguments")
        && !function_names.contains(&"arguments")
        && !scope.is_lexically_declared("arguments");
    let arguments_object = if needs_arguments {
        Some(create_arguments_object(ctx, fobj, &args, strict))
    } else {
        None
    };

    {
        let mut env = var_env.borrow_mut();
        let record = env.inner.as_env_record_mut();
        for name in &parameter_names {
            if !record.has_binding(name) {
                record.create_mutable_binding(name.to_string(), false)?;
                record.initialize_binding(name, JsValue::Undefined)?;
            }
        }
        // A repeated parameter name takes the last argument given for it.
        for (index, name) in parameter_names.iter().enumerate() {
            let value = args.get(index).cloned().unwrap_or(JsValue::Undefined);
            record.set_mutable_binding(name, value, false)?;
        }

        if let Some(arguments) = arguments_object {
            if strict {
                record.create_immutable_binding("arguments".to_string(), false)?;
            } else {
                record.create_mutable_binding("arguments".to_string(), false)?;
            }
            record.initialize_binding("arguments", JsValue::Object(arguments))?;
        }

        for name in scope.var_declared_names() {
            if !record.has_binding(name) {
                record.create_mutable_binding(name.to_string(), false)?;
                record.initialize_binding(name, JsValue::Undefined)?;
            }
        }
    }

    let lex_env = if scope.lexical_names.is_empty() {
        var_env.clone()
    } else {
        let lex_env = LexEnvironment::new_declarative_environment(Some(var_env.clone()));
        instantiate_lexical_declarations(&lex_env, scope)?;
        lex_env
    };

    for f in &scope.functions {
        let fo = instantiate_function(ctx, f, lex_env.clone(), None);
        let mut env = var_env.borrow_mut();
        let record = env.inner.as_env_record_mut();
        if !record.has_binding(f.name()) {
            record.create_mutable_binding(f.name().to_string(), false)?;
            record.initialize_binding(f.name(), JsValue::Object(fo))?;
        } else {
            record.set_mutable_binding(f.name(), JsValue::Object(fo), false)?;
        }
    }

    Ok(lex_env)
}

/// An unmapped arguments object: indexed values and a hidden `length`, plus
/// `callee` in sloppy functions.
fn create_arguments_object(
    ctx: &EvalContext,
    fobj: &JsObjectType,
    args: &[JsValue],
    strict: bool,
) -> JsObjectType {
    let mut o = ObjectType::Arguments(ObjectBase::new(
        ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype),
    ));
    for (index, value) in args.iter().enumerate() {
        o.insert_property(index.to_string(), PropertyDescriptor::new_data(value.clone()));
    }
    o.insert_property(
        "length",
        PropertyDescriptor::new_hidden(JsValue::integer(args.len() as i64)),
    );
    if !strict {
        o.insert_property(
            "callee",
            PropertyDescriptor::new_hidden(JsValue::Object(fobj.clone())),
        );
    }
    o.into_ref()
}
