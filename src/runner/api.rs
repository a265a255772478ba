//! The engine facade: compile source text, execute it against one realm and
//! hand back a value or an error the host can act on.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::runner::compiler::{compile_with_strictness, CompileError, Program};
use crate::runner::config::EngineConfig;
use crate::runner::ds::error::{EvalError, InternalFault};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::get_v;
use crate::runner::ds::operations::type_conversion::{primitive_to_string, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::{Completion, CompletionType, CompletionValue};
use crate::runner::plugin::types::{BuiltInFn, EvalContext};

/// Why [`JsEngine::run`] did not produce a value.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source did not compile.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Script code threw and nothing caught it.
    #[error("Uncaught {message}")]
    Uncaught { message: String, value: JsValue },
    /// The engine broke one of its own invariants.
    #[error(transparent)]
    Fault(#[from] InternalFault),
}

impl EngineError {
    pub fn is_uncaught(&self) -> bool {
        matches!(self, EngineError::Uncaught { .. })
    }
}

/// One engine instance: a configuration and a realm. Globals defined by one
/// execution are visible to the next; two engines never share a global
/// object.
///
/// ```
/// use jsrun::runner::api::JsEngine;
/// use jsrun::runner::ds::value::JsValue;
///
/// let mut engine = JsEngine::new();
/// engine.run("function f(a) { return a * 2; }").unwrap();
/// assert_eq!(engine.run("f(21)").unwrap(), JsValue::integer(42));
/// ```
pub struct JsEngine {
    config: EngineConfig,
    ctx: EvalContext,
}

impl JsEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let ctx = EvalContext::with_config(&config);
        JsEngine { config, ctx }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compiles `source` under the configured default source name.
    pub fn compile(&self, source: &str) -> Result<Program, CompileError> {
        compile_with_strictness(source, &self.config.default_source_name, self.config.strict)
    }

    pub fn compile_named(&self, source: &str, source_name: &str) -> Result<Program, CompileError> {
        compile_with_strictness(source, source_name, self.config.strict)
    }

    /// Executes `program` against the global environment. A Reference left
    /// by a final expression statement is read here, so the completion
    /// always carries a plain value.
    pub fn execute(&mut self, program: &Program) -> Result<Completion, InternalFault> {
        let completion = self.ctx.execute(program)?;
        let reference = match &completion.value {
            Some(CompletionValue::Reference(reference)) => reference.clone(),
            _ => return Ok(completion),
        };
        match reference.get_value(&mut self.ctx) {
            Ok(v) => Ok(Completion::normal_with_value(v)),
            Err(e) => Ok(Completion::throw(self.ctx.error_to_value(e)?)),
        }
    }

    /// Compiles and executes `source`, returning the completion value.
    pub fn run(&mut self, source: &str) -> Result<JsValue, EngineError> {
        let program = self.compile(source)?;
        self.run_program(&program)
    }

    /// Runs the lines as one script, joined with newlines.
    pub fn evaluate(&mut self, lines: &[&str]) -> Result<JsValue, EngineError> {
        self.run(&lines.join("\n"))
    }

    pub fn run_program(&mut self, program: &Program) -> Result<JsValue, EngineError> {
        let completion = self.execute(program)?;
        match completion.completion_type {
            CompletionType::Normal => Ok(completion.value_or_undefined()),
            CompletionType::Throw => {
                let value = completion.value_or_undefined();
                let message = describe_thrown(&mut self.ctx, &value);
                warn!(source = program.source_name(), %message, "uncaught exception");
                Err(EngineError::Uncaught { message, value })
            }
            other => Err(InternalFault::new(format!("{:?} completion at the top level", other)).into()),
        }
    }

    /// Binds a host function on the global object.
    pub fn define_native_function<F>(&mut self, name: &str, params: &[&str], function: F)
    where
        F: Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, EvalError> + 'static,
    {
        let f = self
            .ctx
            .create_native_function(name, params, BuiltInFn::Plugin(Box::new(function)), false);
        self.ctx.define_global(name, JsValue::Object(f));
    }

    pub fn define_global_value(&mut self, name: &str, value: JsValue) {
        self.ctx.define_global(name, value);
    }

    /// Reads a global binding. Unlike a script reference, a missing name
    /// is `undefined` rather than a ReferenceError.
    pub fn global(&mut self, name: &str) -> JsValue {
        self.ctx.get_binding(name).unwrap_or(JsValue::Undefined)
    }

    pub fn context(&mut self) -> &mut EvalContext {
        &mut self.ctx
    }

    pub fn global_object(&self) -> JsObjectType {
        self.ctx.global_object()
    }

    pub fn realm_id(&self) -> Uuid {
        self.ctx.realm.id
    }
}

impl Default for JsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// `name: message` for error-like objects, the string value otherwise.
/// Getters that throw while describing fall back to a placeholder.
fn describe_thrown(ctx: &mut EvalContext, value: &JsValue) -> String {
    match value {
        JsValue::Object(_) => {
            let read = |ctx: &mut EvalContext, key: &str| -> Option<String> {
                match get_v(ctx, value, key) {
                    Ok(JsValue::Undefined) | Err(_) => None,
                    Ok(v) => to_string(ctx, &v).ok(),
                }
            };
            match (read(&mut *ctx, "name"), read(&mut *ctx, "message")) {
                (Some(name), Some(message)) if !message.is_empty() => {
                    format!("{}: {}", name, message)
                }
                (Some(name), _) => name,
                (None, Some(message)) => message,
                (None, None) => "[object Object]".to_string(),
            }
        }
        primitive => primitive_to_string(primitive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_errors_are_described_by_name_and_message() {
        let mut engine = JsEngine::new();
        let err = engine.run("null.x").unwrap_err();
        match err {
            EngineError::Uncaught { message, .. } => {
                assert!(message.starts_with("TypeError: "), "{}", message)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn thrown_primitives_keep_their_value() {
        let mut engine = JsEngine::new();
        match engine.run("throw 7").unwrap_err() {
            EngineError::Uncaught { message, value } => {
                assert_eq!(message, "7");
                assert_eq!(value, JsValue::integer(7));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn final_reference_is_dereferenced() {
        let mut engine = JsEngine::new();
        let program = engine.compile("var o = {p: 3}; o.p").unwrap();
        let completion = engine.execute(&program).unwrap();
        assert_eq!(completion.get_value(), Some(&JsValue::integer(3)));
    }

    #[test]
    fn final_unresolvable_reference_throws() {
        let mut engine = JsEngine::new();
        let program = engine.compile("missing").unwrap();
        let completion = engine.execute(&program).unwrap();
        assert_eq!(completion.completion_type, CompletionType::Throw);
    }
}
