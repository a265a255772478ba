//! The evaluation context and the types of the native calling convention.

use tracing::error;

use crate::runner::compiler::Program;
use crate::runner::config::EngineConfig;
use crate::runner::ds::error::{EvalError, InternalFault, JErrorType};
use crate::runner::ds::execution_context::{ExecutionContext, ExecutionContextStack};
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::realm::{CodeRealm, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::reference::Reference;
use crate::runner::eval::statement::execute_program;
use crate::runner::eval::types::Completion;
use crate::runner::plugin::registry::BuiltInRegistry;

/// State of one interpreter: the realm, the stack of running execution
/// contexts and the call depth guard.
pub struct EvalContext {
    pub realm: CodeRealm,
    pub ctx_stack: ExecutionContextStack,
    call_depth: usize,
    max_call_depth: usize,
}

impl EvalContext {
    /// A context with an empty global object. See
    /// [`EvalContext::install_core_builtins`].
    pub fn new() -> Self {
        EvalContext {
            realm: CodeRealm::new(),
            ctx_stack: ExecutionContextStack::new(),
            call_depth: 0,
            max_call_depth: EngineConfig::DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let mut ctx = EvalContext::new();
        ctx.max_call_depth = config.max_call_depth;
        if config.install_builtins {
            ctx.install_core_builtins(BuiltInRegistry::with_core());
        }
        ctx
    }

    pub fn install_core_builtins(&mut self, registry: BuiltInRegistry) {
        registry.install(self);
    }

    pub fn global_object(&self) -> JsObjectType {
        self.realm.global_object.clone()
    }

    pub fn global_env(&self) -> JsLexEnvironmentType {
        self.realm.global_env.clone()
    }

    pub fn running_execution_ctx(&self) -> Option<&ExecutionContext> {
        self.ctx_stack.get_running_execution_ctx()
    }

    /// The lexical environment of the running code, the global environment
    /// when nothing runs.
    pub fn lex_env(&self) -> JsLexEnvironmentType {
        match self.running_execution_ctx() {
            Some(c) => c.lex_env.clone(),
            None => self.global_env(),
        }
    }

    pub fn var_env(&self) -> JsLexEnvironmentType {
        match self.running_execution_ctx() {
            Some(c) => c.var_env.clone(),
            None => self.global_env(),
        }
    }

    /// Replaces the running lexical environment, returning the previous one
    /// so the caller can restore it.
    pub fn set_lex_env(&mut self, env: JsLexEnvironmentType) -> JsLexEnvironmentType {
        match self.ctx_stack.get_running_execution_ctx_mut() {
            Some(c) => std::mem::replace(&mut c.lex_env, env),
            None => env,
        }
    }

    pub fn this_binding(&self) -> JsValue {
        match self.running_execution_ctx() {
            Some(c) => c.this_binding.clone(),
            None => JsValue::Object(self.global_object()),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.running_execution_ctx().map_or(false, |c| c.strict)
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    pub fn enter_call(&mut self) -> Result<(), EvalError> {
        if self.call_depth >= self.max_call_depth {
            return Err(JErrorType::RangeError("Maximum call stack size exceeded".to_string()).into());
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn leave_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Runs a compiled Program against the global environment.
    pub fn execute(&mut self, program: &Program) -> Result<Completion, InternalFault> {
        let env = self.global_env();
        self.execute_in(program, env)
    }

    /// Runs a compiled Program with `env` as its variable environment.
    pub fn execute_in(
        &mut self,
        program: &Program,
        env: JsLexEnvironmentType,
    ) -> Result<Completion, InternalFault> {
        let result = execute_program(program, env, self);
        if let Err(fault) = &result {
            error!(source = %program.source_name(), %fault, "program aborted");
        }
        result
    }

    /// Reads a binding visible from the global environment.
    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, EvalError> {
        let env = self.global_env();
        Reference::resolve(&env, name, false).get_value(self)
    }

    /// Creates the Error object for an engine-raised error, using this
    /// realm's prototypes.
    pub fn new_error(&self, error: &JErrorType) -> JsValue {
        let proto = self
            .realm
            .intrinsic(WellKnownIntrinsics::prototype_for_error(error));
        let mut o = ObjectType::Error(ObjectBase::new(proto));
        o.insert_property(
            "message",
            PropertyDescriptor::new_hidden(JsValue::string(error.message())),
        );
        JsValue::Object(o.into_ref())
    }

    /// The value a `catch` clause binds for `err`. Faults are not catchable
    /// and are handed back.
    pub fn error_to_value(&self, err: EvalError) -> Result<JsValue, InternalFault> {
        match err {
            EvalError::Throw(v) => Ok(v),
            EvalError::Error(e) => Ok(self.new_error(&e)),
            EvalError::Fault(f) => Err(f),
        }
    }

    /// A native function object with `length` and `name` set up.
    pub fn create_native_function(
        &self,
        name: &str,
        formal_parameters: &[&str],
        function: BuiltInFn,
        is_constructor: bool,
    ) -> JsObjectType {
        let func = FunctionObject::new_native_function(
            name,
            formal_parameters.iter().map(|p| p.to_string()).collect(),
            function,
            is_constructor,
            self.realm.intrinsic(WellKnownIntrinsics::FunctionPrototype),
        );
        let arity = func.arity();
        let mut o = ObjectType::Function(func);
        install_function_properties(&mut o, name, arity);
        o.into_ref()
    }

    /// Defines a writable, non-enumerable, configurable property on the
    /// global object, the way built-in globals are installed.
    pub fn define_global(&mut self, name: &str, value: JsValue) {
        self.realm
            .global_object
            .borrow_mut()
            .insert_property(name, PropertyDescriptor::new_hidden(value));
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `length` and `name` of a function object: read-only, hidden, configurable.
pub fn install_function_properties(o: &mut ObjectType, name: &str, arity: usize) {
    o.insert_property(
        "length",
        PropertyDescriptor::Data {
            value: JsValue::integer(arity as i64),
            writable: false,
            enumerable: false,
            configurable: true,
        },
    );
    o.insert_property(
        "name",
        PropertyDescriptor::Data {
            value: JsValue::string(name),
            writable: false,
            enumerable: false,
            configurable: true,
        },
    );
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn =
    fn(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError>;

/// Built-in function - either compiled-in or host-provided.
pub enum BuiltInFn {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),

    /// Host-provided closure.
    Plugin(Box<dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, EvalError>>),
}

impl BuiltInFn {
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EvalError> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

/// A method of a built-in object together with its declared parameters.
pub struct BuiltInMethod {
    pub name: String,
    pub formal_parameters: Vec<String>,
    pub function: BuiltInFn,
}
impl BuiltInMethod {
    pub fn into_function_object(self, ctx: &EvalContext, is_constructor: bool) -> JsObjectType {
        let params: Vec<&str> = self.formal_parameters.iter().map(|p| p.as_str()).collect();
        ctx.create_native_function(&self.name, &params, self.function, is_constructor)
    }
}

/// Built-in object definition.
/// Represents a JavaScript built-in object like Object, Math or Error.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Object", "Math"); also its global binding.
    pub name: String,

    /// Name of the built-in whose prototype this one's prototype inherits
    /// from (e.g., "Error" for "TypeError").
    pub prototype: Option<String>,

    /// Methods defined on the object itself (or the constructor).
    pub methods: Vec<BuiltInMethod>,

    /// Methods defined on `<name>.prototype`.
    pub prototype_methods: Vec<BuiltInMethod>,

    /// Static value properties, installed read-only.
    pub properties: Vec<(String, JsValue)>,

    /// Constructor function and its declared parameters, if this object is
    /// constructable.
    pub constructor: Option<BuiltInMethod>,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: Some("Object".to_string()),
            methods: Vec::new(),
            prototype_methods: Vec::new(),
            properties: Vec::new(),
            constructor: None,
        }
    }

    /// Set the prototype chain parent.
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    /// Add a native method to the object itself.
    pub fn add_method(mut self, name: impl Into<String>, params: &[&str], func: NativeFn) -> Self {
        self.methods.push(native_method(name.into(), params, func));
        self
    }

    /// Add a native method to the object's prototype.
    pub fn add_prototype_method(
        mut self,
        name: impl Into<String>,
        params: &[&str],
        func: NativeFn,
    ) -> Self {
        self.prototype_methods
            .push(native_method(name.into(), params, func));
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(mut self, params: &[&str], constructor: NativeFn) -> Self {
        self.constructor = Some(native_method(self.name.clone(), params, constructor));
        self
    }

    /// Materializes this definition in `ctx`'s realm and binds it on the
    /// global object. Known constructors reuse the realm's intrinsic
    /// prototypes so engine-raised errors and literals share them.
    pub fn install(self, ctx: &mut EvalContext) -> JsObjectType {
        let BuiltInObject {
            name,
            prototype,
            methods,
            prototype_methods,
            properties,
            constructor,
        } = self;
        let realm_proto =
            WellKnownIntrinsics::prototype_for(&name).and_then(|which| ctx.realm.intrinsic(which));

        let (target, proto) = match constructor {
            Some(ctor) => {
                let target = ctor.into_function_object(ctx, true);
                let proto = match realm_proto {
                    Some(p) => p,
                    None => {
                        let parent = prototype
                            .as_deref()
                            .and_then(WellKnownIntrinsics::prototype_for)
                            .and_then(|which| ctx.realm.intrinsic(which));
                        ObjectType::new_ordinary(parent).into_ref()
                    }
                };
                proto.borrow_mut().insert_property(
                    "constructor",
                    PropertyDescriptor::new_hidden(JsValue::Object(target.clone())),
                );
                target.borrow_mut().insert_property(
                    "prototype",
                    PropertyDescriptor::Data {
                        value: JsValue::Object(proto.clone()),
                        writable: false,
                        enumerable: false,
                        configurable: false,
                    },
                );
                if let Some(which) = WellKnownIntrinsics::constructor_for(&name) {
                    ctx.realm.set_intrinsic(which, target.clone());
                }
                (target, Some(proto))
            }
            None => {
                let target = ObjectType::new_ordinary(
                    ctx.realm.intrinsic(WellKnownIntrinsics::ObjectPrototype),
                )
                .into_ref();
                (target, realm_proto)
            }
        };

        if let Some(proto) = &proto {
            for method in prototype_methods {
                install_method(ctx, proto, method);
            }
        }
        for method in methods {
            install_method(ctx, &target, method);
        }
        for (key, value) in properties {
            target.borrow_mut().insert_property(
                key,
                PropertyDescriptor::Data {
                    value,
                    writable: false,
                    enumerable: false,
                    configurable: false,
                },
            );
        }
        ctx.define_global(&name, JsValue::Object(target.clone()));
        target
    }
}

fn install_method(ctx: &EvalContext, holder: &JsObjectType, method: BuiltInMethod) {
    let key = method.name.clone();
    let f = method.into_function_object(ctx, false);
    holder
        .borrow_mut()
        .insert_property(key, PropertyDescriptor::new_hidden(JsValue::Object(f)));
}

fn native_method(name: String, params: &[&str], func: NativeFn) -> BuiltInMethod {
    BuiltInMethod {
        name,
        formal_parameters: params.iter().map(|p| p.to_string()).collect(),
        function: BuiltInFn::Native(func),
    }
}
