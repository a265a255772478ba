use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObjectType, ObjectBase};
use crate::runner::plugin::types::BuiltInFn;

pub enum FunctionKind {
    /// A function written in script code. It closes over the environment it
    /// was instantiated in.
    Script {
        code: Rc<FunctionData>,
        environment: JsLexEnvironmentType,
        strict: bool,
    },
    /// A host function following the native calling convention.
    Native {
        name: String,
        formal_parameters: Vec<String>,
        function: Rc<BuiltInFn>,
        is_constructor: bool,
    },
}

pub struct FunctionObject {
    pub kind: FunctionKind,
    pub object_base: ObjectBase,
}
impl FunctionObject {
    pub fn new_script_function(
        code: Rc<FunctionData>,
        environment: JsLexEnvironmentType,
        prototype: Option<JsObjectType>,
    ) -> Self {
        let strict = code.is_strict();
        FunctionObject {
            kind: FunctionKind::Script {
                code,
                environment,
                strict,
            },
            object_base: ObjectBase::new(prototype),
        }
    }

    pub fn new_native_function(
        name: impl Into<String>,
        formal_parameters: Vec<String>,
        function: BuiltInFn,
        is_constructor: bool,
        prototype: Option<JsObjectType>,
    ) -> Self {
        FunctionObject {
            kind: FunctionKind::Native {
                name: name.into(),
                formal_parameters,
                function: Rc::new(function),
                is_constructor,
            },
            object_base: ObjectBase::new(prototype),
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            FunctionKind::Script { code, .. } => code.name(),
            FunctionKind::Native { name, .. } => name,
        }
    }

    /// Number of declared formal parameters, reported as `length`.
    pub fn arity(&self) -> usize {
        match &self.kind {
            FunctionKind::Script { code, .. } => code.params.len(),
            FunctionKind::Native {
                formal_parameters, ..
            } => formal_parameters.len(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            FunctionKind::Script { .. } => true,
            FunctionKind::Native { is_constructor, .. } => *is_constructor,
        }
    }

    pub fn is_strict(&self) -> bool {
        match &self.kind {
            FunctionKind::Script { strict, .. } => *strict,
            FunctionKind::Native { .. } => true,
        }
    }
}
