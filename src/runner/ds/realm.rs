use std::collections::HashMap;

use uuid::Uuid;

use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{BuiltInFn, EvalContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownIntrinsics {
    Array,
    ArrayPrototype,
    Error,
    ErrorPrototype,
    Function,
    FunctionPrototype,
    Object,
    ObjectPrototype,
    RangeError,
    RangeErrorPrototype,
    ReferenceError,
    ReferenceErrorPrototype,
    SyntaxError,
    SyntaxErrorPrototype,
    TypeError,
    TypeErrorPrototype,
}
impl WellKnownIntrinsics {
    /// The prototype intrinsic backing a built-in constructor of this name.
    pub fn prototype_for(constructor_name: &str) -> Option<WellKnownIntrinsics> {
        Some(match constructor_name {
            "Object" => WellKnownIntrinsics::ObjectPrototype,
            "Function" => WellKnownIntrinsics::FunctionPrototype,
            "Array" => WellKnownIntrinsics::ArrayPrototype,
            "Error" => WellKnownIntrinsics::ErrorPrototype,
            "TypeError" => WellKnownIntrinsics::TypeErrorPrototype,
            "ReferenceError" => WellKnownIntrinsics::ReferenceErrorPrototype,
            "RangeError" => WellKnownIntrinsics::RangeErrorPrototype,
            "SyntaxError" => WellKnownIntrinsics::SyntaxErrorPrototype,
            _ => return None,
        })
    }

    pub fn constructor_for(constructor_name: &str) -> Option<WellKnownIntrinsics> {
        Some(match constructor_name {
            "Object" => WellKnownIntrinsics::Object,
            "Function" => WellKnownIntrinsics::Function,
            "Array" => WellKnownIntrinsics::Array,
            "Error" => WellKnownIntrinsics::Error,
            "TypeError" => WellKnownIntrinsics::TypeError,
            "ReferenceError" => WellKnownIntrinsics::ReferenceError,
            "RangeError" => WellKnownIntrinsics::RangeError,
            "SyntaxError" => WellKnownIntrinsics::SyntaxError,
            _ => return None,
        })
    }

    pub fn prototype_for_error(error: &JErrorType) -> WellKnownIntrinsics {
        match error {
            JErrorType::ReferenceError(_) => WellKnownIntrinsics::ReferenceErrorPrototype,
            JErrorType::TypeError(_) => WellKnownIntrinsics::TypeErrorPrototype,
            JErrorType::RangeError(_) => WellKnownIntrinsics::RangeErrorPrototype,
            JErrorType::SyntaxError(_) => WellKnownIntrinsics::SyntaxErrorPrototype,
        }
    }
}

/// The global object, the global environment and the intrinsic objects
/// shared by all code run in one engine instance.
pub struct CodeRealm {
    pub id: Uuid,
    pub global_object: JsObjectType,
    pub global_env: JsLexEnvironmentType,
    intrinsics: HashMap<WellKnownIntrinsics, JsObjectType>,
}
impl CodeRealm {
    pub fn new() -> Self {
        let mut intrinsics = HashMap::new();

        let object_prototype = ObjectType::new_ordinary(None).into_ref();
        let function_prototype = ObjectType::Function(FunctionObject::new_native_function(
            "",
            vec![],
            BuiltInFn::Native(function_prototype_call),
            false,
            Some(object_prototype.clone()),
        ))
        .into_ref();
        let array_prototype = ObjectType::new_array(Some(object_prototype.clone())).into_ref();

        let error_prototype = ObjectType::new_ordinary(Some(object_prototype.clone())).into_ref();
        {
            let mut e = error_prototype.borrow_mut();
            e.insert_property("name", PropertyDescriptor::new_hidden(JsValue::string("Error")));
            e.insert_property("message", PropertyDescriptor::new_hidden(JsValue::string("")));
        }
        for (which, name) in [
            (WellKnownIntrinsics::TypeErrorPrototype, "TypeError"),
            (WellKnownIntrinsics::ReferenceErrorPrototype, "ReferenceError"),
            (WellKnownIntrinsics::RangeErrorPrototype, "RangeError"),
            (WellKnownIntrinsics::SyntaxErrorPrototype, "SyntaxError"),
        ]
        .iter()
        {
            let mut proto = ObjectType::new_ordinary(Some(error_prototype.clone()));
            proto.insert_property("name", PropertyDescriptor::new_hidden(JsValue::string(*name)));
            proto.insert_property("message", PropertyDescriptor::new_hidden(JsValue::string("")));
            intrinsics.insert(*which, proto.into_ref());
        }

        let global_object = ObjectType::new_ordinary(Some(object_prototype.clone())).into_ref();
        let object_env = LexEnvironment::new_object_environment(global_object.clone(), None);
        let global_env = LexEnvironment::new_declarative_environment(Some(object_env));

        intrinsics.insert(WellKnownIntrinsics::ObjectPrototype, object_prototype);
        intrinsics.insert(WellKnownIntrinsics::FunctionPrototype, function_prototype);
        intrinsics.insert(WellKnownIntrinsics::ArrayPrototype, array_prototype);
        intrinsics.insert(WellKnownIntrinsics::ErrorPrototype, error_prototype);

        CodeRealm {
            id: Uuid::new_v4(),
            global_object,
            global_env,
            intrinsics,
        }
    }

    pub fn intrinsic(&self, which: WellKnownIntrinsics) -> Option<JsObjectType> {
        self.intrinsics.get(&which).cloned()
    }

    pub fn set_intrinsic(&mut self, which: WellKnownIntrinsics, object: JsObjectType) {
        self.intrinsics.insert(which, object);
    }

    /// The object environment at the bottom of the global chain.
    pub fn global_object_env(&self) -> Option<JsLexEnvironmentType> {
        self.global_env.borrow().outer.clone()
    }
}
impl Default for CodeRealm {
    fn default() -> Self {
        Self::new()
    }
}

fn function_prototype_call(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EvalError> {
    Ok(JsValue::Undefined)
}
