use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::env_record::{
    DeclarativeEnvironmentRecord, EnvironmentRecordType, ObjectEnvironmentRecord,
};
use crate::runner::ds::object::JsObjectType;

pub type JsLexEnvironmentType = Rc<RefCell<LexEnvironment>>;

pub struct LexEnvironment {
    pub inner: Box<EnvironmentRecordType>,
    pub outer: Option<JsLexEnvironmentType>,
}
impl LexEnvironment {
    pub fn new_declarative_environment(outer: Option<JsLexEnvironmentType>) -> JsLexEnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            inner: Box::new(EnvironmentRecordType::Declarative(
                DeclarativeEnvironmentRecord::new(),
            )),
            outer,
        }))
    }

    pub fn new_object_environment(
        binding_object: JsObjectType,
        outer: Option<JsLexEnvironmentType>,
    ) -> JsLexEnvironmentType {
        Rc::new(RefCell::new(LexEnvironment {
            inner: Box::new(EnvironmentRecordType::Object(ObjectEnvironmentRecord::new(
                binding_object,
            ))),
            outer,
        }))
    }

    /// Walks the chain inner to outer and returns the first environment
    /// whose record has a binding for `name`.
    pub fn find_binding_environment(
        env: &JsLexEnvironmentType,
        name: &str,
    ) -> Option<JsLexEnvironmentType> {
        let mut current = Some(env.clone());
        while let Some(e) = current {
            let next = {
                let borrowed = e.borrow();
                if borrowed.inner.as_env_record().has_binding(name) {
                    None
                } else {
                    Some(borrowed.outer.clone())
                }
            };
            match next {
                None => return Some(e),
                Some(outer) => current = outer,
            }
        }
        None
    }
}
