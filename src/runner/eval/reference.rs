//! References: the resolved location an identifier or a property access
//! names, read and written through the same path it was resolved with.

use std::fmt;
use std::fmt::{Debug, Formatter};

use crate::runner::ds::error::{EvalError, JErrorType};
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::operations::object::{get, get_v, put_v};
use crate::runner::ds::operations::type_conversion::{get_type, to_object, TYPE_STR_UNDEFINED};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::types::ValueResult;

#[derive(Clone)]
pub enum ReferenceBase {
    /// No environment record declares the name.
    Unresolvable,
    /// The environment whose record holds the binding.
    Environment(JsLexEnvironmentType),
    /// The value a property is read from. Primitives are kept as they are
    /// so `this` in a method call on a primitive stays primitive.
    Property(JsValue),
}

#[derive(Clone)]
pub struct Reference {
    pub base: ReferenceBase,
    pub name: String,
    pub strict: bool,
}

impl Reference {
    /// Identifier resolution: the innermost environment of `env`'s chain
    /// that declares `name`.
    pub fn resolve(env: &JsLexEnvironmentType, name: &str, strict: bool) -> Self {
        let base = match LexEnvironment::find_binding_environment(env, name) {
            Some(e) => ReferenceBase::Environment(e),
            None => ReferenceBase::Unresolvable,
        };
        Reference {
            base,
            name: name.to_string(),
            strict,
        }
    }

    pub fn property(base: JsValue, name: impl Into<String>, strict: bool) -> Self {
        Reference {
            base: ReferenceBase::Property(base),
            name: name.into(),
            strict,
        }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }

    pub fn is_property_reference(&self) -> bool {
        matches!(self.base, ReferenceBase::Property(_))
    }

    /// GetValue.
    pub fn get_value(&self, ctx: &mut EvalContext) -> ValueResult {
        match &self.base {
            ReferenceBase::Unresolvable => Err(self.not_defined()),
            ReferenceBase::Property(base) => get_v(ctx, base, &self.name),
            ReferenceBase::Environment(env) => {
                let binding_object = env.borrow().inner.binding_object();
                match binding_object {
                    Some(o) => {
                        if self.strict && !o.borrow().has_property(&self.name) {
                            return Err(self.not_defined());
                        }
                        get(ctx, &o, &self.name)
                    }
                    None => env
                        .borrow()
                        .inner
                        .as_env_record()
                        .get_binding_value(&self.name, self.strict)
                        .map_err(EvalError::from),
                }
            }
        }
    }

    /// PutValue.
    pub fn put_value(&self, ctx: &mut EvalContext, value: JsValue) -> Result<(), EvalError> {
        match &self.base {
            ReferenceBase::Unresolvable => {
                if self.strict {
                    return Err(self.not_defined());
                }
                let global = JsValue::Object(ctx.global_object());
                put_v(ctx, &global, &self.name, value, false)
            }
            ReferenceBase::Property(base) => put_v(ctx, base, &self.name, value, self.strict),
            ReferenceBase::Environment(env) => {
                let binding_object = env.borrow().inner.binding_object();
                match binding_object {
                    Some(o) => put_v(ctx, &JsValue::Object(o), &self.name, value, self.strict),
                    None => env
                        .borrow_mut()
                        .inner
                        .as_env_record_mut()
                        .set_mutable_binding(&self.name, value, self.strict)
                        .map_err(EvalError::from),
                }
            }
        }
    }

    /// The `delete` operator applied to this reference.
    pub fn delete(&self, ctx: &mut EvalContext) -> Result<bool, EvalError> {
        match &self.base {
            ReferenceBase::Unresolvable => Ok(true),
            ReferenceBase::Property(base) => {
                let o = to_object(ctx, base)?;
                let deleted = o.borrow_mut().delete(&self.name);
                if !deleted && self.strict {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot delete property '{}' of {}",
                        self.name, base
                    ))
                    .into());
                }
                Ok(deleted)
            }
            ReferenceBase::Environment(env) => Ok(env
                .borrow_mut()
                .inner
                .as_env_record_mut()
                .delete_binding(&self.name)),
        }
    }

    /// The `typeof` operator: an unresolvable reference is `"undefined"`
    /// instead of a ReferenceError.
    pub fn type_of(&self, ctx: &mut EvalContext) -> Result<&'static str, EvalError> {
        if self.is_unresolvable() {
            return Ok(TYPE_STR_UNDEFINED);
        }
        let value = self.get_value(ctx)?;
        Ok(get_type(&value))
    }

    /// The `this` a call through this reference receives.
    pub fn get_this_value(&self) -> JsValue {
        match &self.base {
            ReferenceBase::Property(base) => base.clone(),
            _ => JsValue::Undefined,
        }
    }

    fn not_defined(&self) -> EvalError {
        JErrorType::ReferenceError(format!("{} is not defined", self.name)).into()
    }
}

impl Debug for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let base = match &self.base {
            ReferenceBase::Unresolvable => "unresolvable".to_string(),
            ReferenceBase::Environment(_) => "environment".to_string(),
            ReferenceBase::Property(v) => format!("{:?}", v),
        };
        f.debug_struct("Reference")
            .field("base", &base)
            .field("name", &self.name)
            .field("strict", &self.strict)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn declared_binding_round_trips() {
        let mut ctx = EvalContext::new();
        let env = ctx.global_env();
        env.borrow_mut()
            .inner
            .as_env_record_mut()
            .create_mutable_binding("x".to_string(), false)
            .unwrap();
        env.borrow_mut()
            .inner
            .as_env_record_mut()
            .initialize_binding("x", JsValue::Undefined)
            .unwrap();

        let r = Reference::resolve(&env, "x", false);
        r.put_value(&mut ctx, JsValue::integer(7)).unwrap();
        let r = Reference::resolve(&env, "x", false);
        assert_eq!(r.get_value(&mut ctx).unwrap(), JsValue::integer(7));
    }

    #[test]
    fn unresolvable_reads_throw_but_typeof_does_not() {
        let mut ctx = EvalContext::new();
        let env = ctx.global_env();
        let r = Reference::resolve(&env, "nope", false);
        assert!(r.is_unresolvable());
        assert_matches!(
            r.get_value(&mut ctx),
            Err(EvalError::Error(JErrorType::ReferenceError(_)))
        );
        assert_eq!(r.type_of(&mut ctx).unwrap(), "undefined");
    }

    #[test]
    fn sloppy_unresolvable_write_creates_global_property() {
        let mut ctx = EvalContext::new();
        let env = ctx.global_env();
        Reference::resolve(&env, "g", false)
            .put_value(&mut ctx, JsValue::integer(1))
            .unwrap();
        assert!(ctx.global_object().borrow().get_own_property("g").is_some());

        let strict = Reference::resolve(&env, "h", true);
        assert_matches!(
            strict.put_value(&mut ctx, JsValue::integer(1)),
            Err(EvalError::Error(JErrorType::ReferenceError(_)))
        );
    }
}
