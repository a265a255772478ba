use std::collections::HashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::value::JsValue;

pub trait EnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool;
    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType>;
    fn create_immutable_binding(&mut self, name: String, strict: bool) -> Result<(), JErrorType>;
    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType>;
    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType>;
    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, JErrorType>;
    fn delete_binding(&mut self, name: &str) -> bool;
}

pub enum EnvironmentRecordType {
    Declarative(DeclarativeEnvironmentRecord),
    Object(ObjectEnvironmentRecord),
}
impl EnvironmentRecordType {
    pub fn as_env_record(&self) -> &dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
        }
    }

    pub fn as_env_record_mut(&mut self) -> &mut dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
        }
    }

    /// The object behind an object record, whose properties may be
    /// accessors and so have to be read through the interpreter.
    pub fn binding_object(&self) -> Option<JsObjectType> {
        match self {
            EnvironmentRecordType::Declarative(_) => None,
            EnvironmentRecordType::Object(o) => Some(o.binding_object.clone()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum BindingFlag {
    NoDelete,
    IsImmutable,
    /// Assignment to this immutable binding throws even in sloppy code.
    Strict,
}

pub struct DeclarativeEnvironmentRecord {
    /// `None` marks a binding that exists but has not been initialized yet.
    bindings: HashMap<String, Option<JsValue>>,
    binding_flags: HashMap<String, Vec<BindingFlag>>,
}
impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        DeclarativeEnvironmentRecord {
            bindings: HashMap::new(),
            binding_flags: HashMap::new(),
        }
    }

    fn has_flag(&self, name: &str, flag: BindingFlag) -> bool {
        self.binding_flags
            .get(name)
            .map_or(false, |flags| flags.contains(&flag))
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        matches!(self.bindings.get(name), Some(Some(_)))
    }
}
impl Default for DeclarativeEnvironmentRecord {
    fn default() -> Self {
        Self::new()
    }
}
impl EnvironmentRecord for DeclarativeEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        if self.has_binding(&name) {
            return Err(JErrorType::SyntaxError(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        self.bindings.insert(name.clone(), None);
        let flags = if can_delete {
            vec![]
        } else {
            vec![BindingFlag::NoDelete]
        };
        self.binding_flags.insert(name, flags);
        Ok(())
    }

    fn create_immutable_binding(&mut self, name: String, strict: bool) -> Result<(), JErrorType> {
        if self.has_binding(&name) {
            return Err(JErrorType::SyntaxError(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        self.bindings.insert(name.clone(), None);
        let mut flags = vec![BindingFlag::NoDelete, BindingFlag::IsImmutable];
        if strict {
            flags.push(BindingFlag::Strict);
        }
        self.binding_flags.insert(name, flags);
        Ok(())
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType> {
        if !self.has_binding(name) {
            if strict {
                return Err(JErrorType::ReferenceError(format!("{} is not defined", name)));
            }
            self.create_mutable_binding(name.to_string(), true)?;
            return self.initialize_binding(name, value);
        }
        if !self.is_initialized(name) {
            return Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            )));
        }
        if self.has_flag(name, BindingFlag::IsImmutable) {
            if strict || self.has_flag(name, BindingFlag::Strict) {
                return Err(JErrorType::TypeError(
                    "Assignment to constant variable.".to_string(),
                ));
            }
            return Ok(());
        }
        self.bindings.insert(name.to_string(), Some(value));
        Ok(())
    }

    fn get_binding_value(&self, name: &str, _strict: bool) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            Some(Some(v)) => Ok(v.clone()),
            Some(None) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        if !self.has_binding(name) {
            return true;
        }
        if self.has_flag(name, BindingFlag::NoDelete) {
            return false;
        }
        self.bindings.remove(name);
        self.binding_flags.remove(name);
        true
    }
}

/// Exposes the properties of an object as bindings. Used for the global
/// object.
pub struct ObjectEnvironmentRecord {
    pub binding_object: JsObjectType,
}
impl ObjectEnvironmentRecord {
    pub fn new(binding_object: JsObjectType) -> Self {
        ObjectEnvironmentRecord { binding_object }
    }

    /// An own non-configurable property, which a lexical declaration of the
    /// same name may not shadow.
    pub fn has_restricted_property(&self, name: &str) -> bool {
        self.binding_object
            .borrow()
            .get_own_property(name)
            .map_or(false, |d| !d.is_configurable())
    }
}
impl EnvironmentRecord for ObjectEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.binding_object.borrow().has_property(name)
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        let defined = self.binding_object.borrow_mut().define_own_property(
            name.clone(),
            PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::Data {
                value: JsValue::Undefined,
                writable: true,
                enumerable: true,
                configurable: can_delete,
            }),
        );
        if defined {
            Ok(())
        } else {
            Err(JErrorType::TypeError(format!(
                "Cannot define global variable '{}'",
                name
            )))
        }
    }

    fn create_immutable_binding(&mut self, name: String, _strict: bool) -> Result<(), JErrorType> {
        Err(JErrorType::TypeError(format!(
            "Cannot create an immutable binding '{}' on an object",
            name
        )))
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        self.set_mutable_binding(name, value, false)
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JErrorType> {
        let mut o = self.binding_object.borrow_mut();
        let existing = o.get_own_property(name).cloned();
        let ok = match existing {
            Some(PropertyDescriptor::Data { writable: true, .. }) => o.define_own_property(
                name.to_string(),
                PropertyDescriptorSetter::value_only(value),
            ),
            Some(_) => false,
            None => o.define_own_property(
                name.to_string(),
                PropertyDescriptorSetter::new_from_property_descriptor(
                    PropertyDescriptor::new_data(value),
                ),
            ),
        };
        if !ok && strict {
            return Err(JErrorType::TypeError(format!(
                "Cannot assign to read only property '{}'",
                name
            )));
        }
        Ok(())
    }

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, JErrorType> {
        match self.binding_object.borrow().lookup_property(name) {
            Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
            Some(PropertyDescriptor::Accessor { .. }) => Ok(JsValue::Undefined),
            None if strict => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            None => Ok(JsValue::Undefined),
        }
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        self.binding_object.borrow_mut().delete(name)
    }
}
