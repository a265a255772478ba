use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::object_property::{
    PropertyDescriptor, PropertyDescriptorSetter, PropertyKey,
};
use crate::runner::ds::operations::test_and_comparison::{same_optional_object, same_value};
use crate::runner::ds::value::{JsNumberType, JsValue};

pub type JsObjectType = Rc<RefCell<ObjectType>>;

pub enum ObjectType {
    Ordinary(ObjectBase),
    Array(ObjectBase),
    Error(ObjectBase),
    Arguments(ObjectBase),
    Function(FunctionObject),
}
impl ObjectType {
    pub fn new_ordinary(prototype: Option<JsObjectType>) -> Self {
        ObjectType::Ordinary(ObjectBase::new(prototype))
    }

    pub fn new_array(prototype: Option<JsObjectType>) -> Self {
        let mut base = ObjectBase::new(prototype);
        base.insert_property(
            "length".to_string(),
            PropertyDescriptor::Data {
                value: JsValue::integer(0),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        ObjectType::Array(base)
    }

    pub fn into_ref(self) -> JsObjectType {
        Rc::new(RefCell::new(self))
    }

    pub fn base(&self) -> &ObjectBase {
        match self {
            ObjectType::Ordinary(b)
            | ObjectType::Array(b)
            | ObjectType::Error(b)
            | ObjectType::Arguments(b) => b,
            ObjectType::Function(f) => &f.object_base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        match self {
            ObjectType::Ordinary(b)
            | ObjectType::Array(b)
            | ObjectType::Error(b)
            | ObjectType::Arguments(b) => b,
            ObjectType::Function(f) => &mut f.object_base,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            ObjectType::Function(f) => f.is_constructor(),
            _ => false,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match self {
            ObjectType::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The tag reported by `Object.prototype.toString`.
    pub fn class_name(&self) -> &'static str {
        match self {
            ObjectType::Ordinary(_) => "Object",
            ObjectType::Array(_) => "Array",
            ObjectType::Error(_) => "Error",
            ObjectType::Arguments(_) => "Arguments",
            ObjectType::Function(_) => "Function",
        }
    }

    pub fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.base().get_prototype_of()
    }

    pub fn get_own_property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.base().get_own_property(key)
    }

    pub fn lookup_property(&self, key: &str) -> Option<PropertyDescriptor> {
        self.base().lookup_property(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.base().has_property(key)
    }

    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.base().own_keys()
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.base_mut().delete(key)
    }

    /// `[[DefineOwnProperty]]`, with the array exotic behaviour of keeping
    /// `length` one past the highest index and truncating on a smaller length.
    pub fn define_own_property(&mut self, key: PropertyKey, desc: PropertyDescriptorSetter) -> bool {
        if let ObjectType::Array(base) = self {
            if key == "length" {
                if let Some(v) = &desc.value {
                    match to_array_length(v) {
                        Some(new_len) if base.truncate_to(new_len) => {}
                        _ => return false,
                    }
                }
                return base.define_own_property(key, desc);
            }
            if let Some(index) = array_index(&key) {
                let len = base.array_length();
                if index >= len && !base.get_own_property("length").map_or(false, |d| d.is_writable()) {
                    return false;
                }
                if !base.define_own_property(key, desc) {
                    return false;
                }
                if index >= len {
                    base.set_array_length(index + 1);
                }
                return true;
            }
        }
        self.base_mut().define_own_property(key, desc)
    }

    /// Adds or replaces an own property without validation. Only for
    /// objects the engine itself is assembling.
    pub fn insert_property(&mut self, key: impl Into<PropertyKey>, desc: PropertyDescriptor) {
        let key = key.into();
        if let ObjectType::Array(base) = self {
            if let Some(index) = array_index(&key) {
                if index >= base.array_length() {
                    base.set_array_length(index + 1);
                }
            }
        }
        self.base_mut().insert_property(key, desc)
    }
}

pub struct ObjectBase {
    properties: HashMap<PropertyKey, PropertyDescriptor>,
    keys: Vec<PropertyKey>,
    is_extensible: bool,
    prototype: Option<JsObjectType>,
}
impl ObjectBase {
    pub fn new(prototype: Option<JsObjectType>) -> Self {
        ObjectBase {
            properties: HashMap::new(),
            keys: Vec::new(),
            is_extensible: true,
            prototype,
        }
    }

    pub fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.prototype.clone()
    }

    pub fn is_extensible(&self) -> bool {
        self.is_extensible
    }

    pub fn prevent_extensions(&mut self) -> bool {
        self.is_extensible = false;
        true
    }

    pub fn get_own_property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Finds `key` on this object or the nearest prototype that has it.
    pub fn lookup_property(&self, key: &str) -> Option<PropertyDescriptor> {
        if let Some(d) = self.properties.get(key) {
            return Some(d.clone());
        }
        let mut p = self.prototype.clone();
        while let Some(o) = p {
            let o = o.borrow();
            if let Some(d) = o.get_own_property(key) {
                return Some(d.clone());
            }
            p = o.get_prototype_of();
        }
        None
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.has_own_property(key)
            || match &self.prototype {
                None => false,
                Some(p) => p.borrow().has_property(key),
            }
    }

    /// Own keys in insertion order.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        self.keys.clone()
    }

    pub fn insert_property(&mut self, key: PropertyKey, desc: PropertyDescriptor) {
        if self.properties.insert(key.clone(), desc).is_none() {
            self.keys.push(key);
        }
    }

    pub fn delete(&mut self, key: &str) -> bool {
        match self.properties.get(key) {
            None => true,
            Some(d) if d.is_configurable() => {
                self.properties.remove(key);
                self.keys.retain(|k| k != key);
                true
            }
            Some(_) => false,
        }
    }

    /// ValidateAndApplyPropertyDescriptor for ordinary objects.
    pub fn define_own_property(&mut self, key: PropertyKey, desc: PropertyDescriptorSetter) -> bool {
        let current = match self.properties.get(&key) {
            None => {
                if !self.is_extensible {
                    return false;
                }
                let new_desc = if desc.is_accessor_descriptor() {
                    PropertyDescriptor::Accessor {
                        get: desc.get.unwrap_or(None),
                        set: desc.set.unwrap_or(None),
                        enumerable: desc.enumerable.unwrap_or(false),
                        configurable: desc.configurable.unwrap_or(false),
                    }
                } else {
                    PropertyDescriptor::Data {
                        value: desc.value.unwrap_or(JsValue::Undefined),
                        writable: desc.writable.unwrap_or(false),
                        enumerable: desc.enumerable.unwrap_or(false),
                        configurable: desc.configurable.unwrap_or(false),
                    }
                };
                self.insert_property(key, new_desc);
                return true;
            }
            Some(current) => current.clone(),
        };

        if !current.is_configurable() {
            if desc.configurable == Some(true) {
                return false;
            }
            if let Some(e) = desc.enumerable {
                if e != current.is_enumerable() {
                    return false;
                }
            }
        }

        let enumerable = desc.enumerable.unwrap_or_else(|| current.is_enumerable());
        let configurable = desc.configurable.unwrap_or_else(|| current.is_configurable());
        let updated = if desc.is_generic_descriptor() {
            match current {
                PropertyDescriptor::Data { value, writable, .. } => PropertyDescriptor::Data {
                    value,
                    writable,
                    enumerable,
                    configurable,
                },
                PropertyDescriptor::Accessor { get, set, .. } => PropertyDescriptor::Accessor {
                    get,
                    set,
                    enumerable,
                    configurable,
                },
            }
        } else if current.is_data_descriptor() != desc.is_data_descriptor() {
            if !current.is_configurable() {
                return false;
            }
            if desc.is_data_descriptor() {
                PropertyDescriptor::Data {
                    value: desc.value.unwrap_or(JsValue::Undefined),
                    writable: desc.writable.unwrap_or(false),
                    enumerable,
                    configurable,
                }
            } else {
                PropertyDescriptor::Accessor {
                    get: desc.get.unwrap_or(None),
                    set: desc.set.unwrap_or(None),
                    enumerable,
                    configurable,
                }
            }
        } else {
            match current {
                PropertyDescriptor::Data {
                    value: current_value,
                    writable: current_writable,
                    configurable: current_configurable,
                    ..
                } => {
                    if !current_configurable && !current_writable {
                        if desc.writable == Some(true) {
                            return false;
                        }
                        if let Some(v) = &desc.value {
                            if !same_value(v, &current_value) {
                                return false;
                            }
                        }
                    }
                    PropertyDescriptor::Data {
                        value: desc.value.unwrap_or(current_value),
                        writable: desc.writable.unwrap_or(current_writable),
                        enumerable,
                        configurable,
                    }
                }
                PropertyDescriptor::Accessor {
                    get: current_get,
                    set: current_set,
                    configurable: current_configurable,
                    ..
                } => {
                    if !current_configurable {
                        if let Some(g) = &desc.get {
                            if !same_optional_object(g, &current_get) {
                                return false;
                            }
                        }
                        if let Some(s) = &desc.set {
                            if !same_optional_object(s, &current_set) {
                                return false;
                            }
                        }
                    }
                    PropertyDescriptor::Accessor {
                        get: desc.get.unwrap_or(current_get),
                        set: desc.set.unwrap_or(current_set),
                        enumerable,
                        configurable,
                    }
                }
            }
        };
        self.insert_property(key, updated);
        true
    }

    fn array_length(&self) -> u32 {
        match self.properties.get("length").and_then(|d| d.value()) {
            Some(JsValue::Number(JsNumberType::Integer(i))) => *i as u32,
            _ => 0,
        }
    }

    fn set_array_length(&mut self, len: u32) {
        if let Some(PropertyDescriptor::Data { value, .. }) = self.properties.get_mut("length") {
            *value = JsValue::integer(len as i64);
        }
    }

    fn truncate_to(&mut self, new_len: u32) -> bool {
        if new_len >= self.array_length() {
            return true;
        }
        let doomed: Vec<PropertyKey> = self
            .keys
            .iter()
            .filter(|k| array_index(k).map_or(false, |i| i >= new_len))
            .cloned()
            .collect();
        for k in doomed {
            if !self.delete(&k) {
                return false;
            }
        }
        true
    }
}

/// Canonical array index (`"0"`, `"17"`, never `"017"`) below 2^32 - 1.
pub fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match key.parse::<u64>() {
        Ok(i) if i < u32::MAX as u64 => Some(i as u32),
        _ => None,
    }
}

fn to_array_length(v: &JsValue) -> Option<u32> {
    match v {
        JsValue::Number(JsNumberType::Integer(i)) if *i >= 0 && *i <= u32::MAX as i64 => {
            Some(*i as u32)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(v: i64) -> PropertyDescriptorSetter {
        PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::new_data(
            JsValue::integer(v),
        ))
    }

    #[test]
    fn keys_keep_insertion_order() {
        let mut o = ObjectType::new_ordinary(None);
        o.define_own_property("b".to_string(), data(1));
        o.define_own_property("a".to_string(), data(2));
        o.define_own_property("b".to_string(), data(3));
        assert_eq!(o.own_keys(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn non_configurable_rejects_redefinition() {
        let mut o = ObjectType::new_ordinary(None);
        o.define_own_property(
            "x".to_string(),
            PropertyDescriptorSetter {
                value: Some(JsValue::integer(1)),
                ..Default::default()
            },
        );
        assert!(!o.define_own_property("x".to_string(), data(2)));
        assert!(!o.delete("x"));
        assert!(o.define_own_property(
            "x".to_string(),
            PropertyDescriptorSetter::value_only(JsValue::integer(1))
        ));
    }

    #[test]
    fn array_length_tracks_indices() {
        let mut a = ObjectType::new_array(None);
        a.define_own_property("4".to_string(), data(9));
        assert_eq!(
            a.get_own_property("length").and_then(|d| d.value()).cloned(),
            Some(JsValue::integer(5))
        );
        a.define_own_property(
            "length".to_string(),
            PropertyDescriptorSetter::value_only(JsValue::integer(2)),
        );
        assert!(a.get_own_property("4").is_none());
    }

    #[test]
    fn array_index_is_canonical() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("012"), None);
        assert_eq!(array_index("1.5"), None);
        assert_eq!(array_index("length"), None);
    }
}
