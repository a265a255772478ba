//! Built-in registry: the set of native objects and globals installed into a
//! fresh realm.

use tracing::debug;

use super::types::{BuiltInFn, BuiltInMethod, BuiltInObject, EvalContext, NativeFn};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::register_core_builtins;

/// Registry for built-in objects.
/// Collects object definitions and global functions, then installs them into
/// an [`EvalContext`] in registration order.
pub struct BuiltInRegistry {
    /// All registered built-in objects.
    objects: Vec<BuiltInObject>,

    /// Functions bound directly on the global object (e.g. `isNaN`).
    global_functions: Vec<BuiltInMethod>,

    /// Read-only value properties of the global object (e.g. `NaN`).
    global_values: Vec<(String, JsValue)>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: Vec::new(),
            global_functions: Vec::new(),
            global_values: Vec::new(),
        }
    }

    /// Create a registry with the core built-ins (Object, Function, Error
    /// types, Math and the global functions).
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    /// Register a built-in object. A later registration under the same
    /// name replaces the earlier one.
    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.retain(|o| o.name != obj.name);
        self.objects.push(obj);
    }

    pub fn register_global_function(&mut self, name: &str, params: &[&str], func: NativeFn) {
        self.global_functions.retain(|f| f.name != name);
        self.global_functions.push(BuiltInMethod {
            name: name.to_string(),
            formal_parameters: params.iter().map(|p| p.to_string()).collect(),
            function: BuiltInFn::Native(func),
        });
    }

    pub fn register_global_value(&mut self, name: &str, value: JsValue) {
        self.global_values.retain(|(n, _)| n != name);
        self.global_values.push((name.to_string(), value));
    }

    /// Get a registered object by name.
    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Check if an object exists in the registry.
    pub fn has_object(&self, name: &str) -> bool {
        self.get_object(name).is_some()
    }

    /// Check if a method exists on an object or its prototype.
    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.get_object(object).map_or(false, |o| {
            o.methods.iter().any(|m| m.name == method)
                || o.prototype_methods.iter().any(|m| m.name == method)
        })
    }

    /// Names of all registered objects, in registration order.
    pub fn object_names(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.name.as_str()).collect()
    }

    /// Installs everything into `ctx`'s realm.
    pub fn install(self, ctx: &mut EvalContext) {
        debug!(
            objects = self.objects.len(),
            functions = self.global_functions.len(),
            realm = %ctx.realm.id,
            "installing built-ins"
        );
        for object in self.objects {
            object.install(ctx);
        }
        let global = ctx.global_object();
        for function in self.global_functions {
            let name = function.name.clone();
            let f = function.into_function_object(ctx, false);
            global
                .borrow_mut()
                .insert_property(name, PropertyDescriptor::new_hidden(JsValue::Object(f)));
        }
        for (name, value) in self.global_values {
            global.borrow_mut().insert_property(
                name,
                PropertyDescriptor::Data {
                    value,
                    writable: false,
                    enumerable: false,
                    configurable: false,
                },
            );
        }
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_lists_objects_in_order() {
        let registry = BuiltInRegistry::with_core();
        let names = registry.object_names();
        assert_eq!(names.first(), Some(&"Object"));
        assert!(registry.has_object("Math"));
        assert!(registry.has_method("Math", "log"));
        assert!(registry.has_method("Object", "hasOwnProperty"));
        assert!(!registry.has_object("JSON"));
    }

    #[test]
    fn re_registering_replaces() {
        let mut registry = BuiltInRegistry::new();
        registry.register_object(BuiltInObject::new("Thing").add_property("a", JsValue::integer(1)));
        registry.register_object(BuiltInObject::new("Thing"));
        assert_eq!(registry.object_names(), vec!["Thing"]);
        assert!(registry.get_object("Thing").map_or(false, |o| o.properties.is_empty()));
    }
}
