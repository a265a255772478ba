//! Standard library built-in objects.
//!
//! The native objects a fresh realm starts with: Object, Function, Array,
//! the Error constructors and Math, plus a few global functions and values.

pub mod array;
pub mod core;
pub mod error;
pub mod function;
pub mod math;
pub mod object;

use crate::runner::ds::value::JsValue;

pub use self::core::register_core_builtins;

/// The argument at `index`, or `undefined` when fewer were passed.
pub(crate) fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}
