//! Native function convention and built-in installation.
//!
//! Every callable the engine knows, script or native, is invoked the same
//! way:
//!
//! ```text
//! call(ctx, this, args) -> Result<JsValue, EvalError>
//! ```
//!
//! ### Key Components
//!
//! - **[`EvalContext`](types::EvalContext)**: the interpreter state handed to every native
//! - **[`NativeFn`](types::NativeFn)** / **[`BuiltInFn`](types::BuiltInFn)**: the calling convention
//! - **[`BuiltInObject`](types::BuiltInObject)**: declarative description of a built-in
//!   object, its constructor and its prototype methods
//! - **[`BuiltInRegistry`](registry::BuiltInRegistry)**: the set of built-ins installed
//!   into a fresh realm
//!
//! ### Writing a native
//!
//! Natives declare their formal parameter names (reported as the function's
//! `length`), read arguments positionally and treat a missing one as
//! `undefined`. Conversions go through the shared operations in
//! [`crate::runner::ds::operations::type_conversion`] so that objects get a chance to
//! run their `valueOf`/`toString`. Engine errors are returned as
//! `EvalError::Error(JErrorType::…)`; the interpreter turns them into Error
//! objects when script code observes them.
//!
//! ```
//! use jsrun::runner::ds::error::EvalError;
//! use jsrun::runner::ds::operations::type_conversion::to_number;
//! use jsrun::runner::ds::value::JsValue;
//! use jsrun::runner::plugin::types::{BuiltInObject, EvalContext};
//!
//! fn triple(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EvalError> {
//!     let n = to_number(ctx, args.get(0).unwrap_or(&JsValue::Undefined))?;
//!     if n.is_nan() {
//!         return Ok(JsValue::number(f64::NAN));
//!     }
//!     Ok(JsValue::number(n * 3.0))
//! }
//!
//! let mut ctx = EvalContext::new();
//! BuiltInObject::new("MyMath").add_method("triple", &["x"], triple).install(&mut ctx);
//! ```

pub mod registry;
pub mod types;
