//! # jsrun - a JavaScript compile-and-execute core
//!
//! Source text is parsed into a syntax tree, validated into an immutable
//! [`runner::compiler::Program`] and run by a tree-walking interpreter
//! against one realm per engine instance.
//!
//! ## Quick Start
//!
//! ### Parsing JavaScript
//!
//! ```
//! use jsrun::parser::JsParser;
//!
//! let code = "var x = 5 + 3;";
//! let ast = JsParser::parse_to_ast_from_str(code).unwrap();
//! println!("Parsed {} statements", ast.body.len());
//! ```
//!
//! ### Running JavaScript
//!
//! ```
//! use jsrun::runner::api::JsEngine;
//! use jsrun::runner::ds::value::JsValue;
//!
//! let mut engine = JsEngine::new();
//! let value = engine.run("var x = 1; x = x + 1; x").unwrap();
//! assert_eq!(value, JsValue::integer(2));
//! ```
//!
//! ### Compiling once, executing many times
//!
//! ```
//! use jsrun::runner::api::JsEngine;
//! use jsrun::runner::ds::value::JsValue;
//!
//! let mut engine = JsEngine::new();
//! let program = engine.compile("var n = (typeof n === 'number') ? n + 1 : 0; n").unwrap();
//! engine.run_program(&program).unwrap();
//! assert_eq!(engine.run_program(&program).unwrap(), JsValue::integer(1));
//! ```
//!
//! ### Host functions
//!
//! ```
//! use jsrun::runner::api::JsEngine;
//! use jsrun::runner::ds::operations::type_conversion::to_number;
//! use jsrun::runner::ds::value::JsValue;
//!
//! let mut engine = JsEngine::new();
//! engine.define_native_function("twice", &["x"], |ctx, _this, args| {
//!     let x = to_number(ctx, args.get(0).unwrap_or(&JsValue::Undefined))?;
//!     Ok(JsValue::number(x * 2.0))
//! });
//! assert_eq!(engine.run("twice(21)").unwrap(), JsValue::integer(42));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser, syntax tree and per-scope declaration summaries
//! - **[`runner`]** - compilation and execution
//!   - **[`runner::compiler`]** - validation of parsed trees into Programs
//!   - **[`runner::eval`]** - the interpreter: References and Completions
//!   - **[`runner::ds`]** - values, objects, environments and the realm
//!   - **[`runner::plugin`]** - the native calling convention and built-in registry
//!   - **[`runner::std_lib`]** - the built-in objects
//!   - **[`runner::api`]** - the engine facade

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
mod stack;
