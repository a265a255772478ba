//! Compilation and execution of scripts.
//!
//! [`compiler`] turns source text into a [`compiler::Program`], [`eval`]
//! runs it inside an [`plugin::types::EvalContext`], and [`api::JsEngine`]
//! ties the two together for hosts.

pub mod api;
pub mod compiler;
pub mod config;
pub mod ds;
pub mod eval;
pub mod plugin;
pub mod std_lib;
