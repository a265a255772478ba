//! Parsing of script source text into the syntax tree of [`ast`].
//!
//! The grammar lives in `js_grammar.pest`; [`JsParser`] drives it and builds
//! the tree, recording per-scope declarations through
//! [`static_semantics::ScopeTracker`] as it goes.

mod api;
pub mod ast;
pub mod static_semantics;
#[cfg(test)]
mod unit_tests;

pub use api::{JsParser, Rule, SyntaxDiagnostic, MAX_NESTING_DEPTH};
