//! Tree-walking interpreter.
//!
//! Statements produce [`Completion`]s, expressions produce values or
//! [`Reference`]s. Errors raised while evaluating travel as the `Err` side of
//! [`types::EvalResult`] until a `try` statement or the Program boundary turns
//! them back into completions.

pub mod expression;
pub mod function;
pub mod reference;
pub mod statement;
pub mod types;

pub use reference::{Reference, ReferenceBase};
pub use types::{Completion, CompletionType, CompletionValue};
