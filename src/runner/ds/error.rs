use std::fmt;
use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::runner::ds::value::JsValue;

/// Error kinds the engine itself raises. They become Error objects of the
/// matching constructor once they are observed by script code.
#[derive(Debug, Clone, PartialEq)]
pub enum JErrorType {
    ReferenceError(String),
    TypeError(String),
    RangeError(String),
    SyntaxError(String),
}
impl JErrorType {
    pub fn name(&self) -> &'static str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m,
        }
    }
}
impl Display for JErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.message())
    }
}

/// A broken engine invariant. Never observable from script code.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("internal fault: {message}")]
pub struct InternalFault {
    pub message: String,
}
impl InternalFault {
    pub fn new(message: impl Into<String>) -> Self {
        InternalFault {
            message: message.into(),
        }
    }
}

/// The failure side of evaluating an expression or calling a function.
#[derive(Debug, Clone)]
pub enum EvalError {
    /// A value thrown by script code (or an already materialized error object).
    Throw(JsValue),
    /// An engine-raised error that has not been turned into an object yet.
    Error(JErrorType),
    Fault(InternalFault),
}
impl EvalError {
    pub fn is_fault(&self) -> bool {
        matches!(self, EvalError::Fault(_))
    }
}
impl From<JErrorType> for EvalError {
    fn from(e: JErrorType) -> Self {
        EvalError::Error(e)
    }
}
impl From<InternalFault> for EvalError {
    fn from(f: InternalFault) -> Self {
        EvalError::Fault(f)
    }
}
