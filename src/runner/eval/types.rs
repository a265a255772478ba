//! Completion records.

use crate::runner::ds::error::EvalError;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::reference::Reference;

/// Result of executing a statement.
pub type EvalResult = Result<Completion, EvalError>;

/// Result of evaluating an expression to a value.
pub type ValueResult = Result<JsValue, EvalError>;

/// Completion record type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionType {
    /// Normal completion - execution continues.
    Normal,
    /// Return completion - function returns.
    Return,
    /// Throw completion - exception thrown.
    Throw,
    /// Break completion - break from loop/switch/labeled statement.
    Break,
    /// Continue completion - continue loop iteration.
    Continue,
}

/// What a completion carries. A `Reference` only appears as the value of a
/// top-level expression statement of a Program; it is dereferenced before
/// the next statement runs or by the caller of `execute`.
#[derive(Debug, Clone)]
pub enum CompletionValue {
    Value(JsValue),
    Reference(Reference),
}

/// Completion record.
/// Every statement evaluation returns a completion record.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_type: CompletionType,
    /// `None` is the empty value.
    pub value: Option<CompletionValue>,
    /// Target label for break/continue.
    pub target: Option<String>,
}

impl Completion {
    /// Create a normal completion with no value.
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
            target: None,
        }
    }

    /// Create a normal completion with a value.
    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(CompletionValue::Value(value)),
            target: None,
        }
    }

    pub fn normal_with_reference(reference: Reference) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(CompletionValue::Reference(reference)),
            target: None,
        }
    }

    pub fn normal_with_optional_value(value: Option<JsValue>) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: value.map(CompletionValue::Value),
            target: None,
        }
    }

    /// Create a return completion.
    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(CompletionValue::Value(value)),
            target: None,
        }
    }

    /// Create a throw completion.
    pub fn throw(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Throw,
            value: Some(CompletionValue::Value(value)),
            target: None,
        }
    }

    /// Create a break completion.
    pub fn break_completion(target: Option<String>) -> Self {
        Completion {
            completion_type: CompletionType::Break,
            value: None,
            target,
        }
    }

    /// Create a continue completion.
    pub fn continue_completion(target: Option<String>) -> Self {
        Completion {
            completion_type: CompletionType::Continue,
            value: None,
            target,
        }
    }

    pub fn is_normal(&self) -> bool {
        self.completion_type == CompletionType::Normal
    }

    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    /// The carried value when it is a plain value.
    pub fn get_value(&self) -> Option<&JsValue> {
        match &self.value {
            Some(CompletionValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// The carried value, `undefined` when empty or a Reference.
    pub fn value_or_undefined(&self) -> JsValue {
        self.get_value().cloned().unwrap_or(JsValue::Undefined)
    }

    /// UpdateEmpty: an empty completion takes `value`; a completion that
    /// already carries a value keeps it.
    pub fn update_empty(mut self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            self.value = value.map(CompletionValue::Value);
        }
        self
    }

    /// Whether a Break or Continue names `label` (or names nothing).
    pub fn targets(&self, labels: &[String]) -> bool {
        match &self.target {
            None => true,
            Some(t) => labels.iter().any(|l| l == t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_empty_fills_only_empty_values() {
        let c = Completion::break_completion(None).update_empty(Some(JsValue::integer(1)));
        assert_eq!(c.get_value(), Some(&JsValue::integer(1)));
        assert_eq!(c.completion_type, CompletionType::Break);

        let c = Completion::return_value(JsValue::integer(2)).update_empty(Some(JsValue::integer(1)));
        assert_eq!(c.get_value(), Some(&JsValue::integer(2)));

        let c = Completion::normal().update_empty(None);
        assert!(c.value.is_none());
    }

    #[test]
    fn targets_matches_unlabeled_and_listed_labels() {
        let labels = vec!["outer".to_string()];
        assert!(Completion::continue_completion(None).targets(&labels));
        assert!(Completion::continue_completion(Some("outer".to_string())).targets(&labels));
        assert!(!Completion::continue_completion(Some("inner".to_string())).targets(&labels));
    }
}
