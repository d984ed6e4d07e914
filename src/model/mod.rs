//! Core data types for `formsync`.
//!
//! This module defines the fundamental types used throughout the engine:
//! - `EntityId` - Numeric identifier of a form or question
//! - `Form` - Named entity owning an ordered list of question references
//! - `Question` - Leaf entity referenced by ID from forms and templates
//! - `IdRef` - Tagged view of a JSON scalar at the engine boundary
//! - `Environment` - Which instance a collection was exported from

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Identifier assigned by one application instance.
pub type EntityId = u64;

/// The instance a collection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Source,
    Target,
}

impl Environment {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated form record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Form {
    pub id: EntityId,
    pub display_name: String,
    /// Ordered question references; position is the primary alignment key.
    pub question_ids: Vec<EntityId>,
}

/// A validated question record.
///
/// The full record is kept because every field except `id` takes part in
/// the content signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: EntityId,
    pub record: Map<String, Value>,
}

impl Question {
    /// The question label, if it is a string.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.record.get("label").and_then(Value::as_str)
    }

    /// The question type, if it is a string.
    #[must_use]
    pub fn question_type(&self) -> Option<&str> {
        self.record.get("question_type").and_then(Value::as_str)
    }
}

/// Tagged view of a JSON scalar.
///
/// Values arrive either as native numbers or as numeric strings; classifying
/// them once keeps the traversal free of ad-hoc type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRef<'a> {
    /// A non-negative JSON integer.
    Native(EntityId),
    /// A string made only of ASCII digits.
    NumericString(EntityId),
    /// Any other string; may embed IDs.
    FreeText(&'a str),
    /// Booleans, nulls, floats, negatives, containers.
    Opaque,
}

impl<'a> IdRef<'a> {
    /// Classify a JSON value.
    #[must_use]
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Number(number) => number.as_u64().map_or(Self::Opaque, Self::Native),
            Value::String(text) => Self::classify_str(text),
            _ => Self::Opaque,
        }
    }

    /// Classify a string (object keys, string values).
    #[must_use]
    pub fn classify_str(text: &'a str) -> Self {
        parse_numeric(text).map_or(Self::FreeText(text), Self::NumericString)
    }

    /// The embedded ID for native and numeric-string values.
    #[must_use]
    pub const fn id(&self) -> Option<EntityId> {
        match self {
            Self::Native(id) | Self::NumericString(id) => Some(*id),
            Self::FreeText(_) | Self::Opaque => None,
        }
    }
}

/// Parse a pure ASCII-digit string into an ID.
///
/// Returns `None` for empty strings, any non-digit character, or values that
/// overflow `u64`.
#[must_use]
pub fn parse_numeric(text: &str) -> Option<EntityId> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_native() {
        assert_eq!(IdRef::classify(&json!(42)), IdRef::Native(42));
        assert_eq!(IdRef::classify(&json!(-3)), IdRef::Opaque);
        assert_eq!(IdRef::classify(&json!(1.5)), IdRef::Opaque);
        assert_eq!(IdRef::classify(&json!(true)), IdRef::Opaque);
        assert_eq!(IdRef::classify(&json!(null)), IdRef::Opaque);
    }

    #[test]
    fn test_classify_strings() {
        assert_eq!(IdRef::classify(&json!("42")), IdRef::NumericString(42));
        assert_eq!(IdRef::classify(&json!("")), IdRef::FreeText(""));
        assert_eq!(IdRef::classify(&json!("4 2")), IdRef::FreeText("4 2"));
        assert_eq!(IdRef::classify(&json!("+4")), IdRef::FreeText("+4"));
    }

    #[test]
    fn test_parse_numeric_overflow() {
        assert_eq!(parse_numeric("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_numeric("18446744073709551616"), None);
        assert_eq!(parse_numeric("007"), Some(7));
    }

    #[test]
    fn test_question_accessors() {
        let Value::Object(record) = json!({"id": 1, "label": "Name", "question_type": "text"})
        else {
            unreachable!()
        };
        let question = Question { id: 1, record };
        assert_eq!(question.label(), Some("Name"));
        assert_eq!(question.question_type(), Some("text"));
    }
}
