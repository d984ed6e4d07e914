//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context (form name, IDs, candidate lists) for debugging

use crate::error::FormsyncError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Shape Errors (exit code 2) ===
    /// Input record does not match the expected schema
    InvalidShape,
    /// Target form lists fewer questions than the source
    QuestionCountMismatch,
    /// Source and target share no names
    NoOverlap,

    // === Matching Errors (exit code 3) ===
    /// More than one candidate for a source entity
    AmbiguousMatch,
    /// No candidate for a source entity
    UnresolvedMatch,
    /// Leftover source questions treated as fatal
    UnresolvedQuestions,

    // === Conflict Errors (exit code 4) ===
    /// Mapping disagrees with an earlier one
    MappingConflict,
    /// Two keys collapse to one rewritten key
    KeyConflict,
    /// Textual and structural rewrites diverged
    ConsistencyFailed,

    // === Missing Errors (exit code 5) ===
    /// Known source ID without destination
    MissingMapping,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// Input file not found
    FileNotFound,
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidShape => "INVALID_SHAPE",
            Self::QuestionCountMismatch => "QUESTION_COUNT_MISMATCH",
            Self::NoOverlap => "NO_OVERLAP",
            Self::AmbiguousMatch => "AMBIGUOUS_MATCH",
            Self::UnresolvedMatch => "UNRESOLVED_MATCH",
            Self::UnresolvedQuestions => "UNRESOLVED_QUESTIONS",
            Self::MappingConflict => "MAPPING_CONFLICT",
            Self::KeyConflict => "KEY_CONFLICT",
            Self::ConsistencyFailed => "CONSISTENCY_FAILED",
            Self::MissingMapping => "MISSING_MAPPING",
            Self::ConfigError => "CONFIG_ERROR",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// Nothing here is transient; retryable means the caller can succeed by
    /// changing inputs or flags (e.g. choosing the right file).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidShape
                | Self::FileNotFound
                | Self::ConfigError
                | Self::MissingMapping
                | Self::UnresolvedQuestions
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Shape errors
    /// - 3: Matching errors
    /// - 4: Conflict and consistency errors
    /// - 5: Missing mappings
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidShape | Self::QuestionCountMismatch | Self::NoOverlap => 2,
            Self::AmbiguousMatch | Self::UnresolvedMatch | Self::UnresolvedQuestions => 3,
            Self::MappingConflict | Self::KeyConflict | Self::ConsistencyFailed => 4,
            Self::MissingMapping => 5,
            Self::ConfigError => 7,
            Self::FileNotFound | Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried with different inputs
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `FormsyncError`.
    #[must_use]
    pub fn from_error(err: &FormsyncError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    /// Extract error code and context from a `FormsyncError`.
    fn extract_code_and_context(err: &FormsyncError) -> (ErrorCode, Option<Value>) {
        match err {
            FormsyncError::Shape {
                collection,
                index,
                reason,
            } => (
                ErrorCode::InvalidShape,
                Some(json!({"collection": collection, "index": index, "reason": reason})),
            ),
            FormsyncError::QuestionCountMismatch {
                form,
                source_count,
                target_count,
            } => (
                ErrorCode::QuestionCountMismatch,
                Some(json!({
                    "form": form,
                    "source_count": source_count,
                    "target_count": target_count,
                })),
            ),
            FormsyncError::NoOverlap { what } => {
                (ErrorCode::NoOverlap, Some(json!({"what": what})))
            }
            FormsyncError::AmbiguousMatch {
                source_id,
                form,
                candidates,
            } => (
                ErrorCode::AmbiguousMatch,
                Some(json!({
                    "source_id": source_id,
                    "form": form,
                    "candidates": candidates,
                    "candidate_count": candidates.len(),
                })),
            ),
            FormsyncError::UnresolvedMatch { source_id, form } => (
                ErrorCode::UnresolvedMatch,
                Some(json!({"source_id": source_id, "form": form})),
            ),
            FormsyncError::UnresolvedQuestions { ids } => (
                ErrorCode::UnresolvedQuestions,
                Some(json!({"ids": ids, "count": ids.len()})),
            ),
            FormsyncError::MappingConflict {
                source_id,
                existing,
                attempted,
            } => (
                ErrorCode::MappingConflict,
                Some(json!({
                    "source_id": source_id,
                    "existing": existing,
                    "attempted": attempted,
                })),
            ),
            FormsyncError::KeyConflict { key } => {
                (ErrorCode::KeyConflict, Some(json!({"key": key})))
            }
            FormsyncError::Consistency { reason } => {
                (ErrorCode::ConsistencyFailed, Some(json!({"reason": reason})))
            }
            FormsyncError::MissingMapping { ids } => (
                ErrorCode::MissingMapping,
                Some(json!({"ids": ids, "count": ids.len()})),
            ),
            FormsyncError::Config(_) => (ErrorCode::ConfigError, None),
            FormsyncError::FileNotFound { path } => (
                ErrorCode::FileNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            FormsyncError::Io(_) => (ErrorCode::IoError, None),
            FormsyncError::Json(_) => (ErrorCode::JsonError, None),
            FormsyncError::Yaml(_) => (ErrorCode::YamlError, None),
            FormsyncError::WithContext { context, source } => {
                let code = if source.is::<serde_json::Error>() {
                    ErrorCode::JsonError
                } else if source.is::<std::io::Error>() {
                    ErrorCode::IoError
                } else {
                    ErrorCode::InternalError
                };
                (code, Some(json!({"context": context})))
            }
            FormsyncError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    /// Generate context-aware hint from error.
    fn generate_hint(err: &FormsyncError) -> Option<String> {
        match err {
            FormsyncError::Shape { collection, .. } if collection.contains("forms") => Some(
                "Each form needs an id and a display_name; was a question bank selected instead of a form library?"
                    .to_string(),
            ),
            FormsyncError::Shape { collection, .. } if collection.contains("questions") => Some(
                "Each question needs an id; was a form library selected instead of a question bank?"
                    .to_string(),
            ),
            FormsyncError::AmbiguousMatch { candidates, .. } => Some(format!(
                "Target questions {} share the same content; make them distinguishable, then re-run",
                candidates
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            _ => err.suggestion().map(str::to_string),
        }
    }
}
