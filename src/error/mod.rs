//! Error types and handling for `formsync`.
//!
//! Every failure the engine can raise is a structured variant carrying enough
//! context (form name, entity ID, candidate list) to be shown verbatim to an
//! operator.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration at the CLI boundary
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output via [`StructuredError`]

mod context;
mod structured;

pub use context::{OptionExt, ResultExt};
pub use structured::{ErrorCode, StructuredError};

use crate::model::EntityId;
use std::path::PathBuf;
use thiserror::Error;

/// Number of IDs listed inline before an error message is truncated.
pub const PREVIEW_LIMIT: usize = 10;

/// Primary error type for `formsync` operations.
#[derive(Error, Debug)]
pub enum FormsyncError {
    // === Shape Errors ===
    /// A record in an input collection does not match the expected schema.
    #[error("Invalid {collection} entry at index {index}: {reason}")]
    Shape {
        collection: String,
        index: usize,
        reason: String,
    },

    /// A matched form has fewer question IDs in the target than in the source.
    #[error(
        "Form '{form}' has only {target_count} question IDs in the target but {source_count} in the source"
    )]
    QuestionCountMismatch {
        form: String,
        source_count: usize,
        target_count: usize,
    },

    /// Name-keyed tables have nothing in common.
    #[error("No overlapping {what} between source and target; cannot build mapping")]
    NoOverlap { what: String },

    // === Matching Errors ===
    /// More than one equally valid target exists for a source entity.
    #[error("Ambiguous matches for source question {source_id} in form '{form}': {candidates:?}")]
    AmbiguousMatch {
        source_id: EntityId,
        form: String,
        candidates: Vec<EntityId>,
    },

    /// No target candidate remains for a source entity.
    #[error("Unable to locate a matching target question for {source_id} in form '{form}'")]
    UnresolvedMatch { source_id: EntityId, form: String },

    /// Leftover source questions the caller chose to treat as fatal.
    #[error("{} source questions have no target counterpart: {}", ids.len(), preview_ids(ids))]
    UnresolvedQuestions { ids: Vec<EntityId> },

    // === Conflict Errors ===
    /// A mapping was extended with a value that disagrees with an earlier one.
    #[error("Conflicting mappings for {source_id}: {existing} vs {attempted}")]
    MappingConflict {
        source_id: EntityId,
        existing: EntityId,
        attempted: EntityId,
    },

    /// Two keys of one object collapse to the same rewritten key with different values.
    #[error("Conflicting values encountered when updating key '{key}'")]
    KeyConflict { key: String },

    /// Textual and structural rewrites produced different documents.
    #[error("Text replacements diverged from the structural rewrite: {reason}")]
    Consistency { reason: String },

    // === Missing Errors ===
    /// Known source IDs were referenced but have no destination.
    #[error(
        "Found references to source IDs without target mappings: {} ({} total)",
        preview_ids(ids),
        ids.len()
    )]
    MissingMapping { ids: Vec<EntityId> },

    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input file does not exist.
    #[error("Missing required file: {}", path.display())]
    FileNotFound { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors ===
    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Render up to [`PREVIEW_LIMIT`] IDs, with an ellipsis when more exist.
#[must_use]
pub fn preview_ids(ids: &[EntityId]) -> String {
    let shown = ids
        .iter()
        .take(PREVIEW_LIMIT)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if ids.len() > PREVIEW_LIMIT {
        format!("{shown} ...")
    } else {
        shown
    }
}

impl FormsyncError {
    /// Can the user fix this by selecting different inputs or flags?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Shape { .. }
                | Self::FileNotFound { .. }
                | Self::Config(_)
                | Self::MissingMapping { .. }
                | Self::UnresolvedQuestions { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Shape { .. } => {
                Some("Check that the right export was selected for each input file")
            }
            Self::QuestionCountMismatch { .. } => {
                Some("Re-export the target form library after syncing the form's questions")
            }
            Self::AmbiguousMatch { .. } => {
                Some("Make the duplicated target questions distinguishable, then re-run")
            }
            Self::MissingMapping { .. } => {
                Some("Use --allow-missing to leave these references unchanged")
            }
            Self::UnresolvedQuestions { .. } => {
                Some("Drop --strict to report unresolved questions without failing")
            }
            Self::FileNotFound { .. } => Some("Check the path or set it in formsync.yaml"),
            Self::Consistency { .. } => {
                Some("Use --dry-run to inspect the replacements; the file was not written")
            }
            _ => None,
        }
    }

    /// Create a shape error for a record of the named collection.
    #[must_use]
    pub fn shape(collection: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        Self::Shape {
            collection: collection.into(),
            index,
            reason: reason.into(),
        }
    }

    /// Create a consistency error.
    #[must_use]
    pub fn consistency(reason: impl Into<String>) -> Self {
        Self::Consistency {
            reason: reason.into(),
        }
    }
}

/// Result type using `FormsyncError`.
pub type Result<T> = std::result::Result<T, FormsyncError>;
