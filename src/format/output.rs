use crate::mapping::{FormMatch, MatchKind, Reconciliation, UnmatchedForm};
use crate::model::EntityId;
use crate::rewrite::ReplacementStats;
use serde::Serialize;

/// Counts shared by every command that reconciles exports.
#[derive(Debug, Clone, Serialize)]
pub struct MappingSummary {
    pub forms_mapped: usize,
    pub questions_mapped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched_forms: Vec<UnmatchedForm>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_questions: Vec<EntityId>,
}

impl MappingSummary {
    #[must_use]
    pub fn from_reconciliation(result: &Reconciliation) -> Self {
        Self {
            forms_mapped: result.form_map.len(),
            questions_mapped: result.question_map.len(),
            unmatched_forms: result.unmatched_forms.clone(),
            unresolved_questions: result.unresolved.clone(),
        }
    }
}

/// Result of `sync`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutput {
    pub workflow: String,
    pub output: String,
    pub dry_run: bool,
    pub written: bool,
    pub total_replacements: usize,
    pub replacements: ReplacementStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(flatten)]
    pub mapping: MappingSummary,
}

/// Result of `deps`.
#[derive(Debug, Clone, Serialize)]
pub struct DepsOutput {
    pub updated_forms: String,
    pub updated_questions: String,
    pub dry_run: bool,
    pub written: bool,
    pub form_replacements: ReplacementStats,
    pub question_replacements: ReplacementStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<EntityId>,
    #[serde(flatten)]
    pub mapping: MappingSummary,
}

/// A question pair with context for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRow {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub form_name: Option<String>,
    pub question_label: Option<String>,
    #[serde(rename = "match")]
    pub kind: MatchKind,
}

/// A source question without a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRow {
    pub source_id: EntityId,
    pub question_label: Option<String>,
}

/// Result of `report`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub forms: Vec<FormMatch>,
    pub questions: Vec<QuestionRow>,
    pub unmatched_forms: Vec<UnmatchedForm>,
    pub unresolved: Vec<UnresolvedRow>,
}

/// An unmapped field ID and how often it appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnmatchedField {
    pub id: EntityId,
    pub count: usize,
}

/// Result of `fields`.
#[derive(Debug, Clone, Serialize)]
pub struct FieldsOutput {
    pub profile: String,
    pub output: String,
    pub dry_run: bool,
    pub written: bool,
    pub fields_mapped: usize,
    pub total_replacements: usize,
    pub replacements: ReplacementStats,
    pub unmatched: Vec<UnmatchedField>,
    pub missing_in_target: Vec<String>,
    pub missing_in_source: Vec<String>,
}
