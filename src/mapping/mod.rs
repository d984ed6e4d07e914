//! Source → target ID mapping.
//!
//! [`reconcile`] runs the whole matching pipeline over an [`EntityIndex`]:
//! forms are paired by display name, questions by position within each pair
//! and then by content signature across the remaining pool.

mod fields;
mod forms;
mod idmap;
mod questions;

pub use fields::{FieldMapping, FieldTable, map_fields};
pub use forms::{FormAlignment, FormMatch, FormPair, UnmatchedForm, align_forms};
pub use idmap::IdMap;
pub use questions::{MatchKind, QuestionMapper, QuestionMatch};

use crate::error::{FormsyncError, Result};
use crate::index::EntityIndex;
use crate::model::EntityId;
use crate::signature::Canonicalizer;
use tracing::info;

/// Everything the matcher learned about two exports.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub form_map: IdMap,
    pub question_map: IdMap,
    pub form_matches: Vec<FormMatch>,
    pub question_matches: Vec<QuestionMatch>,
    pub unmatched_forms: Vec<UnmatchedForm>,
    /// Source questions the sweep could not pair, ascending.
    pub unresolved: Vec<EntityId>,
}

impl Reconciliation {
    /// Fail if any source question was left without a target.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::UnresolvedQuestions` listing the leftovers.
    pub fn ensure_resolved(&self) -> Result<()> {
        if self.unresolved.is_empty() {
            Ok(())
        } else {
            Err(FormsyncError::UnresolvedQuestions {
                ids: self.unresolved.clone(),
            })
        }
    }
}

/// Build form and question maps for an indexed pair of exports.
///
/// # Errors
///
/// Propagates the first matching failure of any form pair:
/// `QuestionCountMismatch`, `AmbiguousMatch`, `UnresolvedMatch` or
/// `MappingConflict`.
pub fn reconcile(index: &EntityIndex, canon: &Canonicalizer) -> Result<Reconciliation> {
    let alignment = align_forms(index)?;

    let mut mapper = QuestionMapper::new(index, canon);
    for pair in &alignment.pairs {
        mapper.align_form(*pair)?;
    }
    let unresolved = mapper.sweep()?;
    let (question_map, question_matches) = mapper.finish();

    info!(
        forms = alignment.form_map.len(),
        unmatched_forms = alignment.unmatched.len(),
        questions = question_map.len(),
        unresolved = unresolved.len(),
        "Reconciled exports"
    );

    Ok(Reconciliation {
        form_map: alignment.form_map,
        question_map,
        form_matches: alignment.matches,
        question_matches,
        unmatched_forms: alignment.unmatched,
        unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reconcile_intake_scenario() {
        let index = EntityIndex::build(
            &json!([{"id": 10, "display_name": "Intake", "question_ids": [1, 2, 3]}]),
            &json!([{"id": 20, "display_name": "Intake", "question_ids": [101, 102, 103]}]),
            &json!([
                {"id": 1, "label": "Name", "question_type": "text"},
                {"id": 2, "label": "Email", "question_type": "text"},
                {"id": 3, "label": "Consent", "question_type": "checkbox"},
                {"id": 4, "label": "Loose end", "question_type": "text"}
            ]),
            &json!([
                {"id": 101, "label": "Name", "question_type": "text"},
                {"id": 102, "label": "Email", "question_type": "text"},
                {"id": 103, "label": "Consent", "question_type": "checkbox"},
                {"id": 104, "label": "Loose end", "question_type": "text"}
            ]),
        )
        .unwrap();

        let result = reconcile(&index, &Canonicalizer::default()).unwrap();
        assert_eq!(result.form_map.get(10), Some(20));
        assert_eq!(
            result.question_map.iter().collect::<Vec<_>>(),
            vec![(1, 101), (2, 102), (3, 103), (4, 104)]
        );
        assert!(result.unresolved.is_empty());
        assert!(result.ensure_resolved().is_ok());
        assert_eq!(
            result.question_matches.last().map(|m| m.kind),
            Some(MatchKind::GlobalSignature)
        );
    }

    #[test]
    fn test_reconcile_reports_unresolved() {
        let index = EntityIndex::build(
            &json!([]),
            &json!([]),
            &json!([{"id": 1, "label": "Only in source"}]),
            &json!([]),
        )
        .unwrap();
        let result = reconcile(&index, &Canonicalizer::default()).unwrap();
        assert_eq!(result.unresolved, vec![1]);
        assert!(matches!(
            result.ensure_resolved(),
            Err(FormsyncError::UnresolvedQuestions { .. })
        ));
    }
}
