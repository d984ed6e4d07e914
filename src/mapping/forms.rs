//! Form alignment by display name.

use crate::error::Result;
use crate::index::EntityIndex;
use crate::mapping::IdMap;
use crate::model::{EntityId, Form};
use serde::Serialize;
use tracing::{debug, warn};

/// A source form and the target form sharing its name.
#[derive(Debug, Clone, Copy)]
pub struct FormPair<'a> {
    pub source: &'a Form,
    pub target: &'a Form,
}

/// A mapped form, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormMatch {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub form_name: String,
}

/// A source form with no target counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedForm {
    pub source_id: EntityId,
    pub form_name: String,
    /// Target names that look like typos of this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub similar: Vec<String>,
}

/// Result of pairing forms by name.
#[derive(Debug, Clone)]
pub struct FormAlignment<'a> {
    pub pairs: Vec<FormPair<'a>>,
    pub form_map: IdMap,
    pub matches: Vec<FormMatch>,
    pub unmatched: Vec<UnmatchedForm>,
}

/// Pair every source form with the target form of the same name.
///
/// Unmatched forms are reported, not fatal; their questions can only be
/// reached by the global signature sweep.
///
/// # Errors
///
/// Returns `FormsyncError::MappingConflict` if one source form ID appears
/// twice under names that resolve to different target forms.
pub fn align_forms(index: &EntityIndex) -> Result<FormAlignment<'_>> {
    let mut alignment = FormAlignment {
        pairs: Vec::new(),
        form_map: IdMap::new(),
        matches: Vec::new(),
        unmatched: Vec::new(),
    };

    for source in &index.source_forms {
        let Some(target) = index.target_form(&source.display_name) else {
            let similar = index.similar_target_names(&source.display_name, 3);
            warn!(
                form = %source.display_name,
                id = source.id,
                similar = ?similar,
                "Source form has no target counterpart"
            );
            alignment.unmatched.push(UnmatchedForm {
                source_id: source.id,
                form_name: source.display_name.clone(),
                similar,
            });
            continue;
        };

        alignment.form_map.insert(source.id, target.id)?;
        debug!(form = %source.display_name, source_id = source.id, target_id = target.id, "Matched form");
        alignment.matches.push(FormMatch {
            source_id: source.id,
            target_id: target.id,
            form_name: source.display_name.clone(),
        });
        alignment.pairs.push(FormPair { source, target });
    }

    Ok(alignment)
}
