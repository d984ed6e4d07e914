//! Text-preserving output.
//!
//! The structural rewrite re-serializes a document, which loses the original
//! key order, spacing and number formatting. To keep the file byte-identical
//! outside the rewritten IDs, the raw text is patched instead and then checked
//! against the structural result: replacement counts must agree pair by pair
//! and the patched text must parse to exactly the rewritten tree.

use crate::error::{FormsyncError, Result};
use crate::model::{EntityId, parse_numeric};
use crate::rewrite::{DIGIT_RUN, ReplacementStats, RewriteOutcome};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Raw text with IDs substituted, plus what was substituted.
#[derive(Debug, Clone)]
pub struct TextPatch {
    pub text: String,
    pub stats: ReplacementStats,
}

/// Replace every standalone digit run whose value is an old ID in `stats`.
///
/// Single pass: a substituted ID is never looked up again.
#[must_use]
pub fn patch_text(original: &str, stats: &ReplacementStats) -> TextPatch {
    let replacements: HashMap<EntityId, EntityId> = stats
        .iter()
        .map(|row| (row.old_id, row.new_id))
        .collect();

    let mut patched = ReplacementStats::default();
    let mut text = String::with_capacity(original.len());
    let mut last = 0;
    for run in DIGIT_RUN.find_iter(original) {
        let Some((old_id, new_id)) = parse_numeric(run.as_str())
            .and_then(|id| replacements.get(&id).map(|&new_id| (id, new_id)))
        else {
            continue;
        };
        text.push_str(&original[last..run.start()]);
        text.push_str(&new_id.to_string());
        patched.record(old_id, new_id);
        last = run.end();
    }
    text.push_str(&original[last..]);

    TextPatch {
        text,
        stats: patched,
    }
}

/// Patch `original` and prove the result matches the structural rewrite.
///
/// # Errors
///
/// Returns `FormsyncError::Consistency` if any pair was replaced a different
/// number of times textually than structurally, if the patched text no
/// longer parses, or if it parses to a different tree.
pub fn verify_text_patch(original: &str, outcome: &RewriteOutcome) -> Result<String> {
    let patch = patch_text(original, &outcome.stats);

    for expected in outcome.stats.iter() {
        let replaced = patch.stats.count(expected.old_id, expected.new_id);
        if replaced != expected.count {
            return Err(FormsyncError::consistency(format!(
                "expected to replace {} occurrences of {} but replaced {replaced}",
                expected.count, expected.old_id
            )));
        }
    }

    let reparsed: Value = serde_json::from_str(&patch.text).map_err(|err| {
        FormsyncError::consistency(format!("patched text is no longer valid JSON: {err}"))
    })?;

    if let Some(path) = first_difference(&reparsed, &outcome.value, String::new()) {
        return Err(FormsyncError::consistency(format!(
            "text replacements did not produce the expected document (first difference at '{path}')"
        )));
    }

    debug!(
        replacements = patch.stats.total(),
        bytes = patch.text.len(),
        "Verified text patch"
    );
    Ok(patch.text)
}

/// JSON pointer of the first place two trees differ.
fn first_difference(left: &Value, right: &Value, path: String) -> Option<String> {
    match (left, right) {
        (Value::Object(a), Value::Object(b)) => {
            if a.len() != b.len() {
                return Some(path);
            }
            a.iter().find_map(|(key, value)| match b.get(key) {
                Some(other) => first_difference(value, other, format!("{path}/{key}")),
                None => Some(format!("{path}/{key}")),
            })
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Some(path);
            }
            a.iter()
                .zip(b)
                .enumerate()
                .find_map(|(index, (x, y))| first_difference(x, y, format!("{path}/{index}")))
        }
        _ => (left != right).then_some(path),
    }
}
