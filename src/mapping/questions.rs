//! Question alignment.
//!
//! Two passes build the question map:
//!
//! 1. Per form pair, walk the source question list by position. The target
//!    at the same position is taken when it is still free and its content
//!    agrees; otherwise the form's target list is searched for a unique
//!    signature match.
//! 2. A global sweep pairs the remaining source questions with unconsumed
//!    targets whose full signature is identical, but only when both sides of
//!    a signature bucket have the same number of members.

use crate::error::{FormsyncError, Result};
use crate::index::EntityIndex;
use crate::mapping::{FormPair, IdMap};
use crate::model::EntityId;
use crate::signature::{Canonicalizer, LooseSignature, Signature};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace, warn};

/// How a question pair was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Same position, identical full signature.
    Positional,
    /// Same position, identical label and type.
    PositionalLoose,
    /// Same position, source record absent from the bank.
    PositionalUnverified,
    /// Unique full-signature match elsewhere in the form.
    FormSignature,
    /// Unique label-and-type match elsewhere in the form.
    FormLooseSignature,
    /// Paired by the global signature sweep.
    GlobalSignature,
}

impl MatchKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positional => "positional",
            Self::PositionalLoose => "positional_loose",
            Self::PositionalUnverified => "positional_unverified",
            Self::FormSignature => "form_signature",
            Self::FormLooseSignature => "form_loose_signature",
            Self::GlobalSignature => "global_signature",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A mapped question, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionMatch {
    pub source_id: EntityId,
    pub target_id: EntityId,
    /// Form the pair was found in; `None` for the global sweep.
    pub form_name: Option<String>,
    pub kind: MatchKind,
}

/// Builds the question map over an indexed pair of exports.
pub struct QuestionMapper<'a> {
    index: &'a EntityIndex,
    canon: &'a Canonicalizer,
    map: IdMap,
    matches: Vec<QuestionMatch>,
}

impl<'a> QuestionMapper<'a> {
    #[must_use]
    pub fn new(index: &'a EntityIndex, canon: &'a Canonicalizer) -> Self {
        Self {
            index,
            canon,
            map: IdMap::new(),
            matches: Vec::new(),
        }
    }

    /// Map the questions of one form pair.
    ///
    /// # Errors
    ///
    /// - `QuestionCountMismatch` if the target form has fewer questions
    /// - `AmbiguousMatch` if a signature search finds several candidates
    /// - `UnresolvedMatch` if a source question has no acceptable target
    pub fn align_form(&mut self, pair: FormPair<'_>) -> Result<()> {
        let form = pair.source.display_name.as_str();
        let source_ids = &pair.source.question_ids;
        let target_ids = &pair.target.question_ids;

        if target_ids.len() < source_ids.len() {
            return Err(FormsyncError::QuestionCountMismatch {
                form: form.to_string(),
                source_count: source_ids.len(),
                target_count: target_ids.len(),
            });
        }

        let mut target_full: HashMap<EntityId, Signature> = HashMap::new();
        let mut target_loose: HashMap<EntityId, LooseSignature> = HashMap::new();
        for &id in target_ids {
            if let Some(question) = self.index.target_questions.get(id) {
                target_full.insert(id, self.canon.full(question));
                target_loose.insert(id, self.canon.loose(question));
            }
        }

        let mut used: HashSet<EntityId> = target_ids
            .iter()
            .copied()
            .filter(|&id| self.map.is_consumed(id))
            .collect();

        for (position, &source_id) in source_ids.iter().enumerate() {
            if let Some(mapped) = self.map.get(source_id) {
                used.insert(mapped);
                continue;
            }

            let source = self.index.source_questions.get(source_id);
            let full = source.map(|question| self.canon.full(question));
            let loose = source.map(|question| self.canon.loose(question));

            let mut found = None;

            let candidate = target_ids[position];
            if !used.contains(&candidate) {
                found = match (&full, &loose) {
                    (Some(full), _) if target_full.get(&candidate) == Some(full) => {
                        Some((candidate, MatchKind::Positional))
                    }
                    (_, Some(loose)) if target_loose.get(&candidate) == Some(loose) => {
                        Some((candidate, MatchKind::PositionalLoose))
                    }
                    (None, _) => Some((candidate, MatchKind::PositionalUnverified)),
                    _ => None,
                };
            }

            if let (None, Some(full)) = (found, &full) {
                found = unique_candidate(form, source_id, target_ids, &used, |id| {
                    target_full.get(&id) == Some(full)
                })?
                .map(|id| (id, MatchKind::FormSignature));
            }

            if let (None, Some(loose)) = (found, &loose) {
                found = unique_candidate(form, source_id, target_ids, &used, |id| {
                    target_loose.get(&id) == Some(loose)
                })?
                .map(|id| (id, MatchKind::FormLooseSignature));
            }

            let Some((target_id, kind)) = found else {
                return Err(FormsyncError::UnresolvedMatch {
                    source_id,
                    form: form.to_string(),
                });
            };

            trace!(form, source_id, target_id, position, %kind, "Matched question");
            self.record(source_id, target_id, Some(form), kind)?;
            used.insert(target_id);
        }

        Ok(())
    }

    /// Pair the remaining questions by identical full signature.
    ///
    /// Source questions left over after the per-form passes are grouped by
    /// signature, as are target questions no source maps to. A bucket is
    /// paired in ascending ID order when both sides have the same non-zero
    /// size. Every other leftover is returned, sorted.
    ///
    /// # Errors
    ///
    /// Returns `MappingConflict` only if the map was corrupted in between.
    pub fn sweep(&mut self) -> Result<Vec<EntityId>> {
        let mut source_buckets: BTreeMap<Signature, Vec<EntityId>> = BTreeMap::new();
        for question in self.index.source_questions.iter() {
            if !self.map.contains(question.id) {
                source_buckets
                    .entry(self.canon.full(question))
                    .or_default()
                    .push(question.id);
            }
        }

        let mut target_buckets: HashMap<Signature, Vec<EntityId>> = HashMap::new();
        for question in self.index.target_questions.iter() {
            if !self.map.is_consumed(question.id) {
                target_buckets
                    .entry(self.canon.full(question))
                    .or_default()
                    .push(question.id);
            }
        }

        let mut unresolved = Vec::new();
        for (signature, sources) in source_buckets {
            let targets = target_buckets.remove(&signature).unwrap_or_default();
            if !targets.is_empty() && targets.len() == sources.len() {
                for (&source_id, &target_id) in sources.iter().zip(&targets) {
                    self.record(source_id, target_id, None, MatchKind::GlobalSignature)?;
                }
                debug!(
                    signature = %signature.short_digest(),
                    pairs = sources.len(),
                    "Paired questions by signature"
                );
            } else {
                debug!(
                    signature = %signature.short_digest(),
                    sources = sources.len(),
                    targets = targets.len(),
                    "Signature bucket left unresolved"
                );
                unresolved.extend(sources);
            }
        }

        unresolved.sort_unstable();
        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), "Source questions left without a target");
        }
        Ok(unresolved)
    }

    fn record(
        &mut self,
        source_id: EntityId,
        target_id: EntityId,
        form: Option<&str>,
        kind: MatchKind,
    ) -> Result<()> {
        self.map.insert(source_id, target_id)?;
        self.matches.push(QuestionMatch {
            source_id,
            target_id,
            form_name: form.map(str::to_string),
            kind,
        });
        Ok(())
    }

    /// The finished map and the provenance of each pair.
    #[must_use]
    pub fn finish(self) -> (IdMap, Vec<QuestionMatch>) {
        (self.map, self.matches)
    }
}

fn unique_candidate<F>(
    form: &str,
    source_id: EntityId,
    target_ids: &[EntityId],
    used: &HashSet<EntityId>,
    matches: F,
) -> Result<Option<EntityId>>
where
    F: Fn(EntityId) -> bool,
{
    let mut seen = HashSet::new();
    let candidates: Vec<EntityId> = target_ids
        .iter()
        .copied()
        .filter(|id| !used.contains(id) && seen.insert(*id) && matches(*id))
        .collect();

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        _ => Err(FormsyncError::AmbiguousMatch {
            source_id,
            form: form.to_string(),
            candidates,
        }),
    }
}
