//! Structural ID rewriting over arbitrary JSON documents.
//!
//! Every scalar site is visited once in a depth-first walk:
//! - native integers and pure-digit strings are looked up whole
//! - pure-digit object keys are replaced; other keys are left alone
//! - free text has its template placeholders and bare digit runs rewritten
//!
//! Each replacement bumps a per-(old, new) counter. IDs that are known source
//! IDs but resolve through no map are collected as missing.

mod keyed;
mod text;

pub use keyed::{KeyedRewrite, rewrite_key};
pub use text::rewrite_free_text;

pub(crate) use text::DIGIT_RUN;

use crate::error::{FormsyncError, Result};
use crate::mapping::IdMap;
use crate::model::{EntityId, IdRef};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Replacement counts keyed by (old, new).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementStats {
    counts: BTreeMap<(EntityId, EntityId), usize>,
}

/// One row of a replacement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub old_id: EntityId,
    pub new_id: EntityId,
    pub count: usize,
}

impl ReplacementStats {
    pub fn record(&mut self, old_id: EntityId, new_id: EntityId) {
        *self.counts.entry((old_id, new_id)).or_default() += 1;
    }

    #[must_use]
    pub fn count(&self, old_id: EntityId, new_id: EntityId) -> usize {
        self.counts.get(&(old_id, new_id)).copied().unwrap_or(0)
    }

    /// Rows in ascending (old, new) order.
    pub fn iter(&self) -> impl Iterator<Item = Replacement> + '_ {
        self.counts
            .iter()
            .map(|(&(old_id, new_id), &count)| Replacement {
                old_id,
                new_id,
                count,
            })
    }

    /// Total number of replacements.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of distinct pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn merge(&mut self, other: &Self) {
        for (&pair, &count) in &other.counts {
            *self.counts.entry(pair).or_default() += count;
        }
    }
}

impl Serialize for ReplacementStats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// A rewritten document with its audit trail.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub value: Value,
    pub stats: ReplacementStats,
    /// Known source IDs that resolved through no map.
    pub missing: BTreeSet<EntityId>,
}

/// Rewrites documents through an ordered chain of ID maps.
#[derive(Debug, Clone)]
pub struct Rewriter<'a> {
    maps: Vec<&'a IdMap>,
    known: BTreeSet<EntityId>,
    allow_missing: bool,
}

impl<'a> Rewriter<'a> {
    /// Maps are applied in the given order, each at most once per value.
    pub fn new<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = &'a IdMap>,
    {
        Self {
            maps: maps.into_iter().collect(),
            known: BTreeSet::new(),
            allow_missing: false,
        }
    }

    /// Source IDs whose absence from every map is an error.
    #[must_use]
    pub fn with_known_ids(mut self, known: BTreeSet<EntityId>) -> Self {
        self.known = known;
        self
    }

    /// Report missing IDs in the outcome instead of failing.
    #[must_use]
    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    /// Resolve an ID through the chain. `None` if no map knows it.
    #[must_use]
    pub fn resolve(&self, id: EntityId) -> Option<EntityId> {
        let mut current = id;
        let mut hit = false;
        for map in &self.maps {
            if let Some(next) = map.get(current) {
                current = next;
                hit = true;
            }
        }
        hit.then_some(current)
    }

    /// Rewrite `value`, returning a new tree.
    ///
    /// # Errors
    ///
    /// - `KeyConflict` if two keys of one object rewrite to the same key with
    ///   different values
    /// - `MissingMapping` if known source IDs were left unresolved and
    ///   missing IDs are not allowed
    pub fn rewrite(&self, value: &Value) -> Result<RewriteOutcome> {
        let mut walk = Walk {
            rewriter: self,
            stats: ReplacementStats::default(),
            missing: BTreeSet::new(),
        };
        let value = walk.value(value)?;

        debug!(
            replacements = walk.stats.total(),
            pairs = walk.stats.len(),
            missing = walk.missing.len(),
            "Rewrote document"
        );

        if !walk.missing.is_empty() && !self.allow_missing {
            return Err(FormsyncError::MissingMapping {
                ids: walk.missing.into_iter().collect(),
            });
        }

        Ok(RewriteOutcome {
            value,
            stats: walk.stats,
            missing: walk.missing,
        })
    }
}

struct Walk<'r, 'a> {
    rewriter: &'r Rewriter<'a>,
    stats: ReplacementStats,
    missing: BTreeSet<EntityId>,
}

impl Walk<'_, '_> {
    fn lookup(&mut self, id: EntityId) -> Option<EntityId> {
        match self.rewriter.resolve(id) {
            Some(new_id) if new_id != id => {
                self.stats.record(id, new_id);
                Some(new_id)
            }
            Some(_) => None,
            None => {
                if self.rewriter.known.contains(&id) {
                    self.missing.insert(id);
                }
                None
            }
        }
    }

    fn value(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::Object(map) => self.object(map).map(Value::Object),
            Value::Array(items) => items
                .iter()
                .map(|item| self.value(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::String(text) => Ok(Value::String(self.string(text))),
            Value::Number(_) => Ok(match IdRef::classify(value) {
                IdRef::Native(id) => self.lookup(id).map_or_else(|| value.clone(), Value::from),
                _ => value.clone(),
            }),
            Value::Bool(_) | Value::Null => Ok(value.clone()),
        }
    }

    fn string(&mut self, text: &str) -> String {
        match IdRef::classify_str(text) {
            IdRef::NumericString(id) => self
                .lookup(id)
                .map_or_else(|| text.to_string(), |new_id| new_id.to_string()),
            _ => rewrite_free_text(text, |id| self.lookup(id)).into_owned(),
        }
    }

    fn object(&mut self, map: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut out = Map::with_capacity(map.len());
        for (key, value) in map {
            let key = match IdRef::classify_str(key) {
                IdRef::NumericString(id) => self
                    .lookup(id)
                    .map_or_else(|| key.clone(), |new_id| new_id.to_string()),
                _ => key.clone(),
            };
            let value = self.value(value)?;
            match out.get(&key) {
                Some(existing) if *existing != value => {
                    return Err(FormsyncError::KeyConflict { key });
                }
                Some(_) => {}
                None => {
                    out.insert(key, value);
                }
            }
        }
        Ok(out)
    }
}
