//! Directional source → target ID mapping.

use crate::error::{FormsyncError, Result};
use crate::model::EntityId;
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from one environment's IDs to another's.
///
/// A source ID maps to at most one target. Entries can be added but never
/// changed: re-inserting the same pair is a no-op, a different target is a
/// conflict. Targets handed out are tracked so matching never reuses one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    forward: BTreeMap<EntityId, EntityId>,
    consumed: BTreeSet<EntityId>,
}

impl IdMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from pairs, rejecting conflicting duplicates.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::MappingConflict` if one source ID is paired
    /// with two different targets.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (EntityId, EntityId)>,
    {
        let mut map = Self::new();
        for (source, target) in pairs {
            map.insert(source, target)?;
        }
        Ok(map)
    }

    /// Record `source → target`.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::MappingConflict` if `source` is already mapped
    /// to a different target.
    pub fn insert(&mut self, source: EntityId, target: EntityId) -> Result<()> {
        match self.forward.get(&source) {
            Some(&existing) if existing == target => Ok(()),
            Some(&existing) => Err(FormsyncError::MappingConflict {
                source_id: source,
                existing,
                attempted: target,
            }),
            None => {
                self.forward.insert(source, target);
                self.consumed.insert(target);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, source: EntityId) -> Option<EntityId> {
        self.forward.get(&source).copied()
    }

    #[must_use]
    pub fn contains(&self, source: EntityId) -> bool {
        self.forward.contains_key(&source)
    }

    /// Whether some source already maps to `target`.
    #[must_use]
    pub fn is_consumed(&self, target: EntityId) -> bool {
        self.consumed.contains(&target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Pairs in ascending source order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.forward.iter().map(|(&source, &target)| (source, target))
    }
}
