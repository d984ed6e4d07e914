//! Custom field mapping by field name.

use crate::error::{FormsyncError, Result};
use crate::mapping::IdMap;
use crate::model::EntityId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Name → ID table for one environment's custom fields.
pub type FieldTable = BTreeMap<String, EntityId>;

/// Field map plus the names that could not be paired.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    pub map: IdMap,
    pub missing_in_target: BTreeSet<String>,
    pub missing_in_source: BTreeSet<String>,
}

/// Pair source and target field IDs through their shared names.
///
/// # Errors
///
/// - `NoOverlap` if the tables share no field name
/// - `MappingConflict` if two source names with the same ID resolve to
///   different target IDs
pub fn map_fields(source: &FieldTable, target: &FieldTable) -> Result<FieldMapping> {
    let mut mapping = FieldMapping::default();

    for (name, &old_id) in source {
        match target.get(name) {
            Some(&new_id) => {
                mapping.map.insert(old_id, new_id)?;
                debug!(field = %name, old_id, new_id, "Matched field");
            }
            None => {
                mapping.missing_in_target.insert(name.clone());
            }
        }
    }

    mapping.missing_in_source = target
        .keys()
        .filter(|name| !source.contains_key(*name))
        .cloned()
        .collect();

    if mapping.map.is_empty() {
        return Err(FormsyncError::NoOverlap {
            what: "custom field names".to_string(),
        });
    }

    if !mapping.missing_in_target.is_empty() {
        warn!(
            count = mapping.missing_in_target.len(),
            "Source fields without a target counterpart"
        );
    }

    Ok(mapping)
}
