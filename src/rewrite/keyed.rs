//! Rewrite of values stored under one named key.

use crate::mapping::IdMap;
use crate::model::{EntityId, IdRef};
use crate::rewrite::ReplacementStats;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Result of a key-scoped rewrite.
#[derive(Debug, Clone)]
pub struct KeyedRewrite {
    pub value: Value,
    pub stats: ReplacementStats,
    /// IDs found under the key with no mapping, with occurrence counts.
    pub unmatched: BTreeMap<EntityId, usize>,
}

/// Replace IDs stored under `key` anywhere in `value`.
///
/// Numbers stay numbers and strings stay strings. Surrounding whitespace in a
/// numeric string is tolerated on input and dropped on output. Nothing outside
/// the key is touched.
#[must_use]
pub fn rewrite_key(value: &Value, key: &str, map: &IdMap) -> KeyedRewrite {
    let mut walk = KeyedWalk {
        key,
        map,
        stats: ReplacementStats::default(),
        unmatched: BTreeMap::new(),
    };
    let value = walk.value(value);
    KeyedRewrite {
        value,
        stats: walk.stats,
        unmatched: walk.unmatched,
    }
}

struct KeyedWalk<'a> {
    key: &'a str,
    map: &'a IdMap,
    stats: ReplacementStats,
    unmatched: BTreeMap<EntityId, usize>,
}

impl KeyedWalk<'_> {
    fn value(&mut self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    let value = if key == self.key {
                        self.scalar(value)
                    } else {
                        self.value(value)
                    };
                    out.insert(key.clone(), value);
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(|item| self.value(item)).collect()),
            other => other.clone(),
        }
    }

    fn scalar(&mut self, value: &Value) -> Value {
        let (old_id, as_string) = match value {
            Value::String(text) => match IdRef::classify_str(text.trim()).id() {
                Some(id) => (id, true),
                None => return value.clone(),
            },
            other => match IdRef::classify(other) {
                IdRef::Native(id) => (id, false),
                _ => return value.clone(),
            },
        };

        let Some(new_id) = self.map.get(old_id) else {
            *self.unmatched.entry(old_id).or_default() += 1;
            return value.clone();
        };

        self.stats.record(old_id, new_id);
        if as_string {
            Value::String(new_id.to_string())
        } else {
            Value::from(new_id)
        }
    }
}
