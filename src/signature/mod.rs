//! Content signatures for matching entities across ID spaces.
//!
//! A full signature is the canonical JSON of a record without its `id`:
//! keys sorted recursively, no whitespace, and the `label` stripped of
//! environment-specific link decoration. Two records that differ only in
//! field order or in that decoration produce byte-identical signatures.
//!
//! A loose signature keeps only the normalized label and the question type.
//! It is the fallback when unrelated fields (ordering metadata and the like)
//! drifted between exports.

use crate::error::{FormsyncError, Result};
use crate::model::Question;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;

/// Label decoration removed before comparing records.
///
/// Link target attributes are added by one instance's editor and carry no
/// meaning for the question itself.
pub const DEFAULT_LABEL_STRIP_PATTERNS: &[&str] = &[r#"\s+target\s*=\s*("[^"]*"|'[^']*')"#];

/// Canonical content fingerprint of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    /// The canonical JSON text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA256 of the canonical text as lowercase hex.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// First 12 hex characters of the digest, for log lines and reports.
    #[must_use]
    pub fn short_digest(&self) -> String {
        let mut digest = self.digest();
        digest.truncate(12);
        digest
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse fingerprint: normalized label and question type only.
///
/// Both fields hold canonical JSON of the raw value, so a string label and a
/// structured one never compare equal. `None` means the field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LooseSignature {
    pub label: Option<String>,
    pub question_type: Option<String>,
}

/// Produces signatures with a fixed set of label normalization rules.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    label_noise: Vec<Regex>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self {
            label_noise: DEFAULT_LABEL_STRIP_PATTERNS
                .iter()
                .map(|pattern| Regex::new(pattern).expect("default label pattern"))
                .collect(),
        }
    }
}

impl Canonicalizer {
    /// Build a canonicalizer from regex patterns stripped out of labels.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::Config` if a pattern is not a valid regex.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let label_noise = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern.as_ref()).map_err(|err| {
                    FormsyncError::Config(format!(
                        "invalid label strip pattern '{}': {err}",
                        pattern.as_ref()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { label_noise })
    }

    /// Remove configured decoration from label text.
    #[must_use]
    pub fn normalize_label<'a>(&self, label: &'a str) -> Cow<'a, str> {
        let mut normalized = Cow::Borrowed(label);
        for pattern in &self.label_noise {
            if pattern.is_match(&normalized) {
                let stripped = pattern.replace_all(&normalized, "").into_owned();
                normalized = Cow::Owned(stripped);
            }
        }
        normalized
    }

    /// Full signature of a question.
    #[must_use]
    pub fn full(&self, question: &Question) -> Signature {
        self.full_record(&question.record)
    }

    /// Full signature of any record: every field except `id`.
    #[must_use]
    pub fn full_record(&self, record: &Map<String, Value>) -> Signature {
        let mut fields: Vec<(&String, &Value)> =
            record.iter().filter(|(key, _)| key.as_str() != "id").collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let payload: Map<String, Value> = fields
            .into_iter()
            .map(|(key, value)| {
                let value = match (key.as_str(), value) {
                    ("label", Value::String(label)) => {
                        Value::String(self.normalize_label(label).into_owned())
                    }
                    _ => sorted_keys(value),
                };
                (key.clone(), value)
            })
            .collect();

        Signature(Value::Object(payload).to_string())
    }

    /// Loose signature of a question.
    #[must_use]
    pub fn loose(&self, question: &Question) -> LooseSignature {
        let record = &question.record;
        LooseSignature {
            label: record.get("label").map(|label| match label {
                Value::String(text) => {
                    Value::String(self.normalize_label(text).into_owned()).to_string()
                }
                other => canonical_json(other),
            }),
            question_type: record.get("question_type").map(canonical_json),
        }
    }
}

/// Canonical compact JSON of a value with object keys sorted recursively.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    sorted_keys(value).to_string()
}

fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(value: Value) -> Question {
        let Value::Object(record) = value else {
            panic!("question fixture must be an object");
        };
        let id = record.get("id").and_then(Value::as_u64).unwrap_or_default();
        Question { id, record }
    }

    #[test]
    fn test_signature_ignores_id_and_field_order() {
        let canon = Canonicalizer::default();
        let a = question(json!({"id": 1, "label": "Name", "question_type": "text", "opts": {"b": 1, "a": 2}}));
        let b = question(json!({"opts": {"a": 2, "b": 1}, "question_type": "text", "label": "Name", "id": 900}));
        assert_eq!(canon.full(&a), canon.full(&b));
        assert_eq!(
            canon.full(&a).as_str(),
            r#"{"label":"Name","opts":{"a":2,"b":1},"question_type":"text"}"#
        );
    }

    #[test]
    fn test_signature_strips_link_target() {
        let canon = Canonicalizer::default();
        let a = question(json!({"id": 1, "label": "See <a href=\"/x\" target=\"_blank\">policy</a>"}));
        let b = question(json!({"id": 2, "label": "See <a href=\"/x\">policy</a>"}));
        assert_eq!(canon.full(&a), canon.full(&b));
        assert_eq!(canon.loose(&a), canon.loose(&b));
    }

    #[test]
    fn test_signature_detects_content_change() {
        let canon = Canonicalizer::default();
        let a = question(json!({"id": 1, "label": "Name", "required": true}));
        let b = question(json!({"id": 1, "label": "Name", "required": false}));
        assert_ne!(canon.full(&a), canon.full(&b));
    }

    #[test]
    fn test_loose_signature_ignores_other_fields() {
        let canon = Canonicalizer::default();
        let a = question(json!({"id": 1, "label": "Name", "question_type": "text", "order": 1}));
        let b = question(json!({"id": 2, "label": "Name", "question_type": "text", "order": 7}));
        assert_ne!(canon.full(&a), canon.full(&b));
        assert_eq!(canon.loose(&a), canon.loose(&b));
    }

    #[test]
    fn test_loose_signature_compares_structured_labels() {
        let canon = Canonicalizer::default();
        let a = question(json!({"id": 1, "label": {"en": "Date of birth"}, "question_type": "text"}));
        let b = question(json!({"id": 2, "label": {"en": "Favourite colour"}, "question_type": "text"}));
        let c = question(json!({"id": 3, "question_type": "text", "label": {"en": "Date of birth"}}));
        assert_ne!(canon.loose(&a), canon.loose(&b));
        assert_eq!(canon.loose(&a), canon.loose(&c));
    }

    #[test]
    fn test_loose_signature_keeps_value_kind() {
        let canon = Canonicalizer::default();
        let text = question(json!({"id": 1, "label": "5", "question_type": "text"}));
        let number = question(json!({"id": 2, "label": 5, "question_type": "text"}));
        let absent = question(json!({"id": 3, "question_type": "text"}));
        let null = question(json!({"id": 4, "label": null, "question_type": "text"}));
        assert_ne!(canon.loose(&text), canon.loose(&number));
        assert_ne!(canon.loose(&absent), canon.loose(&null));
    }

    #[test]
    fn test_custom_patterns() {
        let canon = Canonicalizer::new(&[r#"\s+rel="[^"]*""#]).unwrap();
        assert_eq!(
            canon.normalize_label(r#"<a rel="noopener" href="/">x</a>"#),
            r#"<a href="/">x</a>"#
        );
        assert!(Canonicalizer::new(&["("]).is_err());
    }

    #[test]
    fn test_digest_is_sha256_hex() {
        let signature = Canonicalizer::default().full(&question(json!({"id": 1, "label": "x"})));
        let digest = signature.digest();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(signature.short_digest(), &digest[..12]);
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        assert_eq!(
            canonical_json(&json!({"z": [{"b": 1, "a": 0}], "a": null})),
            r#"{"a":null,"z":[{"a":0,"b":1}]}"#
        );
    }
}
