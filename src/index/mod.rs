//! Entity indexing for source and target exports.
//!
//! Validates the shape of decoded form and question collections and builds
//! the lookup tables the mapper works from:
//! - target forms keyed by `display_name`
//! - source and target questions keyed by ID
//!
//! Display names are assumed unique per environment. When a target library
//! repeats a name, the last form wins and a warning is logged.

use crate::error::{FormsyncError, OptionExt, Result};
use crate::mapping::FieldTable;
use crate::model::{EntityId, Environment, Form, IdRef, Question};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Questions of one environment keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    by_id: BTreeMap<EntityId, Question>,
}

impl QuestionBank {
    /// Look up a question by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Question> {
        self.by_id.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// All IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.by_id.keys().copied()
    }

    /// All questions in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.by_id.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Validated forms and questions for both environments.
#[derive(Debug, Clone)]
pub struct EntityIndex {
    pub source_forms: Vec<Form>,
    pub target_forms: Vec<Form>,
    pub source_questions: QuestionBank,
    pub target_questions: QuestionBank,
    target_by_name: HashMap<String, usize>,
}

impl EntityIndex {
    /// Validate the four decoded collections and build lookup tables.
    ///
    /// # Errors
    ///
    /// Returns `FormsyncError::Shape` naming the collection and index of the
    /// first record that does not look like a form or question.
    pub fn build(
        source_forms: &Value,
        target_forms: &Value,
        source_questions: &Value,
        target_questions: &Value,
    ) -> Result<Self> {
        let source_forms = load_forms(source_forms, Environment::Source)?;
        let target_forms = load_forms(target_forms, Environment::Target)?;
        let source_questions = load_questions(source_questions, Environment::Source)?;
        let target_questions = load_questions(target_questions, Environment::Target)?;
        Ok(Self::from_parts(
            source_forms,
            target_forms,
            source_questions,
            target_questions,
        ))
    }

    /// Assemble an index from already validated parts.
    #[must_use]
    pub fn from_parts(
        source_forms: Vec<Form>,
        target_forms: Vec<Form>,
        source_questions: QuestionBank,
        target_questions: QuestionBank,
    ) -> Self {
        let mut target_by_name = HashMap::with_capacity(target_forms.len());
        for (position, form) in target_forms.iter().enumerate() {
            if let Some(previous) = target_by_name.insert(form.display_name.clone(), position) {
                warn!(
                    name = %form.display_name,
                    previous_id = target_forms[previous].id,
                    id = form.id,
                    "Duplicate target form name; keeping the later form"
                );
            }
        }

        debug!(
            source_forms = source_forms.len(),
            target_forms = target_forms.len(),
            source_questions = source_questions.len(),
            target_questions = target_questions.len(),
            "Indexed collections"
        );

        Self {
            source_forms,
            target_forms,
            source_questions,
            target_questions,
            target_by_name,
        }
    }

    /// Target form with the given display name.
    #[must_use]
    pub fn target_form(&self, name: &str) -> Option<&Form> {
        self.target_by_name
            .get(name)
            .map(|&position| &self.target_forms[position])
    }

    /// Target form names close to `name`, nearest first.
    #[must_use]
    pub fn similar_target_names(&self, name: &str, max_suggestions: usize) -> Vec<String> {
        let names: Vec<&str> = self.target_by_name.keys().map(String::as_str).collect();
        find_similar_names(name, &names, max_suggestions)
    }

    /// IDs of every question in the source bank.
    #[must_use]
    pub fn source_question_ids(&self) -> BTreeSet<EntityId> {
        self.source_questions.ids().collect()
    }

    /// IDs of every source form.
    #[must_use]
    pub fn source_form_ids(&self) -> BTreeSet<EntityId> {
        self.source_forms.iter().map(|form| form.id).collect()
    }
}

fn collection_label(env: Environment, kind: &str) -> String {
    format!("{env} {kind}")
}

fn as_records<'a>(value: &'a Value, collection: &str) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        FormsyncError::shape(collection, 0, "expected a JSON array of records")
    })
}

fn record_id(record: &Map<String, Value>, collection: &str, index: usize) -> Result<EntityId> {
    record
        .get("id")
        .and_then(|value| IdRef::classify(value).id())
        .ok_or_shape(collection, index, "missing or non-numeric id")
}

/// Validate a decoded form library.
///
/// Question IDs are read from `question_ids` on the record, or from
/// `data_json.question_ids` as found in application exports.
///
/// # Errors
///
/// Returns `FormsyncError::Shape` if the value is not an array of form objects
/// with a numeric `id`, a non-empty `display_name` and numeric question IDs.
pub fn load_forms(value: &Value, env: Environment) -> Result<Vec<Form>> {
    let collection = collection_label(env, "forms");
    let records = as_records(value, &collection)?;

    let mut forms = Vec::with_capacity(records.len());
    for (index, raw) in records.iter().enumerate() {
        let record = raw
            .as_object()
            .ok_or_shape(&collection, index, "expected a form object")?;

        let display_name = record
            .get("display_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_shape(&collection, index, "missing display_name")?;

        let id = record_id(record, &collection, index)?;
        let question_ids = form_question_ids(record, &collection, index)?;

        forms.push(Form {
            id,
            display_name: display_name.to_string(),
            question_ids,
        });
    }

    Ok(forms)
}

fn form_question_ids(
    record: &Map<String, Value>,
    collection: &str,
    index: usize,
) -> Result<Vec<EntityId>> {
    let list = record.get("question_ids").or_else(|| {
        record
            .get("data_json")
            .and_then(|data| data.get("question_ids"))
    });

    let Some(list) = list else {
        return Ok(Vec::new());
    };
    if list.is_null() {
        return Ok(Vec::new());
    }

    let items = list
        .as_array()
        .ok_or_shape(collection, index, "question_ids is not a list")?;

    items
        .iter()
        .map(|item| {
            IdRef::classify(item).id().ok_or_else(|| {
                FormsyncError::shape(
                    collection,
                    index,
                    format!("expected numeric question ID, received {item}"),
                )
            })
        })
        .collect()
}

/// Validate a decoded question bank and key it by ID.
///
/// # Errors
///
/// Returns `FormsyncError::Shape` if the value is not an array of question
/// objects with a numeric `id`.
pub fn load_questions(value: &Value, env: Environment) -> Result<QuestionBank> {
    let collection = collection_label(env, "questions");
    let records = as_records(value, &collection)?;

    let mut by_id = BTreeMap::new();
    for (index, raw) in records.iter().enumerate() {
        let record = raw
            .as_object()
            .ok_or_shape(&collection, index, "expected a question object")?;
        let id = record_id(record, &collection, index)?;
        if by_id
            .insert(
                id,
                Question {
                    id,
                    record: record.clone(),
                },
            )
            .is_some()
        {
            warn!(%env, id, "Duplicate question ID; keeping the later record");
        }
    }

    Ok(QuestionBank { by_id })
}

/// Validate a custom field table.
///
/// Accepts either an object of `{name: id}` or a list of records carrying
/// `field_name` and `field_id` (header spellings such as `Field Name` are
/// matched case-insensitively). Rows with a blank name or ID are skipped.
///
/// # Errors
///
/// Returns `FormsyncError::Shape` for non-numeric IDs, for a name repeated
/// with different IDs, or when no usable row remains.
pub fn load_field_table(value: &Value, env: Environment) -> Result<FieldTable> {
    let collection = collection_label(env, "fields");
    let mut table = FieldTable::new();

    match value {
        Value::Object(entries) => {
            for (index, (name, raw)) in entries.iter().enumerate() {
                add_field(&mut table, &collection, index, name, raw)?;
            }
        }
        Value::Array(rows) => {
            for (index, row) in rows.iter().enumerate() {
                let record = row
                    .as_object()
                    .ok_or_shape(&collection, index, "expected a field record")?;
                let name = field_column(record, "field name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let raw = field_column(record, "field id").unwrap_or(&Value::Null);
                add_field(&mut table, &collection, index, name, raw)?;
            }
        }
        _ => {
            return Err(FormsyncError::shape(
                &collection,
                0,
                "expected an object of names to IDs or a list of field records",
            ));
        }
    }

    if table.is_empty() {
        return Err(FormsyncError::shape(&collection, 0, "no usable field rows"));
    }
    Ok(table)
}

fn field_column<'a>(record: &'a Map<String, Value>, header: &str) -> Option<&'a Value> {
    record.iter().find_map(|(key, value)| {
        let normalized = key.trim().to_ascii_lowercase().replace('_', " ");
        (normalized == header).then_some(value)
    })
}

fn add_field(
    table: &mut FieldTable,
    collection: &str,
    index: usize,
    name: &str,
    raw: &Value,
) -> Result<()> {
    let name = name.trim();
    let blank = match raw {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    };
    if name.is_empty() || blank {
        return Ok(());
    }

    let id = match raw {
        Value::String(text) => IdRef::classify_str(text.trim()).id(),
        other => IdRef::classify(other).id(),
    }
    .ok_or_else(|| {
        FormsyncError::shape(
            collection,
            index,
            format!("field ID {raw} for '{name}' is not numeric"),
        )
    })?;

    match table.get(name) {
        Some(&existing) if existing != id => Err(FormsyncError::shape(
            collection,
            index,
            format!("duplicate field name '{name}' with conflicting IDs"),
        )),
        _ => {
            table.insert(name.to_string(), id);
            Ok(())
        }
    }
}

/// Calculate the Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Find names similar to `searched` using Levenshtein distance.
///
/// Returns up to `max_suggestions` names with distance <= 3.
#[must_use]
pub fn find_similar_names(searched: &str, existing: &[&str], max_suggestions: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|name| (levenshtein_distance(searched, name), *name))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}
