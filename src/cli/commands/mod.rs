//! Command implementations.
//!
//! Every command resolves a [`RunConfig`] from its flags, loads what it
//! needs, and prints either a text summary or a JSON document to stdout.

pub mod completions;
pub mod deps;
pub mod fields;
pub mod report;
pub mod sync;

use crate::config::RunConfig;
use crate::error::Result;
use crate::format::{
    MappingSummary, TextFormatOptions, format_heading, format_id_list, format_replacement_line,
    format_warning,
};
use crate::index::EntityIndex;
use crate::mapping::{Reconciliation, reconcile};
use crate::model::EntityId;
use crate::rewrite::ReplacementStats;
use crate::util::load_json;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// IDs listed inline in text summaries.
const ID_LIST_LIMIT: usize = 10;

/// The four decoded exports and their validated index.
#[derive(Debug, Clone)]
pub struct LoadedExports {
    pub source_forms: Value,
    pub target_forms: Value,
    pub source_questions: Value,
    pub target_questions: Value,
    pub index: EntityIndex,
}

impl LoadedExports {
    /// Read and validate the exports named by `config`.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound`, a JSON error, or a shape error for the first
    /// export that cannot be used.
    pub fn load(config: &RunConfig) -> Result<Self> {
        let source_forms = load_json(&config.source_forms)?;
        let target_forms = load_json(&config.target_forms)?;
        let source_questions = load_json(&config.source_questions)?;
        let target_questions = load_json(&config.target_questions)?;
        let index = EntityIndex::build(
            &source_forms,
            &target_forms,
            &source_questions,
            &target_questions,
        )?;
        debug!(
            source_forms = %config.source_forms.display(),
            target_forms = %config.target_forms.display(),
            "Loaded exports"
        );
        Ok(Self {
            source_forms,
            target_forms,
            source_questions,
            target_questions,
            index,
        })
    }

    /// Match forms and questions, honoring `strict_unresolved`.
    ///
    /// # Errors
    ///
    /// Propagates matching failures, and `UnresolvedQuestions` in strict mode.
    pub fn reconcile(&self, config: &RunConfig) -> Result<Reconciliation> {
        let canon = config.canonicalizer()?;
        let result = reconcile(&self.index, &canon)?;
        if config.strict_unresolved {
            result.ensure_resolved()?;
        }
        Ok(result)
    }
}

/// Print a serializable result as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Text lines shared by every reconciling command.
fn print_mapping_summary(summary: &MappingSummary, options: TextFormatOptions) {
    println!(
        "Mapped {} forms and {} questions.",
        summary.forms_mapped, summary.questions_mapped
    );
    for form in &summary.unmatched_forms {
        let similar = if form.similar.is_empty() {
            String::new()
        } else {
            format!("; similar: {}", form.similar.join(", "))
        };
        let line = format!(
            "Form '{}' ({}) has no target counterpart{similar}",
            form.form_name, form.source_id
        );
        println!("{}", format_warning(&line, options));
    }
    if !summary.unresolved_questions.is_empty() {
        let line = format!(
            "{} source questions left unresolved: {}",
            summary.unresolved_questions.len(),
            format_id_list(&summary.unresolved_questions, ID_LIST_LIMIT)
        );
        println!("{}", format_warning(&line, options));
    }
}

/// Replacement rows under a heading, or a note that nothing changed.
fn print_replacements(heading: &str, stats: &ReplacementStats, options: TextFormatOptions) {
    if stats.is_empty() {
        println!("{heading}: no IDs required updating.");
        return;
    }
    println!(
        "{}",
        format_heading(&format!("{heading} ({} replacements):", stats.total()), options)
    );
    for row in stats.iter() {
        println!("{}", format_replacement_line(&row, options));
    }
}

fn print_missing(missing: &[EntityId], options: TextFormatOptions) {
    if missing.is_empty() {
        return;
    }
    let line = format!(
        "Left {} references without a mapping unchanged: {}",
        missing.len(),
        format_id_list(missing, ID_LIST_LIMIT)
    );
    println!("{}", format_warning(&line, options));
}
