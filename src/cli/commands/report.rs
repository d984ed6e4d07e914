//! Report command implementation.
//!
//! Prints the form and question mappings as CSV tables (or one JSON
//! document). Nothing is written to disk.

use super::{LoadedExports, print_json};
use crate::cli::ReportArgs;
use crate::config::{CliOverrides, RunConfig};
use crate::error::Result;
use crate::format::csv::{
    CsvSection, FORM_FIELDS, QUESTION_FIELDS, UNMATCHED_FORM_FIELDS, UNRESOLVED_FIELDS,
    format_sections,
};
use crate::format::{QuestionRow, ReportOutput, UnresolvedRow};
use crate::index::EntityIndex;
use crate::mapping::Reconciliation;

/// Execute the report command.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded or matching fails.
pub fn execute(args: &ReportArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let config = RunConfig::load(&args.overrides(overrides))?;
    let report = run(&config)?;

    if json {
        print_json(&report)
    } else {
        print!("{}", render_csv(&report));
        Ok(())
    }
}

/// Reconcile the exports and collect report rows.
///
/// # Errors
///
/// See [`execute`].
pub fn run(config: &RunConfig) -> Result<ReportOutput> {
    let exports = LoadedExports::load(config)?;
    let reconciliation = exports.reconcile(config)?;
    Ok(build_report(&exports.index, &reconciliation))
}

/// Attach labels and form names to the raw matches.
#[must_use]
pub fn build_report(index: &EntityIndex, reconciliation: &Reconciliation) -> ReportOutput {
    let label_of = |id| {
        index
            .source_questions
            .get(id)
            .and_then(|question| question.label())
            .map(str::to_string)
    };

    let questions = reconciliation
        .question_matches
        .iter()
        .map(|found| QuestionRow {
            source_id: found.source_id,
            target_id: found.target_id,
            form_name: found.form_name.clone(),
            question_label: label_of(found.source_id),
            kind: found.kind,
        })
        .collect();

    let unresolved = reconciliation
        .unresolved
        .iter()
        .map(|&source_id| UnresolvedRow {
            source_id,
            question_label: label_of(source_id),
        })
        .collect();

    ReportOutput {
        forms: reconciliation.form_matches.clone(),
        questions,
        unmatched_forms: reconciliation.unmatched_forms.clone(),
        unresolved,
    }
}

/// Render non-empty tables; empty ones become a one-line note.
#[must_use]
pub fn render_csv(report: &ReportOutput) -> String {
    let mut sections = Vec::new();
    let mut notes = Vec::new();

    if report.forms.is_empty() {
        notes.push("No form mappings were detected.");
    } else {
        let rows = report
            .forms
            .iter()
            .map(|form| {
                vec![
                    form.source_id.to_string(),
                    form.target_id.to_string(),
                    form.form_name.clone(),
                ]
            })
            .collect();
        sections.push(CsvSection::new("Form ID mappings", FORM_FIELDS, rows));
    }

    if report.questions.is_empty() {
        notes.push("No question mappings were detected.");
    } else {
        let rows = report
            .questions
            .iter()
            .map(|row| {
                vec![
                    row.source_id.to_string(),
                    row.target_id.to_string(),
                    row.form_name.clone().unwrap_or_default(),
                    row.question_label.clone().unwrap_or_default(),
                    row.kind.to_string(),
                ]
            })
            .collect();
        sections.push(CsvSection::new(
            "Question ID mappings",
            QUESTION_FIELDS,
            rows,
        ));
    }

    if !report.unmatched_forms.is_empty() {
        let rows = report
            .unmatched_forms
            .iter()
            .map(|form| {
                vec![
                    form.source_id.to_string(),
                    form.form_name.clone(),
                    form.similar.join("; "),
                ]
            })
            .collect();
        sections.push(CsvSection::new(
            "Unmatched source forms",
            UNMATCHED_FORM_FIELDS,
            rows,
        ));
    }

    if !report.unresolved.is_empty() {
        let rows = report
            .unresolved
            .iter()
            .map(|row| {
                vec![
                    row.source_id.to_string(),
                    row.question_label.clone().unwrap_or_default(),
                ]
            })
            .collect();
        sections.push(CsvSection::new(
            "Unresolved source questions",
            UNRESOLVED_FIELDS,
            rows,
        ));
    }

    let mut out = format_sections(&sections);
    for note in notes {
        out.push_str(note);
        out.push('\n');
    }
    out
}
