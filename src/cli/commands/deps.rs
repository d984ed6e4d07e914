//! Deps command implementation.
//!
//! Rewrites question references inside the target form library and question
//! bank, so that dependency conditions copied from the source point at the
//! target's question IDs.

use super::{LoadedExports, print_json, print_mapping_summary, print_missing, print_replacements};
use crate::cli::DepsArgs;
use crate::config::{CliOverrides, RunConfig};
use crate::error::{FormsyncError, Result};
use crate::format::{DepsOutput, MappingSummary, TextFormatOptions, format_success};
use crate::rewrite::Rewriter;
use crate::util::write_json;
use tracing::info;

/// Execute the deps command.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, matching fails, or a
/// referenced source question has no mapping (unless allowed).
pub fn execute(args: &DepsArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let config = RunConfig::load(&args.overrides(overrides))?;
    let output = run(&config, args.dry_run)?;

    if json {
        print_json(&output)
    } else {
        print_summary(&output, TextFormatOptions::detect());
        Ok(())
    }
}

/// Reconcile and rewrite both target libraries.
///
/// Missing references are gathered from both documents before failing, so
/// the error lists every ID that needs attention.
///
/// # Errors
///
/// See [`execute`].
pub fn run(config: &RunConfig, dry_run: bool) -> Result<DepsOutput> {
    let exports = LoadedExports::load(config)?;
    let reconciliation = exports.reconcile(config)?;

    let rewriter = Rewriter::new([&reconciliation.question_map])
        .with_known_ids(exports.index.source_question_ids())
        .allow_missing(true);
    let forms = rewriter.rewrite(&exports.target_forms)?;
    let questions = rewriter.rewrite(&exports.target_questions)?;

    let mut missing = forms.missing.clone();
    missing.extend(questions.missing.iter().copied());
    let missing: Vec<_> = missing.into_iter().collect();
    if !missing.is_empty() && !config.allow_missing {
        return Err(FormsyncError::MissingMapping { ids: missing });
    }

    let written = !dry_run;
    if written {
        write_json(&config.updated_forms, &forms.value)?;
        write_json(&config.updated_questions, &questions.value)?;
    }

    info!(
        form_replacements = forms.stats.total(),
        question_replacements = questions.stats.total(),
        written,
        "Deps finished"
    );

    Ok(DepsOutput {
        updated_forms: config.updated_forms.display().to_string(),
        updated_questions: config.updated_questions.display().to_string(),
        dry_run,
        written,
        form_replacements: forms.stats,
        question_replacements: questions.stats,
        missing,
        mapping: MappingSummary::from_reconciliation(&reconciliation),
    })
}

fn print_summary(output: &DepsOutput, options: TextFormatOptions) {
    print_mapping_summary(&output.mapping, options);
    print_replacements("Form library", &output.form_replacements, options);
    print_replacements("Question bank", &output.question_replacements, options);
    print_missing(&output.missing, options);

    if output.written {
        println!(
            "{}",
            format_success(
                &format!(
                    "Wrote {} and {}",
                    output.updated_forms, output.updated_questions
                ),
                options
            )
        );
    } else {
        println!("Dry run: no files written.");
    }
}
