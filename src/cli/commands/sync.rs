//! Sync command implementation.
//!
//! Rewrites every source question and form ID in the target workflow
//! configuration. The structural rewrite decides what changes; the file is
//! then patched as text so its formatting survives, and the patch must parse
//! back to the structural result before anything is written.

use super::{LoadedExports, print_json, print_mapping_summary, print_missing, print_replacements};
use crate::cli::SyncArgs;
use crate::config::{CliOverrides, RunConfig};
use crate::error::{Result, ResultExt};
use crate::format::{MappingSummary, SyncOutput, TextFormatOptions, format_success};
use crate::rewrite::Rewriter;
use crate::util::{TextFile, sha256_hex, write_text_atomic};
use crate::verify::verify_text_patch;
use serde_json::Value;
use tracing::{debug, info};

/// Execute the sync command.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, matching fails, a known ID
/// has no mapping (unless allowed), or the text patch diverges from the
/// structural rewrite.
pub fn execute(args: &SyncArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let config = RunConfig::load(&args.overrides(overrides))?;
    let output = run(&config, args)?;

    if json {
        print_json(&output)
    } else {
        print_summary(&output, TextFormatOptions::detect());
        Ok(())
    }
}

/// Reconcile, rewrite and (unless dry-run) write the workflow.
///
/// # Errors
///
/// See [`execute`].
pub fn run(config: &RunConfig, args: &SyncArgs) -> Result<SyncOutput> {
    let exports = LoadedExports::load(config)?;
    let reconciliation = exports.reconcile(config)?;

    let workflow_path = &config.target_workflow;
    let source = TextFile::read(workflow_path)?;
    let original = source.text.as_str();
    let workflow: Value = serde_json::from_str(original)
        .with_context(|| format!("Invalid JSON in {}", workflow_path.display()))?;

    let mut known = exports.index.source_question_ids();
    known.extend(exports.index.source_form_ids());
    let outcome = Rewriter::new([&reconciliation.question_map, &reconciliation.form_map])
        .with_known_ids(known)
        .allow_missing(config.allow_missing)
        .rewrite(&workflow)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| workflow_path.clone());

    let patched = if outcome.stats.is_empty() {
        None
    } else {
        Some(verify_text_patch(original, &outcome)?)
    };

    let mut written = false;
    let mut sha256 = None;
    if !args.dry_run {
        match (&patched, &args.output) {
            (Some(text), _) => {
                let bytes = source.restore(text);
                write_text_atomic(&output_path, &bytes)?;
                written = true;
                sha256 = Some(sha256_hex(bytes.as_bytes()));
            }
            // An explicit output path always receives a file, even unchanged.
            (None, Some(_)) => {
                let bytes = source.restore(original);
                write_text_atomic(&output_path, &bytes)?;
                written = true;
                sha256 = Some(sha256_hex(bytes.as_bytes()));
            }
            (None, None) => debug!("Workflow unchanged; nothing to write"),
        }
    }

    info!(
        replacements = outcome.stats.total(),
        written,
        path = %output_path.display(),
        "Sync finished"
    );

    Ok(SyncOutput {
        workflow: workflow_path.display().to_string(),
        output: output_path.display().to_string(),
        dry_run: args.dry_run,
        written,
        total_replacements: outcome.stats.total(),
        missing: outcome.missing.iter().copied().collect(),
        replacements: outcome.stats,
        sha256,
        mapping: MappingSummary::from_reconciliation(&reconciliation),
    })
}

fn print_summary(output: &SyncOutput, options: TextFormatOptions) {
    print_mapping_summary(&output.mapping, options);
    print_replacements("Workflow", &output.replacements, options);
    print_missing(&output.missing, options);

    if output.written {
        println!(
            "{}",
            format_success(&format!("Wrote {}", output.output), options)
        );
    } else if output.dry_run {
        println!("Dry run: no files written.");
    }
}
