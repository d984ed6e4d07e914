//! Fields command implementation.
//!
//! Maps custom field IDs by field name and rewrites the `custom_field_id`
//! entries of a target profile display configuration.

use super::{ID_LIST_LIMIT, print_json, print_replacements};
use crate::cli::FieldsArgs;
use crate::config::{CliOverrides, RunConfig};
use crate::error::Result;
use crate::format::{
    FieldsOutput, TextFormatOptions, UnmatchedField, format_id_list, format_success,
    format_warning,
};
use crate::index::load_field_table;
use crate::mapping::map_fields;
use crate::model::Environment;
use crate::rewrite::rewrite_key;
use crate::util::{load_json, write_json};
use tracing::{info, warn};

/// Key under which profile entries store their custom field.
pub const FIELD_ID_KEY: &str = "custom_field_id";

/// Execute the fields command.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, the field tables share no
/// names, or two field names disagree about a mapping.
pub fn execute(args: &FieldsArgs, json: bool, overrides: &CliOverrides) -> Result<()> {
    let config = RunConfig::load(&args.overrides(overrides))?;
    let output = run(&config, args)?;

    if json {
        print_json(&output)
    } else {
        print_summary(&output, TextFormatOptions::detect());
        Ok(())
    }
}

/// Map the field tables and rewrite the profile.
///
/// # Errors
///
/// See [`execute`].
pub fn run(config: &RunConfig, args: &FieldsArgs) -> Result<FieldsOutput> {
    let source = load_field_table(&load_json(&config.source_fields)?, Environment::Source)?;
    let target = load_field_table(&load_json(&config.target_fields)?, Environment::Target)?;
    let mapping = map_fields(&source, &target)?;

    let profile = load_json(&config.target_profile)?;
    let rewritten = rewrite_key(&profile, FIELD_ID_KEY, &mapping.map);

    if !rewritten.unmatched.is_empty() {
        warn!(
            count = rewritten.unmatched.len(),
            "Profile references fields without a mapping"
        );
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| config.target_profile.clone());
    let written = !args.dry_run;
    if written {
        write_json(&output_path, &rewritten.value)?;
    }

    info!(
        fields = mapping.map.len(),
        replacements = rewritten.stats.total(),
        written,
        "Fields finished"
    );

    Ok(FieldsOutput {
        profile: config.target_profile.display().to_string(),
        output: output_path.display().to_string(),
        dry_run: args.dry_run,
        written,
        fields_mapped: mapping.map.len(),
        total_replacements: rewritten.stats.total(),
        replacements: rewritten.stats,
        unmatched: rewritten
            .unmatched
            .into_iter()
            .map(|(id, count)| UnmatchedField { id, count })
            .collect(),
        missing_in_target: mapping.missing_in_target.into_iter().collect(),
        missing_in_source: mapping.missing_in_source.into_iter().collect(),
    })
}

fn print_summary(output: &FieldsOutput, options: TextFormatOptions) {
    println!("Mapped {} custom fields by name.", output.fields_mapped);
    print_replacements("Profile", &output.replacements, options);

    if !output.unmatched.is_empty() {
        let ids: Vec<_> = output.unmatched.iter().map(|field| field.id).collect();
        let line = format!(
            "{} field IDs in the profile have no mapping: {}",
            ids.len(),
            format_id_list(&ids, ID_LIST_LIMIT)
        );
        println!("{}", format_warning(&line, options));
    }
    for (names, side) in [
        (&output.missing_in_target, "target"),
        (&output.missing_in_source, "source"),
    ] {
        if !names.is_empty() {
            let line = format!("Fields missing in {side}: {}", names.join(", "));
            println!("{}", format_warning(&line, options));
        }
    }

    if output.written {
        println!(
            "{}",
            format_success(&format!("Wrote {}", output.output), options)
        );
    } else {
        println!("Dry run: no files written.");
    }
}
