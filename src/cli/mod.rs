//! CLI definitions and entry point.

use crate::config::CliOverrides;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Reconcile form and question IDs between two application instances
#[derive(Parser, Debug)]
#[command(name = "formsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Project config file (default: ./formsync.yaml)
    #[arg(long, global = true, env = "FORMSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write JSON log lines to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite source IDs in the target workflow configuration
    Sync(SyncArgs),

    /// Rewrite question references in the target form library and question bank
    Deps(DepsArgs),

    /// Print the form and question mappings without writing anything
    Report(ReportArgs),

    /// Rewrite custom field IDs in a target profile display configuration
    Fields(FieldsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Locations of the four exports every reconciling command reads.
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Source form library export
    #[arg(long)]
    pub source_forms: Option<PathBuf>,

    /// Target form library export
    #[arg(long)]
    pub target_forms: Option<PathBuf>,

    /// Source question bank export
    #[arg(long)]
    pub source_questions: Option<PathBuf>,

    /// Target question bank export
    #[arg(long)]
    pub target_questions: Option<PathBuf>,

    /// Fail when any source question is left without a target
    #[arg(long)]
    pub strict: bool,
}

impl ExportArgs {
    /// Layer these flags over the global overrides.
    pub fn apply(&self, overrides: &mut CliOverrides) {
        set_path(&mut overrides.source_forms, self.source_forms.as_ref());
        set_path(&mut overrides.target_forms, self.target_forms.as_ref());
        set_path(
            &mut overrides.source_questions,
            self.source_questions.as_ref(),
        );
        set_path(
            &mut overrides.target_questions,
            self.target_questions.as_ref(),
        );
        if self.strict {
            overrides.strict_unresolved = Some(true);
        }
    }
}

/// Arguments for the sync command.
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    #[command(flatten)]
    pub exports: ExportArgs,

    /// Target workflow configuration to rewrite
    #[arg(long)]
    pub target_workflow: Option<PathBuf>,

    /// Write the result here instead of rewriting the workflow in place
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Compute and verify replacements without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Leave references without a mapping unchanged instead of failing
    #[arg(long)]
    pub allow_missing: bool,
}

impl SyncArgs {
    #[must_use]
    pub fn overrides(&self, base: &CliOverrides) -> CliOverrides {
        let mut overrides = base.clone();
        self.exports.apply(&mut overrides);
        set_path(&mut overrides.target_workflow, self.target_workflow.as_ref());
        if self.allow_missing {
            overrides.allow_missing = Some(true);
        }
        overrides
    }
}

/// Arguments for the deps command.
#[derive(Args, Debug, Clone, Default)]
pub struct DepsArgs {
    #[command(flatten)]
    pub exports: ExportArgs,

    /// Where to write the rewritten target form library
    #[arg(long)]
    pub updated_forms: Option<PathBuf>,

    /// Where to write the rewritten target question bank
    #[arg(long)]
    pub updated_questions: Option<PathBuf>,

    /// Compute replacements without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Leave references without a mapping unchanged instead of failing
    #[arg(long)]
    pub allow_missing: bool,
}

impl DepsArgs {
    #[must_use]
    pub fn overrides(&self, base: &CliOverrides) -> CliOverrides {
        let mut overrides = base.clone();
        self.exports.apply(&mut overrides);
        set_path(&mut overrides.updated_forms, self.updated_forms.as_ref());
        set_path(
            &mut overrides.updated_questions,
            self.updated_questions.as_ref(),
        );
        if self.allow_missing {
            overrides.allow_missing = Some(true);
        }
        overrides
    }
}

/// Arguments for the report command.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    #[command(flatten)]
    pub exports: ExportArgs,
}

impl ReportArgs {
    #[must_use]
    pub fn overrides(&self, base: &CliOverrides) -> CliOverrides {
        let mut overrides = base.clone();
        self.exports.apply(&mut overrides);
        overrides
    }
}

/// Arguments for the fields command.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldsArgs {
    /// Source custom field table (name to ID)
    #[arg(long)]
    pub source_fields: Option<PathBuf>,

    /// Target custom field table (name to ID)
    #[arg(long)]
    pub target_fields: Option<PathBuf>,

    /// Target profile display configuration to rewrite
    #[arg(long)]
    pub target_profile: Option<PathBuf>,

    /// Write the result here instead of rewriting the profile in place
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Compute replacements without writing
    #[arg(long)]
    pub dry_run: bool,
}

impl FieldsArgs {
    #[must_use]
    pub fn overrides(&self, base: &CliOverrides) -> CliOverrides {
        let mut overrides = base.clone();
        set_path(&mut overrides.source_fields, self.source_fields.as_ref());
        set_path(&mut overrides.target_fields, self.target_fields.as_ref());
        set_path(&mut overrides.target_profile, self.target_profile.as_ref());
        overrides
    }
}

fn set_path(slot: &mut Option<PathBuf>, value: Option<&PathBuf>) {
    if let Some(path) = value {
        *slot = Some(path.clone());
    }
}

/// Arguments for the completions command.
#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}
