//! Output formatting for `formsync`.
//!
//! Supports human-readable text summaries, machine-parseable JSON, and CSV
//! mapping reports. JSON and reports go to stdout; diagnostics go to stderr.
//!
//! # Output Types
//!
//! - [`SyncOutput`] - Workflow rewrite result (sync)
//! - [`DepsOutput`] - Library rewrite result (deps)
//! - [`ReportOutput`] - Mapping tables (report)
//! - [`FieldsOutput`] - Profile rewrite result (fields)
//!
//! # CSV Output
//!
//! The [`csv`] module renders titled tables with proper escaping of commas,
//! quotes, and newlines.

pub mod csv;
mod output;
mod text;

pub use output::{
    DepsOutput, FieldsOutput, MappingSummary, QuestionRow, ReportOutput, SyncOutput,
    UnmatchedField, UnresolvedRow,
};
pub use text::{
    TextFormatOptions, format_heading, format_id_list, format_replacement_line, format_success,
    format_warning,
};
