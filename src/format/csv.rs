//! CSV formatting for `formsync`.
//!
//! Mapping reports are printed as titled CSV tables separated by blank
//! lines, so each table can be pasted into a spreadsheet on its own.

use std::io::{self, Write};

/// Header of the form mapping table.
pub const FORM_FIELDS: &[&str] = &["source_id", "target_id", "form_name"];

/// Header of the question mapping table.
pub const QUESTION_FIELDS: &[&str] = &[
    "source_id",
    "target_id",
    "form_name",
    "question_label",
    "match",
];

/// Header of the unmatched form table.
pub const UNMATCHED_FORM_FIELDS: &[&str] = &["source_id", "form_name", "similar_target_names"];

/// Header of the unresolved question table.
pub const UNRESOLVED_FIELDS: &[&str] = &["source_id", "question_label"];

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
/// Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// A titled table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSection {
    pub title: String,
    pub fields: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl CsvSection {
    /// Section titled `"{label} ({fields})"`.
    #[must_use]
    pub fn new(label: &str, fields: &'static [&'static str], rows: Vec<Vec<String>>) -> Self {
        Self {
            title: format!("{label} ({})", fields.join(",")),
            fields,
            rows,
        }
    }
}

/// Write CSV header row to the given writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_header<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let header = fields.join(",");
    writeln!(writer, "{header}")
}

/// Format one row, escaping each value.
#[must_use]
pub fn format_row(values: &[String]) -> String {
    values
        .iter()
        .map(|value| escape_field(value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Write a titled table followed by a blank line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_section<W: Write>(writer: &mut W, section: &CsvSection) -> io::Result<()> {
    writeln!(writer, "{}", section.title)?;
    write_header(writer, section.fields)?;
    for row in &section.rows {
        writeln!(writer, "{}", format_row(row))?;
    }
    writeln!(writer)
}

/// Format sections as a complete CSV string.
///
/// # Panics
///
/// Panics if writing to the in-memory buffer fails (which should not happen).
#[must_use]
pub fn format_sections(sections: &[CsvSection]) -> String {
    let mut output = Vec::new();
    for section in sections {
        // write_section should not fail with Vec<u8>
        write_section(&mut output, section).expect("writing to Vec should not fail");
    }
    String::from_utf8_lossy(&output).into_owned()
}
