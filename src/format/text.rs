//! Text formatting for terminal summaries.

use crate::rewrite::Replacement;
use crossterm::style::Stylize;
use std::io::IsTerminal;

/// Formatting options for text output.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatOptions {
    pub use_color: bool,
}

impl TextFormatOptions {
    #[must_use]
    pub const fn plain() -> Self {
        Self { use_color: false }
    }

    /// Color when stdout is a terminal and `NO_COLOR` is unset.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            use_color: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

/// `  old -> new (n occurrences)`
#[must_use]
pub fn format_replacement_line(row: &Replacement, options: TextFormatOptions) -> String {
    let arrow = if options.use_color {
        "->".dim().to_string()
    } else {
        "->".to_string()
    };
    format!(
        "  {} {arrow} {} ({} occurrences)",
        row.old_id, row.new_id, row.count
    )
}

#[must_use]
pub fn format_heading(text: &str, options: TextFormatOptions) -> String {
    if options.use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

#[must_use]
pub fn format_success(text: &str, options: TextFormatOptions) -> String {
    if options.use_color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

#[must_use]
pub fn format_warning(text: &str, options: TextFormatOptions) -> String {
    if options.use_color {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

/// Up to `limit` IDs joined with ", ", with a trailing count of the rest.
#[must_use]
pub fn format_id_list(ids: &[u64], limit: usize) -> String {
    let shown = ids
        .iter()
        .take(limit)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if ids.len() > limit {
        format!("{shown} (+{} more)", ids.len() - limit)
    } else {
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_line_plain() {
        let row = Replacement {
            old_id: 1,
            new_id: 101,
            count: 3,
        };
        assert_eq!(
            format_replacement_line(&row, TextFormatOptions::plain()),
            "  1 -> 101 (3 occurrences)"
        );
    }

    #[test]
    fn test_colored_output_differs() {
        let colored = TextFormatOptions { use_color: true };
        assert_ne!(format_warning("careful", colored), "careful");
        assert_eq!(format_warning("careful", TextFormatOptions::plain()), "careful");
    }

    #[test]
    fn test_format_id_list() {
        assert_eq!(format_id_list(&[1, 2, 3], 5), "1, 2, 3");
        assert_eq!(format_id_list(&[1, 2, 3], 2), "1, 2 (+1 more)");
    }
}
