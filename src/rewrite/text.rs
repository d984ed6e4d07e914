//! ID substitution inside free text.

use crate::model::{EntityId, parse_numeric};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// `{{...<N>...}}`: only `N` is an ID reference.
static TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\{\{[^{}<]*<)([0-9]+)(>[^{}]*\}\})").expect("template pattern")
});

/// Maximal ASCII digit runs, so a match is never adjacent to another digit.
pub(crate) static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit pattern"));

/// Rewrite IDs embedded in `text`.
///
/// Inside template placeholders only the bracketed number is looked up;
/// outside them every digit run is. `lookup` returns the replacement for an
/// ID or `None` to leave the run alone. Each site is visited exactly once.
pub fn rewrite_free_text<F>(text: &str, mut lookup: F) -> Cow<'_, str>
where
    F: FnMut(EntityId) -> Option<EntityId>,
{
    let mut out = String::new();
    let mut changed = false;
    let mut last = 0;

    for caps in TEMPLATE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        changed |= rewrite_runs(&text[last..whole.start()], &mut out, &mut lookup);
        changed |= rewrite_template(&caps, &mut out, &mut lookup);
        last = whole.end();
    }
    changed |= rewrite_runs(&text[last..], &mut out, &mut lookup);

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

fn rewrite_template<F>(caps: &Captures<'_>, out: &mut String, lookup: &mut F) -> bool
where
    F: FnMut(EntityId) -> Option<EntityId>,
{
    let replacement = parse_numeric(&caps[2]).and_then(&mut *lookup);
    out.push_str(&caps[1]);
    match replacement {
        Some(new_id) => out.push_str(&new_id.to_string()),
        None => out.push_str(&caps[2]),
    }
    out.push_str(&caps[3]);
    replacement.is_some()
}

fn rewrite_runs<F>(segment: &str, out: &mut String, lookup: &mut F) -> bool
where
    F: FnMut(EntityId) -> Option<EntityId>,
{
    let mut changed = false;
    let mut last = 0;
    for run in DIGIT_RUN.find_iter(segment) {
        out.push_str(&segment[last..run.start()]);
        match parse_numeric(run.as_str()).and_then(&mut *lookup) {
            Some(new_id) => {
                out.push_str(&new_id.to_string());
                changed = true;
            }
            None => out.push_str(run.as_str()),
        }
        last = run.end();
    }
    out.push_str(&segment[last..]);
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(id: EntityId) -> Option<EntityId> {
        match id {
            2 => Some(102),
            42 => Some(99),
            _ => None,
        }
    }

    #[test]
    fn test_template_only_bracketed_number() {
        assert_eq!(rewrite_free_text("{{Q<42>}}", map), "{{Q<99>}}");
        assert_eq!(rewrite_free_text("{{Q2<42>}}", map), "{{Q2<99>}}");
        assert_eq!(rewrite_free_text("see {{Q<2>}}", map), "see {{Q<102>}}");
    }

    #[test]
    fn test_bare_runs_outside_templates() {
        assert_eq!(rewrite_free_text("ids 2, 42 and 7", map), "ids 102, 99 and 7");
    }

    #[test]
    fn test_no_partial_number_replacement() {
        assert_eq!(rewrite_free_text("x422 and 12", map), "x422 and 12");
        assert_eq!(rewrite_free_text("q2a", map), "q102a");
    }

    #[test]
    fn test_unchanged_text_is_borrowed() {
        assert!(matches!(rewrite_free_text("nothing 7 here", map), Cow::Borrowed(_)));
    }

    #[test]
    fn test_each_site_visited_once() {
        let mut seen = Vec::new();
        let out = rewrite_free_text("{{A<2>}} 2 {{B<3>}}", |id| {
            seen.push(id);
            map(id)
        });
        assert_eq!(out, "{{A<102>}} 102 {{B<3>}}");
        assert_eq!(seen, vec![2, 2, 3]);
    }

    #[test]
    fn test_overflowing_run_left_alone() {
        let text = "99999999999999999999999";
        assert_eq!(rewrite_free_text(text, |_| Some(1)), text);
    }
}
