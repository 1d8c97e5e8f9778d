//! Doc-comment whitespace normalization.
//!
//! Comment bodies in doc sources carry the indentation of the code they were
//! extracted from. Normalization drops blank lines at both ends and the
//! smallest leading-space run shared by all non-blank lines. Markup is never
//! touched.

use std::sync::LazyLock;

use regex::Regex;

pub(crate) static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("valid regex"));

/// Normalize a raw comment body. Idempotent.
pub fn normalize_comment(raw: &str) -> String {
    let lines: Vec<&str> = LINE_BREAK_RE.split(raw).collect();

    let Some(start) = lines.iter().position(|l| !is_blank(l)) else {
        return String::new();
    };
    let end = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(start);
    let body = &lines[start..=end];

    let indent = body
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| leading_spaces(l))
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|line| line.get(indent.min(leading_spaces(line))..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_blank_edges_and_common_indent() {
        assert_eq!(normalize_comment("  \n    Hello\n    World\n  "), "Hello\nWorld");
    }

    #[test]
    fn keeps_relative_indentation() {
        let raw = "\n    <code>\n      if (x)\n        y();\n    </code>\n";
        assert_eq!(normalize_comment(raw), "<code>\n  if (x)\n    y();\n</code>");
    }

    #[test]
    fn splits_on_every_line_break_style() {
        assert_eq!(normalize_comment("\r\n  a\r  b\n  c\r\n"), "a\nb\nc");
    }

    #[test]
    fn interior_blank_lines_do_not_pin_indent_to_zero() {
        assert_eq!(normalize_comment("    one\n\n    two"), "one\n\ntwo");
    }

    #[test]
    fn tabs_are_not_stripped() {
        assert_eq!(normalize_comment("\t  tabbed\n  spaced"), "\t  tabbed\n  spaced");
    }

    #[test]
    fn whitespace_only_body_normalizes_to_empty() {
        assert_eq!(normalize_comment(" \n\t\n  "), "");
        assert_eq!(normalize_comment(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "  \n    Hello\n    World\n  ",
            "\n   <summary>\n     Adds.\n   </summary>\n   <param name=\"x\">X</param>\n",
            "    one\n      \n    two",
            "no indent at all",
        ];
        for raw in samples {
            let once = normalize_comment(raw);
            assert_eq!(normalize_comment(&once), once, "not idempotent for {raw:?}");
        }
    }
}
