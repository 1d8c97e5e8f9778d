//! Markdown output for apidoc.
//!
//! Provides the [`MarkdownFormatter`], Markdown-specific writers for assembly
//! index pages, type pages and member sections, and the cleanup filters run
//! over every finished document. [`preset`] installs all of it on a branch.

pub mod cleanup;
pub mod writers;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use apidoc_emit::{
    AssemblyNode, DocumentNode, EmissionContext, Formatter, MemberNode, Parent, TypeNode, Writer,
};
use apidoc_shared::RenderConfig;

pub use cleanup::{
    CollapseBlankLines, EnsureTrailingNewline, FilterChain, IndentCodeBlocks, ResolveLinks,
    TrimTrailingWhitespace,
};

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

static ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\\`*_\[\]<>|]").expect("valid regex"));

fn escape(text: &str) -> String {
    ESCAPE_RE.replace_all(text, r"\$0").into_owned()
}

/// CommonMark with GitHub-style tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn heading(&self, level: u8, text: &str) -> String {
        format!("{} {}\n\n", "#".repeat(usize::from(level.clamp(1, 6))), escape(text))
    }

    fn text(&self, text: &str) -> String {
        escape(text)
    }

    fn code(&self, code: &str) -> String {
        if code.contains('`') {
            format!("`` {code} ``")
        } else {
            format!("`{code}`")
        }
    }

    fn code_block(&self, language: &str, code: &str) -> String {
        format!("```{language}\n{code}\n```\n\n")
    }

    fn link(&self, text: &str, target: &str) -> String {
        format!("[{}]({target})", escape(text))
    }

    fn anchor(&self, id: &str) -> String {
        format!("<a id=\"{id}\"></a>\n\n")
    }

    fn strong(&self, text: &str) -> String {
        format!("**{text}**")
    }

    fn emphasis(&self, text: &str) -> String {
        format!("*{text}*")
    }

    fn list_item(&self, depth: usize, text: &str) -> String {
        format!("{}- {text}\n", "  ".repeat(depth))
    }

    fn table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        let cell = |s: &str| s.replace('\n', " ").replace('|', r"\|");
        let mut out = String::new();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));
        out.push_str(&format!("|{}\n", " --- |".repeat(headers.len())));
        for row in rows {
            let cells: Vec<String> = row.iter().map(|c| cell(c)).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out.push('\n');
        out
    }

    fn line_break(&self) -> String {
        "\\\n".into()
    }
}

// ---------------------------------------------------------------------------
// Preset
// ---------------------------------------------------------------------------

/// Install the Markdown formatter, writers and render settings on `ctx`.
pub fn preset<N: DocumentNode, P: Parent>(
    ctx: &EmissionContext<N, P>,
    config: &RenderConfig,
) -> EmissionContext<N, P> {
    debug!(heading_level = config.heading_level, "installing markdown preset");
    ctx.with_formatter(MarkdownFormatter)
        .with_render_config(config.clone())
        .with_heading_level(config.heading_level)
        .with_writer(Writer::<AssemblyNode>::new(writers::write_assembly_index))
        .with_writer(Writer::<TypeNode>::new(writers::write_type_page))
        .with_writer(Writer::<MemberNode>::new(writers::write_member_section))
}
