//! Render extensions: formatters, filters and targets.
//!
//! Extensions are resolved through the local scope by type, so installing one
//! with `using` shadows the ambient value for the rest of that branch only.

use std::sync::Arc;

use parking_lot::Mutex;

use apidoc_shared::{RenderConfig, Result};

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

/// Turns structural requests (heading, code, link, ...) into markup text.
pub trait Formatter: Send + Sync {
    /// Identifier used in logs and tests.
    fn name(&self) -> &'static str;

    fn heading(&self, level: u8, text: &str) -> String;
    /// Escape literal prose.
    fn text(&self, text: &str) -> String;
    fn code(&self, code: &str) -> String;
    fn code_block(&self, language: &str, code: &str) -> String;
    fn link(&self, text: &str, target: &str) -> String;
    fn anchor(&self, id: &str) -> String;
    fn strong(&self, text: &str) -> String;
    fn emphasis(&self, text: &str) -> String;
    /// One list entry at `depth` (0 = top level), already terminated.
    fn list_item(&self, depth: usize, text: &str) -> String;

    fn numbered_item(&self, depth: usize, number: usize, text: &str) -> String {
        format!("{}{number}. {text}\n", "   ".repeat(depth))
    }

    fn table(&self, headers: &[&str], rows: &[Vec<String>]) -> String;

    fn paragraph_break(&self) -> String {
        "\n\n".into()
    }

    fn line_break(&self) -> String {
        "\n".into()
    }
}

/// Unadorned text; the formatter in effect when none is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn heading(&self, _level: u8, text: &str) -> String {
        format!("{text}\n\n")
    }

    fn text(&self, text: &str) -> String {
        text.to_string()
    }

    fn code(&self, code: &str) -> String {
        code.to_string()
    }

    fn code_block(&self, _language: &str, code: &str) -> String {
        let body: Vec<String> = code.lines().map(|l| format!("    {l}")).collect();
        format!("{}\n\n", body.join("\n"))
    }

    fn link(&self, text: &str, target: &str) -> String {
        format!("{text} ({target})")
    }

    fn anchor(&self, _id: &str) -> String {
        String::new()
    }

    fn strong(&self, text: &str) -> String {
        text.to_string()
    }

    fn emphasis(&self, text: &str) -> String {
        text.to_string()
    }

    fn list_item(&self, depth: usize, text: &str) -> String {
        format!("{}- {text}\n", "  ".repeat(depth))
    }

    fn table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut out = headers.join("\t");
        out.push('\n');
        for row in rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

/// Local-scope slot holding the installed formatter.
#[derive(Clone)]
pub struct ActiveFormatter(pub Arc<dyn Formatter>);

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Rewrites the materialized text of a scope.
pub trait Filter: Send + Sync {
    fn apply(&self, text: &str) -> String;
}

impl<F> Filter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn apply(&self, text: &str) -> String {
        self(text)
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Receives the fragments of each named document, in order.
pub trait Target: Send + Sync {
    fn accept(&self, document: &str, fragments: &[Arc<str>]) -> Result<()>;
}

/// Local-scope slot holding the installed target.
#[derive(Clone)]
pub struct ActiveTarget(pub Arc<dyn Target>);

/// Collects documents in memory.
#[derive(Debug, Default)]
pub struct BufferTarget {
    documents: Mutex<Vec<(String, String)>>,
}

impl BufferTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents received so far, in arrival order.
    pub fn documents(&self) -> Vec<(String, String)> {
        self.documents.lock().clone()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.documents
            .lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.clone())
    }

    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }
}

impl Target for BufferTarget {
    fn accept(&self, document: &str, fragments: &[Arc<str>]) -> Result<()> {
        self.documents
            .lock()
            .push((document.to_string(), fragments.concat()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local settings
// ---------------------------------------------------------------------------

/// Heading depth for the current branch (1..=6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingLevel(pub u8);

impl Default for HeadingLevel {
    fn default() -> Self {
        Self(1)
    }
}

/// Render settings visible to writers.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions(pub RenderConfig);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_target_concatenates_fragments() {
        let target = BufferTarget::new();
        let fragments: Vec<Arc<str>> = vec!["# A".into(), "\n".into(), "body".into()];
        target.accept("a.md", &fragments).unwrap();
        assert_eq!(target.get("a.md").as_deref(), Some("# A\nbody"));
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn closures_are_filters() {
        let upper = |s: &str| s.to_uppercase();
        assert_eq!(upper.apply("abc"), "ABC");
    }

    #[test]
    fn plain_code_block_is_indented() {
        assert_eq!(PlainFormatter.code_block("csharp", "a();\nb();"), "    a();\n    b();\n\n");
    }
}
