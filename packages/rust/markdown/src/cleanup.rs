//! Cleanup filters for rendered Markdown.
//!
//! Each filter rewrites the materialized text of a document scope. The
//! configured set runs in sequence through a [`FilterChain`].

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use apidoc_emit::Filter;
use apidoc_shared::RenderConfig;

/// Apply `pass` to every run of lines outside fenced code blocks.
fn outside_code_fences(md: &str, pass: impl Fn(&str) -> String) -> String {
    let mut result = String::with_capacity(md.len());
    let mut prose = String::new();
    let mut in_code_block = false;

    for line in md.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            if !in_code_block {
                result.push_str(&pass(&prose));
                prose.clear();
            }
            in_code_block = !in_code_block;
            result.push_str(line);
            continue;
        }
        if in_code_block {
            result.push_str(line);
        } else {
            prose.push_str(line);
        }
    }
    result.push_str(&pass(&prose));
    result
}

// ---------------------------------------------------------------------------
// Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into a single blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseBlankLines;

impl Filter for CollapseBlankLines {
    fn apply(&self, md: &str) -> String {
        let mut result = String::with_capacity(md.len());
        let mut in_code_block = false;
        let mut previous_blank = false;

        for line in md.split_inclusive('\n') {
            let fence = line.trim_start().starts_with("```");
            if fence {
                in_code_block = !in_code_block;
            }
            let blank = !in_code_block && !fence && line.trim().is_empty();
            if blank && previous_blank {
                continue;
            }
            previous_blank = blank;
            result.push_str(line);
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Trailing whitespace
// ---------------------------------------------------------------------------

/// Strip trailing whitespace from every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimTrailingWhitespace;

impl Filter for TrimTrailingWhitespace {
    fn apply(&self, md: &str) -> String {
        static TRAILING_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("valid regex"));

        TRAILING_RE.replace_all(md, "").into_owned()
    }
}

// ---------------------------------------------------------------------------
// Trailing newline
// ---------------------------------------------------------------------------

/// End the document with exactly one newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureTrailingNewline;

impl Filter for EnsureTrailingNewline {
    fn apply(&self, md: &str) -> String {
        let trimmed = md.trim_end_matches('\n');
        format!("{trimmed}\n")
    }
}

// ---------------------------------------------------------------------------
// Indented code blocks
// ---------------------------------------------------------------------------

/// Turn fenced code blocks into blocks indented by `width` spaces.
#[derive(Debug, Clone, Copy)]
pub struct IndentCodeBlocks {
    pub width: usize,
}

impl Filter for IndentCodeBlocks {
    fn apply(&self, md: &str) -> String {
        static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?ms)^[ \t]*```[^\n]*\n(.*?)^[ \t]*```[ \t]*$").expect("valid regex")
        });

        let indent = " ".repeat(self.width);
        FENCE_RE
            .replace_all(md, |caps: &regex::Captures| {
                let body = caps.get(1).map_or("", |m| m.as_str());
                body.lines()
                    .map(|line| {
                        if line.is_empty() {
                            String::new()
                        } else {
                            format!("{indent}{line}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .into_owned()
    }
}

// ---------------------------------------------------------------------------
// Relative links
// ---------------------------------------------------------------------------

/// Resolve relative link targets against a base URL.
///
/// Absolute URLs, in-page anchors, `mailto:` links and images are untouched.
#[derive(Debug, Clone)]
pub struct ResolveLinks {
    pub base: Url,
}

impl Filter for ResolveLinks {
    fn apply(&self, md: &str) -> String {
        static LINK_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

        outside_code_fences(md, |prose| {
            LINK_RE
                .replace_all(prose, |caps: &regex::Captures| {
                    let start = caps.get(0).map_or(0, |m| m.start());
                    let text = &caps[1];
                    let href = &caps[2];

                    if start > 0 && prose.as_bytes()[start - 1] == b'!' {
                        return caps[0].to_string();
                    }
                    if href.starts_with("http://")
                        || href.starts_with("https://")
                        || href.starts_with('#')
                        || href.starts_with("mailto:")
                    {
                        return caps[0].to_string();
                    }

                    match self.base.join(href) {
                        Ok(resolved) => format!("[{text}]({resolved})"),
                        Err(_) => caps[0].to_string(),
                    }
                })
                .into_owned()
        })
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Filters applied in order.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The cleanup chain described by `config.filters` and `config.base_url`.
    ///
    /// Fences are only removed after every fence-aware filter has run.
    pub fn from_config(config: &RenderConfig) -> Self {
        let mut chain = Self::new();
        if let Some(base) = &config.base_url {
            chain = chain.with(ResolveLinks { base: base.clone() });
        }
        if config.filters.trim_trailing_whitespace {
            chain = chain.with(TrimTrailingWhitespace);
        }
        if config.filters.collapse_blank_lines {
            chain = chain.with(CollapseBlankLines);
        }
        if config.filters.indent_code_blocks > 0 {
            chain = chain.with(IndentCodeBlocks {
                width: config.filters.indent_code_blocks,
            });
        }
        chain.with(EnsureTrailingNewline)
    }
}

impl Filter for FilterChain {
    fn apply(&self, md: &str) -> String {
        self.filters
            .iter()
            .fold(md.to_string(), |text, filter| filter.apply(&text))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
