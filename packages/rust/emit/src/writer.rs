//! Writers and the default writer table.
//!
//! A [`Writer`] renders one node type. Each node type names its default in
//! [`DocumentNode::default_writer`]; a branch can shadow it by installing a
//! `Writer<N>` in its local scope. Default writers render children in
//! declaration order and only ever talk to the active [`Formatter`].

use std::sync::{Arc, LazyLock};

use regex::Regex;

use apidoc_index::{DocElement, DocNode, normalize_comment};
use apidoc_metadata::{MemberIdentity, display_signature, display_type_name};
use apidoc_shared::Result;

use crate::context::EmissionContext;
use crate::extension::Formatter;
use crate::node::{
    AssemblyNode, Collection, DocElementNode, DocEntryNode, DocEntryProvider, DocumentNode,
    MemberNode, RootNode, TypeNode,
};

type WriteFn<N> = dyn Fn(&EmissionContext<N>) -> Result<EmissionContext<N>> + Send + Sync;

/// Renders a node of type `N` into the context it is given.
pub struct Writer<N>(Arc<WriteFn<N>>);

impl<N> Clone for Writer<N> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<N: DocumentNode> Writer<N> {
    pub fn new<F>(write: F) -> Self
    where
        F: Fn(&EmissionContext<N>) -> Result<EmissionContext<N>> + Send + Sync + 'static,
    {
        Self(Arc::new(write))
    }

    pub fn call(&self, ctx: &EmissionContext<N>) -> Result<EmissionContext<N>> {
        (self.0)(ctx)
    }
}

// ---------------------------------------------------------------------------
// Default writers
// ---------------------------------------------------------------------------

pub fn write_root(ctx: &EmissionContext<RootNode>) -> Result<EmissionContext<RootNode>> {
    ctx.select_assemblies().write()
}

pub fn write_assembly(ctx: &EmissionContext<AssemblyNode>) -> Result<EmissionContext<AssemblyNode>> {
    let ctx = ctx.heading(ctx.node().name());
    ctx.scope(|c| c.nested().select_types().write())
}

pub fn write_type(ctx: &EmissionContext<TypeNode>) -> Result<EmissionContext<TypeNode>> {
    let ctx = ctx.emit(ctx.formatter().anchor(&anchor_id(ctx.node().identity())));
    let ctx = ctx.heading(&type_title(ctx.node()));
    let ctx = ctx.select_doc_entry().write()?;
    ctx.scope(|c| c.nested().select_members().write())
}

pub fn write_member(ctx: &EmissionContext<MemberNode>) -> Result<EmissionContext<MemberNode>> {
    let node = ctx.node();
    if !ctx.render_config().0.include_undocumented && node.doc_entry().is_empty() {
        return Ok(ctx.clone());
    }
    let ctx = ctx.emit(ctx.formatter().anchor(&anchor_id(node.identity())));
    let ctx = ctx.heading(&display_signature(node.declaring(), node.info()));
    ctx.select_doc_entry().write()
}

/// Renders elements in declaration order. Consecutive `param`, `typeparam`,
/// `exception` and `seealso` elements form one labeled list.
pub fn write_doc_entry(ctx: &EmissionContext<DocEntryNode>) -> Result<EmissionContext<DocEntryNode>> {
    let f = ctx.formatter();
    let mut run: Option<&'static str> = None;
    let elements = ctx.select_doc_elements().each(|element| {
        let label = list_label(&element.node().element().name);
        let mut element = element;
        if label != run {
            if run.is_some() {
                element = element.emit(f.line_break());
            }
            if let Some(label) = label {
                element = element.emit(format!("{}{}", f.strong(label), f.paragraph_break()));
            }
            run = label;
        }
        element.write()
    })?;
    let elements = if run.is_some() {
        elements.emit(f.line_break())
    } else {
        elements
    };
    Ok(elements.end())
}

fn list_label(element: &str) -> Option<&'static str> {
    match element {
        "param" => Some("Parameters"),
        "typeparam" => Some("Type parameters"),
        "exception" => Some("Exceptions"),
        "seealso" => Some("See also"),
        _ => None,
    }
}

pub fn write_doc_element(
    ctx: &EmissionContext<DocElementNode>,
) -> Result<EmissionContext<DocElementNode>> {
    let formatter = ctx.formatter();
    let options = ctx.render_config();
    let links = |name: &str| ctx.link_target(name);
    let renderer = DocRenderer::new(formatter.as_ref(), &links, &options.0.code_language);
    Ok(ctx.emit(renderer.block(ctx.node().element())))
}

pub fn write_collection<N: DocumentNode>(
    ctx: &EmissionContext<Collection<N>>,
) -> Result<EmissionContext<Collection<N>>> {
    ctx.each(|item| item.write())
}

/// Heading text of a type page: `Widget class`, `Box<T> class`.
pub fn type_title(node: &TypeNode) -> String {
    format!("{} {}", display_type_name(node.info()), node.type_kind().keyword())
}

/// Anchor for a type or member heading; unique per identity.
///
/// `M:Acme.Widget.Spin(System.Int32)` → `m-acme-widget-spin-system-int32`.
/// Markers that tell overloads apart become words: `` ` `` → `g`, `{` → `of`,
/// `[` → `array`, `@` → `ref`, `*` → `ptr`.
pub fn anchor_id(identity: &MemberIdentity) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in identity.as_str().chars() {
        let marker = match c {
            '`' => Some("g"),
            '{' => Some("of"),
            '[' => Some("array"),
            '@' => Some("ref"),
            '*' => Some("ptr"),
            c if c.is_alphanumeric() => None,
            _ => {
                pending_dash = true;
                continue;
            }
        };
        if (pending_dash || marker.is_some()) && !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
        match marker {
            Some(word) => {
                out.push_str(word);
                pending_dash = true;
            }
            None => {
                out.extend(c.to_lowercase());
                pending_dash = false;
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Doc-comment rendering
// ---------------------------------------------------------------------------

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Renders doc-comment elements through a formatter.
///
/// Cross references (`<see cref>`) are resolved with `links`; unresolved ones
/// render as inline code of the identity's display name.
pub struct DocRenderer<'a> {
    formatter: &'a dyn Formatter,
    links: &'a dyn Fn(&str) -> Option<Arc<str>>,
    language: &'a str,
}

impl<'a> DocRenderer<'a> {
    pub fn new(
        formatter: &'a dyn Formatter,
        links: &'a dyn Fn(&str) -> Option<Arc<str>>,
        language: &'a str,
    ) -> Self {
        Self {
            formatter,
            links,
            language,
        }
    }

    /// Render a top-level element as a block, terminated by a paragraph break.
    pub fn block(&self, element: &DocElement) -> String {
        let f = self.formatter;
        let body = || self.inline(&element.children).trim().to_string();
        match element.name.as_str() {
            "remarks" => self.labeled("Remarks", &body()),
            "returns" => self.labeled("Returns", &body()),
            "value" => self.labeled("Value", &body()),
            "example" => self.labeled("Example", &body()),
            "param" | "typeparam" => {
                let name = element.attribute("name").unwrap_or_default();
                f.list_item(0, &format!("{}: {}", f.code(name), body()))
            }
            "exception" => {
                let cref = element.attribute("cref").unwrap_or_default();
                f.list_item(0, &format!("{}: {}", self.reference(cref, ""), body()))
            }
            "seealso" => f.list_item(0, &self.see(element)),
            "code" => self.code(element),
            "list" => self.list(element, 0),
            _ => self.paragraph(&body()),
        }
    }

    /// Render a node sequence as inline text; whitespace runs collapse.
    pub fn inline(&self, nodes: &[DocNode]) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                DocNode::Text(text) => {
                    let collapsed = WHITESPACE_RE.replace_all(text, " ");
                    out.push_str(&self.formatter.text(&collapsed));
                }
                DocNode::Element(element) => out.push_str(&self.inline_element(element)),
            }
        }
        out
    }

    /// Plain first paragraph of a `<summary>`, for tables and descriptions.
    pub fn summary_line(&self, summary: &DocElement) -> String {
        let text = self.inline(&summary.children);
        let first = text.split("\n\n").find(|p| !p.trim().is_empty()).unwrap_or("");
        WHITESPACE_RE.replace_all(first.trim(), " ").into_owned()
    }

    fn inline_element(&self, element: &DocElement) -> String {
        let f = self.formatter;
        match element.name.as_str() {
            "c" => f.code(&element.text()),
            "code" => format!("{}{}", f.paragraph_break(), self.code(element)),
            "see" | "seealso" => self.see(element),
            "paramref" | "typeparamref" => f.code(element.attribute("name").unwrap_or_default()),
            "para" => format!(
                "{}{}{}",
                f.paragraph_break(),
                self.inline(&element.children).trim(),
                f.paragraph_break()
            ),
            "list" => format!("{}{}", f.paragraph_break(), self.list(element, 0)),
            "b" | "strong" => f.strong(self.inline(&element.children).trim()),
            "i" | "em" => f.emphasis(self.inline(&element.children).trim()),
            "br" => f.line_break(),
            _ => self.inline(&element.children),
        }
    }

    fn paragraph(&self, body: &str) -> String {
        if body.is_empty() {
            return String::new();
        }
        format!("{body}{}", self.formatter.paragraph_break())
    }

    fn labeled(&self, label: &str, body: &str) -> String {
        if body.is_empty() {
            return String::new();
        }
        let f = self.formatter;
        format!("{}{}{body}{}", f.strong(label), f.paragraph_break(), f.paragraph_break())
    }

    fn see(&self, element: &DocElement) -> String {
        let f = self.formatter;
        let text = self.inline(&element.children);
        let text = text.trim();
        if let Some(cref) = element.attribute("cref") {
            return self.reference(cref, text);
        }
        if let Some(word) = element.attribute("langword") {
            return f.code(word);
        }
        if let Some(href) = element.attribute("href") {
            return f.link(if text.is_empty() { href } else { text }, href);
        }
        text.to_string()
    }

    fn reference(&self, cref: &str, text: &str) -> String {
        let label = if text.is_empty() {
            MemberIdentity::from_raw(cref).display_name()
        } else {
            text.to_string()
        };
        match (self.links)(cref) {
            Some(target) => self.formatter.link(&label, &target),
            None => self.formatter.code(&label),
        }
    }

    fn code(&self, element: &DocElement) -> String {
        let language = element
            .attribute("language")
            .or_else(|| element.attribute("lang"))
            .unwrap_or(self.language);
        self.formatter
            .code_block(language, &normalize_comment(&element.text()))
    }

    fn list(&self, element: &DocElement, depth: usize) -> String {
        let f = self.formatter;
        let kind = element.attribute("type").unwrap_or("bullet");

        if kind == "table" {
            let header = element.elements().find(|e| e.name == "listheader");
            let headers: Vec<String> = header
                .map(|h| h.elements().map(|cell| self.inline(&cell.children).trim().to_string()).collect())
                .unwrap_or_else(|| vec!["Term".into(), "Description".into()]);
            let rows: Vec<Vec<String>> = element
                .elements()
                .filter(|e| e.name == "item")
                .map(|item| {
                    item.elements()
                        .map(|cell| self.inline(&cell.children).trim().to_string())
                        .collect()
                })
                .collect();
            let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
            return f.table(&headers, &rows);
        }

        let mut out = String::new();
        for (i, item) in element.elements().filter(|e| e.name == "item").enumerate() {
            let text = self.item_text(item, depth);
            if kind == "number" {
                out.push_str(&f.numbered_item(depth, i + 1, &text));
            } else {
                out.push_str(&f.list_item(depth, &text));
            }
        }
        out.push('\n');
        out
    }

    fn item_text(&self, item: &DocElement, depth: usize) -> String {
        let f = self.formatter;
        let term = item.elements().find(|e| e.name == "term");
        let description = item.elements().find(|e| e.name == "description");
        let nested = item.elements().find(|e| e.name == "list");

        let mut text = match (term, description) {
            (Some(term), Some(description)) => format!(
                "{}: {}",
                f.strong(self.inline(&term.children).trim()),
                self.inline(&description.children).trim()
            ),
            (Some(only), None) | (None, Some(only)) => self.inline(&only.children).trim().to_string(),
            (None, None) => self
                .inline(&item.children)
                .trim()
                .to_string(),
        };
        if let Some(nested) = nested {
            text.push('\n');
            text.push_str(self.list(nested, depth + 1).trim_end());
        }
        text
    }
}
