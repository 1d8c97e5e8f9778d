//! Documentation entries and the doc-comment tree.

use std::collections::BTreeMap;

use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

use apidoc_metadata::MemberIdentity;
use apidoc_shared::{ApiDocError, Result};

use crate::normalize::normalize_comment;
use crate::source::{RawMember, SourceLocation};

// ---------------------------------------------------------------------------
// Doc-comment tree
// ---------------------------------------------------------------------------

/// A node of a parsed doc comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocNode {
    Element(DocElement),
    Text(String),
}

/// An element of a parsed doc comment (`<summary>`, `<see cref="..."/>`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<DocNode>,
}

impl DocElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &DocElement> {
        self.children.iter().filter_map(|c| match c {
            DocNode::Element(e) => Some(e),
            DocNode::Text(_) => None,
        })
    }

    /// Concatenated text of the whole subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DocNode], out: &mut String) {
    for node in nodes {
        match node {
            DocNode::Text(t) => out.push_str(t),
            DocNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

/// Parse a normalized comment body into a list of top-level nodes.
pub(crate) fn parse_comment(body: &str, location: &SourceLocation) -> Result<Vec<DocNode>> {
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let wrapped = format!("<member>{body}</member>");
    let package = parser::parse(&wrapped).map_err(|e| {
        ApiDocError::load(location.to_string(), format!("malformed comment markup: {e:?}"))
    })?;
    let document = package.as_document();
    let root = document
        .root()
        .children()
        .into_iter()
        .find_map(ChildOfRoot::element)
        .ok_or_else(|| ApiDocError::load(location.to_string(), "empty comment markup"))?;

    Ok(convert_children(root))
}

fn convert_children(element: Element<'_>) -> Vec<DocNode> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(e) => Some(DocNode::Element(convert_element(e))),
            ChildOfElement::Text(t) => Some(DocNode::Text(t.text().to_string())),
            _ => None,
        })
        .collect()
}

fn convert_element(element: Element<'_>) -> DocElement {
    DocElement {
        name: element.name().local_part().to_string(),
        attributes: element
            .attributes()
            .into_iter()
            .map(|a| (a.name().local_part().to_string(), a.value().to_string()))
            .collect(),
        children: convert_children(element),
    }
}

// ---------------------------------------------------------------------------
// DocumentationEntry
// ---------------------------------------------------------------------------

/// The documentation of one type or member, immutable once built.
///
/// An entry with no content is the representation of "no documentation":
/// lookups never fail, they return [`DocumentationEntry::empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationEntry {
    identity: MemberIdentity,
    content: Vec<DocNode>,
    raw: Option<String>,
    location: Option<SourceLocation>,
}

impl DocumentationEntry {
    /// Synthesized entry for a member the doc source says nothing about.
    pub fn empty(identity: MemberIdentity) -> Self {
        Self {
            identity,
            content: Vec::new(),
            raw: None,
            location: None,
        }
    }

    pub(crate) fn from_raw(member: RawMember) -> Result<Self> {
        let body = normalize_comment(&member.inner);
        let content = parse_comment(&body, &member.location)?;
        Ok(Self {
            identity: MemberIdentity::from_raw(member.name),
            content,
            raw: Some(member.raw),
            location: Some(member.location),
        })
    }

    pub fn identity(&self) -> &MemberIdentity {
        &self.identity
    }

    /// Value of the source element's `name` attribute; `None` for synthesized entries.
    pub fn name_attribute(&self) -> Option<&str> {
        self.raw.as_ref().map(|_| self.identity.as_str())
    }

    /// The `<member>` element exactly as it appeared in the source.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Normalized top-level nodes.
    pub fn content(&self) -> &[DocNode] {
        &self.content
    }

    /// True when there is no documentation at all.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|n| match n {
            DocNode::Text(t) => t.trim().is_empty(),
            DocNode::Element(_) => false,
        })
    }

    /// Top-level elements in declaration order.
    pub fn elements(&self) -> impl Iterator<Item = &DocElement> {
        self.content.iter().filter_map(|c| match c {
            DocNode::Element(e) => Some(e),
            DocNode::Text(_) => None,
        })
    }

    /// First top-level element called `name` (e.g. `summary`).
    pub fn element(&self, name: &str) -> Option<&DocElement> {
        self.elements().find(|e| e.name == name)
    }

    /// The `<param>` (or `<typeparam>`) element documenting `parameter`.
    pub fn param(&self, tag: &str, parameter: &str) -> Option<&DocElement> {
        self.elements()
            .find(|e| e.name == tag && e.attribute("name") == Some(parameter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_member(name: &str, inner: &str) -> RawMember {
        RawMember {
            name: name.into(),
            raw: format!("<member name=\"{name}\">{inner}</member>"),
            inner: inner.into(),
            location: SourceLocation {
                origin: "test.xml".into(),
                line: 1,
            },
        }
    }

    #[test]
    fn entry_parses_normalized_markup() {
        let entry = DocumentationEntry::from_raw(raw_member(
            "M:Acme.Widget.Spin(System.Int32)",
            "\n      <summary>\n      Spins the <c>widget</c>.\n      </summary>\n      <param name=\"times\">How often.</param>\n    ",
        ))
        .unwrap();

        let summary = entry.element("summary").unwrap();
        assert_eq!(summary.text(), "\nSpins the widget.\n");
        assert_eq!(entry.param("param", "times").unwrap().text(), "How often.");
        assert_eq!(entry.name_attribute(), Some("M:Acme.Widget.Spin(System.Int32)"));
        assert!(!entry.is_empty());
    }

    #[test]
    fn attributes_and_nested_elements_survive() {
        let entry = DocumentationEntry::from_raw(raw_member(
            "T:Acme.Widget",
            "<summary>See <see cref=\"T:Acme.Gadget\"/> and <paramref name=\"x\"/>.</summary>",
        ))
        .unwrap();
        let summary = entry.element("summary").unwrap();
        let refs: Vec<_> = summary.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(refs, ["see", "paramref"]);
        assert_eq!(
            summary.elements().next().unwrap().attribute("cref"),
            Some("T:Acme.Gadget")
        );
    }

    #[test]
    fn self_closing_member_is_empty() {
        let entry = DocumentationEntry::from_raw(raw_member("F:Acme.Widget.Empty", "")).unwrap();
        assert!(entry.is_empty());
        assert!(entry.raw().is_some());
    }

    #[test]
    fn synthesized_empty_entry_keeps_kind_tag() {
        let entry = DocumentationEntry::empty(MemberIdentity::from_raw("P:Acme.Widget.Size"));
        assert!(entry.is_empty());
        assert_eq!(entry.identity().kind(), Some(apidoc_metadata::IdentityKind::Property));
        assert_eq!(entry.name_attribute(), None);
        assert!(entry.element("summary").is_none());
    }

    #[test]
    fn bad_comment_markup_is_a_load_failure() {
        let err = DocumentationEntry::from_raw(raw_member("T:Acme.Bad", "<summary>unclosed"))
            .unwrap_err();
        assert!(err.to_string().contains("test.xml:1"));
    }
}
