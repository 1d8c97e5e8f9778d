//! Reading XML documentation files.
//!
//! The file is parsed once with `sxd-document` to validate it and to read the
//! decoded member names. A markup scan of the original source then locates
//! the raw inner text of every `<member>` element, skipping comments, CDATA
//! and processing instructions, so normalization sees the markup exactly as
//! written. Each located element must name the same member as the parsed one
//! at the same position.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

use apidoc_shared::{ApiDocError, Result};

use crate::normalize::LINE_BREAK_RE;

/// A doc source handed over by the collaborator: its text plus an origin
/// (usually a file path) used in diagnostics.
#[derive(Debug, Clone)]
pub struct DocSource {
    pub origin: String,
    pub text: String,
}

impl DocSource {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// Where an entry came from, for duplicate and load diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub origin: String,
    pub line: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.origin, self.line)
    }
}

/// One `<member>` element as found in the source.
#[derive(Debug, Clone)]
pub(crate) struct RawMember {
    /// Decoded `name` attribute.
    pub name: String,
    /// The whole element, byte for byte.
    pub raw: String,
    /// Inner markup; empty for self-closing elements.
    pub inner: String,
    pub location: SourceLocation,
}

/// Parsed shape of a doc file.
#[derive(Debug)]
pub(crate) struct DocFile {
    /// Content of `<doc><assembly><name>`, if present.
    pub assembly: Option<String>,
    pub members: Vec<RawMember>,
}

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").expect("valid regex")
});

/// Read every member element of a doc source, in document order.
pub(crate) fn read_doc_file(source: &DocSource) -> Result<DocFile> {
    let package = parser::parse(&source.text)
        .map_err(|e| ApiDocError::load(&source.origin, format!("malformed XML: {e:?}")))?;
    let document = package.as_document();

    let doc = document
        .root()
        .children()
        .into_iter()
        .find_map(ChildOfRoot::element)
        .filter(|e| e.name().local_part() == "doc")
        .ok_or_else(|| ApiDocError::load(&source.origin, "missing <doc> root element"))?;

    let assembly = child_elements(doc, "assembly")
        .into_iter()
        .next()
        .and_then(|a| child_elements(a, "name").into_iter().next())
        .map(|n| element_text(n).trim().to_string())
        .filter(|n| !n.is_empty());

    let names: Vec<String> = child_elements(doc, "members")
        .into_iter()
        .flat_map(|members| child_elements(members, "member"))
        .map(|m| {
            m.attribute_value("name").map(str::to_string).ok_or_else(|| {
                ApiDocError::load(&source.origin, "<member> element without a name attribute")
            })
        })
        .collect::<Result<_>>()?;

    let spans = locate_members(&source.text).map_err(|e| ApiDocError::load(&source.origin, e))?;
    if spans.len() != names.len() {
        return Err(ApiDocError::load(
            &source.origin,
            format!(
                "found {} <member> elements but located {} in the source text",
                names.len(),
                spans.len()
            ),
        ));
    }

    let mut members = Vec::with_capacity(names.len());
    let mut line = 1;
    let mut scanned = 0;
    for (name, span) in names.into_iter().zip(spans) {
        line += LINE_BREAK_RE
            .find_iter(&source.text[scanned..span.element.start])
            .count();
        scanned = span.element.start;

        if span.name != name {
            return Err(ApiDocError::load(
                &source.origin,
                format!(
                    "line {line}: <member> names '{}' in the source text but '{name}' in the document",
                    span.name
                ),
            ));
        }

        members.push(RawMember {
            name,
            raw: source.text[span.element].to_string(),
            inner: span
                .inner
                .map(|inner| source.text[inner].to_string())
                .unwrap_or_default(),
            location: SourceLocation {
                origin: source.origin.clone(),
                line,
            },
        });
    }

    Ok(DocFile { assembly, members })
}

/// A `<member>` element located in the source text.
#[derive(Debug)]
struct MemberSpan {
    /// `name` attribute with entity references decoded.
    name: String,
    element: Range<usize>,
    /// `None` for self-closing elements.
    inner: Option<Range<usize>>,
}

/// Locate the `doc/members/member` elements of already well-formed markup.
fn locate_members(text: &str) -> std::result::Result<Vec<MemberSpan>, String> {
    let mut spans = Vec::new();
    let mut open: Vec<&str> = Vec::new();
    let mut current: Option<(String, usize, usize)> = None;
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let start = pos + offset;
        let rest = &text[start..];

        if rest.starts_with("<!--") {
            pos = skip_past(text, start, "-->")?;
        } else if rest.starts_with("<![CDATA[") {
            pos = skip_past(text, start, "]]>")?;
        } else if rest.starts_with("<?") {
            pos = skip_past(text, start, "?>")?;
        } else if rest.starts_with("<!") {
            pos = skip_declaration(text, start)?;
        } else if rest.starts_with("</") {
            let end = tag_end(text, start)?;
            let name = local_name(text[start + 2..end - 1].trim());
            if open.pop() != Some(name) {
                return Err(format!("unbalanced </{name}> at byte {start}"));
            }
            if name == "member" && is_members_list(&open) {
                if let Some((member, element_start, inner_start)) = current.take() {
                    spans.push(MemberSpan {
                        name: member,
                        element: element_start..end,
                        inner: Some(inner_start..start),
                    });
                }
            }
            pos = end;
        } else {
            let end = tag_end(text, start)?;
            let tag = &text[start + 1..end - 1];
            let self_closing = tag.ends_with('/');
            let tag = tag.trim_end_matches('/');
            let split = tag.find(char::is_whitespace).unwrap_or(tag.len());
            let name = local_name(&tag[..split]);

            if name == "member" && is_members_list(&open) {
                let member = name_attribute(&tag[split..])
                    .ok_or_else(|| format!("<member> without a name at byte {start}"))?;
                if self_closing {
                    spans.push(MemberSpan {
                        name: member,
                        element: start..end,
                        inner: None,
                    });
                } else {
                    current = Some((member, start, end));
                }
            }
            if !self_closing {
                open.push(name);
            }
            pos = end;
        }
    }
    Ok(spans)
}

fn is_members_list(open: &[&str]) -> bool {
    open == ["doc", "members"]
}

fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

fn skip_past(text: &str, start: usize, terminator: &str) -> std::result::Result<usize, String> {
    text[start..]
        .find(terminator)
        .map(|i| start + i + terminator.len())
        .ok_or_else(|| format!("unterminated markup at byte {start}"))
}

/// End of a `<!DOCTYPE ...>` declaration, including any internal subset.
fn skip_declaration(text: &str, start: usize) -> std::result::Result<usize, String> {
    let mut depth = 0usize;
    for (i, c) in text[start..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '>' if depth == 0 => return Ok(start + i + 1),
            _ => {}
        }
    }
    Err(format!("unterminated declaration at byte {start}"))
}

/// Byte after the `>` closing the tag at `start`; quoted `>` do not count.
fn tag_end(text: &str, start: usize) -> std::result::Result<usize, String> {
    let mut quote = None;
    for (i, c) in text[start..].char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Ok(start + i + 1),
            _ => {}
        }
    }
    Err(format!("unterminated tag at byte {start}"))
}

/// The decoded value of the unprefixed `name` attribute.
fn name_attribute(attributes: &str) -> Option<String> {
    ATTRIBUTE_RE
        .captures_iter(attributes)
        .find(|caps| &caps[1] == "name")
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|value| decode_attribute(value.as_str()))
}

/// Attribute-value normalization: literal whitespace becomes a space, then
/// character and predefined entity references are expanded.
fn decode_attribute(value: &str) -> String {
    let value = value.replace("\r\n", " ").replace(['\r', '\n', '\t'], " ");
    ENTITY_RE
        .replace_all(&value, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(|code| code.ok())
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn child_elements<'d>(parent: Element<'d>, name: &str) -> Vec<Element<'d>> {
    parent
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(e) if e.name().local_part() == name => Some(e),
            _ => None,
        })
        .collect()
}

fn element_text(element: Element<'_>) -> String {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Text(t) => Some(t.text().to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<doc>
    <assembly>
        <name>Acme</name>
    </assembly>
    <members>
        <member name="T:Acme.Widget">
            <summary>
            A widget.
            </summary>
        </member>
        <member name="M:Acme.Widget.Spin(System.Int32)">
            <summary>Spins.</summary>
            <param name="times">How often.</param>
        </member>
        <member name="F:Acme.Widget.Empty"/>
    </members>
</doc>
"#;

    #[test]
    fn reads_assembly_name_and_members() {
        let file = read_doc_file(&DocSource::new("Acme.xml", SAMPLE)).unwrap();
        assert_eq!(file.assembly.as_deref(), Some("Acme"));
        let names: Vec<_> = file.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            ["T:Acme.Widget", "M:Acme.Widget.Spin(System.Int32)", "F:Acme.Widget.Empty"]
        );
    }

    #[test]
    fn keeps_raw_inner_text_and_line_numbers() {
        let file = read_doc_file(&DocSource::new("Acme.xml", SAMPLE)).unwrap();
        let widget = &file.members[0];
        assert!(widget.inner.contains("            A widget."));
        assert!(widget.raw.starts_with("<member name=\"T:Acme.Widget\">"));
        assert_eq!(widget.location.line, 7);
        assert_eq!(file.members[1].location.line, 12);
        assert_eq!(file.members[2].inner, "");
    }

    #[test]
    fn commented_out_members_are_not_located() {
        let text = r#"<doc><members>
    <!-- <member name="T:Acme.Old"><summary>stale</summary></member> -->
    <member name="T:Acme.A"><summary>fresh</summary></member>
</members></doc>"#;
        let file = read_doc_file(&DocSource::new("a.xml", text)).unwrap();
        assert_eq!(file.members.len(), 1);
        assert_eq!(file.members[0].name, "T:Acme.A");
        assert_eq!(file.members[0].inner, "<summary>fresh</summary>");
        assert_eq!(file.members[0].location.line, 3);
    }

    #[test]
    fn members_with_extra_attributes_are_located() {
        let text = r#"<doc><members>
    <!-- <member name="T:Acme.Old"><summary>stale</summary></member> -->
    <member name="T:Acme.A" xml:lang="en"><summary>fresh</summary></member>
    <member xml:lang='en' name='T:Acme.B'/>
</members></doc>"#;
        let file = read_doc_file(&DocSource::new("a.xml", text)).unwrap();
        let names: Vec<_> = file.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["T:Acme.A", "T:Acme.B"]);
        assert!(file.members[0].raw.starts_with("<member name=\"T:Acme.A\" xml:lang=\"en\">"));
        assert_eq!(file.members[0].inner, "<summary>fresh</summary>");
        assert_eq!(file.members[1].inner, "");
    }

    #[test]
    fn member_markup_inside_cdata_stays_in_the_body() {
        let text = r#"<doc><members>
    <member name="T:Acme.A"><example><![CDATA[ <member name="T:Acme.Fake"></member> ]]></example></member>
</members></doc>"#;
        let file = read_doc_file(&DocSource::new("a.xml", text)).unwrap();
        assert_eq!(file.members.len(), 1);
        assert!(file.members[0].inner.contains("T:Acme.Fake"));
        assert!(file.members[0].raw.ends_with("]]></example></member>"));
    }

    #[test]
    fn located_names_are_decoded_before_comparison() {
        let text = r#"<doc><members><member name="M:Acme.Op(Acme.A&amp;B)"/></members></doc>"#;
        let file = read_doc_file(&DocSource::new("a.xml", text)).unwrap();
        assert_eq!(file.members[0].name, "M:Acme.Op(Acme.A&B)");
        assert_eq!(decode_attribute("a&lt;&#65;&#x42;&unknown;"), "a<AB&unknown;");
    }

    #[test]
    fn line_numbers_follow_every_line_break_style() {
        let text = "<doc>\r<members>\r<member name=\"T:Acme.A\"/>\r\n<member name=\"T:Acme.B\"/>\n<member name=\"T:Acme.C\"/>\r</members></doc>";
        let file = read_doc_file(&DocSource::new("a.xml", text)).unwrap();
        let lines: Vec<_> = file.members.iter().map(|m| m.location.line).collect();
        assert_eq!(lines, [3, 4, 5]);
    }

    #[test]
    fn malformed_xml_is_a_load_failure() {
        let err = read_doc_file(&DocSource::new("bad.xml", "<doc><members>")).unwrap_err();
        assert!(matches!(err, ApiDocError::Load { .. }));
        assert!(err.to_string().contains("bad.xml"));
    }

    #[test]
    fn wrong_root_is_a_load_failure() {
        let err = read_doc_file(&DocSource::new("x.xml", "<project/>")).unwrap_err();
        assert!(err.to_string().contains("missing <doc>"));
    }
}
