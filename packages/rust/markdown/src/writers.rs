//! Markdown page writers.
//!
//! Installed by [`preset`](crate::preset) in place of the default writers:
//! an assembly renders as an index of its types grouped by namespace, a type
//! as a full page with member tables, and a member as a section with its
//! declaration.

use apidoc_emit::{
    AssemblyNode, Collection, DocEntryProvider, DocRenderer, DocumentNode, EmissionContext,
    MemberNode, MemberProvider, Parent, TypeNode, TypeProvider, anchor_id, type_title,
};
use apidoc_index::DocumentationEntry;
use apidoc_metadata::{
    MemberInfo, MemberKind, TypeInfo, display_signature, display_type, display_type_name,
};
use apidoc_shared::Result;

/// Assembly index: one table of types per namespace.
pub fn write_assembly_index(
    ctx: &EmissionContext<AssemblyNode>,
) -> Result<EmissionContext<AssemblyNode>> {
    let f = ctx.formatter();
    let mut ctx = ctx.heading(&format!("{} assembly", ctx.node().name()));

    let mut namespaces: Vec<(String, Vec<TypeNode>)> = Vec::new();
    for ty in ctx.node().types().iter() {
        let namespace = ty.info().namespace().unwrap_or("(global)").to_string();
        match namespaces.iter_mut().find(|(ns, _)| *ns == namespace) {
            Some((_, types)) => types.push(ty.clone()),
            None => namespaces.push((namespace, vec![ty.clone()])),
        }
    }

    let level = ctx.nested().heading_level();
    for (namespace, types) in namespaces {
        let rows: Vec<Vec<String>> = types
            .iter()
            .map(|ty| vec![type_link(&ctx, ty), summary_of(&ctx, &ty.doc_entry())])
            .collect();
        ctx = ctx
            .emit(f.heading(level, &namespace))
            .emit(f.table(&["Type", "Description"], &rows));
    }
    Ok(ctx)
}

/// A complete type page.
pub fn write_type_page(ctx: &EmissionContext<TypeNode>) -> Result<EmissionContext<TypeNode>> {
    let node = ctx.node();
    let info = node.info();
    let f = ctx.formatter();
    let options = ctx.render_config();
    let language = options.0.code_language.as_str();

    let mut ctx = ctx
        .emit(f.anchor(&anchor_id(node.identity())))
        .heading(&type_title(node))
        .emit(format!(
            "{} {}{}{} {}{}",
            f.strong("Namespace:"),
            f.code(info.namespace().unwrap_or("(global)")),
            f.line_break(),
            f.strong("Assembly:"),
            f.code(node.assembly_name()),
            f.paragraph_break()
        ))
        .emit(f.code_block(language, &type_declaration(info)));
    ctx = ctx.select_doc_entry().write()?;

    let section_level = ctx.nested().heading_level();

    let nested = node.types();
    if !nested.is_empty() {
        let rows: Vec<Vec<String>> = nested
            .iter()
            .map(|ty| vec![type_link(&ctx, ty), summary_of(&ctx, &ty.doc_entry())])
            .collect();
        ctx = ctx
            .emit(f.heading(section_level, "Nested types"))
            .emit(f.table(&["Type", "Description"], &rows));
    }

    let sections = [
        ("Constructors", node.constructors()),
        ("Properties", node.properties()),
        ("Methods", node.methods()),
        ("Fields", node.fields()),
        ("Events", node.events()),
    ];
    for (title, members) in sections {
        let members = if options.0.include_undocumented {
            members
        } else {
            members.filter(|m| !m.doc_entry().is_empty())
        };
        if members.is_empty() {
            continue;
        }

        ctx = ctx.emit(f.heading(section_level, title));
        if options.0.member_tables {
            let rows: Vec<Vec<String>> = members
                .iter()
                .map(|m| {
                    let signature = display_signature(m.declaring(), m.info());
                    vec![
                        f.link(&signature, &format!("#{}", anchor_id(m.identity()))),
                        summary_of(&ctx, &m.doc_entry()),
                    ]
                })
                .collect();
            ctx = ctx.emit(f.table(&["Name", "Description"], &rows));
        }
        ctx = ctx.scope(|c| write_members(c, members))?;
    }
    Ok(ctx)
}

fn write_members(
    ctx: &EmissionContext<TypeNode>,
    members: Collection<MemberNode>,
) -> Result<EmissionContext<TypeNode>> {
    ctx.nested().nested().select(|_| members).write()
}

/// A member section: heading, declaration, documentation.
pub fn write_member_section(
    ctx: &EmissionContext<MemberNode>,
) -> Result<EmissionContext<MemberNode>> {
    let node = ctx.node();
    let options = ctx.render_config();
    if !options.0.include_undocumented && node.doc_entry().is_empty() {
        return Ok(ctx.clone());
    }

    let f = ctx.formatter();
    let ctx = ctx
        .emit(f.anchor(&anchor_id(node.identity())))
        .heading(&display_signature(node.declaring(), node.info()))
        .emit(f.code_block(
            &options.0.code_language,
            &member_declaration(node.declaring(), node.info()),
        ));
    ctx.select_doc_entry().write()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn type_link<N: DocumentNode, P: Parent>(ctx: &EmissionContext<N, P>, ty: &TypeNode) -> String {
    let f = ctx.formatter();
    let name = display_type_name(ty.info());
    match ctx.link_target(ty.identity().as_str()) {
        Some(target) => f.link(&name, &target),
        None => f.code(&name),
    }
}

/// First paragraph of an entry's `<summary>`, or empty.
fn summary_of<N: DocumentNode, P: Parent>(
    ctx: &EmissionContext<N, P>,
    entry: &DocumentationEntry,
) -> String {
    let Some(summary) = entry.element("summary") else {
        return String::new();
    };
    let formatter = ctx.formatter();
    let options = ctx.render_config();
    let links = |name: &str| ctx.link_target(name);
    DocRenderer::new(formatter.as_ref(), &links, &options.0.code_language).summary_line(summary)
}

/// `class Widget`, `struct Pair<TKey, TValue>`.
pub fn type_declaration(info: &TypeInfo) -> String {
    format!("{} {}", info.kind.keyword(), display_type_name(info))
}

/// C#-style declaration line of a member.
pub fn member_declaration(declaring: &TypeInfo, member: &MemberInfo) -> String {
    let signature = display_signature(declaring, member);
    let value_type = member
        .return_type
        .as_ref()
        .map(display_type)
        .unwrap_or_else(|| "void".to_string());

    match member.kind {
        _ if member.is_constructor() => signature,
        MemberKind::Method => format!("{value_type} {signature}"),
        MemberKind::Property => {
            let accessors = match (member.getter.is_some(), member.setter.is_some()) {
                (true, true) => "{ get; set; }",
                (false, true) => "{ set; }",
                _ => "{ get; }",
            };
            format!("{value_type} {signature} {accessors}")
        }
        MemberKind::Field => format!("{value_type} {signature}"),
        MemberKind::Event => format!("event {value_type} {signature}"),
        MemberKind::Constructor | MemberKind::Unknown => signature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use apidoc_emit::BufferTarget;
    use apidoc_index::{DocSource, DocumentIndex, SourcePair};
    use apidoc_metadata::{
        AccessorInfo, AssemblyInfo, NamedType, ParameterInfo, TypeKind, TypeRef,
    };
    use apidoc_shared::RenderConfig;
    use pretty_assertions::assert_eq;

    use crate::preset;

    const DOCS: &str = r#"<doc>
    <members>
        <member name="T:Acme.Widget">
            <summary>A widget that spins.</summary>
            <remarks>
            Use it like this:
            <code>
            var w = new Widget();
            w.Spin(3);
            </code>
            </remarks>
        </member>
        <member name="M:Acme.Widget.Spin(System.Int32)">
            <summary>Spins the widget.</summary>
            <param name="times">How often.</param>
            <returns>The new angle.</returns>
        </member>
    </members>
</doc>"#;

    fn index() -> Arc<DocumentIndex> {
        let int = TypeRef::named("System", "Int32");
        let mut size = MemberInfo::new(MemberKind::Property, "Size").with_return_type(int.clone());
        size.getter = Some(AccessorInfo::default());
        let widget = TypeInfo {
            named: NamedType::new(Some("Acme"), "Widget"),
            kind: TypeKind::Class,
            generic_parameters: Vec::new(),
            members: vec![
                MemberInfo::new(MemberKind::Method, "Spin")
                    .with_parameters(vec![ParameterInfo::new("times", int.clone())])
                    .with_return_type(TypeRef::named("System", "Double")),
                size,
            ],
        };
        let assembly = AssemblyInfo {
            name: "Acme".into(),
            types: vec![widget],
        };
        Arc::new(
            DocumentIndex::build(vec![SourcePair::new(
                assembly,
                Some(DocSource::new("Acme.xml", DOCS)),
            )])
            .unwrap(),
        )
    }

    fn page(config: &RenderConfig) -> String {
        let root = preset(&EmissionContext::root(index()), config);
        root.select_types()
            .for_each(|ty| ty.write())
            .unwrap()
            .text()
    }

    #[test]
    fn type_page_has_title_declaration_and_remarks() {
        let out = page(&RenderConfig::default());
        assert!(out.contains("<a id=\"t-acme-widget\"></a>\n\n# Widget class\n\n"));
        assert!(out.contains("**Namespace:** `Acme`\\\n**Assembly:** `Acme`"));
        assert!(out.contains("```csharp\nclass Widget\n```"));
        assert!(out.contains("**Remarks**\n\nUse it like this:"));
        assert!(out.contains("```csharp\nvar w = new Widget();\nw.Spin(3);\n```"));
    }

    #[test]
    fn member_table_links_to_sections() {
        let out = page(&RenderConfig::default());
        assert!(out.contains("## Methods\n\n| Name | Description |\n| --- | --- |\n"));
        assert!(out.contains(
            "| [Spin(int times)](#m-acme-widget-spin-system-int32) | Spins the widget. |"
        ));
        assert!(out.contains("### Spin(int times)\n\n```csharp\ndouble Spin(int times)\n```"));
        assert!(out.contains("**Parameters**\n\n- `times`: How often.\n"));
        assert!(out.contains("**Returns**\n\nThe new angle."));
    }

    #[test]
    fn property_declaration_lists_accessors() {
        let out = page(&RenderConfig::default());
        assert!(out.contains("int Size { get; }"));
    }

    #[test]
    fn undocumented_members_are_dropped_when_configured() {
        let config = RenderConfig {
            include_undocumented: false,
            ..Default::default()
        };
        let out = page(&config);
        assert!(!out.contains("Properties"));
        assert!(out.contains("## Methods"));
    }

    #[test]
    fn tables_can_be_disabled() {
        let config = RenderConfig {
            member_tables: false,
            ..Default::default()
        };
        let out = page(&config);
        assert!(!out.contains("| Name | Description |"));
        assert!(out.contains("### Spin(int times)"));
    }

    #[test]
    fn assembly_index_links_known_types() {
        let root = preset(&EmissionContext::root(index()), &RenderConfig::default());
        root.define_link_target("T:Acme.Widget", "Acme.Widget.md").unwrap();
        let target = Arc::new(BufferTarget::new());
        let root = root.with_target(target.clone());

        root.select_assemblies()
            .for_each(|asm| Ok(asm.document("index", |c| c.render())?.end()))
            .unwrap();

        let index = target.get("index").unwrap();
        assert!(index.starts_with("# Acme assembly\n\n## Acme\n\n| Type | Description |"));
        assert!(index.contains("| [Widget](Acme.Widget.md) | A widget that spins. |"));
    }

    #[test]
    fn member_declarations() {
        let ty = TypeInfo {
            named: NamedType::new(Some("Acme"), "Widget"),
            kind: TypeKind::Class,
            generic_parameters: Vec::new(),
            members: Vec::new(),
        };
        let field = MemberInfo::new(MemberKind::Field, "Count")
            .with_return_type(TypeRef::named("System", "Int64"));
        assert_eq!(member_declaration(&ty, &field), "long Count");

        let event = MemberInfo::new(MemberKind::Event, "Changed")
            .with_return_type(TypeRef::named("System", "EventHandler"));
        assert_eq!(member_declaration(&ty, &event), "event EventHandler Changed");

        let ctor = MemberInfo::new(MemberKind::Constructor, ".ctor");
        assert_eq!(member_declaration(&ty, &ctor), "Widget()");
    }
}
