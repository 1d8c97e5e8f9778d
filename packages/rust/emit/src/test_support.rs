use std::sync::Arc;

use apidoc_index::{DocSource, DocumentIndex, SourcePair};
use apidoc_metadata::{
    AssemblyInfo, GenericOwner, MemberInfo, MemberKind, NamedType, ParameterInfo, TypeInfo,
    TypeKind, TypeRef,
};

const DOCS: &str = r#"<?xml version="1.0"?>
<doc>
    <assembly><name>Acme</name></assembly>
    <members>
        <member name="T:Acme.Widget">
            <summary>
            A widget that spins.
            </summary>
        </member>
        <member name="M:Acme.Widget.#ctor(System.String)">
            <summary>Creates a widget.</summary>
            <param name="name">Display name.</param>
        </member>
        <member name="M:Acme.Widget.Spin(System.Int32)">
            <summary>Spins the widget; see <see cref="T:Acme.Gadget"/>.</summary>
            <param name="times">How often.</param>
        </member>
        <member name="T:Acme.Gadget">
            <summary>A gadget.</summary>
        </member>
    </members>
</doc>
"#;

/// Acme: `Widget` (ctor, `Spin`, undocumented `Size`), `Gadget` (struct),
/// and `Box<T>` with a generic `Map<U>(U)`.
pub(crate) fn sample_assembly() -> AssemblyInfo {
    let string = TypeRef::named("System", "String");
    let int = TypeRef::named("System", "Int32");

    let widget = TypeInfo {
        named: NamedType::new(Some("Acme"), "Widget"),
        kind: TypeKind::Class,
        generic_parameters: Vec::new(),
        members: vec![
            MemberInfo::new(MemberKind::Constructor, ".ctor")
                .with_parameters(vec![ParameterInfo::new("name", string)]),
            MemberInfo::new(MemberKind::Method, "Spin")
                .with_parameters(vec![ParameterInfo::new("times", int.clone())]),
            MemberInfo::new(MemberKind::Property, "Size").with_return_type(int),
        ],
    };

    let gadget = TypeInfo {
        named: NamedType::new(Some("Acme"), "Gadget"),
        kind: TypeKind::Struct,
        generic_parameters: Vec::new(),
        members: Vec::new(),
    };

    let mut map = MemberInfo::new(MemberKind::Method, "Map").with_parameters(vec![
        ParameterInfo::new(
            "value",
            TypeRef::GenericParameter {
                name: "U".into(),
                position: 0,
                owner: GenericOwner::Method,
            },
        ),
    ]);
    map.generic_parameters = vec!["U".into()];
    let boxed = TypeInfo {
        named: NamedType::new(Some("Acme"), "Box").with_arity(1),
        kind: TypeKind::Class,
        generic_parameters: vec!["T".into()],
        members: vec![map],
    };

    AssemblyInfo {
        name: "Acme".into(),
        types: vec![widget, gadget, boxed],
    }
}

pub(crate) fn sample_index() -> Arc<DocumentIndex> {
    let index = DocumentIndex::build(vec![SourcePair::new(
        sample_assembly(),
        Some(DocSource::new("Acme.xml", DOCS)),
    )])
    .unwrap();
    Arc::new(index)
}
