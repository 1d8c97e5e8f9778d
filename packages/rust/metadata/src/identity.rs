//! Member identity resolution.
//!
//! Maps a type or member to the documentation-comment identifier its prose is
//! keyed under in the doc source: a one-letter kind tag, `:`, and the
//! dot-qualified name with generic, parameter and conversion suffixes. The
//! string format is the wire contract doc-source producers must follow.

use std::fmt;

use serde::{Deserialize, Serialize};

use apidoc_shared::{ApiDocError, Result};

use crate::model::{GenericOwner, MemberInfo, MemberKind, NamedType, TypeInfo, TypeRef};

/// Canonical documentation identifier of a type or member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberIdentity(String);

/// The one-letter tag an identity starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    Namespace,
    Type,
    Field,
    Property,
    Method,
    Event,
}

impl IdentityKind {
    pub fn tag(self) -> char {
        match self {
            Self::Namespace => 'N',
            Self::Type => 'T',
            Self::Field => 'F',
            Self::Property => 'P',
            Self::Method => 'M',
            Self::Event => 'E',
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        Some(match tag {
            'N' => Self::Namespace,
            'T' => Self::Type,
            'F' => Self::Field,
            'P' => Self::Property,
            'M' => Self::Method,
            'E' => Self::Event,
            _ => return None,
        })
    }
}

impl MemberIdentity {
    /// Wrap an identifier read from a doc source. No validation is performed:
    /// doc sources may carry tags (`N:`, `!:`) no metadata member produces.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    fn tagged(kind: IdentityKind, body: &str) -> Self {
        Self(format!("{}:{body}", kind.tag()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind tag, if the identifier starts with a recognized one.
    pub fn kind(&self) -> Option<IdentityKind> {
        let mut chars = self.0.chars();
        let tag = chars.next()?;
        if chars.next() != Some(':') {
            return None;
        }
        IdentityKind::from_tag(tag)
    }

    /// Identifier with the `X:` prefix removed.
    pub fn body(&self) -> &str {
        match self.0.split_once(':') {
            Some((tag, body)) if tag.len() == 1 => body,
            _ => &self.0,
        }
    }

    /// Short human-readable name for link text.
    ///
    /// `T:Acme.Widget`1` → `Widget`, `M:Acme.Widget.Spin(System.Int32)` →
    /// `Widget.Spin`, `M:Acme.Widget.#ctor` → `Widget`.
    pub fn display_name(&self) -> String {
        let body = self.body();
        let body = body.split(['(', '~']).next().unwrap_or(body);
        let segments = split_segments(body);
        let clean = |s: &str| -> String {
            let s = s.split(['`', '{']).next().unwrap_or(s);
            s.replace('#', ".")
        };

        match self.kind() {
            Some(IdentityKind::Type) | Some(IdentityKind::Namespace) | None => segments
                .last()
                .map(|s| clean(*s))
                .unwrap_or_default(),
            Some(_) => {
                let n = segments.len();
                if n < 2 {
                    return segments.first().map(|s| clean(*s)).unwrap_or_default();
                }
                let owner = clean(segments[n - 2]);
                let member = segments[n - 1];
                if member.starts_with("#ctor") || member.starts_with("#cctor") {
                    owner
                } else {
                    format!("{owner}.{}", clean(member))
                }
            }
        }
    }
}

impl fmt::Display for MemberIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MemberIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split a qualified name on `.` separators that are outside `{}` argument lists.
fn split_segments(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                segments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&body[start..]);
    segments
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Identity of a type definition.
pub fn type_identity(ty: &TypeInfo) -> MemberIdentity {
    let mut body = String::new();
    write_named(&ty.named, &mut body);
    MemberIdentity::tagged(IdentityKind::Type, &body)
}

/// Identity of a member declared on `declaring`.
pub fn member_identity(declaring: &TypeInfo, member: &MemberInfo) -> Result<MemberIdentity> {
    let kind = match member.kind {
        MemberKind::Field => IdentityKind::Field,
        MemberKind::Property => IdentityKind::Property,
        MemberKind::Method | MemberKind::Constructor => IdentityKind::Method,
        MemberKind::Event => IdentityKind::Event,
        MemberKind::Unknown => {
            let mut owner = String::new();
            write_named(&declaring.named, &mut owner);
            return Err(ApiDocError::UnsupportedMemberKind {
                member: format!("{owner}.{}", member.name),
                kind: member.kind.label().to_string(),
            });
        }
    };

    let mut body = String::new();
    write_named(&declaring.named, &mut body);
    body.push('.');
    body.push_str(&escape(&member.name));

    if kind == IdentityKind::Method && !member.generic_parameters.is_empty() {
        body.push_str("``");
        body.push_str(&member.generic_parameters.len().to_string());
    }

    if matches!(kind, IdentityKind::Method | IdentityKind::Property) {
        let parameters = member.signature_parameters();
        if !parameters.is_empty() {
            body.push('(');
            for (i, parameter) in parameters.iter().enumerate() {
                if i > 0 {
                    body.push(',');
                }
                write_type_ref(&parameter.ty, &mut body);
            }
            body.push(')');
        }
    }

    if is_conversion_operator(member) {
        if let Some(ret) = &member.return_type {
            body.push('~');
            write_type_ref(ret, &mut body);
        }
    }

    Ok(MemberIdentity::tagged(kind, &body))
}

/// Identity-format name of a type reference, without a kind tag.
pub fn type_ref_name(ty: &TypeRef) -> String {
    let mut out = String::new();
    write_type_ref(ty, &mut out);
    out
}

fn is_conversion_operator(member: &MemberInfo) -> bool {
    member.kind == MemberKind::Method && (member.name == "op_Implicit" || member.name == "op_Explicit")
}

/// Literal dots inside one name segment become `#` (`.ctor` → `#ctor`).
fn escape(segment: &str) -> String {
    segment.replace('.', "#")
}

fn write_named(named: &NamedType, out: &mut String) {
    match &named.declaring {
        Some(outer) => {
            write_named(outer, out);
            out.push('.');
        }
        None => {
            if let Some(ns) = named.namespace.as_deref().filter(|ns| !ns.is_empty()) {
                out.push_str(ns);
                out.push('.');
            }
        }
    }

    out.push_str(&escape(&named.name));

    if !named.arguments.is_empty() {
        out.push('{');
        for (i, argument) in named.arguments.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_type_ref(argument, out);
        }
        out.push('}');
    } else if named.arity > 0 {
        out.push('`');
        out.push_str(&named.arity.to_string());
    }
}

fn write_type_ref(ty: &TypeRef, out: &mut String) {
    match ty {
        TypeRef::Named(named) => write_named(named, out),
        TypeRef::GenericParameter {
            position, owner, ..
        } => {
            out.push_str(match owner {
                GenericOwner::Type => "`",
                GenericOwner::Method => "``",
            });
            out.push_str(&position.to_string());
        }
        TypeRef::Array { element, rank } => {
            write_type_ref(element, out);
            if *rank <= 1 {
                out.push_str("[]");
            } else {
                out.push('[');
                for i in 0..*rank {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str("0:");
                }
                out.push(']');
            }
        }
        TypeRef::ByRef(inner) => {
            write_type_ref(inner, out);
            out.push('@');
        }
        TypeRef::Pointer(inner) => {
            write_type_ref(inner, out);
            out.push('*');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessorInfo, ParameterInfo, TypeKind};
    use pretty_assertions::assert_eq;

    fn class(named: NamedType) -> TypeInfo {
        TypeInfo {
            named,
            kind: TypeKind::Class,
            generic_parameters: Vec::new(),
            members: Vec::new(),
        }
    }

    fn int32() -> TypeRef {
        TypeRef::named("System", "Int32")
    }

    fn string() -> TypeRef {
        TypeRef::named("System", "String")
    }

    #[test]
    fn plain_type_is_namespace_dot_name() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        assert_eq!(type_identity(&foo).as_str(), "T:NS.Foo");
    }

    #[test]
    fn type_in_global_namespace_has_no_prefix() {
        let foo = class(NamedType::new(None, "Foo"));
        assert_eq!(type_identity(&foo).as_str(), "T:Foo");
    }

    #[test]
    fn method_with_parameters() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let m = MemberInfo::new(MemberKind::Method, "M").with_parameters(vec![
            ParameterInfo::new("x", int32()),
            ParameterInfo::new("y", string()),
        ]);
        assert_eq!(
            member_identity(&foo, &m).unwrap().as_str(),
            "M:NS.Foo.M(System.Int32,System.String)"
        );
    }

    #[test]
    fn empty_parameter_list_omits_parentheses() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let m = MemberInfo::new(MemberKind::Method, "Reset");
        assert_eq!(member_identity(&foo, &m).unwrap().as_str(), "M:NS.Foo.Reset");
    }

    #[test]
    fn open_generic_definition_uses_arity() {
        let list = class(NamedType::new(Some("System.Collections.Generic"), "List").with_arity(1));
        assert_eq!(
            type_identity(&list).as_str(),
            "T:System.Collections.Generic.List`1"
        );
    }

    #[test]
    fn closed_generic_replaces_arity_with_arguments() {
        let open = NamedType::new(Some("NS"), "Pair").with_arity(2);
        let closed = TypeRef::Named(open.clone().with_arguments(vec![int32(), string()]));

        let open_id = type_identity(&class(open)).body().to_string();
        let expected = open_id.replace("`2", "{System.Int32,System.String}");
        assert_eq!(type_ref_name(&closed), expected);
        assert_eq!(expected, "NS.Pair{System.Int32,System.String}");
    }

    #[test]
    fn nested_generic_arguments_resolve_recursively() {
        let inner = TypeRef::Named(
            NamedType::new(Some("System.Collections.Generic"), "List")
                .with_arity(1)
                .with_arguments(vec![string()]),
        );
        let dict = TypeRef::Named(
            NamedType::new(Some("System.Collections.Generic"), "Dictionary")
                .with_arity(2)
                .with_arguments(vec![int32(), inner]),
        );
        assert_eq!(
            type_ref_name(&dict),
            "System.Collections.Generic.Dictionary{System.Int32,System.Collections.Generic.List{System.String}}"
        );
    }

    #[test]
    fn nested_type_uses_enclosing_type_prefix() {
        let outer = NamedType::new(Some("NS"), "Outer").with_arity(1);
        let inner = class(NamedType::new(Some("Ignored"), "Inner").nested_in(outer));
        assert_eq!(type_identity(&inner).as_str(), "T:NS.Outer`1.Inner");
    }

    #[test]
    fn constructor_name_is_escaped() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let ctor = MemberInfo::new(MemberKind::Constructor, ".ctor")
            .with_parameters(vec![ParameterInfo::new("seed", int32())]);
        assert_eq!(
            member_identity(&foo, &ctor).unwrap().as_str(),
            "M:NS.Foo.#ctor(System.Int32)"
        );
    }

    #[test]
    fn explicit_interface_member_escapes_dots() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let m = MemberInfo::new(MemberKind::Method, "System.IDisposable.Dispose");
        assert_eq!(
            member_identity(&foo, &m).unwrap().as_str(),
            "M:NS.Foo.System#IDisposable#Dispose"
        );
    }

    #[test]
    fn indexer_parameters_come_from_getter() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let mut item = MemberInfo::new(MemberKind::Property, "Item").with_return_type(string());
        item.getter = Some(AccessorInfo {
            parameters: vec![ParameterInfo::new("index", int32())],
        });
        assert_eq!(
            member_identity(&foo, &item).unwrap().as_str(),
            "P:NS.Foo.Item(System.Int32)"
        );
    }

    #[test]
    fn plain_property_has_no_parentheses() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let mut p = MemberInfo::new(MemberKind::Property, "Name").with_return_type(string());
        p.getter = Some(AccessorInfo::default());
        assert_eq!(member_identity(&foo, &p).unwrap().as_str(), "P:NS.Foo.Name");
    }

    #[test]
    fn field_and_event_tags() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let field = MemberInfo::new(MemberKind::Field, "count");
        let event = MemberInfo::new(MemberKind::Event, "Changed");
        assert_eq!(member_identity(&foo, &field).unwrap().as_str(), "F:NS.Foo.count");
        assert_eq!(member_identity(&foo, &event).unwrap().as_str(), "E:NS.Foo.Changed");
    }

    #[test]
    fn generic_method_and_generic_parameters() {
        let list = class(NamedType::new(Some("NS"), "Box").with_arity(1));
        let mut m = MemberInfo::new(MemberKind::Method, "Map").with_parameters(vec![
            ParameterInfo::new(
                "item",
                TypeRef::GenericParameter {
                    name: "T".into(),
                    position: 0,
                    owner: GenericOwner::Type,
                },
            ),
            ParameterInfo::new(
                "other",
                TypeRef::GenericParameter {
                    name: "U".into(),
                    position: 0,
                    owner: GenericOwner::Method,
                },
            ),
        ]);
        m.generic_parameters = vec!["U".into()];
        assert_eq!(
            member_identity(&list, &m).unwrap().as_str(),
            "M:NS.Box`1.Map``1(`0,``0)"
        );
    }

    #[test]
    fn arrays_refs_and_pointers() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let m = MemberInfo::new(MemberKind::Method, "Fill").with_parameters(vec![
            ParameterInfo::new("a", TypeRef::array_of(int32())),
            ParameterInfo::new(
                "b",
                TypeRef::Array {
                    element: Box::new(int32()),
                    rank: 2,
                },
            ),
            ParameterInfo::new("c", TypeRef::ByRef(Box::new(string()))),
            ParameterInfo::new("d", TypeRef::Pointer(Box::new(int32()))),
        ]);
        assert_eq!(
            member_identity(&foo, &m).unwrap().as_str(),
            "M:NS.Foo.Fill(System.Int32[],System.Int32[0:,0:],System.String@,System.Int32*)"
        );
    }

    #[test]
    fn operators_and_conversions() {
        let money = class(NamedType::new(Some("NS"), "Money"));
        let this = TypeRef::named("NS", "Money");
        let add = MemberInfo::new(MemberKind::Method, "op_Addition").with_parameters(vec![
            ParameterInfo::new("a", this.clone()),
            ParameterInfo::new("b", this.clone()),
        ]);
        let implicit = MemberInfo::new(MemberKind::Method, "op_Implicit")
            .with_parameters(vec![ParameterInfo::new("m", this)])
            .with_return_type(TypeRef::named("System", "Decimal"));

        assert_eq!(
            member_identity(&money, &add).unwrap().as_str(),
            "M:NS.Money.op_Addition(NS.Money,NS.Money)"
        );
        assert_eq!(
            member_identity(&money, &implicit).unwrap().as_str(),
            "M:NS.Money.op_Implicit(NS.Money)~System.Decimal"
        );
    }

    #[test]
    fn unknown_member_kind_is_rejected() {
        let foo = class(NamedType::new(Some("NS"), "Foo"));
        let m = MemberInfo::new(MemberKind::Unknown, "Weird");
        let err = member_identity(&foo, &m).unwrap_err();
        assert!(matches!(err, ApiDocError::UnsupportedMemberKind { .. }));
        assert!(err.to_string().contains("NS.Foo.Weird"));
    }

    #[test]
    fn identity_kind_and_display_name() {
        let id = MemberIdentity::from_raw("M:NS.Foo`1.Spin(System.Int32)");
        assert_eq!(id.kind(), Some(IdentityKind::Method));
        assert_eq!(id.display_name(), "Foo.Spin");

        assert_eq!(MemberIdentity::from_raw("T:NS.Outer.Inner").display_name(), "Inner");
        assert_eq!(MemberIdentity::from_raw("M:NS.Foo.#ctor").display_name(), "Foo");
        assert_eq!(
            MemberIdentity::from_raw("T:NS.Pair{System.Int32,System.String}").display_name(),
            "Pair"
        );
        assert_eq!(MemberIdentity::from_raw("!:broken").kind(), None);
    }
}
