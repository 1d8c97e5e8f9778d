//! The abstract type/member graph supplied by the reflection collaborator.
//!
//! Everything here is plain data deserialized from the collaborator's JSON
//! output. Nested types are listed flat in [`AssemblyInfo::types`]; each one
//! carries its declaring-type chain in [`TypeInfo::declaring`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Assemblies and types
// ---------------------------------------------------------------------------

/// One assembly: the unit documentation entries are keyed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyInfo {
    /// Assembly identity (simple name, e.g. `Acme.Core`).
    pub name: String,
    /// Every type in the assembly, nested types included, in metadata order.
    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

/// Category of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

impl TypeKind {
    /// Lowercase keyword used in headings.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Delegate => "delegate",
        }
    }
}

/// A type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Name and declaring chain. `arguments` is always empty for a definition.
    #[serde(flatten)]
    pub named: NamedType,
    pub kind: TypeKind,
    /// Names of the type's own generic parameters, for display.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_parameters: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberInfo>,
}

impl TypeInfo {
    pub fn name(&self) -> &str {
        &self.named.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.named.root_namespace()
    }

    pub fn is_nested(&self) -> bool {
        self.named.declaring.is_some()
    }
}

// ---------------------------------------------------------------------------
// Type references
// ---------------------------------------------------------------------------

/// A named type, either a definition or a constructed generic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedType {
    /// Namespace of the outermost type. Ignored once `declaring` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Simple name without arity suffix (`List`, not ``List`1``).
    pub name: String,
    /// Enclosing type for nested types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring: Option<Box<NamedType>>,
    /// Number of generic parameters this segment declares itself.
    #[serde(default)]
    pub arity: usize,
    /// Type arguments when this is a constructed (closed) generic.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<TypeRef>,
}

impl NamedType {
    /// A non-generic, non-nested type.
    pub fn new(namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.into(),
            declaring: None,
            arity: 0,
            arguments: Vec::new(),
        }
    }

    /// Set the number of generic parameters.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    /// Nest this type inside `declaring`.
    pub fn nested_in(mut self, declaring: NamedType) -> Self {
        self.namespace = None;
        self.declaring = Some(Box::new(declaring));
        self
    }

    /// Close this generic over `arguments`.
    pub fn with_arguments(mut self, arguments: Vec<TypeRef>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Namespace of the outermost enclosing type.
    pub fn root_namespace(&self) -> Option<&str> {
        match &self.declaring {
            Some(outer) => outer.root_namespace(),
            None => self.namespace.as_deref().filter(|ns| !ns.is_empty()),
        }
    }
}

/// Who declared a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericOwner {
    Type,
    Method,
}

/// Any type that can appear in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Named(NamedType),
    GenericParameter {
        name: String,
        position: usize,
        owner: GenericOwner,
    },
    Array {
        element: Box<TypeRef>,
        #[serde(default = "default_rank")]
        rank: usize,
    },
    ByRef(Box<TypeRef>),
    Pointer(Box<TypeRef>),
}

fn default_rank() -> usize {
    1
}

impl TypeRef {
    /// Shorthand for a non-generic named type.
    pub fn named(namespace: &str, name: &str) -> Self {
        Self::Named(NamedType::new(Some(namespace), name))
    }

    /// Shorthand for a single-dimension array of `element`.
    pub fn array_of(element: TypeRef) -> Self {
        Self::Array {
            element: Box::new(element),
            rank: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Category of a member. Anything the collaborator emits outside the known
/// set deserializes to `Unknown`, which the identity resolver rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
    Event,
    #[serde(other)]
    Unknown,
}

impl MemberKind {
    /// Lowercase name used in diagnostics and headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Property => "property",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Event => "event",
            Self::Unknown => "unknown",
        }
    }
}

/// A single parameter of a callable member or accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A property accessor; only its parameter list participates in identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorInfo {
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
}

/// A member of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Metadata name (`.ctor`, `op_Addition`, `Item`, ...).
    pub name: String,
    pub kind: MemberKind,
    /// Declared parameters of methods and constructors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterInfo>,
    /// Names of a generic method's own type parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_parameters: Vec<String>,
    /// Return type of a method, or the value type of a field, property or event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<AccessorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<AccessorInfo>,
}

impl MemberInfo {
    /// A member with no parameters, accessors or types attached.
    pub fn new(kind: MemberKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: Vec::new(),
            generic_parameters: Vec::new(),
            return_type: None,
            getter: None,
            setter: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterInfo>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_return_type(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MemberKind::Constructor
            || (self.kind == MemberKind::Method && (self.name == ".ctor" || self.name == ".cctor"))
    }

    /// Parameters that participate in this member's identity and signature.
    ///
    /// Indexers take their list from the getter; a set-only indexer uses the
    /// setter's list without the trailing value parameter.
    pub fn signature_parameters(&self) -> &[ParameterInfo] {
        match self.kind {
            MemberKind::Property => {
                if let Some(getter) = &self.getter {
                    &getter.parameters
                } else if let Some(setter) = &self.setter {
                    let n = setter.parameters.len().saturating_sub(1);
                    &setter.parameters[..n]
                } else {
                    &[]
                }
            }
            _ => &self.parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_info_deserializes_flat_json() {
        let json = r#"{
            "namespace": "Acme",
            "name": "Inner",
            "declaring": { "namespace": "Acme", "name": "Outer", "arity": 1 },
            "kind": "class",
            "members": [
                { "name": "Count", "kind": "property", "return_type": { "named": { "namespace": "System", "name": "Int32" } }, "getter": {} }
            ]
        }"#;
        let ty: TypeInfo = serde_json::from_str(json).expect("parse type");
        assert!(ty.is_nested());
        assert_eq!(ty.namespace(), Some("Acme"));
        assert_eq!(ty.members[0].kind, MemberKind::Property);
    }

    #[test]
    fn unrecognized_member_kind_becomes_unknown() {
        let json = r#"{ "name": "Weird", "kind": "extension_block" }"#;
        let member: MemberInfo = serde_json::from_str(json).expect("parse member");
        assert_eq!(member.kind, MemberKind::Unknown);
    }

    #[test]
    fn set_only_indexer_drops_value_parameter() {
        let int = TypeRef::named("System", "Int32");
        let mut member = MemberInfo::new(MemberKind::Property, "Item");
        member.setter = Some(AccessorInfo {
            parameters: vec![
                ParameterInfo::new("index", int.clone()),
                ParameterInfo::new("value", TypeRef::named("System", "String")),
            ],
        });
        assert_eq!(member.signature_parameters(), &[ParameterInfo::new("index", int)]);
    }
}
