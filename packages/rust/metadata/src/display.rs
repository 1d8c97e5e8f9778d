//! Human-readable, C#-style names for headings and tables.

use crate::model::{MemberInfo, MemberKind, NamedType, TypeInfo, TypeRef};

/// Keyword alias for well-known `System` types.
fn keyword(named: &NamedType) -> Option<&'static str> {
    if named.declaring.is_some() || named.namespace.as_deref() != Some("System") {
        return None;
    }
    Some(match named.name.as_str() {
        "Boolean" => "bool",
        "Byte" => "byte",
        "SByte" => "sbyte",
        "Char" => "char",
        "Int16" => "short",
        "UInt16" => "ushort",
        "Int32" => "int",
        "UInt32" => "uint",
        "Int64" => "long",
        "UInt64" => "ulong",
        "Single" => "float",
        "Double" => "double",
        "Decimal" => "decimal",
        "String" => "string",
        "Object" => "object",
        "Void" => "void",
        _ => return None,
    })
}

/// Display a type reference: `int`, `List<string>`, `Outer.Inner`, `int[,]`.
pub fn display_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(named) => display_named(named, &[]),
        TypeRef::GenericParameter { name, .. } => name.clone(),
        TypeRef::Array { element, rank } => {
            format!("{}[{}]", display_type(element), ",".repeat(rank.saturating_sub(1)))
        }
        TypeRef::ByRef(inner) => format!("ref {}", display_type(inner)),
        TypeRef::Pointer(inner) => format!("{}*", display_type(inner)),
    }
}

fn display_named(named: &NamedType, parameter_names: &[String]) -> String {
    if let Some(kw) = keyword(named) {
        return kw.to_string();
    }

    let mut out = String::new();
    if let Some(outer) = &named.declaring {
        out.push_str(&display_named(outer, &[]));
        out.push('.');
    }
    out.push_str(&named.name);

    if !named.arguments.is_empty() {
        let args: Vec<String> = named.arguments.iter().map(display_type).collect();
        out.push_str(&format!("<{}>", args.join(", ")));
    } else if named.arity > 0 {
        let names: Vec<String> = if parameter_names.len() == named.arity {
            parameter_names.to_vec()
        } else if named.arity == 1 {
            vec!["T".to_string()]
        } else {
            (1..=named.arity).map(|i| format!("T{i}")).collect()
        };
        out.push_str(&format!("<{}>", names.join(", ")));
    }
    out
}

/// Display name of a type definition, generic parameters included.
pub fn display_type_name(ty: &TypeInfo) -> String {
    display_named(&ty.named, &ty.generic_parameters)
}

/// Display a member's signature as it appears in headings: `Spin(int times)`,
/// `this[int index]`, `Widget(string name)` for constructors.
pub fn display_signature(declaring: &TypeInfo, member: &MemberInfo) -> String {
    let parameters = member
        .signature_parameters()
        .iter()
        .map(|p| format!("{} {}", display_type(&p.ty), p.name))
        .collect::<Vec<_>>()
        .join(", ");

    match member.kind {
        MemberKind::Property if member.name == "Item" && !member.signature_parameters().is_empty() => {
            format!("this[{parameters}]")
        }
        MemberKind::Method | MemberKind::Constructor => {
            let name = if member.is_constructor() {
                declaring.name().to_string()
            } else {
                operator_display(&member.name)
                    .unwrap_or(member.name.as_str())
                    .to_string()
            };
            let generics = if member.generic_parameters.is_empty() {
                String::new()
            } else {
                format!("<{}>", member.generic_parameters.join(", "))
            };
            format!("{name}{generics}({parameters})")
        }
        _ => member.name.clone(),
    }
}

/// `op_Addition` → `operator +`.
fn operator_display(name: &str) -> Option<&'static str> {
    Some(match name {
        "op_Addition" => "operator +",
        "op_Subtraction" => "operator -",
        "op_Multiply" => "operator *",
        "op_Division" => "operator /",
        "op_Modulus" => "operator %",
        "op_Equality" => "operator ==",
        "op_Inequality" => "operator !=",
        "op_LessThan" => "operator <",
        "op_GreaterThan" => "operator >",
        "op_LessThanOrEqual" => "operator <=",
        "op_GreaterThanOrEqual" => "operator >=",
        "op_UnaryNegation" => "operator -",
        "op_LogicalNot" => "operator !",
        "op_Implicit" => "implicit operator",
        "op_Explicit" => "explicit operator",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessorInfo, ParameterInfo, TypeKind};

    fn class(named: NamedType, params: &[&str]) -> TypeInfo {
        TypeInfo {
            named,
            kind: TypeKind::Class,
            generic_parameters: params.iter().map(|s| s.to_string()).collect(),
            members: Vec::new(),
        }
    }

    #[test]
    fn system_types_use_keywords() {
        assert_eq!(display_type(&TypeRef::named("System", "Int32")), "int");
        assert_eq!(
            display_type(&TypeRef::array_of(TypeRef::named("System", "String"))),
            "string[]"
        );
        assert_eq!(display_type(&TypeRef::named("Acme", "Int32")), "Int32");
    }

    #[test]
    fn generic_definitions_show_parameter_names() {
        let dict = class(
            NamedType::new(Some("System.Collections.Generic"), "Dictionary").with_arity(2),
            &["TKey", "TValue"],
        );
        assert_eq!(display_type_name(&dict), "Dictionary<TKey, TValue>");
    }

    #[test]
    fn constructor_and_indexer_signatures() {
        let widget = class(NamedType::new(Some("Acme"), "Widget"), &[]);
        let ctor = MemberInfo::new(MemberKind::Constructor, ".ctor").with_parameters(vec![
            ParameterInfo::new("name", TypeRef::named("System", "String")),
        ]);
        assert_eq!(display_signature(&widget, &ctor), "Widget(string name)");

        let mut item = MemberInfo::new(MemberKind::Property, "Item");
        item.getter = Some(AccessorInfo {
            parameters: vec![ParameterInfo::new("index", TypeRef::named("System", "Int32"))],
        });
        assert_eq!(display_signature(&widget, &item), "this[int index]");
    }

    #[test]
    fn operator_signature() {
        let money = class(NamedType::new(Some("Acme"), "Money"), &[]);
        let add = MemberInfo::new(MemberKind::Method, "op_Addition").with_parameters(vec![
            ParameterInfo::new("a", TypeRef::named("Acme", "Money")),
            ParameterInfo::new("b", TypeRef::named("Acme", "Money")),
        ]);
        assert_eq!(display_signature(&money, &add), "operator +(Money a, Money b)");
    }
}
