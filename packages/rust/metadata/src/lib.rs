//! Abstract metadata graph and documentation identity resolution.
//!
//! The reflection collaborator hands apidoc a graph of assemblies, types and
//! members ([`model`]). [`identity`] turns any node of that graph into the
//! [`MemberIdentity`] string its documentation is keyed under, and
//! [`display`] produces the C#-style names used in rendered headings.

pub mod display;
pub mod identity;
pub mod model;

pub use display::{display_signature, display_type, display_type_name};
pub use identity::{IdentityKind, MemberIdentity, member_identity, type_identity, type_ref_name};
pub use model::{
    AccessorInfo, AssemblyInfo, GenericOwner, MemberInfo, MemberKind, NamedType, ParameterInfo,
    TypeInfo, TypeKind, TypeRef,
};
