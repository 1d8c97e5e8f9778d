//! Documentation index for apidoc.
//!
//! Reads XML doc sources, normalizes each comment body, and keys the result
//! by (assembly, [`MemberIdentity`](apidoc_metadata::MemberIdentity)). The
//! index is built once and never mutated; a lookup for an undocumented member
//! yields an empty entry instead of an error.

pub mod document_index;
pub mod entry;
pub mod normalize;
pub mod source;

pub use document_index::{DocumentIndex, IndexStats, IndexedAssembly, IndexedType, SourcePair};
pub use entry::{DocElement, DocNode, DocumentationEntry};
pub use normalize::normalize_comment;
pub use source::{DocSource, SourceLocation};
