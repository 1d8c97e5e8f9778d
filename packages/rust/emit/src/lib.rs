//! Context propagation and extension engine.
//!
//! A traversal starts from [`EmissionContext::root`] over a
//! [`DocumentIndex`](apidoc_index::DocumentIndex), descends the capability
//! typed document tree with `select_*`, fans out with `for_each`, and renders
//! with `write`. Formatters, filters, targets and writer overrides live in
//! the branch-local scope; link targets live in the persistent store shared
//! by the whole traversal.

pub mod context;
pub mod extension;
pub mod node;
pub mod output;
pub mod scope;
pub mod writer;

#[cfg(test)]
mod test_support;

pub use context::{EmissionContext, Emitted, Parent};
pub use extension::{
    ActiveFormatter, ActiveTarget, BufferTarget, Filter, Formatter, HeadingLevel, PlainFormatter,
    RenderOptions, Target,
};
pub use node::{
    AssemblyNode, AssemblyProvider, Collection, DocElementNode, DocElementProvider, DocEntryNode,
    DocEntryProvider, DocumentNode, MemberNode, MemberProvider, NodeKind, RootNode, TypeNode,
    TypeProvider,
};
pub use output::Output;
pub use scope::{LocalMap, PersistentStore, Scope};
pub use writer::{DocRenderer, Writer, anchor_id, type_title};
