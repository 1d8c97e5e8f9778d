//! The document tree and its capability traits.
//!
//! Nodes are cheap handles into a shared [`DocumentIndex`]; they hold no
//! state of their own and can be re-created at any time. What a node can
//! produce is expressed by the capability traits it implements, so asking an
//! assembly for its doc entry, or a member for its types, does not compile.

use std::sync::Arc;

use apidoc_index::{DocElement, DocumentIndex, DocumentationEntry, IndexedAssembly};
use apidoc_metadata::{MemberIdentity, MemberInfo, MemberKind, TypeInfo, TypeKind};

use crate::writer::{self, Writer};

/// Which node family a value belongs to; drives default-writer dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Assembly,
    Type,
    Member,
    DocEntry,
    DocElement,
    Collection,
}

/// A node of the document tree.
pub trait DocumentNode: Clone + Send + Sync + 'static {
    fn kind(&self) -> NodeKind;

    /// Writer used when no override is installed in the local scope.
    fn default_writer() -> Writer<Self>;
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

pub trait AssemblyProvider {
    fn assemblies(&self) -> Collection<AssemblyNode>;
}

pub trait TypeProvider {
    fn types(&self) -> Collection<TypeNode>;

    fn classes(&self) -> Collection<TypeNode> {
        self.types().filter(|t| t.type_kind() == TypeKind::Class)
    }

    fn structs(&self) -> Collection<TypeNode> {
        self.types().filter(|t| t.type_kind() == TypeKind::Struct)
    }

    fn interfaces(&self) -> Collection<TypeNode> {
        self.types().filter(|t| t.type_kind() == TypeKind::Interface)
    }

    fn enums(&self) -> Collection<TypeNode> {
        self.types().filter(|t| t.type_kind() == TypeKind::Enum)
    }
}

pub trait MemberProvider {
    fn members(&self) -> Collection<MemberNode>;

    fn fields(&self) -> Collection<MemberNode> {
        self.members().filter(|m| m.info().kind == MemberKind::Field)
    }

    fn properties(&self) -> Collection<MemberNode> {
        self.members().filter(|m| m.info().kind == MemberKind::Property)
    }

    /// Callable members other than constructors.
    fn methods(&self) -> Collection<MemberNode> {
        self.members()
            .filter(|m| m.info().kind == MemberKind::Method && !m.info().is_constructor())
    }

    fn constructors(&self) -> Collection<MemberNode> {
        self.members().filter(|m| m.info().is_constructor())
    }

    fn events(&self) -> Collection<MemberNode> {
        self.members().filter(|m| m.info().kind == MemberKind::Event)
    }
}

pub trait DocEntryProvider {
    fn doc_entry(&self) -> Arc<DocumentationEntry>;
}

/// Sub-elements of a node's doc entry. Every [`DocEntryProvider`] has it.
pub trait DocElementProvider {
    fn doc_element(&self, name: &str) -> Option<DocElementNode>;
    fn doc_elements(&self) -> Collection<DocElementNode>;
}

impl<T: DocEntryProvider> DocElementProvider for T {
    fn doc_element(&self, name: &str) -> Option<DocElementNode> {
        let entry = self.doc_entry();
        entry
            .element(name)
            .map(|e| DocElementNode::new(e.clone(), entry.identity().clone()))
    }

    fn doc_elements(&self) -> Collection<DocElementNode> {
        let entry = self.doc_entry();
        entry
            .elements()
            .map(|e| DocElementNode::new(e.clone(), entry.identity().clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct RootNode {
    index: Arc<DocumentIndex>,
}

impl RootNode {
    pub fn new(index: Arc<DocumentIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }
}

impl DocumentNode for RootNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Root
    }

    fn default_writer() -> Writer<Self> {
        Writer::new(writer::write_root)
    }
}

impl AssemblyProvider for RootNode {
    fn assemblies(&self) -> Collection<AssemblyNode> {
        (0..self.index.assemblies().len())
            .map(|assembly| AssemblyNode {
                index: Arc::clone(&self.index),
                assembly,
            })
            .collect()
    }
}

impl TypeProvider for RootNode {
    fn types(&self) -> Collection<TypeNode> {
        self.assemblies().types()
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AssemblyNode {
    index: Arc<DocumentIndex>,
    assembly: usize,
}

impl AssemblyNode {
    pub fn indexed(&self) -> &IndexedAssembly {
        &self.index.assemblies()[self.assembly]
    }

    pub fn name(&self) -> &str {
        self.indexed().name()
    }
}

impl DocumentNode for AssemblyNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Assembly
    }

    fn default_writer() -> Writer<Self> {
        Writer::new(writer::write_assembly)
    }
}

impl TypeProvider for AssemblyNode {
    fn types(&self) -> Collection<TypeNode> {
        (0..self.indexed().types().len())
            .map(|ty| TypeNode {
                index: Arc::clone(&self.index),
                assembly: self.assembly,
                ty,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Type
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TypeNode {
    index: Arc<DocumentIndex>,
    assembly: usize,
    ty: usize,
}

impl TypeNode {
    fn indexed(&self) -> &IndexedAssembly {
        &self.index.assemblies()[self.assembly]
    }

    pub fn info(&self) -> &TypeInfo {
        &self.indexed().info().types[self.ty]
    }

    pub fn identity(&self) -> &MemberIdentity {
        &self.indexed().types()[self.ty].identity
    }

    pub fn assembly_name(&self) -> &str {
        self.indexed().name()
    }

    pub fn type_kind(&self) -> TypeKind {
        self.info().kind
    }
}

impl DocumentNode for TypeNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Type
    }

    fn default_writer() -> Writer<Self> {
        Writer::new(writer::write_type)
    }
}

impl MemberProvider for TypeNode {
    fn members(&self) -> Collection<MemberNode> {
        (0..self.info().members.len())
            .map(|member| MemberNode {
                index: Arc::clone(&self.index),
                assembly: self.assembly,
                ty: self.ty,
                member,
            })
            .collect()
    }
}

/// Types declared directly inside this one.
impl TypeProvider for TypeNode {
    fn types(&self) -> Collection<TypeNode> {
        let outer = &self.info().named;
        let assembly = self.indexed();
        (0..assembly.types().len())
            .filter(|&i| assembly.info().types[i].named.declaring.as_deref() == Some(outer))
            .map(|ty| TypeNode {
                index: Arc::clone(&self.index),
                assembly: self.assembly,
                ty,
            })
            .collect()
    }
}

impl DocEntryProvider for TypeNode {
    fn doc_entry(&self) -> Arc<DocumentationEntry> {
        self.index.lookup(self.assembly_name(), self.identity())
    }
}

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MemberNode {
    index: Arc<DocumentIndex>,
    assembly: usize,
    ty: usize,
    member: usize,
}

impl MemberNode {
    fn indexed(&self) -> &IndexedAssembly {
        &self.index.assemblies()[self.assembly]
    }

    pub fn declaring(&self) -> &TypeInfo {
        &self.indexed().info().types[self.ty]
    }

    pub fn info(&self) -> &MemberInfo {
        &self.declaring().members[self.member]
    }

    pub fn identity(&self) -> &MemberIdentity {
        &self.indexed().types()[self.ty].members[self.member]
    }

    pub fn declaring_identity(&self) -> &MemberIdentity {
        &self.indexed().types()[self.ty].identity
    }

    pub fn assembly_name(&self) -> &str {
        self.indexed().name()
    }
}

impl DocumentNode for MemberNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Member
    }

    fn default_writer() -> Writer<Self> {
        Writer::new(writer::write_member)
    }
}

impl DocEntryProvider for MemberNode {
    fn doc_entry(&self) -> Arc<DocumentationEntry> {
        self.index.lookup(self.assembly_name(), self.identity())
    }
}

// ---------------------------------------------------------------------------
// Doc entry and elements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DocEntryNode {
    entry: Arc<DocumentationEntry>,
}

impl DocEntryNode {
    pub fn new(entry: Arc<DocumentationEntry>) -> Self {
        Self { entry }
    }

    pub fn entry(&self) -> &DocumentationEntry {
        &self.entry
    }
}

impl DocumentNode for DocEntryNode {
    fn kind(&self) -> NodeKind {
        NodeKind::DocEntry
    }

    fn default_writer() -> Writer<Self> {
        Writer::new(writer::write_doc_entry)
    }
}

impl DocEntryProvider for DocEntryNode {
    fn doc_entry(&self) -> Arc<DocumentationEntry> {
        Arc::clone(&self.entry)
    }
}

/// One top-level element of a doc entry (`summary`, `param`, ...).
#[derive(Debug, Clone)]
pub struct DocElementNode {
    element: Arc<DocElement>,
    owner: MemberIdentity,
}

impl DocElementNode {
    pub fn new(element: DocElement, owner: MemberIdentity) -> Self {
        Self {
            element: Arc::new(element),
            owner,
        }
    }

    pub fn element(&self) -> &DocElement {
        &self.element
    }

    /// Identity of the entry this element belongs to.
    pub fn owner(&self) -> &MemberIdentity {
        &self.owner
    }
}

impl DocumentNode for DocElementNode {
    fn kind(&self) -> NodeKind {
        NodeKind::DocElement
    }

    fn default_writer() -> Writer<Self> {
        Writer::new(writer::write_doc_element)
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A homogeneous sequence of sibling nodes, in enumeration order.
#[derive(Clone)]
pub struct Collection<N>(Arc<[N]>);

impl<N: Clone> Collection<N> {
    pub fn new(items: Vec<N>) -> Self {
        Self(items.into())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn filter(&self, keep: impl Fn(&N) -> bool) -> Self {
        self.iter().filter(|n| keep(n)).cloned().collect()
    }
}

impl<N> FromIterator<N> for Collection<N> {
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<N: DocumentNode> DocumentNode for Collection<N> {
    fn kind(&self) -> NodeKind {
        NodeKind::Collection
    }

    fn default_writer() -> Writer<Self> {
        Writer::new(writer::write_collection::<N>)
    }
}

impl<N: AssemblyProvider + Clone> AssemblyProvider for Collection<N> {
    fn assemblies(&self) -> Collection<AssemblyNode> {
        self.iter().flat_map(|n| n.assemblies().iter().cloned().collect::<Vec<_>>()).collect()
    }
}

impl<N: TypeProvider + Clone> TypeProvider for Collection<N> {
    fn types(&self) -> Collection<TypeNode> {
        self.iter().flat_map(|n| n.types().iter().cloned().collect::<Vec<_>>()).collect()
    }
}

impl<N: MemberProvider + Clone> MemberProvider for Collection<N> {
    fn members(&self) -> Collection<MemberNode> {
        self.iter().flat_map(|n| n.members().iter().cloned().collect::<Vec<_>>()).collect()
    }
}
