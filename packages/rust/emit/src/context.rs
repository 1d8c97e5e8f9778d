//! The immutable emission context.
//!
//! An [`EmissionContext`] binds a document node to its parent context, the
//! configuration [`Scope`] and the output accumulated so far. Every operation
//! takes `&self` and returns a new context; nothing is mutated in place, so a
//! caller's context is never affected by what a nested block does with its
//! own copy.
//!
//! The parent is typed: selecting child types from an assembly context gives
//! an `EmissionContext<Collection<TypeNode>, EmissionContext<AssemblyNode, _>>`,
//! and [`EmissionContext::write`] hands back exactly that parent.

use std::any::Any;
use std::sync::Arc;

use tracing::{debug, trace};

use apidoc_index::DocumentIndex;
use apidoc_shared::{ApiDocError, RenderConfig, Result};

use crate::extension::{
    ActiveFormatter, ActiveTarget, Filter, Formatter, HeadingLevel, PlainFormatter, RenderOptions,
    Target,
};
use crate::node::{
    AssemblyNode, AssemblyProvider, Collection, DocElementNode, DocElementProvider, DocEntryNode,
    DocEntryProvider, DocumentNode, MemberNode, MemberProvider, RootNode, TypeNode, TypeProvider,
};
use crate::output::Output;
use crate::scope::{LocalMap, PersistentStore, Scope};
use crate::writer::Writer;

const LINK_PREFIX: &str = "link:";

// ---------------------------------------------------------------------------
// Parent link
// ---------------------------------------------------------------------------

/// Anything a context can return control to.
pub trait Parent: Clone + Send + Sync + 'static {
    fn output(&self) -> &Output;
    /// The same parent carrying `output` instead of its own.
    fn with_output(&self, output: Output) -> Self;
}

/// Terminal parent of a root context: the finished output.
#[derive(Debug, Clone, Default)]
pub struct Emitted {
    output: Output,
}

impl Emitted {
    pub fn text(&self) -> String {
        self.output.text()
    }

    pub fn fragments(&self) -> Vec<Arc<str>> {
        self.output.fragments()
    }
}

impl Parent for Emitted {
    fn output(&self) -> &Output {
        &self.output
    }

    fn with_output(&self, output: Output) -> Self {
        Self { output }
    }
}

// ---------------------------------------------------------------------------
// EmissionContext
// ---------------------------------------------------------------------------

/// The unit of traversal and configuration.
pub struct EmissionContext<N, P = Emitted> {
    node: N,
    parent: Arc<P>,
    scope: Scope,
    output: Output,
}

impl<N: Clone, P> Clone for EmissionContext<N, P> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            parent: Arc::clone(&self.parent),
            scope: self.scope.clone(),
            output: self.output.clone(),
        }
    }
}

impl<N: DocumentNode, P: Parent> Parent for EmissionContext<N, P> {
    fn output(&self) -> &Output {
        &self.output
    }

    fn with_output(&self, output: Output) -> Self {
        EmissionContext::with_output(self, output)
    }
}

impl EmissionContext<RootNode> {
    /// Root context over `index` with a fresh persistent store.
    pub fn root(index: Arc<DocumentIndex>) -> Self {
        Self::root_with_store(index, Arc::new(PersistentStore::new()))
    }

    /// Root context sharing an existing persistent store.
    pub fn root_with_store(index: Arc<DocumentIndex>, store: Arc<PersistentStore>) -> Self {
        Self {
            node: RootNode::new(index),
            parent: Arc::new(Emitted::default()),
            scope: Scope::new(store),
            output: Output::new(),
        }
    }
}

impl<N: DocumentNode, P: Parent> EmissionContext<N, P> {
    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn parent(&self) -> &P {
        &self.parent
    }

    /// Local and persistent bindings of this branch.
    pub fn bindings(&self) -> &Scope {
        &self.scope
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Everything emitted so far on this branch, including what it inherited.
    pub fn text(&self) -> String {
        self.output.text()
    }

    fn with_output(&self, output: Output) -> Self {
        Self {
            node: self.node.clone(),
            parent: Arc::clone(&self.parent),
            scope: self.scope.clone(),
            output,
        }
    }

    fn with_local(&self, local: LocalMap) -> Self {
        Self {
            node: self.node.clone(),
            parent: Arc::clone(&self.parent),
            scope: self.scope.with_local(local),
            output: self.output.clone(),
        }
    }

    // -- traversal ----------------------------------------------------------

    /// Descend to a node derived from the current one. The new context's
    /// parent is `self`; scope and output carry over.
    pub fn select<M, F>(&self, derive: F) -> EmissionContext<M, Self>
    where
        M: DocumentNode,
        F: FnOnce(&N) -> M,
    {
        EmissionContext {
            node: derive(&self.node),
            parent: Arc::new(self.clone()),
            scope: self.scope.clone(),
            output: self.output.clone(),
        }
    }

    /// Rebind the current branch to another node of the same type.
    pub fn replace(&self, node: N) -> Self {
        Self {
            node,
            parent: Arc::clone(&self.parent),
            scope: self.scope.clone(),
            output: self.output.clone(),
        }
    }

    /// Return to the parent, carrying this branch's output upward.
    pub fn end(&self) -> P {
        self.parent.with_output(self.output.clone())
    }

    /// Append a text fragment.
    pub fn emit(&self, text: impl Into<Arc<str>>) -> Self {
        self.with_output(self.output.push(text))
    }

    /// Run the writer for the current node in place and stay on this context.
    pub fn render(&self) -> Result<Self> {
        let written = self.run_writer()?;
        Ok(self.with_output(self.output.append(&written)))
    }

    /// Run the writer for the current node and return the parent with the
    /// written output appended after everything already emitted.
    pub fn write(&self) -> Result<P> {
        let written = self.run_writer()?;
        Ok(self.parent.with_output(self.output.append(&written)))
    }

    fn run_writer(&self) -> Result<Output> {
        let writer = self.writer();
        let detached = EmissionContext {
            node: self.node.clone(),
            parent: Arc::new(Emitted::default()),
            scope: self.scope.clone(),
            output: Output::new(),
        };
        trace!(kind = ?self.node.kind(), "running writer");
        let written = writer.call(&detached)?;
        Ok(written.output)
    }

    /// Writer for the current node: a local override if present, else the
    /// node type's default.
    pub fn writer(&self) -> Writer<N> {
        self.scope
            .local
            .get::<Writer<N>>()
            .map(|w| (*w).clone())
            .unwrap_or_else(N::default_writer)
    }

    /// Override the writer for node type `M` on this branch.
    pub fn with_writer<M: DocumentNode>(&self, writer: Writer<M>) -> Self {
        self.using(writer)
    }

    // -- scoping ------------------------------------------------------------

    /// Run `action`, keep its output, and drop every other change it made.
    ///
    /// The caller's own context is borrowed, not consumed, so it is unchanged
    /// whether `action` succeeds or fails.
    pub fn scope<F>(&self, action: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> Result<Self>,
    {
        let result = action(self)?;
        Ok(self.with_output(result.output))
    }

    /// Run `action` against an empty accumulator and append its text after
    /// passing it through `filter`.
    pub fn with_filter<F>(&self, filter: &dyn Filter, action: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> Result<Self>,
    {
        let inner = self.with_output(Output::new());
        let produced = action(&inner)?;
        let filtered = filter.apply(&produced.output.text());
        Ok(self.emit(filtered))
    }

    /// Run `action` as the named document.
    ///
    /// With a target installed the produced fragments go to the target and
    /// this context's output is left as it was. Without one they pass
    /// through into the current accumulator.
    pub fn document<F>(&self, name: &str, action: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> Result<Self>,
    {
        let Some(target) = self.scope.local.get::<ActiveTarget>() else {
            return self.scope(action);
        };
        let inner = self.with_output(Output::new());
        let produced = action(&inner)?;
        let fragments = produced.output.fragments();
        debug!(document = name, fragments = fragments.len(), "document emitted");
        target.0.accept(name, &fragments)?;
        Ok(self.clone())
    }

    // -- extensions ---------------------------------------------------------

    /// Shadow the local value of type `E` on this branch.
    pub fn using<E: Any + Send + Sync>(&self, extension: E) -> Self {
        self.with_local(self.scope.local.with(extension))
    }

    pub fn extension<E: Any + Send + Sync>(&self) -> Option<Arc<E>> {
        self.scope.local.get::<E>()
    }

    pub fn with_formatter(&self, formatter: impl Formatter + 'static) -> Self {
        self.using(ActiveFormatter(Arc::new(formatter)))
    }

    /// Active formatter, [`PlainFormatter`] when none is installed.
    pub fn formatter(&self) -> Arc<dyn Formatter> {
        self.extension::<ActiveFormatter>()
            .map(|f| Arc::clone(&f.0))
            .unwrap_or_else(|| Arc::new(PlainFormatter))
    }

    pub fn with_target(&self, target: Arc<dyn Target>) -> Self {
        self.using(ActiveTarget(target))
    }

    pub fn with_render_config(&self, config: RenderConfig) -> Self {
        self.using(RenderOptions(config))
    }

    pub fn render_config(&self) -> Arc<RenderOptions> {
        self.extension::<RenderOptions>()
            .unwrap_or_else(|| Arc::new(RenderOptions::default()))
    }

    pub fn heading_level(&self) -> u8 {
        self.extension::<HeadingLevel>()
            .map(|h| h.0)
            .unwrap_or(HeadingLevel::default().0)
    }

    pub fn with_heading_level(&self, level: u8) -> Self {
        self.using(HeadingLevel(level.clamp(1, 6)))
    }

    /// One heading level deeper.
    pub fn nested(&self) -> Self {
        self.with_heading_level(self.heading_level().saturating_add(1))
    }

    /// Emit a heading at the current level.
    pub fn heading(&self, text: &str) -> Self {
        self.emit(self.formatter().heading(self.heading_level(), text))
    }

    // -- persistent scope ---------------------------------------------------

    /// Define a cross-document link target. Visible to every context derived
    /// from the same root; redefining with a different target fails.
    pub fn define_link_target(&self, name: &str, target: &str) -> Result<()> {
        self.scope
            .persistent
            .set_once(&format!("{LINK_PREFIX}{name}"), target)
            .map_err(|e| match e {
                ApiDocError::DuplicateLinkTarget {
                    existing,
                    attempted,
                    ..
                } => ApiDocError::DuplicateLinkTarget {
                    name: name.to_string(),
                    existing,
                    attempted,
                },
                other => other,
            })
    }

    pub fn link_target(&self, name: &str) -> Option<Arc<str>> {
        self.scope.persistent.get(&format!("{LINK_PREFIX}{name}"))
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

impl<N: DocumentNode, P: Parent> EmissionContext<Collection<N>, P> {
    /// Run `action` once per element, in order, staying on the collection.
    ///
    /// Each element context has this collection context as its parent, with
    /// the original local scope and the output accumulated so far. Elements
    /// are siblings: nothing one iteration puts in its local scope is seen
    /// by the next.
    pub fn each<F>(&self, mut action: F) -> Result<Self>
    where
        F: FnMut(EmissionContext<N, Self>) -> Result<Self>,
    {
        let mut output = self.output.clone();
        for node in self.node.iter() {
            let current = self.with_output(output);
            let element = current.select(|_| node.clone());
            output = action(element)?.output;
        }
        Ok(self.with_output(output))
    }

    /// [`each`](Self::each), then return to the collection's parent.
    pub fn for_each<F>(&self, action: F) -> Result<P>
    where
        F: FnMut(EmissionContext<N, Self>) -> Result<Self>,
    {
        Ok(self.each(action)?.end())
    }
}

// ---------------------------------------------------------------------------
// Capability-bound selects
// ---------------------------------------------------------------------------

impl<N: DocumentNode + AssemblyProvider, P: Parent> EmissionContext<N, P> {
    pub fn select_assemblies(&self) -> EmissionContext<Collection<AssemblyNode>, Self> {
        self.select(AssemblyProvider::assemblies)
    }
}

impl<N: DocumentNode + TypeProvider, P: Parent> EmissionContext<N, P> {
    pub fn select_types(&self) -> EmissionContext<Collection<TypeNode>, Self> {
        self.select(TypeProvider::types)
    }

    pub fn select_classes(&self) -> EmissionContext<Collection<TypeNode>, Self> {
        self.select(TypeProvider::classes)
    }

    pub fn select_structs(&self) -> EmissionContext<Collection<TypeNode>, Self> {
        self.select(TypeProvider::structs)
    }

    pub fn select_interfaces(&self) -> EmissionContext<Collection<TypeNode>, Self> {
        self.select(TypeProvider::interfaces)
    }

    pub fn select_enums(&self) -> EmissionContext<Collection<TypeNode>, Self> {
        self.select(TypeProvider::enums)
    }
}

impl<N: DocumentNode + MemberProvider, P: Parent> EmissionContext<N, P> {
    pub fn select_members(&self) -> EmissionContext<Collection<MemberNode>, Self> {
        self.select(MemberProvider::members)
    }

    pub fn select_fields(&self) -> EmissionContext<Collection<MemberNode>, Self> {
        self.select(MemberProvider::fields)
    }

    pub fn select_properties(&self) -> EmissionContext<Collection<MemberNode>, Self> {
        self.select(MemberProvider::properties)
    }

    pub fn select_methods(&self) -> EmissionContext<Collection<MemberNode>, Self> {
        self.select(MemberProvider::methods)
    }

    pub fn select_constructors(&self) -> EmissionContext<Collection<MemberNode>, Self> {
        self.select(MemberProvider::constructors)
    }

    pub fn select_events(&self) -> EmissionContext<Collection<MemberNode>, Self> {
        self.select(MemberProvider::events)
    }
}

impl<N: DocumentNode + DocEntryProvider, P: Parent> EmissionContext<N, P> {
    pub fn select_doc_entry(&self) -> EmissionContext<DocEntryNode, Self> {
        self.select(|n| DocEntryNode::new(n.doc_entry()))
    }
}

impl<N: DocumentNode + DocElementProvider, P: Parent> EmissionContext<N, P> {
    /// The first top-level doc element called `name`, if the entry has one.
    pub fn select_doc_element(&self, name: &str) -> Option<EmissionContext<DocElementNode, Self>> {
        let element = self.node.doc_element(name)?;
        Some(self.select(|_| element))
    }

    pub fn select_doc_elements(&self) -> EmissionContext<Collection<DocElementNode>, Self> {
        self.select(DocElementProvider::doc_elements)
    }
}
