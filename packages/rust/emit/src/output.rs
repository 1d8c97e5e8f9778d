//! Output accumulator.
//!
//! An [`Output`] is a persistent, append-only list of text fragments. Pushing
//! returns a new list that shares every earlier fragment with the old one, so
//! contexts can fork and carry their own accumulator without copying text.

use std::fmt;
use std::sync::Arc;

/// One link of the list: either a single fragment or a whole spliced list.
struct Node {
    fragment: Option<Arc<str>>,
    spliced: Option<Arc<Node>>,
    prev: Option<Arc<Node>>,
}

impl Drop for Node {
    // Unlink iteratively so long chains do not overflow the stack.
    fn drop(&mut self) {
        let mut pending: Vec<Arc<Node>> =
            self.prev.take().into_iter().chain(self.spliced.take()).collect();
        while let Some(node) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(node) {
                pending.extend(node.prev.take());
                pending.extend(node.spliced.take());
            }
        }
    }
}

/// Ordered text fragments produced by a traversal.
#[derive(Clone, Default)]
pub struct Output {
    head: Option<Arc<Node>>,
    len: usize,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new accumulator with `fragment` appended. Empty fragments are dropped.
    pub fn push(&self, fragment: impl Into<Arc<str>>) -> Self {
        let fragment = fragment.into();
        if fragment.is_empty() {
            return self.clone();
        }
        Self {
            head: Some(Arc::new(Node {
                fragment: Some(fragment),
                spliced: None,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// A new accumulator with every fragment of `other` appended, in order.
    ///
    /// `other` is shared, not copied.
    pub fn append(&self, other: &Output) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        Self {
            head: Some(Arc::new(Node {
                fragment: None,
                spliced: other.head.clone(),
                prev: self.head.clone(),
            })),
            len: self.len + other.len,
        }
    }

    /// Fragments in emission order.
    pub fn fragments(&self) -> Vec<Arc<str>> {
        let mut out = Vec::with_capacity(self.len);
        // Walks newest to oldest; a spliced list is newer than everything
        // before its splice point.
        let mut stack: Vec<&Node> = self.head.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            if let Some(prev) = node.prev.as_deref() {
                stack.push(prev);
            }
            if let Some(spliced) = node.spliced.as_deref() {
                stack.push(spliced);
            }
            if let Some(fragment) = &node.fragment {
                out.push(Arc::clone(fragment));
            }
        }
        out.reverse();
        out
    }

    /// All fragments concatenated.
    pub fn text(&self) -> String {
        self.fragments().concat()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").field("fragments", &self.len).finish()
    }
}
