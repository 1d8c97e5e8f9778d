//! Local and persistent configuration scopes.
//!
//! Every context carries a [`Scope`]: a copy-on-write [`LocalMap`] private to
//! its branch and a [`PersistentStore`] shared by every context derived from
//! the same root.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use apidoc_shared::{ApiDocError, Result};

type Value = Arc<dyn Any + Send + Sync>;

// ---------------------------------------------------------------------------
// Local scope
// ---------------------------------------------------------------------------

/// Type-keyed extension values for one branch.
///
/// Inserting clones only the map's spine; values are shared by reference.
#[derive(Clone, Default)]
pub struct LocalMap(Arc<HashMap<TypeId, Value>>);

impl LocalMap {
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|v| v.downcast::<T>().ok())
    }

    /// A new map with `value` shadowing any earlier value of the same type.
    pub fn with<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut map = (*self.0).clone();
        map.insert(TypeId::of::<T>(), Arc::new(value));
        Self(Arc::new(map))
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.0.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both maps are the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LocalMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMap").field("entries", &self.0.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// Persistent scope
// ---------------------------------------------------------------------------

/// Write-once string store shared across a whole traversal.
///
/// Readers never block each other. The first writer of a key wins; writing
/// the same value again is a no-op, writing a different one fails.
#[derive(Debug, Default)]
pub struct PersistentStore {
    values: RwLock<HashMap<String, Arc<str>>>,
}

impl PersistentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        self.values.read().get(key).cloned()
    }

    /// Define `key` once.
    pub fn set_once(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write();
        match values.get(key) {
            Some(existing) if existing.as_ref() == value => Ok(()),
            Some(existing) => Err(ApiDocError::DuplicateLinkTarget {
                name: key.to_string(),
                existing: existing.to_string(),
                attempted: value.to_string(),
            }),
            None => {
                debug!(key, value, "persistent key defined");
                values.insert(key.to_string(), Arc::from(value));
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// The two configuration layers threaded through every traversal call.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub local: LocalMap,
    pub persistent: Arc<PersistentStore>,
}

impl Scope {
    pub fn new(persistent: Arc<PersistentStore>) -> Self {
        Self {
            local: LocalMap::default(),
            persistent,
        }
    }

    pub fn with_local(&self, local: LocalMap) -> Self {
        Self {
            local,
            persistent: Arc::clone(&self.persistent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct Level(u8);

    #[test]
    fn local_insert_does_not_touch_the_original() {
        let base = LocalMap::default().with(Level(1));
        let child = base.with(Level(2));
        assert_eq!(*base.get::<Level>().unwrap(), Level(1));
        assert_eq!(*child.get::<Level>().unwrap(), Level(2));
        assert!(!base.ptr_eq(&child));
    }

    #[test]
    fn missing_local_value_is_none() {
        assert!(LocalMap::default().get::<Level>().is_none());
    }

    #[test]
    fn set_once_rejects_a_conflicting_value() {
        let store = PersistentStore::new();
        store.set_once("T:Acme.Widget", "Acme.Widget.md").unwrap();
        store.set_once("T:Acme.Widget", "Acme.Widget.md").unwrap();

        let err = store.set_once("T:Acme.Widget", "Other.md").unwrap_err();
        match err {
            ApiDocError::DuplicateLinkTarget {
                name,
                existing,
                attempted,
            } => {
                assert_eq!(name, "T:Acme.Widget");
                assert_eq!(existing, "Acme.Widget.md");
                assert_eq!(attempted, "Other.md");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.get("T:Acme.Widget").as_deref(), Some("Acme.Widget.md"));
    }

    #[test]
    fn first_writer_wins_across_threads() {
        let store = Arc::new(PersistentStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.set_once("key", &format!("v{i}")).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
