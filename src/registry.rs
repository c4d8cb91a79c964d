//! Frozen routing table from type key to handler.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::handler::HandlerRef;

/// Immutable mapping from type key to handler.
///
/// Built once by [`RegistryBuilder`](crate::RegistryBuilder) and never
/// modified afterwards. Cloning is cheap and every clone sees the same
/// table, so lookups need no locking.
pub struct Registry<S> {
    table: Arc<IndexMap<String, HandlerRef<S>>>,
    overridden: usize,
}

impl<S> Registry<S> {
    pub(crate) fn from_table(table: IndexMap<String, HandlerRef<S>>, overridden: usize) -> Self {
        Self {
            table: Arc::new(table),
            overridden,
        }
    }

    /// A registry with no handlers.
    pub fn empty() -> Self {
        Self::from_table(IndexMap::new(), 0)
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, type_key: &str) -> Option<&HandlerRef<S>> {
        self.table.get(type_key)
    }

    /// Whether a handler exists for `type_key`.
    pub fn contains(&self, type_key: &str) -> bool {
        self.table.contains_key(type_key)
    }

    /// Number of distinct type keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the registry holds no handlers.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Type keys in first-registration order.
    pub fn type_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.table.keys().map(String::as_str)
    }

    /// Read-only view of the whole table.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HandlerRef<S>)> + '_ {
        self.table.iter().map(|(key, handler)| (key.as_str(), handler))
    }

    /// How many registrations replaced an earlier one for the same key.
    pub fn overridden(&self) -> usize {
        self.overridden
    }
}

impl<S> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            overridden: self.overridden,
        }
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("type_keys", &self.table.keys().collect::<Vec<_>>())
            .field("overridden", &self.overridden)
            .finish()
    }
}
