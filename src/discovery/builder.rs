//! Registry builder - folds discovered entries into the frozen registry.

use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::component::{Component, ComponentRef};
use super::scanner::Scanner;
use crate::error::DiscoveryError;
use crate::handler::{HandlerEntry, HandlerRef};
use crate::registry::Registry;

/// Collects candidate components and entries, then freezes them into a
/// [`Registry`].
///
/// Candidates are scanned in the order they were supplied. When two entries
/// share a type key the later one replaces the earlier one; the collision is
/// logged but never fails the build.
///
/// ## Example
///
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .component(ShipOrderHandler::new(store.clone()))
///     .component(Orders::new(store.clone()))
///     .build()?;
/// ```
pub struct RegistryBuilder<S> {
    candidates: Vec<ComponentRef<S>>,
    table: IndexMap<String, HandlerRef<S>>,
    overridden: usize,
    scanner: Scanner,
}

impl<S: 'static> RegistryBuilder<S> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            table: IndexMap::new(),
            overridden: 0,
            scanner: Scanner::new(),
        }
    }

    /// Queue a component for scanning.
    pub fn component<C>(self, component: C) -> Self
    where
        C: Component<S>,
    {
        self.component_ref(Arc::new(component))
    }

    /// Queue an already shared component for scanning.
    pub fn component_ref(mut self, component: ComponentRef<S>) -> Self {
        self.candidates.push(component);
        self
    }

    /// Queue several components, keeping their order.
    pub fn components<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = ComponentRef<S>>,
    {
        self.candidates.extend(components);
        self
    }

    /// Fold one entry into the table.
    ///
    /// Returns the handler the entry displaced, if any.
    pub fn insert(&mut self, entry: HandlerEntry<S>) -> Option<HandlerRef<S>> {
        let (metadata, handler) = entry.into_parts();
        match self.table.entry(metadata.type_key().to_string()) {
            Entry::Occupied(mut slot) => {
                warn!(
                    type_key = %metadata,
                    "handler registered twice for type key; keeping the later one"
                );
                self.overridden += 1;
                Some(slot.insert(handler))
            }
            Entry::Vacant(slot) => {
                debug!(type_key = %metadata, "handler added");
                slot.insert(handler);
                None
            }
        }
    }

    /// Scan every queued component in order and freeze the result.
    ///
    /// The first discovery error aborts the build; no registry is produced.
    pub fn build(mut self) -> Result<Registry<S>, DiscoveryError> {
        let candidates = std::mem::take(&mut self.candidates);
        for component in &candidates {
            for entry in self.scanner.scan(component)? {
                self.insert(entry);
            }
        }

        info!(
            handlers = self.table.len(),
            components = candidates.len(),
            overridden = self.overridden,
            "handler registry built"
        );
        Ok(Registry::from_table(self.table, self.overridden))
    }
}

impl<S: 'static> Default for RegistryBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Discovery phase in one call: scan `components` in order and return the
/// frozen registry.
pub fn build_registry<S, I>(components: I) -> Result<Registry<S>, DiscoveryError>
where
    S: 'static,
    I: IntoIterator<Item = ComponentRef<S>>,
{
    RegistryBuilder::new().components(components).build()
}
