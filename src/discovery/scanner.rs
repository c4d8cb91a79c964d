//! Scanner - turns one component's declarations into handler entries.

use std::sync::Arc;

use tracing::{debug, trace};

use super::component::{Component, Registration};
use crate::error::DiscoveryError;
use crate::handler::{HandlerEntry, HandlerMetadata};

/// Produces [`HandlerEntry`] values from a component's registrations.
///
/// Both rules apply to the same component: a direct registration yields the
/// declared handler as is, and every factory registration is invoked exactly
/// once. The first failure aborts the scan of that component.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scanner;

impl Scanner {
    /// Create a scanner.
    pub fn new() -> Self {
        Self
    }

    /// Scan one component.
    pub fn scan<S, C>(&self, component: &Arc<C>) -> Result<Vec<HandlerEntry<S>>, DiscoveryError>
    where
        C: Component<S> + ?Sized,
    {
        let name = component.name().to_string();
        let registrations = Arc::clone(component).registrations();
        trace!(component = %name, declared = registrations.len(), "scanning component");

        let mut entries = Vec::with_capacity(registrations.len());
        for registration in registrations {
            entries.push(self.resolve(&name, registration)?);
        }
        Ok(entries)
    }

    fn resolve<S>(
        &self,
        component: &str,
        registration: Registration<S>,
    ) -> Result<HandlerEntry<S>, DiscoveryError> {
        match registration {
            Registration::Direct { type_key, handler } => {
                let metadata = metadata_for(component, type_key)?;
                debug!(component, type_key = %metadata, "component is a handler");
                Ok(HandlerEntry::new(metadata, handler))
            }
            Registration::Factory {
                type_key,
                method,
                factory,
            } => {
                let metadata = metadata_for(component, type_key)?;
                trace!(component, method, type_key = %metadata, "invoking handler factory");
                let handler = factory().map_err(|source| {
                    DiscoveryError::HandlerInvocationFailure {
                        component: component.to_string(),
                        method: method.to_string(),
                        type_key: metadata.type_key().to_string(),
                        source,
                    }
                })?;
                debug!(component, method, type_key = %metadata, "factory produced handler");
                Ok(HandlerEntry::new(metadata, handler))
            }
        }
    }
}

fn metadata_for(component: &str, type_key: String) -> Result<HandlerMetadata, DiscoveryError> {
    HandlerMetadata::new(type_key).map_err(|_| DiscoveryError::MissingTypeKey {
        component: component.to_string(),
    })
}
