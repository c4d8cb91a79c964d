//! Handler metadata and discovered entries.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use super::HandlerRef;

/// A type key was absent or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("type key is missing or blank")]
pub struct MissingTypeKey;

/// Immutable metadata attached to a handler declaration.
///
/// Two values are equal iff their type keys are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMetadata {
    type_key: String,
}

impl HandlerMetadata {
    /// Build metadata for `type_key`.
    ///
    /// Empty and whitespace-only keys are rejected. Accepted keys are stored
    /// verbatim; lookups are exact and case-sensitive.
    pub fn new(type_key: impl Into<String>) -> Result<Self, MissingTypeKey> {
        let type_key = type_key.into();
        if type_key.trim().is_empty() {
            return Err(MissingTypeKey);
        }
        Ok(Self { type_key })
    }

    /// The routing key.
    pub fn type_key(&self) -> &str {
        &self.type_key
    }
}

impl Hash for HandlerMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_key.hash(state);
    }
}

impl fmt::Display for HandlerMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_key)
    }
}

/// A discovered pairing of metadata and handler.
pub struct HandlerEntry<S> {
    metadata: HandlerMetadata,
    handler: HandlerRef<S>,
}

impl<S> HandlerEntry<S> {
    /// Pair `handler` with `metadata`.
    pub fn new(metadata: HandlerMetadata, handler: HandlerRef<S>) -> Self {
        Self { metadata, handler }
    }

    /// The entry's metadata.
    pub fn metadata(&self) -> &HandlerMetadata {
        &self.metadata
    }

    /// Shortcut for `metadata().type_key()`.
    pub fn type_key(&self) -> &str {
        self.metadata.type_key()
    }

    /// The handler.
    pub fn handler(&self) -> &HandlerRef<S> {
        &self.handler
    }

    /// Split into parts.
    pub fn into_parts(self) -> (HandlerMetadata, HandlerRef<S>) {
        (self.metadata, self.handler)
    }
}

impl<S> Clone for HandlerEntry<S> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<S> fmt::Debug for HandlerEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("type_key", &self.metadata.type_key)
            .finish_non_exhaustive()
    }
}
