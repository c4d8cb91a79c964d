//! Error types for discovery, dispatch and handler logic.
//!
//! Discovery errors are fatal: they abort startup before any registry is
//! published. Dispatch errors are scoped to the single message in flight.

use thiserror::Error;

use crate::transaction::TransactionError;

/// Boxed foreign error used for causes the crate does not model itself.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while scanning components and building the registry.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A registration was declared without a usable type key.
    #[error("component {component} declared a handler without a type key")]
    MissingTypeKey {
        /// Name of the component that declared the registration.
        component: String,
    },

    /// A factory method failed while producing its handler.
    #[error("factory {component}::{method} for type key {type_key:?} failed: {source}")]
    HandlerInvocationFailure {
        /// Name of the component owning the factory.
        component: String,
        /// Factory method name.
        method: String,
        /// Type key the factory was declared for.
        type_key: String,
        /// Original cause.
        #[source]
        source: BoxError,
    },
}

/// Failure reported by a handler while processing a payload.
#[derive(Debug, Error)]
pub enum HandlingError {
    /// Payload decode / deserialization failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// Business logic rejected the message.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A record the handler needed does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller cancelled the dispatch and the handler honoured it.
    #[error("cancelled")]
    Cancelled,

    /// The handler panicked; the payload message is kept when it is a string.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// A transactional store operation failed inside the handler.
    #[error("store error: {0}")]
    Store(#[from] TransactionError),

    /// Other error.
    #[error("handler error: {0}")]
    Other(#[source] BoxError),
}

impl HandlingError {
    /// Wrap any error as [`HandlingError::Other`].
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        HandlingError::Other(err.into())
    }
}

impl From<serde_json::Error> for HandlingError {
    fn from(err: serde_json::Error) -> Self {
        HandlingError::DecodeFailed(err.to_string())
    }
}

impl From<bitcode::Error> for HandlingError {
    fn from(err: bitcode::Error) -> Self {
        HandlingError::DecodeFailed(err.to_string())
    }
}

/// Outcome of a failed dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the envelope's type key.
    #[error("no handler registered for type key {0:?}")]
    NoHandlerForType(String),

    /// The handler failed; its scope was rolled back.
    #[error("handler for {type_key:?} failed: {source}")]
    Handling {
        /// Type key of the message.
        type_key: String,
        /// The handler's error, unchanged.
        #[source]
        source: HandlingError,
    },

    /// The handler failed and undoing its scope failed as well.
    #[error("handler for {type_key:?} failed ({source}) and rollback failed: {rollback}")]
    RollbackFailed {
        /// Type key of the message.
        type_key: String,
        /// The handler's error, unchanged.
        #[source]
        source: HandlingError,
        /// Error returned by the scope provider's rollback.
        rollback: TransactionError,
    },

    /// The scope provider could not open a scope; the handler did not run.
    #[error("could not begin transaction for {type_key:?}: {source}")]
    Begin {
        /// Type key of the message.
        type_key: String,
        /// Provider error.
        #[source]
        source: TransactionError,
    },

    /// The handler succeeded but its scope could not be committed.
    #[error("commit failed for {type_key:?}: {source}")]
    Commit {
        /// Type key of the message.
        type_key: String,
        /// Provider error.
        #[source]
        source: TransactionError,
    },
}

impl DispatchError {
    /// Type key of the message this error belongs to.
    pub fn type_key(&self) -> &str {
        match self {
            DispatchError::NoHandlerForType(key) => key,
            DispatchError::Handling { type_key, .. }
            | DispatchError::RollbackFailed { type_key, .. }
            | DispatchError::Begin { type_key, .. }
            | DispatchError::Commit { type_key, .. } => type_key,
        }
    }

    /// The handler's own error, when the failure came from `handle`.
    pub fn handling_error(&self) -> Option<&HandlingError> {
        match self {
            DispatchError::Handling { source, .. }
            | DispatchError::RollbackFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Terminal state the dispatch ended in.
    pub fn terminal_state(&self) -> crate::DispatchState {
        match self {
            DispatchError::NoHandlerForType(_) | DispatchError::Begin { .. } => {
                crate::DispatchState::Rejected
            }
            _ => crate::DispatchState::RolledBack,
        }
    }
}
