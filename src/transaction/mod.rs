//! Transactional scope provider.
//!
//! The dispatcher opens exactly one scope per message, hands it to the
//! handler through the [`Context`](crate::Context), and releases it with
//! `commit` when the handler succeeds or `rollback` when it fails.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Dispatcher                                               │
//! │   begin() ──► handler.handle(ctx{scope}) ──► commit()    │
//! │                        │ Err / panic                     │
//! │                        └───────────────────► rollback()  │
//! └──────────────────────────────────────────────────────────┘
//!          │                            │
//!          ▼                            ▼
//! ┌───────────────────┐      ┌──────────────────────────────┐
//! │ NoTransactions    │      │ InMemoryStore / StagedWrites │
//! │ (no side effects) │      │ (unit of work, included)     │
//! └───────────────────┘      └──────────────────────────────┘
//! ```

mod in_memory;

use thiserror::Error;

pub use in_memory::{InMemoryStore, StagedWrites, TransactionStats};

/// Error type for scope providers and transactional stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The underlying lock was poisoned.
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    /// A key changed between staging and commit.
    #[error("concurrent write detected for {key} (expected version {expected}, got {actual})")]
    Conflict {
        /// Conflicting key.
        key: String,
        /// Version observed when the write was staged.
        expected: u64,
        /// Version found at commit time.
        actual: u64,
    },

    /// A record could not be encoded or decoded.
    #[error("record {key} could not be serialized: {reason}")]
    Serialization {
        /// Record key.
        key: String,
        /// Underlying serializer message.
        reason: String,
    },

    /// The provider could not open, commit or undo a scope.
    #[error("transaction backend error: {0}")]
    Backend(String),
}

/// Provides one transactional scope per dispatch.
///
/// Scopes are independent: two dispatches never share one.
pub trait TransactionManager: Send + Sync {
    /// Per-dispatch unit of work handed to handlers.
    type Scope;

    /// Open a new scope.
    fn begin(&self) -> Result<Self::Scope, TransactionError>;

    /// Make the scope's side effects durable.
    fn commit(&self, scope: Self::Scope) -> Result<(), TransactionError>;

    /// Undo the scope's side effects.
    fn rollback(&self, scope: Self::Scope) -> Result<(), TransactionError>;
}

/// Scope provider for handler sets without transactional side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransactions;

impl TransactionManager for NoTransactions {
    type Scope = ();

    fn begin(&self) -> Result<(), TransactionError> {
        Ok(())
    }

    fn commit(&self, _scope: ()) -> Result<(), TransactionError> {
        Ok(())
    }

    fn rollback(&self, _scope: ()) -> Result<(), TransactionError> {
        Ok(())
    }
}

impl<T: TransactionManager + ?Sized> TransactionManager for std::sync::Arc<T> {
    type Scope = T::Scope;

    fn begin(&self) -> Result<Self::Scope, TransactionError> {
        (**self).begin()
    }

    fn commit(&self, scope: Self::Scope) -> Result<(), TransactionError> {
        (**self).commit(scope)
    }

    fn rollback(&self, scope: Self::Scope) -> Result<(), TransactionError> {
        (**self).rollback(scope)
    }
}
