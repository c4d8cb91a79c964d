//! Runtime routing of inbound envelopes to their handlers.
//!
//! Each call walks one message through
//! `Received → Resolving → {Invoking → {Committed | RolledBack}} | Rejected`.
//! A dispatch owns exactly one transactional scope, and that scope is
//! released on every exit path, including a panicking handler.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, debug_span, trace, warn};

use crate::bus::Envelope;
use crate::error::{DispatchError, HandlingError};
use crate::handler::{CancellationToken, Context};
use crate::registry::Registry;
use crate::transaction::TransactionManager;

/// Per-dispatch lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchState {
    /// Envelope accepted by the dispatcher.
    Received,
    /// Looking up the handler for the type key.
    Resolving,
    /// Handler running inside its scope.
    Invoking,
    /// Handler succeeded and its scope committed.
    Committed,
    /// Handler failed and its scope was undone.
    RolledBack,
    /// No handler ran (lookup miss or no scope could be opened).
    Rejected,
}

impl DispatchState {
    /// Whether the dispatch has finished.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DispatchState::Committed | DispatchState::RolledBack | DispatchState::Rejected
        )
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Received => "received",
            DispatchState::Resolving => "resolving",
            DispatchState::Invoking => "invoking",
            DispatchState::Committed => "committed",
            DispatchState::RolledBack => "rolled_back",
            DispatchState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Routes envelopes through a frozen [`Registry`] inside per-message scopes.
///
/// Constructing a dispatcher is the moment a registry becomes visible to
/// dispatch callers. The dispatcher is `Sync` when its scope provider is,
/// so one instance behind an `Arc` serves any number of worker threads.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use routed_rust::{
///     build_registry, handler_fn, Component, ComponentRef, Context, Dispatcher,
///     Envelope, HandlerRef, NoTransactions, Registration,
/// };
///
/// struct Pings;
///
/// impl Component<()> for Pings {
///     fn registrations(self: Arc<Self>) -> Vec<Registration<()>> {
///         let handler: HandlerRef = Arc::new(handler_fn(|_ctx: &Context<'_, ()>| Ok(())));
///         vec![Registration::direct("ping", handler)]
///     }
/// }
///
/// let components: Vec<ComponentRef<()>> = vec![Arc::new(Pings)];
/// let registry = build_registry(components).unwrap();
/// let dispatcher = Dispatcher::new(registry, NoTransactions);
///
/// dispatcher.dispatch(&Envelope::with_string_payload("m-1", "ping", "")).unwrap();
/// assert!(dispatcher.dispatch(&Envelope::with_string_payload("m-2", "pong", "")).is_err());
/// ```
pub struct Dispatcher<T: TransactionManager> {
    registry: Registry<T::Scope>,
    transactions: T,
}

impl<T: TransactionManager> Dispatcher<T> {
    /// Publish `registry` for dispatch with `transactions` as scope provider.
    pub fn new(registry: Registry<T::Scope>, transactions: T) -> Self {
        debug!(handlers = registry.len(), "registry published");
        Self {
            registry,
            transactions,
        }
    }

    /// The routing table in use.
    pub fn registry(&self) -> &Registry<T::Scope> {
        &self.registry
    }

    /// The scope provider in use.
    pub fn transactions(&self) -> &T {
        &self.transactions
    }

    /// Dispatch one envelope with no cancellation signal.
    pub fn dispatch(&self, envelope: &Envelope) -> Result<(), DispatchError> {
        self.dispatch_with(envelope, &CancellationToken::new())
    }

    /// Dispatch one envelope, forwarding `cancellation` to the handler.
    ///
    /// The dispatcher never pre-empts a handler: a cancelled token only
    /// becomes an outcome if the handler observes it and returns
    /// [`HandlingError::Cancelled`].
    pub fn dispatch_with(
        &self,
        envelope: &Envelope,
        cancellation: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let type_key = envelope.type_key.as_str();
        let span = debug_span!("dispatch", type_key, message_id = %envelope.id);
        let _enter = span.enter();

        trace!(state = %DispatchState::Received);
        trace!(state = %DispatchState::Resolving);

        let Some(handler) = self.registry.get(type_key) else {
            debug!(state = %DispatchState::Rejected, "no handler for type key");
            return Err(DispatchError::NoHandlerForType(type_key.to_string()));
        };

        let scope = self.transactions.begin().map_err(|source| {
            warn!(state = %DispatchState::Rejected, error = %source, "could not begin scope");
            DispatchError::Begin {
                type_key: type_key.to_string(),
                source,
            }
        })?;

        trace!(state = %DispatchState::Invoking);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.handle(&Context::new(envelope, &scope, cancellation))
        }))
        .unwrap_or_else(|payload| Err(HandlingError::Panicked(panic_message(payload))));

        match outcome {
            Ok(()) => {
                self.transactions.commit(scope).map_err(|source| {
                    warn!(state = %DispatchState::RolledBack, error = %source, "commit failed");
                    DispatchError::Commit {
                        type_key: type_key.to_string(),
                        source,
                    }
                })?;
                debug!(state = %DispatchState::Committed);
                Ok(())
            }
            Err(source) => {
                if let Err(rollback) = self.transactions.rollback(scope) {
                    warn!(
                        state = %DispatchState::RolledBack,
                        error = %source,
                        rollback_error = %rollback,
                        "handler failed and rollback failed"
                    );
                    return Err(DispatchError::RollbackFailed {
                        type_key: type_key.to_string(),
                        source,
                        rollback,
                    });
                }
                debug!(state = %DispatchState::RolledBack, error = %source, "handler failed");
                Err(DispatchError::Handling {
                    type_key: type_key.to_string(),
                    source,
                })
            }
        }
    }
}

impl<T: TransactionManager + fmt::Debug> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("transactions", &self.transactions)
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "non-string panic payload".to_string(),
        },
    }
}
