//! Declared registration interface for components.

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::handler::HandlerRef;

/// Zero-argument handler factory, invoked once during discovery.
pub type HandlerFactory<S> = Box<dyn FnOnce() -> Result<HandlerRef<S>, BoxError> + Send>;

/// One `(type key, handler source)` pair declared by a component.
pub enum Registration<S> {
    /// The handler is already built (typically the component itself).
    Direct {
        /// Routing key.
        type_key: String,
        /// Ready handler.
        handler: HandlerRef<S>,
    },
    /// The handler is produced by a factory method.
    Factory {
        /// Routing key.
        type_key: String,
        /// Method name, used in diagnostics.
        method: &'static str,
        /// The factory.
        factory: HandlerFactory<S>,
    },
}

impl<S> Registration<S> {
    /// Declare a ready handler for `type_key`.
    pub fn direct(type_key: impl Into<String>, handler: HandlerRef<S>) -> Self {
        Registration::Direct {
            type_key: type_key.into(),
            handler,
        }
    }

    /// Declare a factory method that produces the handler for `type_key`.
    pub fn factory<F>(type_key: impl Into<String>, method: &'static str, factory: F) -> Self
    where
        F: FnOnce() -> Result<HandlerRef<S>, BoxError> + Send + 'static,
    {
        Registration::Factory {
            type_key: type_key.into(),
            method,
            factory: Box::new(factory),
        }
    }

    /// The declared routing key.
    pub fn type_key(&self) -> &str {
        match self {
            Registration::Direct { type_key, .. } | Registration::Factory { type_key, .. } => {
                type_key
            }
        }
    }
}

impl<S> fmt::Debug for Registration<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Direct { type_key, .. } => f
                .debug_struct("Direct")
                .field("type_key", type_key)
                .finish_non_exhaustive(),
            Registration::Factory {
                type_key, method, ..
            } => f
                .debug_struct("Factory")
                .field("type_key", type_key)
                .field("method", method)
                .finish_non_exhaustive(),
        }
    }
}

/// A candidate object that may supply handlers.
///
/// Components are fully constructed before they are handed to discovery.
/// They declare what they provide through [`registrations`](Component::registrations);
/// the scanner never inspects them any other way.
///
/// Usually generated by [`#[component]`](crate::component), but a manual
/// implementation is just as valid:
///
/// ```
/// use std::sync::Arc;
/// use routed_rust::{handler_fn, Component, Context, HandlerRef, Registration};
///
/// struct Pings;
///
/// impl Component<()> for Pings {
///     fn registrations(self: Arc<Self>) -> Vec<Registration<()>> {
///         vec![Registration::factory("ping", "ping_handler", || {
///             Ok(Arc::new(handler_fn(|_ctx: &Context<'_, ()>| Ok(()))) as HandlerRef)
///         })]
///     }
/// }
/// ```
pub trait Component<S>: Send + Sync + 'static {
    /// Every handler this component supplies, in declaration order.
    fn registrations(self: Arc<Self>) -> Vec<Registration<S>>;

    /// Name used in diagnostics and discovery errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared, type-erased component as supplied to discovery.
pub type ComponentRef<S> = Arc<dyn Component<S>>;
