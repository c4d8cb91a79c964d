//! Handler module - the contract every message-processing unit satisfies.
//!
//! Provides:
//! - [`MessageHandler`] - `handle(ctx)` for one type key
//! - [`Context`] - payload, metadata, scope and cancellation for one dispatch
//! - [`HandlerMetadata`] / [`HandlerEntry`] - discovered `(type key, handler)` pairs
//! - [`handler_fn`] - closure adapter
//!
//! # Example
//!
//! ```
//! use routed_rust::{handler_fn, Context, HandlingError, MessageHandler};
//!
//! struct ShipOrder;
//!
//! impl MessageHandler for ShipOrder {
//!     fn handle(&self, ctx: &Context<'_, ()>) -> Result<(), HandlingError> {
//!         let _text = ctx.payload_str().ok_or_else(|| {
//!             HandlingError::DecodeFailed("payload is not UTF-8".into())
//!         })?;
//!         Ok(())
//!     }
//! }
//!
//! let ping = handler_fn(|_ctx: &Context<'_, ()>| Ok(()));
//! # let _ = (ShipOrder, ping);
//! ```

mod cancel;
mod context;
mod metadata;

use std::marker::PhantomData;
use std::sync::Arc;

pub use cancel::CancellationToken;
pub use context::Context;
pub use metadata::{HandlerEntry, HandlerMetadata, MissingTypeKey};

use crate::error::HandlingError;

/// A unit of logic that processes message payloads for one type key.
///
/// `S` is the transactional scope handed out by the dispatcher's
/// [`TransactionManager`](crate::TransactionManager). Side effects made
/// through `ctx.scope()` commit only when `handle` returns `Ok`.
///
/// The same instance may be invoked from several dispatch threads at once;
/// implementations guard their own internal state.
pub trait MessageHandler<S = ()>: Send + Sync {
    /// Process one message.
    fn handle(&self, ctx: &Context<'_, S>) -> Result<(), HandlingError>;
}

/// Shared, type-erased handler as stored in the registry.
pub type HandlerRef<S = ()> = Arc<dyn MessageHandler<S>>;

impl<S, H> MessageHandler<S> for Arc<H>
where
    H: MessageHandler<S> + ?Sized,
{
    fn handle(&self, ctx: &Context<'_, S>) -> Result<(), HandlingError> {
        (**self).handle(ctx)
    }
}

/// Handler backed by a closure. Built with [`handler_fn`].
pub struct FnHandler<F, S> {
    f: F,
    _scope: PhantomData<fn(&S)>,
}

/// Turn a closure into a [`MessageHandler`].
pub fn handler_fn<S, F>(f: F) -> FnHandler<F, S>
where
    F: Fn(&Context<'_, S>) -> Result<(), HandlingError> + Send + Sync,
{
    FnHandler {
        f,
        _scope: PhantomData,
    }
}

impl<S, F> MessageHandler<S> for FnHandler<F, S>
where
    F: Fn(&Context<'_, S>) -> Result<(), HandlingError> + Send + Sync,
{
    fn handle(&self, ctx: &Context<'_, S>) -> Result<(), HandlingError> {
        (self.f)(ctx)
    }
}
