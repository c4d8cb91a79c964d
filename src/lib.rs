//! routed_rust: discover message handlers at startup, route messages to
//! them at runtime.
//!
//! Startup runs in two explicit phases:
//!
//! 1. **Discovery**: [`build_registry`] scans fully constructed
//!    [`Component`]s, resolves each declared handler (invoking factory
//!    methods once) and freezes the result into a [`Registry`].
//! 2. **Dispatch**: a [`Dispatcher`] looks up each inbound [`Envelope`] by
//!    type key and runs its handler inside one transactional scope,
//!    committing on success and rolling back on failure.
//!
//! ```
//! use std::sync::Arc;
//! use routed_rust::{
//!     build_registry, component, ComponentRef, Context, Dispatcher, Envelope,
//!     HandlingError, MessageHandler, NoTransactions,
//! };
//!
//! struct ShipOrder;
//!
//! impl MessageHandler for ShipOrder {
//!     fn handle(&self, ctx: &Context<'_, ()>) -> Result<(), HandlingError> {
//!         let _order: serde_json::Value = ctx.input()?;
//!         Ok(())
//!     }
//! }
//!
//! #[component(handles = "ship-order")]
//! impl ShipOrder {}
//!
//! let components: Vec<ComponentRef<()>> = vec![Arc::new(ShipOrder)];
//! let registry = build_registry(components).unwrap();
//! let dispatcher = Dispatcher::new(registry, NoTransactions);
//!
//! dispatcher
//!     .dispatch(&Envelope::with_string_payload("m-1", "ship-order", "{}"))
//!     .unwrap();
//! ```

extern crate self as routed_rust;

pub mod bus;
mod config;
mod discovery;
mod dispatcher;
mod error;
mod handler;
mod registry;
mod transaction;

// Queue workers (requires "bus" feature)
#[cfg(feature = "bus")]
pub mod transport;

pub use bus::Envelope;
pub use config::{ConfigError, TransportConfig};
pub use discovery::{
    build_registry, Component, ComponentRef, HandlerFactory, Registration, RegistryBuilder,
    Scanner,
};
pub use dispatcher::{DispatchState, Dispatcher};
pub use error::{BoxError, DiscoveryError, DispatchError, HandlingError};
pub use handler::{
    handler_fn, CancellationToken, Context, FnHandler, HandlerEntry, HandlerMetadata,
    HandlerRef, MessageHandler, MissingTypeKey,
};
pub use registry::Registry;
pub use transaction::{
    InMemoryStore, NoTransactions, StagedWrites, TransactionError, TransactionManager,
    TransactionStats,
};

// Re-export the attribute macro that implements `Component`
pub use routed_rust_macros::component;
