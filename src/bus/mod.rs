//! Message transport abstractions.
//!
//! This module provides the inbound [`Envelope`] and the point-to-point
//! traits a transport worker uses to pull messages and report outcomes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 transport::listen (workers)                 │
//! │  listen() ──► Dispatcher::dispatch_with() ──► ack() / nack()│
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Listener + Sender Traits                   │
//! │  Listener: listen(queue, timeout) / ack(id) / nack(id, why) │
//! │  Sender:   send(queue, envelope)                            │
//! └─────────────────────────────────────────────────────────────┘
//!          │                  │                     │
//!          ▼                  ▼                     ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────────────┐
//! │InMemoryQueue│    │ KafkaQueue  │    │ RedisStreamQueue    │
//! │ (included)  │    │ (external)  │    │    (external)       │
//! └─────────────┘    └─────────────┘    └─────────────────────┘
//! ```

mod envelope;
mod in_memory_queue;
mod listener;

pub use envelope::Envelope;
pub use in_memory_queue::InMemoryQueue;
pub use listener::{Listener, Sender, TransportError};
