//! Listener and sender traits for point-to-point messaging.

use thiserror::Error;

use super::Envelope;
use crate::error::BoxError;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the broker failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The broker rejected the operation
    #[error("rejected by transport: {0}")]
    Rejected(String),
    /// Timeout waiting for the broker
    #[error("transport timeout")]
    Timeout,
    /// Other error
    #[error("transport error: {0}")]
    Other(#[source] BoxError),
}

/// Trait for listening on a named queue (point-to-point).
///
/// Listeners on the same queue compete: each envelope is delivered to
/// exactly one of them. Acknowledgement and redelivery policy belong to the
/// implementation.
pub trait Listener: Send + Sync {
    /// Listen for the next envelope on a named queue, blocking until one
    /// is available or the timeout expires.
    fn listen(&self, queue: &str, timeout_ms: u64) -> Result<Option<Envelope>, TransportError>;

    /// Acknowledge that an envelope has been processed.
    fn ack(&self, envelope_id: &str) -> Result<(), TransportError>;

    /// Reject an envelope (redelivered or dead-lettered, per implementation).
    fn nack(&self, envelope_id: &str, reason: &str) -> Result<(), TransportError>;
}

/// Trait for sending envelopes to a named queue (point-to-point).
pub trait Sender: Send + Sync {
    /// Send an envelope to a named queue.
    fn send(&self, queue: &str, envelope: Envelope) -> Result<(), TransportError>;
}
