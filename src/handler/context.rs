//! Context passed to message handlers.
//!
//! Carries the inbound envelope, the transactional scope of the current
//! dispatch and the caller's cancellation signal. Handlers access
//! everything they need through the context.

use serde::de::DeserializeOwned;

use super::CancellationToken;
use crate::bus::Envelope;
use crate::error::HandlingError;

/// The context passed to every handler invocation.
///
/// Generic over `S`, the scope type of the dispatcher, so handlers can
/// stage side effects in whatever unit of work the dispatcher opened.
///
/// ## Example
///
/// ```ignore
/// fn handle(&self, ctx: &Context<'_, StagedWrites>) -> Result<(), HandlingError> {
///     let order = ctx.input::<ShipOrder>()?;
///     ctx.ensure_not_cancelled()?;
///     ctx.scope().put(&order.key(), &order)?;
///     Ok(())
/// }
/// ```
pub struct Context<'a, S> {
    envelope: &'a Envelope,
    scope: &'a S,
    cancellation: &'a CancellationToken,
}

impl<'a, S> Context<'a, S> {
    /// Create a new context.
    pub fn new(envelope: &'a Envelope, scope: &'a S, cancellation: &'a CancellationToken) -> Self {
        Self {
            envelope,
            scope,
            cancellation,
        }
    }

    /// Type key the message was routed by.
    pub fn type_key(&self) -> &str {
        &self.envelope.type_key
    }

    /// Transport-assigned message ID.
    pub fn message_id(&self) -> &str {
        &self.envelope.id
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.envelope.payload
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        self.envelope.payload_str()
    }

    /// Deserialize a JSON payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlingError> {
        serde_json::from_slice(&self.envelope.payload).map_err(HandlingError::from)
    }

    /// Decode a bitcode payload into a typed struct.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, HandlingError> {
        self.envelope.decode().map_err(HandlingError::from)
    }

    /// Look up a metadata header by key.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.envelope.metadata(key)
    }

    /// The whole envelope.
    pub fn envelope(&self) -> &Envelope {
        self.envelope
    }

    /// Transactional scope of this dispatch.
    pub fn scope(&self) -> &S {
        self.scope
    }

    /// Cancellation signal forwarded by the caller.
    pub fn cancellation(&self) -> &CancellationToken {
        self.cancellation
    }

    /// Whether the caller asked to cancel this dispatch.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Return `HandlingError::Cancelled` if cancellation was signalled.
    pub fn ensure_not_cancelled(&self) -> Result<(), HandlingError> {
        if self.is_cancelled() {
            Err(HandlingError::Cancelled)
        } else {
            Ok(())
        }
    }
}
