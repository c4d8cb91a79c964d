//! In-memory queue for testing and single-process scenarios.
//!
//! This module provides a thread-safe in-memory queue that implements
//! both `Sender` and `Listener`, useful for:
//! - Unit and integration testing without a broker
//! - Single-process applications
//! - Development and prototyping

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::{Envelope, Listener, Sender, TransportError};

#[derive(Default)]
struct Shared {
    queues: Mutex<HashMap<String, VecDeque<Envelope>>>,
    available: Condvar,
    acked: Mutex<Vec<String>>,
    nacked: Mutex<Vec<(String, String)>>,
}

/// In-memory named queues with competing consumers.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - Each envelope is handed to exactly one listener
/// - Listeners block on a condition variable until an envelope arrives
/// - Acks and nacks are recorded; nacked envelopes are not redelivered
///
/// ## Example
///
/// ```
/// use routed_rust::bus::{Envelope, InMemoryQueue, Listener, Sender};
///
/// let queue = InMemoryQueue::new();
/// queue.send("orders", Envelope::with_string_payload("m-1", "ship-order", "{}")).unwrap();
///
/// let envelope = queue.listen("orders", 100).unwrap().unwrap();
/// assert_eq!(envelope.type_key, "ship-order");
/// queue.ack(&envelope.id).unwrap();
/// assert_eq!(queue.acknowledged(), vec!["m-1".to_string()]);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    shared: Arc<Shared>,
}

impl InMemoryQueue {
    /// Create a new in-memory queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of envelopes waiting on `queue`.
    pub fn pending(&self, queue: &str) -> usize {
        self.shared
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    /// Acknowledged envelope IDs, in acknowledgement order.
    pub fn acknowledged(&self) -> Vec<String> {
        self.shared
            .acked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rejected envelope IDs with their reasons, in rejection order.
    pub fn rejected(&self) -> Vec<(String, String)> {
        self.shared
            .nacked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sender for InMemoryQueue {
    fn send(&self, queue: &str, envelope: Envelope) -> Result<(), TransportError> {
        let mut queues = self
            .shared
            .queues
            .lock()
            .map_err(|_| TransportError::Rejected("queue lock poisoned".into()))?;
        queues.entry(queue.to_string()).or_default().push_back(envelope);
        self.shared.available.notify_all();
        Ok(())
    }
}

impl Listener for InMemoryQueue {
    fn listen(&self, queue: &str, timeout_ms: u64) -> Result<Option<Envelope>, TransportError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut queues = self
            .shared
            .queues
            .lock()
            .map_err(|_| TransportError::Rejected("queue lock poisoned".into()))?;

        loop {
            if let Some(envelope) = queues.get_mut(queue).and_then(VecDeque::pop_front) {
                return Ok(Some(envelope));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            queues = self
                .shared
                .available
                .wait_timeout(queues, deadline - now)
                .map_err(|_| TransportError::Rejected("queue lock poisoned".into()))?
                .0;
        }
    }

    fn ack(&self, envelope_id: &str) -> Result<(), TransportError> {
        self.shared
            .acked
            .lock()
            .map_err(|_| TransportError::Rejected("ack log poisoned".into()))?
            .push(envelope_id.to_string());
        Ok(())
    }

    fn nack(&self, envelope_id: &str, reason: &str) -> Result<(), TransportError> {
        self.shared
            .nacked
            .lock()
            .map_err(|_| TransportError::Rejected("nack log poisoned".into()))?
            .push((envelope_id.to_string(), reason.to_string()));
        Ok(())
    }
}
