//! Background workers that feed a [`Dispatcher`] from a queue.
//!
//! Every worker loops on `listen → dispatch → ack/nack` until the handle
//! is stopped. Stopping cancels the shared [`CancellationToken`], so
//! handlers still running see the signal through their context.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::bus::Listener;
use crate::config::TransportConfig;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::handler::CancellationToken;
use crate::transaction::TransactionManager;

/// Statistics from the transport workers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Messages whose dispatch committed (acked).
    pub handled: usize,
    /// Messages whose handler or scope failed (nacked).
    pub failed: usize,
    /// Messages with no registered handler (nacked).
    pub rejected: usize,
    /// Poll cycles completed.
    pub polls: usize,
}

impl TransportStats {
    fn merge(mut self, other: TransportStats) -> Self {
        self.handled += other.handled;
        self.failed += other.failed;
        self.rejected += other.rejected;
        self.polls += other.polls;
        self
    }
}

/// Handle to the running workers. Drop or call `stop()` to shut down.
pub struct TransportHandle {
    cancellation: CancellationToken,
    workers: Vec<JoinHandle<TransportStats>>,
}

impl TransportHandle {
    /// Stop every worker and wait for them to finish. Returns merged stats.
    pub fn stop(mut self) -> TransportStats {
        self.cancellation.cancel();
        let stats = self
            .workers
            .drain(..)
            .map(|worker| worker.join().unwrap_or_default())
            .fold(TransportStats::default(), TransportStats::merge);
        info!(
            handled = stats.handled,
            failed = stats.failed,
            rejected = stats.rejected,
            "transport stopped"
        );
        stats
    }

    /// Signal stop without waiting.
    pub fn signal_stop(&self) {
        self.cancellation.cancel();
    }

    /// The token forwarded into every dispatch.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// Start `config.workers` threads pulling from `config.queue`.
///
/// Listeners compete for envelopes, so each message is dispatched by
/// exactly one worker. Committed dispatches are acked; every failure is
/// nacked with the error text, and redelivery is left to the listener.
///
/// ## Example
///
/// ```ignore
/// let dispatcher = Arc::new(Dispatcher::new(registry, store.clone()));
/// let queue = InMemoryQueue::new();
/// let handle = transport::listen(
///     dispatcher,
///     queue.clone(),
///     &TransportConfig::for_queue("orders").with_workers(2),
/// );
///
/// queue.send("orders", Envelope::json("m-1", "ship-order", &order)?)?;
///
/// let stats = handle.stop();
/// ```
pub fn listen<T, L>(
    dispatcher: Arc<Dispatcher<T>>,
    listener: L,
    config: &TransportConfig,
) -> TransportHandle
where
    T: TransactionManager + 'static,
    L: Listener + Clone + 'static,
{
    let cancellation = CancellationToken::new();
    let workers = (0..config.workers.max(1))
        .map(|worker| {
            let dispatcher = Arc::clone(&dispatcher);
            let listener = listener.clone();
            let cancellation = cancellation.clone();
            let queue = config.queue.clone();
            let timeout_ms = config.poll_interval_ms;

            thread::spawn(move || {
                run_worker(worker, &dispatcher, &listener, &queue, timeout_ms, &cancellation)
            })
        })
        .collect();

    info!(queue = %config.queue, workers = config.workers.max(1), "transport started");
    TransportHandle {
        cancellation,
        workers,
    }
}

fn run_worker<T, L>(
    worker: usize,
    dispatcher: &Dispatcher<T>,
    listener: &L,
    queue: &str,
    timeout_ms: u64,
    cancellation: &CancellationToken,
) -> TransportStats
where
    T: TransactionManager,
    L: Listener,
{
    let mut stats = TransportStats::default();

    while !cancellation.is_cancelled() {
        stats.polls += 1;

        let envelope = match listener.listen(queue, timeout_ms) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => continue,
            Err(e) => {
                warn!(worker, queue, error = %e, "listen failed");
                continue;
            }
        };

        let acked = match dispatcher.dispatch_with(&envelope, cancellation) {
            Ok(()) => {
                stats.handled += 1;
                listener.ack(&envelope.id)
            }
            Err(e) => {
                match e {
                    DispatchError::NoHandlerForType(_) => stats.rejected += 1,
                    _ => stats.failed += 1,
                }
                debug!(worker, message_id = %envelope.id, error = %e, "dispatch failed");
                listener.nack(&envelope.id, &e.to_string())
            }
        };

        if let Err(e) = acked {
            warn!(worker, message_id = %envelope.id, error = %e, "could not report outcome");
        }
    }

    stats
}
