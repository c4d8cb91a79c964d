//! Many threads dispatching through one dispatcher.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use routed_rust::{
    build_registry, handler_fn, CancellationToken, Component, ComponentRef, Context,
    DispatchError, Dispatcher, Envelope, HandlerRef, HandlingError, NoTransactions, Registration,
};

use crate::support::{order_key, ship, stock_key, warehouse};

#[test]
fn concurrent_dispatches_are_isolated() {
    let w = warehouse(&[("sku-1", 1_000)]);

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let dispatcher = Arc::clone(&w.dispatcher);
            thread::spawn(move || {
                for i in 0..25 {
                    let id = format!("o-{t}-{i}");
                    let envelope = if i % 5 == 0 {
                        // Every fifth message fails validation.
                        Envelope::json(&id, "ship-order", &ship(&id, &[])).unwrap()
                    } else {
                        Envelope::json(&id, "ship-order", &ship(&id, &[("sku-1", 1)])).unwrap()
                    };
                    let _ = dispatcher.dispatch(&envelope);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = w.store.stats();
    assert_eq!(w.ship.calls.load(Ordering::SeqCst), 200);
    assert_eq!(stats.begun, 200);
    assert_eq!(stats.rolled_back, 40);
    assert_eq!(stats.committed + stats.conflicts, 160);

    // Stock only moved for committed orders.
    let stock: u32 = w.store.get(&stock_key("sku-1")).unwrap().unwrap();
    assert_eq!(stock as usize, 1_000 - stats.committed);
    assert!(!w.store.contains(&order_key("o-0-0")).unwrap());
}

#[test]
fn conflicts_surface_as_commit_errors() {
    let w = warehouse(&[("sku-1", 1_000)]);

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let dispatcher = Arc::clone(&w.dispatcher);
            thread::spawn(move || {
                let mut outcomes = Vec::new();
                for i in 0..25 {
                    let id = format!("o-{t}-{i}");
                    let envelope =
                        Envelope::json(&id, "ship-order", &ship(&id, &[("sku-1", 1)])).unwrap();
                    outcomes.push(dispatcher.dispatch(&envelope));
                }
                outcomes
            })
        })
        .collect();

    let mut committed = 0;
    for worker in workers {
        for outcome in worker.join().unwrap() {
            match outcome {
                Ok(()) => committed += 1,
                Err(DispatchError::Commit { .. }) => {}
                Err(other) => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    let stock: u32 = w.store.get(&stock_key("sku-1")).unwrap().unwrap();
    assert_eq!(stock, 1_000 - committed);
    assert_eq!(w.store.stats().conflicts as u32, 100 - committed);
}

/// Handler that waits for cancellation, then reports it.
struct Waits;

impl Component<()> for Waits {
    fn registrations(self: Arc<Self>) -> Vec<Registration<()>> {
        let handler: HandlerRef = Arc::new(handler_fn(|ctx: &Context<'_, ()>| {
            while !ctx.is_cancelled() {
                thread::yield_now();
            }
            Err(HandlingError::Cancelled)
        }));
        vec![Registration::direct("long-running", handler)]
    }
}

#[test]
fn cancellation_reaches_a_running_handler() {
    let components: Vec<ComponentRef<()>> = vec![Arc::new(Waits)];
    let dispatcher = Arc::new(Dispatcher::new(
        build_registry(components).unwrap(),
        NoTransactions,
    ));
    let token = CancellationToken::new();

    let running = {
        let dispatcher = Arc::clone(&dispatcher);
        let token = token.clone();
        thread::spawn(move || {
            dispatcher.dispatch_with(
                &Envelope::with_string_payload("m-1", "long-running", ""),
                &token,
            )
        })
    };

    token.cancel();
    let err = running.join().unwrap().unwrap_err();
    assert!(matches!(err.handling_error(), Some(HandlingError::Cancelled)));
}
