//! Components declared with `#[component]`.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use routed_rust::{
    build_registry, component, Component, Context, DiscoveryError, HandlingError,
    MessageHandler, Registration,
};

use crate::support::{invoke, Counting};

/// Handles "ship-order" itself.
#[derive(Default)]
struct ShipOrderHandler {
    calls: AtomicUsize,
}

impl MessageHandler for ShipOrderHandler {
    fn handle(&self, _ctx: &Context<'_, ()>) -> Result<(), HandlingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[component(handles = "ship-order")]
impl ShipOrderHandler {}

const CANCEL_ORDER: &str = "cancel-order";

#[derive(Debug)]
struct ArchiveUnavailable;

impl fmt::Display for ArchiveUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("archive unavailable")
    }
}

impl std::error::Error for ArchiveUnavailable {}

/// Produces handlers from factory methods; only well-shaped ones count.
#[derive(Default)]
struct Orders {
    factory_calls: AtomicUsize,
    archive_online: bool,
}

#[component]
impl Orders {
    #[handler(CANCEL_ORDER)]
    fn cancel_handler(&self) -> Counting {
        self.factory_calls.fetch_add(1, Ordering::SeqCst);
        Counting::new("cancel")
    }

    #[handler("archive-order")]
    fn archive_handler(&self) -> Result<Counting, ArchiveUnavailable> {
        self.factory_calls.fetch_add(1, Ordering::SeqCst);
        if self.archive_online {
            Ok(Counting::new("archive"))
        } else {
            Err(ArchiveUnavailable)
        }
    }

    #[handler("with-argument")]
    #[allow(dead_code)]
    fn needs_argument(&self, _region: &str) -> Counting {
        Counting::new("never")
    }

    #[handler("no-receiver")]
    #[allow(dead_code)]
    fn associated() -> Counting {
        Counting::new("never")
    }

    #[handler("returns-nothing")]
    #[allow(dead_code)]
    fn side_effect(&self) {}

    #[handler("async-factory")]
    #[allow(dead_code)]
    async fn later(&self) -> Counting {
        Counting::new("never")
    }

    /// Plain methods keep working.
    fn factory_calls(&self) -> usize {
        self.factory_calls.load(Ordering::SeqCst)
    }
}

/// Both a handler itself and a source of another one.
struct Fulfilment;

impl MessageHandler for Fulfilment {
    fn handle(&self, _ctx: &Context<'_, ()>) -> Result<(), HandlingError> {
        Err(HandlingError::Rejected("fulfilment".into()))
    }
}

#[component(handles = "ship-order")]
impl Fulfilment {
    #[handler("ship-order")]
    fn legacy(&self) -> Counting {
        Counting::new("legacy")
    }
}

#[test]
fn type_registers_itself() {
    let ship = Arc::new(ShipOrderHandler::default());
    let registry = build_registry(components![ship.clone()]).unwrap();

    assert_eq!(registry.type_keys().collect::<Vec<_>>(), vec!["ship-order"]);
    invoke(&registry, "ship-order").unwrap();
    assert_eq!(ship.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn only_qualifying_methods_are_factories() {
    let orders = Arc::new(Orders {
        archive_online: true,
        ..Orders::default()
    });

    let registrations = <Orders as Component<()>>::registrations(Arc::clone(&orders));
    let keys: Vec<_> = registrations.iter().map(Registration::type_key).collect();
    assert_eq!(keys, vec!["cancel-order", "archive-order"]);

    // Declaring is not invoking.
    assert_eq!(orders.factory_calls(), 0);
    drop(registrations);

    let registry = build_registry(components![orders.clone()]).unwrap();
    assert_eq!(orders.factory_calls(), 2);
    assert_eq!(registry.len(), 2);
    invoke(&registry, "cancel-order").unwrap();
    invoke(&registry, "archive-order").unwrap();
}

#[test]
fn fallible_factory_error_aborts_discovery() {
    let orders = Arc::new(Orders::default());

    let err = build_registry(components![orders]).unwrap_err();
    match err {
        DiscoveryError::HandlerInvocationFailure {
            method,
            type_key,
            source,
            ..
        } => {
            assert_eq!(method, "archive_handler");
            assert_eq!(type_key, "archive-order");
            assert_eq!(source.to_string(), "archive unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn direct_registration_follows_factories() {
    let registry = build_registry(components![Arc::new(Fulfilment)]).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.overridden(), 1);
    assert!(matches!(
        invoke(&registry, "ship-order"),
        Err(HandlingError::Rejected(msg)) if msg == "fulfilment"
    ));
}

#[test]
fn generated_name_identifies_the_type() {
    let component: Arc<dyn Component<()>> = Arc::new(Fulfilment);
    assert!(component.name().ends_with("Fulfilment"));
}
