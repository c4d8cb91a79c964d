//! Warehouse demo: discover two components, then feed orders through a queue.
//!
//! Run with `RUST_LOG=routed_rust=debug cargo run --example warehouse`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use routed_rust::bus::{Envelope, InMemoryQueue, Sender};
use routed_rust::{
    build_registry, component, transport, ComponentRef, Context, Dispatcher, HandlingError,
    InMemoryStore, MessageHandler, StagedWrites, TransportConfig,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct ShipOrder {
    order_id: String,
    customer_name: String,
    lines: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CancelOrder {
    order_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Order {
    customer_name: String,
    lines: Vec<String>,
    cancelled: bool,
}

/// Handles "ship-order" itself.
#[derive(Default)]
struct ShipOrderHandler {
    shipped: AtomicUsize,
}

impl MessageHandler<StagedWrites> for ShipOrderHandler {
    fn handle(&self, ctx: &Context<'_, StagedWrites>) -> Result<(), HandlingError> {
        let cmd: ShipOrder = ctx.input()?;
        if cmd.lines.is_empty() {
            return Err(HandlingError::Rejected(format!(
                "order {} has no lines",
                cmd.order_id
            )));
        }

        ctx.scope().put(
            &format!("order:{}", cmd.order_id),
            &Order {
                customer_name: cmd.customer_name.clone(),
                lines: cmd.lines,
                cancelled: false,
            },
        )?;
        self.shipped.fetch_add(1, Ordering::SeqCst);
        info!("Order for customer {} shipped", cmd.customer_name);
        Ok(())
    }
}

#[component(handles = "ship-order")]
impl ShipOrderHandler {}

struct CancelOrderHandler;

impl MessageHandler<StagedWrites> for CancelOrderHandler {
    fn handle(&self, ctx: &Context<'_, StagedWrites>) -> Result<(), HandlingError> {
        let cmd: CancelOrder = ctx.input()?;
        let key = format!("order:{}", cmd.order_id);
        let mut order: Order = ctx
            .scope()
            .get(&key)?
            .ok_or_else(|| HandlingError::NotFound(key.clone()))?;
        order.cancelled = true;
        ctx.scope().put(&key, &order)?;
        info!("Order {} cancelled", cmd.order_id);
        Ok(())
    }
}

/// Order maintenance; handlers come from factory methods.
struct Orders;

#[component]
impl Orders {
    #[handler("cancel-order")]
    fn cancel_handler(&self) -> CancelOrderHandler {
        CancelOrderHandler
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = TransportConfig::from_toml_str(
        r#"
        queue = "warehouse"
        workers = 1
        poll_interval_ms = 20
        "#,
    )?;

    // Discovery: fails startup if any component is misdeclared.
    let ship = Arc::new(ShipOrderHandler::default());
    let components: Vec<ComponentRef<StagedWrites>> = vec![ship.clone(), Arc::new(Orders)];
    let registry = build_registry(components)?;
    info!(type_keys = ?registry.type_keys().collect::<Vec<_>>(), "registry ready");

    let store = InMemoryStore::new();
    let dispatcher = Arc::new(Dispatcher::new(registry, store.clone()));

    let queue = InMemoryQueue::new();
    let handle = transport::listen(dispatcher, queue.clone(), &config);

    let orders = [
        ("o-1", "Acme", vec!["sku-1".to_string(), "sku-2".to_string()]),
        ("o-2", "Globex", vec!["sku-3".to_string()]),
        ("o-3", "Initech", Vec::new()),
    ];
    for (i, (order_id, customer_name, lines)) in orders.into_iter().enumerate() {
        let cmd = ShipOrder {
            order_id: order_id.to_string(),
            customer_name: customer_name.to_string(),
            lines,
        };
        queue.send(
            &config.queue,
            Envelope::json(format!("m-{i}"), "ship-order", &cmd)?,
        )?;
    }
    queue.send(
        &config.queue,
        Envelope::json(
            "m-cancel",
            "cancel-order",
            &CancelOrder {
                order_id: "o-2".into(),
            },
        )?,
    )?;
    queue.send(
        &config.queue,
        Envelope::with_string_payload("m-unknown", "restock", "{}"),
    )?;

    thread::sleep(Duration::from_millis(300));
    let stats = handle.stop();

    println!(
        "handled={} failed={} rejected={} shipped={}",
        stats.handled,
        stats.failed,
        stats.rejected,
        ship.shipped.load(Ordering::SeqCst)
    );
    for key in store.keys()? {
        let order: Option<Order> = store.get(&key)?;
        println!("{key}: {order:?}");
    }
    for (id, reason) in queue.rejected() {
        println!("nacked {id}: {reason}");
    }

    Ok(())
}
