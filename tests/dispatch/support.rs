//! Test domain: a small warehouse that ships and cancels orders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use routed_rust::{
    build_registry, component, ComponentRef, Context, Dispatcher, HandlingError, InMemoryStore,
    MessageHandler, StagedWrites,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Command payload: ship an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipOrder {
    pub order_id: String,
    pub customer_name: String,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u32,
}

/// Command payload: cancel a shipped order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Shipped,
    Cancelled,
}

/// Stored order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub status: OrderStatus,
}

pub fn order_key(id: &str) -> String {
    format!("order:{id}")
}

pub fn stock_key(sku: &str) -> String {
    format!("stock:{sku}")
}

/// Stores the order, then takes every line out of stock.
#[derive(Default)]
pub struct ShipOrderHandler {
    pub calls: AtomicUsize,
}

impl MessageHandler<StagedWrites> for ShipOrderHandler {
    fn handle(&self, ctx: &Context<'_, StagedWrites>) -> Result<(), HandlingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let cmd: ShipOrder = ctx.input()?;
        if cmd.lines.is_empty() {
            return Err(HandlingError::Rejected("bad payload".into()));
        }

        let order = Order {
            id: cmd.order_id.clone(),
            customer_name: cmd.customer_name.clone(),
            status: OrderStatus::Shipped,
        };
        ctx.scope().put(&order_key(&order.id), &order)?;

        for line in &cmd.lines {
            let key = stock_key(&line.sku);
            let available: u32 = ctx
                .scope()
                .get(&key)?
                .ok_or_else(|| HandlingError::NotFound(key.clone()))?;
            if available < line.quantity {
                return Err(HandlingError::Rejected(format!(
                    "insufficient stock for {}",
                    line.sku
                )));
            }
            ctx.scope().put(&key, &(available - line.quantity))?;
        }
        Ok(())
    }
}

#[component(handles = "ship-order")]
impl ShipOrderHandler {}

/// Marks a stored order cancelled.
pub struct CancelOrderHandler;

impl MessageHandler<StagedWrites> for CancelOrderHandler {
    fn handle(&self, ctx: &Context<'_, StagedWrites>) -> Result<(), HandlingError> {
        let cmd: CancelOrder = ctx.input()?;
        let key = order_key(&cmd.order_id);
        let mut order: Order = ctx
            .scope()
            .get(&key)?
            .ok_or_else(|| HandlingError::NotFound(key.clone()))?;
        order.status = OrderStatus::Cancelled;
        ctx.scope().put(&key, &order)?;
        Ok(())
    }
}

/// Factory component for order maintenance handlers.
#[derive(Default)]
pub struct Orders {
    pub factory_calls: AtomicUsize,
}

#[component]
impl Orders {
    #[handler("cancel-order")]
    fn cancel_handler(&self) -> CancelOrderHandler {
        self.factory_calls.fetch_add(1, Ordering::SeqCst);
        CancelOrderHandler
    }
}

/// Route `tracing` output through the test harness; `RUST_LOG` selects levels.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Warehouse {
    pub store: InMemoryStore,
    pub ship: Arc<ShipOrderHandler>,
    pub orders: Arc<Orders>,
    pub dispatcher: Arc<Dispatcher<InMemoryStore>>,
}

/// Discover both components and publish a dispatcher over a fresh store
/// holding `stock` units of every listed SKU.
pub fn warehouse(stock: &[(&str, u32)]) -> Warehouse {
    init_tracing();
    let store = InMemoryStore::new();
    for (sku, units) in stock {
        store.put(&stock_key(sku), units).unwrap();
    }

    let ship = Arc::new(ShipOrderHandler::default());
    let orders = Arc::new(Orders::default());
    let components: Vec<ComponentRef<StagedWrites>> = vec![ship.clone(), orders.clone()];
    let registry = build_registry(components).unwrap();
    let dispatcher = Arc::new(Dispatcher::new(registry, store.clone()));

    Warehouse {
        store,
        ship,
        orders,
        dispatcher,
    }
}

pub fn ship(order_id: &str, lines: &[(&str, u32)]) -> ShipOrder {
    ShipOrder {
        order_id: order_id.to_string(),
        customer_name: "Acme".to_string(),
        lines: lines
            .iter()
            .map(|(sku, quantity)| OrderLine {
                sku: sku.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}
