//! Test components: handlers that count their invocations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use routed_rust::{
    handler_fn, Component, Context, Envelope, HandlerRef, HandlingError,
    MessageHandler, Registration, Registry,
};

/// Handler that records how often it ran and tags itself with a label.
#[derive(Default)]
pub struct Counting {
    pub label: &'static str,
    pub calls: AtomicUsize,
}

impl Counting {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MessageHandler for Counting {
    fn handle(&self, _ctx: &Context<'_, ()>) -> Result<(), HandlingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Component that declares one ready handler per key.
pub struct Declares {
    pub keys: Vec<&'static str>,
    pub handler: Arc<Counting>,
}

impl Declares {
    pub fn new(keys: &[&'static str], label: &'static str) -> Self {
        Self {
            keys: keys.to_vec(),
            handler: Arc::new(Counting::new(label)),
        }
    }
}

impl Component<()> for Declares {
    fn registrations(self: Arc<Self>) -> Vec<Registration<()>> {
        self.keys
            .iter()
            .map(|key| Registration::direct(*key, Arc::clone(&self.handler) as HandlerRef))
            .collect()
    }

    fn name(&self) -> &str {
        self.handler.label
    }
}

/// Component with nothing to offer.
pub struct Inert;

impl Component<()> for Inert {
    fn registrations(self: Arc<Self>) -> Vec<Registration<()>> {
        Vec::new()
    }
}

pub fn noop() -> HandlerRef {
    Arc::new(handler_fn(|_ctx: &Context<'_, ()>| Ok(())))
}

/// Collect shared components into the list discovery takes.
macro_rules! components {
    ($($component:expr),* $(,)?) => {
        vec![$($component as routed_rust::ComponentRef<()>),*]
    };
}

/// Run the handler registered for `type_key` once with an empty payload.
pub fn invoke(registry: &Registry<()>, type_key: &str) -> Result<(), HandlingError> {
    let envelope = Envelope::with_string_payload("test", type_key, "");
    let token = routed_rust::CancellationToken::new();
    registry
        .get(type_key)
        .expect("handler registered")
        .handle(&Context::new(&envelope, &(), &token))
}
