mod component;

use proc_macro::TokenStream;

// ============================================================================
// #[component] attribute macro
// ============================================================================

/// Attribute macro that implements `routed_rust::Component` from an impl block.
///
/// # Usage
///
/// A type that is itself a handler:
/// ```ignore
/// struct ShipOrderHandler { store: InMemoryStore }
///
/// impl MessageHandler<StagedWrites> for ShipOrderHandler { /* ... */ }
///
/// #[component(handles = "ship-order")]
/// impl ShipOrderHandler {}
/// ```
///
/// A type whose methods produce handlers:
/// ```ignore
/// #[component]
/// impl Orders {
///     #[handler("cancel-order")]
///     fn cancel_handler(&self) -> CancelOrder {
///         CancelOrder::new(self.store.clone())
///     }
///
///     #[handler("archive-order")]
///     fn archive_handler(&self) -> Result<ArchiveOrder, ConnectError> {
///         ArchiveOrder::connect(&self.archive_url)
///     }
/// }
/// ```
///
/// - `handles = KEY` registers the type itself for `KEY`. The type must
///   implement `MessageHandler`.
/// - `#[handler(KEY)]` registers a factory method. Only methods taking
///   `&self` and nothing else, not `async`, and returning a value qualify;
///   any other method carrying the attribute is left out.
/// - A factory returning `Result<H, E>` fails discovery with its error.
/// - Factories are registered in declaration order, before the type itself.
/// - `KEY` is any expression convertible into `String`. A missing key
///   (`#[handler]`, `handles` with no value) fails discovery.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    component::expand(attr, item)
}
