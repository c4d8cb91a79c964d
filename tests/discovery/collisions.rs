//! Last-write-wins folding of duplicate type keys.

use std::sync::Arc;

use routed_rust::build_registry;

use crate::support::{invoke, Declares};

#[test]
fn later_component_wins() {
    let c1 = Arc::new(Declares::new(&["ship-order"], "C1"));
    let c3 = Arc::new(Declares::new(&["ship-order"], "C3"));

    let registry = build_registry(components![c1.clone(), c3.clone()]).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.overridden(), 1);

    invoke(&registry, "ship-order").unwrap();
    assert_eq!(c1.handler.calls(), 0);
    assert_eq!(c3.handler.calls(), 1);
}

#[test]
fn reversing_order_reverses_winner() {
    let c1 = Arc::new(Declares::new(&["ship-order"], "C1"));
    let c3 = Arc::new(Declares::new(&["ship-order"], "C3"));

    let registry = build_registry(components![c3.clone(), c1.clone()]).unwrap();

    invoke(&registry, "ship-order").unwrap();
    assert_eq!(c1.handler.calls(), 1);
    assert_eq!(c3.handler.calls(), 0);
}

#[test]
fn duplicate_within_one_component() {
    let c = Arc::new(Declares::new(&["a", "b", "a"], "C"));
    let registry = build_registry(components![c]).unwrap();

    assert_eq!(registry.type_keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(registry.overridden(), 1);
}

#[test]
fn keys_are_case_sensitive() {
    let registry = build_registry(components![
        Arc::new(Declares::new(&["ship-order"], "lower")),
        Arc::new(Declares::new(&["Ship-Order"], "mixed")),
    ])
    .unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.overridden(), 0);
}
