//! Discovery phase - components in, frozen registry out.
//!
//! ```text
//! Components ──► Scanner ──► HandlerEntry ──► RegistryBuilder ──► Registry
//! ```
//!
//! Discovery runs once, on one thread, before any dispatch. Every error is
//! fatal: a partially built registry is never returned.

mod builder;
mod component;
mod scanner;

pub use builder::{build_registry, RegistryBuilder};
pub use component::{Component, ComponentRef, HandlerFactory, Registration};
pub use scanner::Scanner;
