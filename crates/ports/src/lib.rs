//! # embed-preflight-ports
//!
//! Port traits for the embed-preflight hexagonal architecture.
//!
//! This crate defines the interfaces between the preflight use cases and the
//! outside world (model registry, search service, filesystem, logging). It
//! depends only on `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod logger;
pub mod probe;
pub mod registry;
pub mod search;

pub use logger::*;
pub use probe::*;
pub use registry::*;
pub use search::*;
