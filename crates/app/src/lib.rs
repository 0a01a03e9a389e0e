//! # embed-preflight-app
//!
//! Preflight use cases: model existence, collection listing, and the ordered
//! validation run. This crate depends on `ports`, `config`, and `shared`.

pub mod collections;
pub mod model_check;
pub mod preflight;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use collections::{CollectionsDeps, SearchTarget, get_collection, list_collections};
pub use model_check::{ModelCheckInput, check_model_exists};
pub use preflight::{
    CheckName, CheckResult, PreflightDeps, PreflightInput, ValidationOutcome, run_preflight,
};
