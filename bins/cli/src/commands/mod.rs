//! CLI command handlers.

pub mod collections;
pub mod config;
pub mod model;
pub mod validate;

pub use collections::{run_collections_get, run_collections_list};
pub use config::run_config_show;
pub use model::run_model_check;
pub use validate::run_validate;
