//! Blocking entry point for synchronous callers.

use crate::{InfraError, InfraResult};
use std::future::Future;

/// Drive `future` to completion on a fresh current-thread runtime.
pub fn block_on<F, T>(future: F) -> InfraResult<T>
where
    F: Future<Output = InfraResult<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(future)
}
