//! Request-scoped context.
//!
//! Every preflight run carries a `RequestContext` so log lines and errors from
//! one run can be correlated.

use crate::{ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A correlation identifier used for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation identifier from user input.
    ///
    /// The value is trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::<str>::from(trimmed)))
    }

    /// Create a new run id, best-effort unique within this process.
    #[must_use]
    pub fn new_run_id() -> Self {
        let n = RUN_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let id: Box<str> = format!("run_{n}").into_boxed_str();
        Self(Arc::<str>::from(id))
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

static RUN_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Request-scoped context passed across port boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
}

impl RequestContext {
    /// Create a context for the given correlation id.
    #[must_use]
    pub const fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    /// Convenience constructor: create a context with an auto-generated `run_*` id.
    #[must_use]
    pub fn new_run() -> Self {
        Self::new(CorrelationId::new_run_id())
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_and_prefixed() {
        let first = RequestContext::new_run();
        let second = RequestContext::new_run();

        assert!(first.correlation_id().as_str().starts_with("run_"));
        assert_ne!(first.correlation_id(), second.correlation_id());
    }

    #[test]
    fn parse_rejects_blank_ids() {
        assert!(CorrelationId::parse("   ").is_err());
        assert!(matches!(
            CorrelationId::parse(" abc ").map(|id| id.as_str().to_owned()),
            Ok(value) if value == "abc"
        ));
    }
}
