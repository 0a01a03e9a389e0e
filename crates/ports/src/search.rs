//! Search service boundary contract.

use crate::BoxFuture;
use embed_preflight_shared::{RequestContext, Result, SecretString};

/// Basic-auth credentials for the search service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCredentials {
    /// Username; credentials are only sent when it is set.
    pub username: Option<Box<str>>,
    /// Password.
    pub password: Option<SecretString>,
}

impl SearchCredentials {
    /// Build credentials from optional parts.
    #[must_use]
    pub fn new(username: Option<&str>, password: Option<&SecretString>) -> Self {
        Self {
            username: username.map(Box::from),
            password: password.cloned(),
        }
    }
}

/// One document returned by a search query.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRecord {
    /// Document id.
    pub id: Box<str>,
    /// Collection (index) the document belongs to.
    pub index: Box<str>,
    /// Opaque document payload.
    pub source: serde_json::Value,
}

/// Boundary contract for an OpenSearch-compatible search service.
///
/// Implementations make exactly one attempt per call.
pub trait SearchServicePort: Send + Sync {
    /// List the names of all indices at the endpoint.
    fn list_indices(
        &self,
        ctx: &RequestContext,
        endpoint: Box<str>,
        credentials: SearchCredentials,
    ) -> BoxFuture<'_, Result<Vec<Box<str>>>>;

    /// Return the first page of documents in `index` using a match-all query.
    ///
    /// No `size` is sent, so the service default page applies (10 hits on
    /// OpenSearch). Zero hits is an empty vector, not an error.
    fn search_all(
        &self,
        ctx: &RequestContext,
        endpoint: Box<str>,
        index: Box<str>,
        credentials: SearchCredentials,
    ) -> BoxFuture<'_, Result<Vec<CollectionRecord>>>;
}
