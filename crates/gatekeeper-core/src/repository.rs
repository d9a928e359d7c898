//! The read-only repository contract the engine is parameterized over.
//!
//! The engine never owns storage: the caller supplies a [`Repository`]
//! and is responsible for its lifecycle. Implementations must be safe
//! for concurrent reads; every call is awaited under the pipeline
//! deadline, so implementations should not block outside the returned
//! future.

use std::future::Future;
use std::pin::Pin;

use crate::error::RepositoryResult;
use crate::types::{Client, Permission, Route};

/// Boxed future returned by repository calls.
///
/// Borrows may reference `&self` and the call arguments for `'a`.
pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = RepositoryResult<T>> + Send + 'a>>;

/// A `(client_id, shared_secret)` pair considered during signature
/// verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretCandidate {
    pub client_id: String,
    pub shared_secret: String,
}

/// Read access to routes, clients, and permissions.
pub trait Repository: Send + Sync + 'static {
    /// Routes that may match `(domain, path)`. The set may
    /// over-approximate; the matcher filters and orders it. `domain` is
    /// lowercased, and empty when the request carried no host.
    fn candidate_routes<'a>(&'a self, domain: &'a str, path: &'a str) -> RepoFuture<'a, Vec<Route>>;

    /// The client holding `api_key`, if any. Keys are globally unique.
    fn client_by_api_key<'a>(&'a self, api_key: &'a str) -> RepoFuture<'a, Option<Client>>;

    /// The client holding `shared_secret`, if any. Secrets are globally
    /// unique.
    fn client_by_shared_secret<'a>(
        &'a self,
        shared_secret: &'a str,
    ) -> RepoFuture<'a, Option<Client>>;

    /// Secrets to try during signature verification.
    ///
    /// With a `client_hint` (from `X-Client-Id`) this is a single
    /// indexed lookup returning at most one candidate; without one the
    /// repository may return a bounded scan of all secret-holding
    /// clients.
    fn candidate_secrets<'a>(
        &'a self,
        client_hint: Option<&'a str>,
    ) -> RepoFuture<'a, Vec<SecretCandidate>>;

    /// The unique permission for `(client_id, route_id)`, if any.
    fn permission<'a>(
        &'a self,
        client_id: &'a str,
        route_id: &'a str,
    ) -> RepoFuture<'a, Option<Permission>>;
}
