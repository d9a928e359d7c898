//! The authorization decision pipeline.
//!
//! One call, one typed [`Decision`]. The pipeline short-circuits on the
//! first terminal state:
//!
//! 1. match a route (deny `no_route`)
//! 2. resolve the method policy (deny `method_not_configured`)
//! 3. public policy → allow `no_auth_required`
//! 4. extract credentials, authenticate by signature or key
//! 5. check client lifecycle status
//! 6. check the (client, route, method) permission
//! 7. allow `authenticated`
//!
//! The step order is observable through the returned reason and must
//! not change. Repository calls run under the caller's deadline; a
//! deadline hit, a repository failure, or a panic anywhere in the
//! pipeline produces an `internal_error` decision rather than an
//! escaping fault.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use gatekeeper_auth::credentials::{self, SignatureBundle};
use gatekeeper_auth::{SignatureError, SignatureVerifier};
use gatekeeper_core::repository::RepoFuture;
use gatekeeper_core::{
    Client, ClientStatus, Decision, InternalCause, Method, MethodPolicy, Reason, Repository,
};

use crate::matcher;

/// One authorization request as handed over by the adapter.
///
/// `path` is the request path with any query string already stripped;
/// it is both the route-matching subject and the canonical signing
/// PATH. `headers` carries the client-supplied credential headers;
/// `query` the parsed query parameters of the original request.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Lowercased by the engine before matching; `None` when the
    /// original request carried no host.
    pub domain: Option<String>,
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub body: Bytes,
}

/// The decision engine. Stateless across requests: every decision is a
/// pure function of the request and current repository state.
#[derive(Clone)]
pub struct Authorizer {
    repository: Arc<dyn Repository>,
    verifier: SignatureVerifier,
}

impl Authorizer {
    /// An engine reading from `repository` and verifying signatures
    /// with `verifier`.
    #[must_use]
    pub fn new(repository: Arc<dyn Repository>, verifier: SignatureVerifier) -> Self {
        Self {
            repository,
            verifier,
        }
    }

    /// Decide whether the request may proceed.
    ///
    /// Never fails and never panics outward: the pipeline runs in its
    /// own task, and a contained panic yields `internal_error`.
    pub async fn authorize(&self, request: AuthRequest, deadline: Instant) -> Decision {
        let engine = self.clone();
        match tokio::spawn(async move { engine.decide(request, deadline).await }).await {
            Ok(decision) => decision,
            Err(join_error) => {
                error!(error = %join_error, "authorization pipeline panicked");
                Decision::internal(InternalCause::Panic)
            }
        }
    }

    async fn decide(&self, request: AuthRequest, deadline: Instant) -> Decision {
        let domain = request
            .domain
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase();

        let candidates = match with_deadline(
            deadline,
            self.repository.candidate_routes(&domain, &request.path),
        )
        .await
        {
            Ok(candidates) => candidates,
            Err(cause) => return Decision::internal(cause),
        };

        let Some(route) =
            matcher::select_route(&candidates, request.domain.as_deref(), &request.path).cloned()
        else {
            debug!(%domain, path = %request.path, "no route matched");
            return Decision::deny(Reason::NoRoute);
        };

        let Some(policy) = route.policy_for(request.method) else {
            debug!(route_id = %route.id, method = %request.method, "method not configured");
            return Decision::deny(Reason::MethodNotConfigured).with_route(&route.id);
        };

        if policy == MethodPolicy::Public {
            return Decision::allow_public(&route.id);
        }

        let creds = credentials::extract(&request.headers, &request.query);
        let prefer_signature = policy == MethodPolicy::RequireSignature
            || (policy == MethodPolicy::RequireAny && creds.signature.is_some());

        let client = if prefer_signature {
            self.authenticate_signature(
                &request,
                creds.signature.as_ref(),
                creds.client_hint.as_deref(),
                deadline,
            )
            .await
        } else {
            self.authenticate_key(creds.api_key.as_deref(), deadline).await
        };

        let client = match client {
            Ok(client) => client,
            Err(denial) => {
                return if denial.reason.is_internal() {
                    denial
                } else {
                    denial.with_route(&route.id)
                };
            }
        };

        match client.status {
            ClientStatus::Active => {}
            ClientStatus::Suspended => {
                return Decision::deny(Reason::ClientSuspended)
                    .with_client(&client.id, &client.name)
                    .with_route(&route.id);
            }
            ClientStatus::Revoked => {
                return Decision::deny(Reason::ClientRevoked)
                    .with_client(&client.id, &client.name)
                    .with_route(&route.id);
            }
        }

        let permission = match with_deadline(
            deadline,
            self.repository.permission(&client.id, &route.id),
        )
        .await
        {
            Ok(permission) => permission,
            Err(cause) => return Decision::internal(cause),
        };

        let Some(permission) = permission else {
            debug!(client_id = %client.id, route_id = %route.id, "no permission");
            return Decision::deny(Reason::NoPermission)
                .with_client(&client.id, &client.name)
                .with_route(&route.id);
        };

        if !permission.allows(request.method) {
            debug!(
                client_id = %client.id,
                route_id = %route.id,
                method = %request.method,
                "method not in permitted set"
            );
            return Decision::deny(Reason::MethodNotAllowed)
                .with_client(&client.id, &client.name)
                .with_route(&route.id);
        }

        Decision::allow_authenticated(&client.id, &client.name, &route.id)
    }

    /// Signature authentication: require a complete bundle, verify it
    /// against the candidate secrets, then resolve the owning client by
    /// the shared secret that matched.
    async fn authenticate_signature(
        &self,
        request: &AuthRequest,
        bundle: Option<&SignatureBundle>,
        client_hint: Option<&str>,
        deadline: Instant,
    ) -> Result<Client, Decision> {
        let Some(bundle) = bundle else {
            return Err(Decision::deny(Reason::MissingCredentials));
        };

        let candidates = with_deadline(deadline, self.repository.candidate_secrets(client_hint))
            .await
            .map_err(Decision::internal)?;

        let matched = self
            .verifier
            .verify(
                request.method.as_str(),
                &request.path,
                bundle,
                &request.body,
                &candidates,
            )
            .map_err(|err| {
                Decision::deny(match err {
                    SignatureError::SignatureMismatch => Reason::InvalidSignature,
                    SignatureError::Expired => Reason::SignatureExpired,
                    SignatureError::BodyMismatch => Reason::BodyTampered,
                })
            })?;

        let client = with_deadline(
            deadline,
            self.repository.client_by_shared_secret(&matched.shared_secret),
        )
        .await
        .map_err(Decision::internal)?;

        // The secret may have been rotated away between verification
        // and resolution.
        client.ok_or_else(|| Decision::deny(Reason::InvalidCredentials))
    }

    /// Key authentication: require a key, resolve the client holding it.
    async fn authenticate_key(
        &self,
        api_key: Option<&str>,
        deadline: Instant,
    ) -> Result<Client, Decision> {
        let Some(api_key) = api_key else {
            return Err(Decision::deny(Reason::MissingCredentials));
        };

        let client = with_deadline(deadline, self.repository.client_by_api_key(api_key))
            .await
            .map_err(Decision::internal)?;

        client.ok_or_else(|| Decision::deny(Reason::InvalidCredentials))
    }
}

/// Await a repository call under the pipeline deadline.
async fn with_deadline<T>(deadline: Instant, call: RepoFuture<'_, T>) -> Result<T, InternalCause> {
    match tokio::time::timeout_at(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            warn!(error = %err, "repository call failed");
            Err(InternalCause::RepositoryError)
        }
        Err(_elapsed) => {
            warn!("repository call exceeded the decision deadline");
            Err(InternalCause::Timeout)
        }
    }
}
