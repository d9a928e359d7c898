//! The gatekeeper HTTP service implementing hyper's `Service` trait.
//!
//! [`GatekeeperService`] ties together subrequest decoding, the
//! decision engine, and response mapping:
//!
//! 1. Health probe interception (`GET /health`)
//! 2. Request body collection
//! 3. Subrequest header decoding (`/authz`)
//! 4. Engine invocation under the configured deadline
//! 5. Decision-to-HTTP mapping and structured decision logging

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use gatekeeper_engine::{AuthRequest, Authorizer};

use crate::extract;
use crate::response::{
    bad_subrequest_response, decision_response, health_response, not_found_response,
    server_error_response, ResponseBody,
};

/// Path the edge proxy points its subrequests at.
pub const AUTHZ_PATH: &str = "/authz";
/// Liveness probe path.
pub const HEALTH_PATH: &str = "/health";

/// Configuration for the HTTP adapter.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Budget for one decision, shared by its repository calls.
    pub decision_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            decision_timeout: Duration::from_secs(2),
        }
    }
}

/// The subrequest authorization service.
pub struct GatekeeperService {
    authorizer: Arc<Authorizer>,
    config: Arc<HttpConfig>,
}

impl GatekeeperService {
    /// A service answering subrequests with decisions from `authorizer`.
    #[must_use]
    pub fn new(authorizer: Authorizer, config: HttpConfig) -> Self {
        Self {
            authorizer: Arc::new(authorizer),
            config: Arc::new(config),
        }
    }
}

impl Clone for GatekeeperService {
    fn clone(&self) -> Self {
        Self {
            authorizer: Arc::clone(&self.authorizer),
            config: Arc::clone(&self.config),
        }
    }
}

impl Service<http::Request<Incoming>> for GatekeeperService {
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let authorizer = Arc::clone(&self.authorizer);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();

            let body = match incoming.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    error!(error = %err, "failed to collect subrequest body");
                    return Ok(server_error_response());
                }
            };

            Ok(handle_request(&authorizer, &config, parts, body).await)
        })
    }
}

/// Process one collected subrequest. Split out from the `Service` impl
/// so tests can drive the adapter without a connection.
pub async fn handle_request(
    authorizer: &Authorizer,
    config: &HttpConfig,
    parts: http::request::Parts,
    body: Bytes,
) -> http::Response<Full<Bytes>> {
    let request_id = Uuid::new_v4().to_string();
    let path = parts.uri.path();

    if parts.method == http::Method::GET && path == HEALTH_PATH {
        return health_response();
    }
    if path != AUTHZ_PATH {
        debug!(%request_id, path, "unknown path");
        return not_found_response();
    }

    let original = match extract::original_request(&parts.headers) {
        Ok(original) => original,
        Err(err) => {
            warn!(%request_id, error = %err, "rejecting malformed subrequest");
            return bad_subrequest_response(&err);
        }
    };

    let started = std::time::Instant::now();
    let deadline = tokio::time::Instant::now() + config.decision_timeout;

    let auth_request = AuthRequest {
        domain: original.domain,
        path: original.path.clone(),
        method: original.method,
        headers: parts.headers,
        query: original.query,
        body,
    };

    let decision = authorizer.authorize(auth_request, deadline).await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    if decision.allowed {
        info!(
            %request_id,
            path = %original.path,
            method = %original.method,
            reason = %decision.reason,
            client_id = decision.client_id.as_deref().unwrap_or("public"),
            route_id = decision.route_id.as_deref().unwrap_or(""),
            duration_ms,
            "authorization allowed"
        );
    } else if let Some(cause) = decision.internal_cause() {
        error!(
            %request_id,
            path = %original.path,
            method = %original.method,
            cause = %cause,
            duration_ms,
            "authorization failed internally"
        );
    } else {
        warn!(
            %request_id,
            path = %original.path,
            method = %original.method,
            reason = %decision.reason,
            route_id = decision.route_id.as_deref().unwrap_or(""),
            duration_ms,
            "authorization denied"
        );
    }

    decision_response(&decision)
}
