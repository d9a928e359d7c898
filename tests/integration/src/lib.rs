//! End-to-end tests for the gatekeeper service.
//!
//! These drive the full stack in-process: subrequest headers through
//! the HTTP adapter, the decision engine, the in-memory repository, and
//! back out as proxy-facing responses. The wall clock is frozen per
//! test so signature freshness is deterministic.

use std::sync::{Arc, Once};

use bytes::Bytes;
use http_body_util::BodyExt;

use gatekeeper_auth::{FixedClock, SignatureVerifier, DEFAULT_TOLERANCE_SECS};
use gatekeeper_core::MemoryRepository;
use gatekeeper_engine::Authorizer;
use gatekeeper_http::{handle_request, HttpConfig, ResponseBody, AUTHZ_PATH};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A frozen-clock stack over the given store document.
#[must_use]
pub fn stack_at(store_json: &str, now: i64) -> (Authorizer, Arc<FixedClock>) {
    init_tracing();

    let repository =
        Arc::new(MemoryRepository::from_json(store_json).expect("store fixture must be valid"));
    let clock = Arc::new(FixedClock::new(now));
    let verifier = SignatureVerifier::new(DEFAULT_TOLERANCE_SECS, clock.clone());
    (Authorizer::new(repository, verifier), clock)
}

/// Build subrequest parts carrying the given headers.
#[must_use]
pub fn subrequest(headers: &[(&str, &str)]) -> http::request::Parts {
    let mut builder = http::Request::builder()
        .method(http::Method::GET)
        .uri(AUTHZ_PATH);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (parts, ()) = builder.body(()).expect("valid subrequest").into_parts();
    parts
}

/// Run one subrequest through the adapter.
pub async fn authorize(
    authorizer: &Authorizer,
    headers: &[(&str, &str)],
    body: &'static [u8],
) -> http::Response<ResponseBody> {
    handle_request(
        authorizer,
        &HttpConfig::default(),
        subrequest(headers),
        Bytes::from_static(body),
    )
    .await
}

/// Collect a response body as bytes.
pub async fn body_bytes(response: http::Response<ResponseBody>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes()
}

mod test_key_auth;
mod test_routing;
mod test_signature_auth;
