//! Decision-to-HTTP mapping.
//!
//! - allow → 200 with `X-Auth-Client-ID`, `X-Auth-Client-Name`, and
//!   `X-Auth-Route-ID` for the proxy to forward upstream
//! - deny → 403 with the reason tag as the body
//! - internal fault → 500
//!
//! The reason tag is the only failure detail that reaches the caller;
//! everything else stays in the logs.

use bytes::Bytes;
use http_body_util::Full;

use gatekeeper_core::Decision;

use crate::extract::SubrequestError;

/// Response header carrying the authenticated client id.
pub const AUTH_CLIENT_ID_HEADER: &str = "x-auth-client-id";
/// Response header carrying the authenticated client name.
pub const AUTH_CLIENT_NAME_HEADER: &str = "x-auth-client-name";
/// Response header carrying the matched route id.
pub const AUTH_ROUTE_ID_HEADER: &str = "x-auth-route-id";

/// The body type used by every adapter response.
pub type ResponseBody = Full<Bytes>;

/// Map a decision to the subrequest response the proxy consumes.
#[must_use]
pub fn decision_response(decision: &Decision) -> http::Response<ResponseBody> {
    if decision.allowed {
        let mut builder = http::Response::builder().status(http::StatusCode::OK);
        if let Some(headers) = builder.headers_mut() {
            insert_identity_headers(headers, decision);
        }
        return builder
            .body(Full::new(Bytes::new()))
            .expect("static allow response should be valid");
    }

    let status = if decision.reason.is_internal() {
        http::StatusCode::INTERNAL_SERVER_ERROR
    } else {
        http::StatusCode::FORBIDDEN
    };

    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(decision.reason.as_str().as_bytes())))
        .expect("static deny response should be valid")
}

/// 400 for a subrequest missing its proxy headers.
#[must_use]
pub fn bad_subrequest_response(error: &SubrequestError) -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::BAD_REQUEST)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from(error.to_string())))
        .expect("static bad request response should be valid")
}

/// 200 health probe response.
#[must_use]
pub fn health_response() -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from_static(
            br#"{"status":"running","service":"gatekeeper"}"#,
        )))
        .expect("static health response should be valid")
}

/// 500 for adapter-level faults (e.g. the subrequest body could not be
/// read). Engine faults go through [`decision_response`] instead.
#[must_use]
pub fn server_error_response() -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::INTERNAL_SERVER_ERROR)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(b"internal_error")))
        .expect("static server error response should be valid")
}

/// 404 for anything that is neither the authz endpoint nor the probe.
#[must_use]
pub fn not_found_response() -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::NOT_FOUND)
        .body(Full::new(Bytes::new()))
        .expect("static not found response should be valid")
}

fn insert_identity_headers(headers: &mut http::HeaderMap, decision: &Decision) {
    let pairs = [
        (AUTH_CLIENT_ID_HEADER, decision.client_id.as_deref()),
        (AUTH_CLIENT_NAME_HEADER, decision.client_name.as_deref()),
        (AUTH_ROUTE_ID_HEADER, decision.route_id.as_deref()),
    ];
    for (name, value) in pairs {
        let Some(value) = value else { continue };
        // A client name is free text; skip anything that cannot be a
        // header value rather than failing the allow.
        if let Ok(header_value) = http::header::HeaderValue::from_str(value) {
            headers.insert(name, header_value);
        }
    }
}
