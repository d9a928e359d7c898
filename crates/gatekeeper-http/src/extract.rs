//! Translation of proxy subrequest headers into engine inputs.
//!
//! The edge proxy forwards the original request's coordinates in
//! headers:
//!
//! - `X-Original-URI` (required) — path plus optional query string
//! - `X-Original-Method` (required) — method token
//! - `X-Original-Host` (optional) — host, possibly with a `:port`
//!
//! The query string is stripped from the URI before the engine sees
//! it: the remaining path is both the route-matching subject and the
//! canonical signing PATH, so signers must sign the path without the
//! query string. Query parameter values are percent-decoded; the host
//! is lowercased with any port suffix removed.

use std::collections::HashMap;

use http::HeaderMap;
use percent_encoding::percent_decode_str;

use gatekeeper_core::Method;

/// Header carrying the original request URI.
pub const ORIGINAL_URI_HEADER: &str = "x-original-uri";
/// Header carrying the original request method.
pub const ORIGINAL_METHOD_HEADER: &str = "x-original-method";
/// Header carrying the original request host.
pub const ORIGINAL_HOST_HEADER: &str = "x-original-host";

/// A malformed subrequest. Rejected with 400 before the engine runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubrequestError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid method token: {0}")]
    InvalidMethod(String),
}

/// The original request's coordinates, decoded from subrequest headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalRequest {
    pub method: Method,
    /// Path with the query string stripped.
    pub path: String,
    /// Parsed query parameters; later duplicates win.
    pub query: HashMap<String, String>,
    /// Lowercased host without port, when the proxy supplied one.
    pub domain: Option<String>,
}

/// Decode the original request coordinates from subrequest headers.
///
/// # Errors
///
/// Returns [`SubrequestError`] when `X-Original-URI` or
/// `X-Original-Method` is missing or the method token is not
/// recognized.
pub fn original_request(headers: &HeaderMap) -> Result<OriginalRequest, SubrequestError> {
    let uri = required_header(headers, ORIGINAL_URI_HEADER)?;
    let method_token = required_header(headers, ORIGINAL_METHOD_HEADER)?;

    let method = Method::parse(method_token)
        .ok_or_else(|| SubrequestError::InvalidMethod(method_token.to_owned()))?;

    let (path, query_string) = split_uri(uri);
    let query = parse_query(query_string);

    let domain = headers
        .get(ORIGINAL_HOST_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(domain_from_host);

    Ok(OriginalRequest {
        method,
        path: path.to_owned(),
        query,
        domain,
    })
}

fn required_header<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, SubrequestError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(SubrequestError::MissingHeader(name))
}

/// Split a request URI into path and query string.
fn split_uri(uri: &str) -> (&str, &str) {
    match uri.split_once('?') {
        Some((path, query)) => (path, query),
        None => (uri, ""),
    }
}

/// Parse `k=v&k2=v2` pairs, percent-decoding values. Pairs without a
/// `=` are ignored.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| {
            (
                name.to_owned(),
                percent_decode_str(value).decode_utf8_lossy().into_owned(),
            )
        })
        .collect()
}

/// Lowercase a host header value and strip any `:port` suffix.
/// Bracketed IPv6 literals keep their full address.
fn domain_from_host(host: &str) -> String {
    let without_port = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.split(':').next().unwrap_or(host)
    };
    without_port.to_ascii_lowercase()
}
