//! Credential extraction from request headers and query parameters.
//!
//! Recognized forms:
//!
//! - `Authorization: Bearer <token>`, `Authorization: ApiKey <token>`,
//!   or a bare token → API key.
//! - `X-Signature` + `X-Timestamp` + `X-Body-Hash` → signature bundle.
//!   A partial bundle, or one with a non-integer timestamp, counts as
//!   no bundle.
//! - `api_key=<token>` query parameter, equivalent to the header form.
//!   The header wins when both are present.
//! - `X-Client-Id` → optional hint narrowing signature secret
//!   discovery to one indexed lookup.
//!
//! Header lookups are case-insensitive; tokens are opaque and never
//! normalized; empty values are treated as absent.

use std::collections::HashMap;

use http::HeaderMap;

/// Header carrying the hex HMAC signature.
pub const SIGNATURE_HEADER: &str = "x-signature";
/// Header carrying the decimal unix-seconds timestamp.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
/// Header carrying the lowercase hex SHA-256 of the body.
pub const BODY_HASH_HEADER: &str = "x-body-hash";
/// Optional header identifying the signing client.
pub const CLIENT_ID_HEADER: &str = "x-client-id";
/// Query parameter accepted as an API key.
pub const API_KEY_PARAM: &str = "api_key";

/// The signature triple carried as request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBundle {
    /// Hex HMAC-SHA-256 signature, as received.
    pub signature: String,
    /// Timestamp string exactly as received; it is part of the signed
    /// canonical string, so the raw form is preserved.
    pub timestamp_raw: String,
    /// The timestamp parsed as unix seconds, for freshness checks.
    pub timestamp: i64,
    /// Claimed lowercase hex SHA-256 of the body.
    pub body_hash: String,
}

/// Everything credential-shaped found on a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub signature: Option<SignatureBundle>,
    pub client_hint: Option<String>,
}

/// Extract credentials from headers and query parameters. Pure; never
/// fails — unrecognized or malformed material is simply absent.
#[must_use]
pub fn extract(headers: &HeaderMap, query: &HashMap<String, String>) -> Credentials {
    Credentials {
        api_key: api_key_from_headers(headers).or_else(|| api_key_from_query(query)),
        signature: signature_bundle(headers),
        client_hint: header_value(headers, CLIENT_ID_HEADER).map(ToOwned::to_owned),
    }
}

/// A trimmed, non-empty header value.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// API key from the `Authorization` header: `Bearer <t>`, `ApiKey <t>`,
/// or a bare token.
fn api_key_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth = header_value(headers, http::header::AUTHORIZATION.as_str())?;

    for prefix in ["bearer ", "apikey "] {
        if auth.len() > prefix.len() && auth[..prefix.len()].eq_ignore_ascii_case(prefix) {
            let token = auth[prefix.len()..].trim();
            return if token.is_empty() {
                None
            } else {
                Some(token.to_owned())
            };
        }
    }

    Some(auth.to_owned())
}

/// API key from the `api_key` query parameter, case-insensitive on the
/// parameter name.
fn api_key_from_query(query: &HashMap<String, String>) -> Option<String> {
    query
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(API_KEY_PARAM))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// The complete signature triple, or `None` when any part is missing,
/// empty, or the timestamp is not a decimal integer.
fn signature_bundle(headers: &HeaderMap) -> Option<SignatureBundle> {
    let signature = header_value(headers, SIGNATURE_HEADER)?;
    let timestamp_raw = header_value(headers, TIMESTAMP_HEADER)?;
    let body_hash = header_value(headers, BODY_HASH_HEADER)?;
    let timestamp: i64 = timestamp_raw.parse().ok()?;

    Some(SignatureBundle {
        signature: signature.to_owned(),
        timestamp_raw: timestamp_raw.to_owned(),
        timestamp,
        body_hash: body_hash.to_owned(),
    })
}
