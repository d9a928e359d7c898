//! Client-side request signing.
//!
//! Produces the header set the verifier expects. Intended for SDKs,
//! example code, and the test suites; the service itself never signs.

use http::HeaderMap;

use crate::clock::{Clock, SystemClock};
use crate::credentials::{BODY_HASH_HEADER, CLIENT_ID_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::signature::{canonical_string, compute_signature, hash_body};

/// The header values produced by one signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub signature: String,
    pub timestamp: String,
    pub body_hash: String,
    /// Present when the signer was configured with a client id.
    pub client_id: Option<String>,
}

impl SignedHeaders {
    /// Insert the signature headers into a header map.
    ///
    /// # Panics
    ///
    /// Panics if a value is not a valid header value; signing output is
    /// always hex/decimal, so this only fires for a pathological
    /// client id.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(SIGNATURE_HEADER, self.signature.parse().expect("hex value"));
        headers.insert(TIMESTAMP_HEADER, self.timestamp.parse().expect("decimal value"));
        headers.insert(BODY_HASH_HEADER, self.body_hash.parse().expect("hex value"));
        if let Some(client_id) = &self.client_id {
            headers.insert(
                CLIENT_ID_HEADER,
                client_id.parse().expect("client id must be a valid header value"),
            );
        }
    }
}

/// Signs requests with a client's shared secret.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    secret: String,
    client_id: Option<String>,
}

impl RequestSigner {
    /// A signer for the given shared secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            client_id: None,
        }
    }

    /// Also emit `X-Client-Id`, letting the verifier resolve the secret
    /// with a single indexed lookup.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sign at an explicit timestamp (unix seconds).
    #[must_use]
    pub fn sign_at(&self, method: &str, path: &str, body: &[u8], timestamp: i64) -> SignedHeaders {
        let timestamp = timestamp.to_string();
        let body_hash = hash_body(body);
        let signature = compute_signature(
            &self.secret,
            &canonical_string(method, path, &timestamp, &body_hash),
        );
        SignedHeaders {
            signature,
            timestamp,
            body_hash,
            client_id: self.client_id.clone(),
        }
    }

    /// Sign at the current wall time.
    #[must_use]
    pub fn sign(&self, method: &str, path: &str, body: &[u8]) -> SignedHeaders {
        self.sign_at(method, path, body, SystemClock.now_unix())
    }
}
