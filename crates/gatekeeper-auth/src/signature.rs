//! Keyed-hash signature verification.
//!
//! The wire protocol:
//!
//! ```text
//! canonical string = METHOD "\n" PATH "\n" TIMESTAMP "\n" BODY_HASH
//! X-Signature      = lowercase hex HMAC-SHA-256(shared_secret, canonical string)
//! X-Timestamp      = decimal unix seconds at signing time
//! X-Body-Hash      = lowercase hex SHA-256(body)
//! ```
//!
//! METHOD is uppercase, PATH is the request path as the adapter
//! supplies it, TIMESTAMP is the raw decimal string as received, and
//! there is no trailing newline. The verifier recomputes the expected
//! signature for each candidate secret and compares in constant time,
//! then checks timestamp freshness against the injected clock, then
//! body integrity. The check order is fixed so that a caller without
//! the secret cannot learn which of its other inputs was wrong.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use gatekeeper_core::SecretCandidate;

use crate::clock::Clock;
use crate::credentials::SignatureBundle;
use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Default freshness window, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Build the canonical string that signer and verifier agree to hash.
#[must_use]
pub fn canonical_string(method: &str, path: &str, timestamp: &str, body_hash: &str) -> String {
    format!(
        "{}\n{path}\n{timestamp}\n{body_hash}",
        method.to_ascii_uppercase()
    )
}

/// Lowercase hex HMAC-SHA-256 of `canonical` keyed by `secret`.
#[must_use]
pub fn compute_signature(secret: &str, canonical: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Lowercase hex SHA-256 of a request body.
#[must_use]
pub fn hash_body(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Constant-time equality over equal-length inputs; unequal lengths
/// fail immediately.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    // ct_eq on differing lengths returns false without comparing, which
    // is the length pre-check this scheme requires.
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verifies signature bundles against candidate secrets.
#[derive(Clone)]
pub struct SignatureVerifier {
    tolerance_secs: i64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    /// A verifier with the given freshness window and clock.
    #[must_use]
    pub fn new(tolerance_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            tolerance_secs,
            clock,
        }
    }

    /// Verify a bundle against the candidate secrets.
    ///
    /// Returns the candidate whose secret produced the signature. Per
    /// candidate the checks run in the fixed order signature →
    /// freshness → body; the first candidate whose signature matches is
    /// authoritative for the remaining checks.
    ///
    /// # Errors
    ///
    /// [`SignatureError::SignatureMismatch`] when no candidate secret
    /// reproduces the signature, [`SignatureError::Expired`] when the
    /// matched signature's timestamp is outside the window, and
    /// [`SignatureError::BodyMismatch`] when the body digest does not
    /// match the signed digest.
    pub fn verify(
        &self,
        method: &str,
        path: &str,
        bundle: &SignatureBundle,
        body: &[u8],
        candidates: &[SecretCandidate],
    ) -> Result<SecretCandidate, SignatureError> {
        let canonical = canonical_string(method, path, &bundle.timestamp_raw, &bundle.body_hash);

        for candidate in candidates {
            let expected = compute_signature(&candidate.shared_secret, &canonical);
            if !constant_time_eq(&expected, &bundle.signature) {
                continue;
            }

            debug!(client_id = %candidate.client_id, "signature matched candidate secret");

            let now = self.clock.now_unix();
            if (now - bundle.timestamp).abs() > self.tolerance_secs {
                debug!(
                    client_id = %candidate.client_id,
                    timestamp = bundle.timestamp,
                    now,
                    tolerance_secs = self.tolerance_secs,
                    "signature timestamp outside freshness window"
                );
                return Err(SignatureError::Expired);
            }

            if !constant_time_eq(&hash_body(body), &bundle.body_hash) {
                debug!(client_id = %candidate.client_id, "body digest mismatch");
                return Err(SignatureError::BodyMismatch);
            }

            return Ok(candidate.clone());
        }

        Err(SignatureError::SignatureMismatch)
    }
}
