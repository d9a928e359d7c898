//! Error types for signature verification.

/// Failures produced while verifying a signature bundle.
///
/// The ordering of checks is fixed: signature match first, then
/// timestamp freshness, then body integrity. A caller missing the
/// secret therefore learns nothing about which of its other inputs was
/// wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// No candidate secret produced a matching signature.
    #[error("signature does not match any candidate secret")]
    SignatureMismatch,

    /// The signature matched but the timestamp is outside the
    /// freshness window.
    #[error("signature timestamp outside the freshness window")]
    Expired,

    /// The signature matched and is fresh, but the body digest does not
    /// match the signed digest.
    #[error("body digest does not match the signed digest")]
    BodyMismatch,
}
