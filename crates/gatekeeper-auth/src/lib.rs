//! Credential extraction and the keyed-hash signature protocol for
//! gatekeeper.
//!
//! This crate is pure: it performs no I/O and holds no storage. The
//! engine feeds it request material and repository-supplied secret
//! candidates.
//!
//! # Modules
//!
//! - [`credentials`] - API key and signature bundle extraction from
//!   headers and query parameters
//! - [`signature`] - canonical string construction and HMAC-SHA-256
//!   verification with constant-time comparison
//! - [`signer`] - client-side signing for SDKs and tests
//! - [`clock`] - injectable wall clock
//! - [`error`] - signature verification error types

pub mod clock;
pub mod credentials;
pub mod error;
pub mod signature;
pub mod signer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::{Credentials, SignatureBundle};
pub use error::SignatureError;
pub use signature::{
    canonical_string, compute_signature, constant_time_eq, hash_body, SignatureVerifier,
    DEFAULT_TOLERANCE_SECS,
};
pub use signer::{RequestSigner, SignedHeaders};
