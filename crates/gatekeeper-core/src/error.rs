//! Error types for the gatekeeper core.

/// Validation failures on entity invariants.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Route pattern is not `/`-anchored or misuses the wildcard.
    #[error("invalid route pattern: {0} (must start with / and may end with a single /*)")]
    InvalidPattern(String),

    /// Route domain is empty or malformed.
    #[error("invalid route domain: {0} (must be an FQDN, *.suffix, or *)")]
    InvalidDomain(String),

    /// A route or permission declares no methods.
    #[error("no methods configured for {0}")]
    NoMethods(String),

    /// A client declares neither an API key nor a shared secret.
    #[error("client {0} has no credentials")]
    NoCredentials(String),

    /// An unrecognized HTTP method token.
    #[error("unknown HTTP method token: {0}")]
    UnknownMethod(String),

    /// A credential or identifier collides with an existing entity.
    #[error("duplicate {kind}: {value}")]
    Duplicate {
        /// What collided (`route id`, `api key`, ...).
        kind: &'static str,
        value: String,
    },
}

/// Failures surfaced by repository implementations.
///
/// The engine maps every repository failure to an `internal_error`
/// decision; the variants here exist for logs and for repository-level
/// tests.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store rejected or could not serve the query.
    #[error("repository query failed: {0}")]
    Query(String),

    /// The store file or seed data violates a model invariant.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Anything else, with context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience result alias for repository calls.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
