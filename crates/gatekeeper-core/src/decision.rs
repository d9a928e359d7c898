//! The decision model returned by the authorization engine.
//!
//! Every authorization produces exactly one [`Decision`] carrying exactly
//! one [`Reason`]. The reason tag is part of the service contract:
//! observability dashboards key on the tag strings, so the vocabulary is
//! closed and the strings are stable.

use std::fmt;

/// Cause attached to an `internal_error` decision.
///
/// The wire tag stays `internal_error`; the cause is for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalCause {
    /// The pipeline deadline elapsed during a repository call.
    Timeout,
    /// A repository call failed.
    RepositoryError,
    /// The pipeline panicked and the panic was contained.
    Panic,
}

impl fmt::Display for InternalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InternalCause::Timeout => "timeout",
            InternalCause::RepositoryError => "repository_error",
            InternalCause::Panic => "panic",
        };
        f.write_str(s)
    }
}

/// Closed vocabulary of decision reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    // Configuration denials.
    NoRoute,
    MethodNotConfigured,
    // Credential denials.
    MissingCredentials,
    InvalidCredentials,
    InvalidSignature,
    SignatureExpired,
    BodyTampered,
    // Identity denials.
    ClientSuspended,
    ClientRevoked,
    // Authorization denials.
    NoPermission,
    MethodNotAllowed,
    // Allows.
    NoAuthRequired,
    Authenticated,
    // System fault. The cause never reaches the wire tag.
    Internal(InternalCause),
}

impl Reason {
    /// The stable wire tag for this reason.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::NoRoute => "no_route",
            Reason::MethodNotConfigured => "method_not_configured",
            Reason::MissingCredentials => "missing_credentials",
            Reason::InvalidCredentials => "invalid_credentials",
            Reason::InvalidSignature => "invalid_signature",
            Reason::SignatureExpired => "signature_expired",
            Reason::BodyTampered => "body_tampered",
            Reason::ClientSuspended => "client_suspended",
            Reason::ClientRevoked => "client_revoked",
            Reason::NoPermission => "no_permission",
            Reason::MethodNotAllowed => "method_not_allowed",
            Reason::NoAuthRequired => "no_auth_required",
            Reason::Authenticated => "authenticated",
            Reason::Internal(_) => "internal_error",
        }
    }

    /// Whether this reason represents a system fault rather than a
    /// policy outcome.
    #[must_use]
    pub fn is_internal(self) -> bool {
        matches!(self, Reason::Internal(_))
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Reason,
    /// Set on allow and on identity/authorization denials.
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    /// Set on every decision made after a route matched.
    pub route_id: Option<String>,
}

impl Decision {
    /// Allow without authentication (public method policy).
    #[must_use]
    pub fn allow_public(route_id: impl Into<String>) -> Self {
        Decision {
            allowed: true,
            reason: Reason::NoAuthRequired,
            client_id: None,
            client_name: None,
            route_id: Some(route_id.into()),
        }
    }

    /// Allow for an authenticated, permitted client.
    #[must_use]
    pub fn allow_authenticated(
        client_id: impl Into<String>,
        client_name: impl Into<String>,
        route_id: impl Into<String>,
    ) -> Self {
        Decision {
            allowed: true,
            reason: Reason::Authenticated,
            client_id: Some(client_id.into()),
            client_name: Some(client_name.into()),
            route_id: Some(route_id.into()),
        }
    }

    /// Deny before any route matched.
    #[must_use]
    pub fn deny(reason: Reason) -> Self {
        Decision {
            allowed: false,
            reason,
            client_id: None,
            client_name: None,
            route_id: None,
        }
    }

    /// Attach the matched route id.
    #[must_use]
    pub fn with_route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Attach the resolved client identity.
    #[must_use]
    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        client_name: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_name = Some(client_name.into());
        self
    }

    /// An `internal_error` decision with the given cause.
    #[must_use]
    pub fn internal(cause: InternalCause) -> Self {
        Decision::deny(Reason::Internal(cause))
    }

    /// The internal cause, when this decision is a system fault.
    #[must_use]
    pub fn internal_cause(&self) -> Option<InternalCause> {
        match self.reason {
            Reason::Internal(cause) => Some(cause),
            _ => None,
        }
    }
}
