//! Entity types: routes, method policies, clients, and permissions.
//!
//! These are the logical entities the decision engine reads. They are
//! created and mutated by the management surface; the engine only ever
//! consumes them through the [`Repository`](crate::repository::Repository)
//! trait. Serde derives exist so a repository can load them from a
//! declarative store file.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// HTTP method tokens accepted in route configuration and requests.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Every method token a route may configure.
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Head,
        Method::Options,
    ];

    /// Parse a method token, case-insensitively.
    ///
    /// Returns `None` for anything outside the canonical token set.
    #[must_use]
    pub fn parse(token: &str) -> Option<Method> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(token))
    }

    /// The canonical uppercase token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-method authentication rule on a route.
///
/// A missing method in the route table is a distinct state
/// (the engine denies with `method_not_configured`), so there is no
/// `NotConfigured` variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodPolicy {
    /// No authentication required.
    #[serde(rename = "public")]
    Public,
    /// An API key must be presented.
    #[serde(rename = "key")]
    RequireKey,
    /// A signature bundle must be presented.
    #[serde(rename = "signature")]
    RequireSignature,
    /// Either credential kind is accepted; a signature bundle is
    /// preferred when one is present because it also proves integrity.
    #[serde(rename = "any")]
    RequireAny,
}

impl MethodPolicy {
    /// Whether this policy requires any credential at all.
    #[must_use]
    pub fn requires_auth(self) -> bool {
        !matches!(self, MethodPolicy::Public)
    }
}

/// A protected (domain, path-family) with per-method policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Opaque stable identifier.
    pub id: String,
    /// Exact path (`/api/users`) or prefix wildcard (`/api/users/*`).
    pub pattern: String,
    /// Exact FQDN, subdomain wildcard (`*.example.com`), or `*`.
    pub domain: String,
    /// Per-method policies. Non-empty.
    pub methods: BTreeMap<Method, MethodPolicy>,
    /// Backend service label, carried through on allow.
    pub service_name: String,
    /// Audit timestamp (unix seconds). Not consulted by the engine.
    #[serde(default)]
    pub created_at: i64,
    /// Audit timestamp (unix seconds). Not consulted by the engine.
    #[serde(default)]
    pub updated_at: i64,
}

impl Route {
    /// Validate the pattern, domain, and method table invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the pattern does not start with `/`,
    /// carries a wildcard anywhere but a trailing `/*`, the domain is
    /// empty or malformed, or the method table is empty.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.pattern.starts_with('/') {
            return Err(ModelError::InvalidPattern(self.pattern.clone()));
        }
        if self.pattern.contains('*')
            && (!self.pattern.ends_with("/*") || self.pattern.matches('*').count() > 1)
        {
            return Err(ModelError::InvalidPattern(self.pattern.clone()));
        }
        if self.domain.is_empty() {
            return Err(ModelError::InvalidDomain(self.domain.clone()));
        }
        if self.domain != "*" {
            let literal = self.domain.strip_prefix("*.").unwrap_or(&self.domain);
            if literal.is_empty() || literal.contains('*') {
                return Err(ModelError::InvalidDomain(self.domain.clone()));
            }
        }
        if self.methods.is_empty() {
            return Err(ModelError::NoMethods(self.id.clone()));
        }
        Ok(())
    }

    /// Whether `path` matches this route's pattern.
    ///
    /// Wildcard patterns `PREFIX/*` match any path starting with
    /// `PREFIX/`; the bare `PREFIX` itself does not match. `/*` therefore
    /// matches every path, including `/`.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        match self.pattern.strip_suffix("/*") {
            Some(prefix) => {
                path.len() > prefix.len() && path.starts_with(prefix) && path.as_bytes()[prefix.len()] == b'/'
            }
            None => path == self.pattern,
        }
    }

    /// Whether `domain` (already lowercased by the caller, possibly
    /// empty) matches this route's domain declaration.
    #[must_use]
    pub fn matches_domain(&self, domain: &str) -> bool {
        if self.domain == "*" {
            return true;
        }
        if let Some(suffix) = self.domain.strip_prefix("*.") {
            // A subdomain wildcard requires a proper subdomain: the bare
            // suffix itself does not match.
            let dotted = format!(".{}", suffix.to_ascii_lowercase());
            return domain.ends_with(&dotted) && !domain.eq_ignore_ascii_case(suffix);
        }
        self.domain.eq_ignore_ascii_case(domain)
    }

    /// Look up the policy configured for `method`, if any.
    #[must_use]
    pub fn policy_for(&self, method: Method) -> Option<MethodPolicy> {
        self.methods.get(&method).copied()
    }
}

/// Lifecycle status of a client. Only `Active` clients authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Suspended,
    Revoked,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClientStatus::Active => "active",
            ClientStatus::Suspended => "suspended",
            ClientStatus::Revoked => "revoked",
        };
        f.write_str(s)
    }
}

/// An identified caller holding one or two credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Opaque stable identifier.
    pub id: String,
    /// Human-readable name, returned to the proxy on allow.
    pub name: String,
    /// Opaque bearer-style key. Globally unique when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Secret for the keyed-hash signature scheme. Globally unique when
    /// present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
    pub status: ClientStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Client {
    /// Validate that the client carries at least one usable credential.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NoCredentials`] when both `api_key` and
    /// `shared_secret` are absent or empty.
    pub fn validate(&self) -> Result<(), ModelError> {
        let has_key = self.api_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_secret = self.shared_secret.as_deref().is_some_and(|s| !s.is_empty());
        if !has_key && !has_secret {
            return Err(ModelError::NoCredentials(self.id.clone()));
        }
        Ok(())
    }

    /// Whether this client may authenticate at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ClientStatus::Active
    }
}

/// Grant of a method set on one route to one client.
///
/// Unique per `(client_id, route_id)`; removed transitively when either
/// referenced entity is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub client_id: String,
    pub route_id: String,
    /// Non-empty subset of the canonical method tokens.
    pub allowed_methods: BTreeSet<Method>,
}

impl Permission {
    /// Validate the non-empty method set invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NoMethods`] when `allowed_methods` is empty.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.allowed_methods.is_empty() {
            return Err(ModelError::NoMethods(format!(
                "{}:{}",
                self.client_id, self.route_id
            )));
        }
        Ok(())
    }

    /// Whether `method` is in the granted set.
    #[must_use]
    pub fn allows(&self, method: Method) -> bool {
        self.allowed_methods.contains(&method)
    }
}
