//! In-memory repository backed by a declarative JSON store file.
//!
//! This is the repository used by the server binary and the test
//! suites. Entities live in `parking_lot`-guarded tables: decisions only
//! take read locks, management mutations take the write lock. Uniqueness
//! invariants (route ids, API keys, shared secrets, one permission per
//! client/route pair) are enforced on load and on every insert.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::repository::{RepoFuture, Repository, SecretCandidate};
use crate::types::{Client, Permission, Route};

/// Serialized shape of the store file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFile {
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Default)]
struct Tables {
    routes: HashMap<String, Route>,
    clients: HashMap<String, Client>,
    permissions: HashMap<(String, String), Permission>,
}

/// Repository implementation holding all entities in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: RwLock<Tables>,
}

impl MemoryRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from a parsed store file, validating every
    /// entity and the cross-entity uniqueness invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] for the first invalid or colliding entity.
    pub fn from_store(store: StoreFile) -> Result<Self, ModelError> {
        let repo = Self::new();
        for route in store.routes {
            repo.insert_route(route)?;
        }
        for client in store.clients {
            repo.insert_client(client)?;
        }
        for permission in store.permissions {
            repo.grant_permission(permission)?;
        }
        Ok(repo)
    }

    /// Parse a JSON store document and build a repository from it.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not valid JSON or any
    /// entity violates an invariant.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let store: StoreFile = serde_json::from_str(json)?;
        Ok(Self::from_store(store)?)
    }

    /// Number of configured routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.inner.read().routes.len()
    }

    /// Number of configured clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.inner.read().clients.len()
    }

    /// Insert a route, generating an id when none is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the route is invalid or its id
    /// collides.
    pub fn insert_route(&self, mut route: Route) -> Result<String, ModelError> {
        if route.id.is_empty() {
            route.id = uuid::Uuid::new_v4().to_string();
        }
        route.validate()?;
        let mut tables = self.inner.write();
        if tables.routes.contains_key(&route.id) {
            return Err(ModelError::Duplicate {
                kind: "route id",
                value: route.id,
            });
        }
        debug!(route_id = %route.id, pattern = %route.pattern, domain = %route.domain, "route registered");
        let id = route.id.clone();
        tables.routes.insert(id.clone(), route);
        Ok(id)
    }

    /// Insert a client, generating an id when none is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the client is invalid or its id,
    /// API key, or shared secret collides.
    pub fn insert_client(&self, mut client: Client) -> Result<String, ModelError> {
        if client.id.is_empty() {
            client.id = uuid::Uuid::new_v4().to_string();
        }
        client.validate()?;
        let mut tables = self.inner.write();
        if tables.clients.contains_key(&client.id) {
            return Err(ModelError::Duplicate {
                kind: "client id",
                value: client.id,
            });
        }
        if let Some(key) = client.api_key.as_deref() {
            if tables.clients.values().any(|c| c.api_key.as_deref() == Some(key)) {
                return Err(ModelError::Duplicate {
                    kind: "api key",
                    value: key.to_owned(),
                });
            }
        }
        if let Some(secret) = client.shared_secret.as_deref() {
            if tables
                .clients
                .values()
                .any(|c| c.shared_secret.as_deref() == Some(secret))
            {
                return Err(ModelError::Duplicate {
                    kind: "shared secret",
                    value: secret.to_owned(),
                });
            }
        }
        debug!(client_id = %client.id, name = %client.name, status = %client.status, "client registered");
        let id = client.id.clone();
        tables.clients.insert(id.clone(), client);
        Ok(id)
    }

    /// Grant a permission. Unique per `(client_id, route_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the permission is invalid or the
    /// pair already holds one.
    pub fn grant_permission(&self, permission: Permission) -> Result<(), ModelError> {
        permission.validate()?;
        let mut tables = self.inner.write();
        let key = (permission.client_id.clone(), permission.route_id.clone());
        if tables.permissions.contains_key(&key) {
            return Err(ModelError::Duplicate {
                kind: "permission",
                value: format!("{}:{}", key.0, key.1),
            });
        }
        tables.permissions.insert(key, permission);
        Ok(())
    }

    /// Remove a route and, transitively, every permission referencing it.
    ///
    /// Returns whether the route existed.
    pub fn remove_route(&self, route_id: &str) -> bool {
        let mut tables = self.inner.write();
        let existed = tables.routes.remove(route_id).is_some();
        if existed {
            tables.permissions.retain(|(_, rid), _| rid != route_id);
        }
        existed
    }

    /// Remove a client and, transitively, every permission referencing it.
    ///
    /// Returns whether the client existed.
    pub fn remove_client(&self, client_id: &str) -> bool {
        let mut tables = self.inner.write();
        let existed = tables.clients.remove(client_id).is_some();
        if existed {
            tables.permissions.retain(|(cid, _), _| cid != client_id);
        }
        existed
    }

    /// Replace a client's lifecycle status. Returns whether the client
    /// existed.
    pub fn set_client_status(&self, client_id: &str, status: crate::types::ClientStatus) -> bool {
        let mut tables = self.inner.write();
        match tables.clients.get_mut(client_id) {
            Some(client) => {
                client.status = status;
                true
            }
            None => false,
        }
    }
}

impl Repository for MemoryRepository {
    fn candidate_routes<'a>(
        &'a self,
        _domain: &'a str,
        path: &'a str,
    ) -> RepoFuture<'a, Vec<Route>> {
        // Path filter only; domain filtering and ordering belong to the
        // matcher.
        let routes: Vec<Route> = self
            .inner
            .read()
            .routes
            .values()
            .filter(|r| r.matches_path(path))
            .cloned()
            .collect();
        Box::pin(async move { Ok(routes) })
    }

    fn client_by_api_key<'a>(&'a self, api_key: &'a str) -> RepoFuture<'a, Option<Client>> {
        let client = self
            .inner
            .read()
            .clients
            .values()
            .find(|c| c.api_key.as_deref() == Some(api_key))
            .cloned();
        Box::pin(async move { Ok(client) })
    }

    fn client_by_shared_secret<'a>(
        &'a self,
        shared_secret: &'a str,
    ) -> RepoFuture<'a, Option<Client>> {
        let client = self
            .inner
            .read()
            .clients
            .values()
            .find(|c| c.shared_secret.as_deref() == Some(shared_secret))
            .cloned();
        Box::pin(async move { Ok(client) })
    }

    fn candidate_secrets<'a>(
        &'a self,
        client_hint: Option<&'a str>,
    ) -> RepoFuture<'a, Vec<SecretCandidate>> {
        let tables = self.inner.read();
        let candidates: Vec<SecretCandidate> = match client_hint {
            Some(id) => tables
                .clients
                .get(id)
                .and_then(|c| {
                    c.shared_secret.as_ref().map(|secret| SecretCandidate {
                        client_id: c.id.clone(),
                        shared_secret: secret.clone(),
                    })
                })
                .into_iter()
                .collect(),
            None => tables
                .clients
                .values()
                .filter_map(|c| {
                    c.shared_secret.as_ref().map(|secret| SecretCandidate {
                        client_id: c.id.clone(),
                        shared_secret: secret.clone(),
                    })
                })
                .collect(),
        };
        drop(tables);
        Box::pin(async move { Ok(candidates) })
    }

    fn permission<'a>(
        &'a self,
        client_id: &'a str,
        route_id: &'a str,
    ) -> RepoFuture<'a, Option<Permission>> {
        let permission = self
            .inner
            .read()
            .permissions
            .get(&(client_id.to_owned(), route_id.to_owned()))
            .cloned();
        Box::pin(async move { Ok(permission) })
    }
}
