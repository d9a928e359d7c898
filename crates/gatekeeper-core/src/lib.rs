//! Core data model and contracts for the gatekeeper authorization
//! service.
//!
//! This crate defines the entities the decision engine reads (routes,
//! clients, permissions), the [`Decision`] model it produces, the
//! read-only [`Repository`] contract it is parameterized over, and an
//! in-memory repository implementation backed by a JSON store file.
//!
//! The engine itself lives in `gatekeeper-engine`; credential and
//! signature handling in `gatekeeper-auth`.

pub mod config;
pub mod decision;
pub mod error;
pub mod memory;
pub mod repository;
pub mod types;

pub use config::ServiceConfig;
pub use decision::{Decision, InternalCause, Reason};
pub use error::{ModelError, RepositoryError, RepositoryResult};
pub use memory::{MemoryRepository, StoreFile};
pub use repository::{RepoFuture, Repository, SecretCandidate};
pub use types::{Client, ClientStatus, Method, MethodPolicy, Permission, Route};
