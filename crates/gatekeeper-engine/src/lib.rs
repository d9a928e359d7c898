//! The gatekeeper decision engine: route matching plus the
//! authorization pipeline.
//!
//! The engine is stateless across requests and performs no
//! cross-request coordination; it is parameterized over a read-only
//! [`Repository`](gatekeeper_core::Repository) supplied by the caller.
//! Every call to [`Authorizer::authorize`] returns a typed
//! [`Decision`](gatekeeper_core::Decision) — there is no error path
//! visible to the adapter.

pub mod authorizer;
pub mod matcher;

pub use authorizer::{AuthRequest, Authorizer};
pub use matcher::select_route;
