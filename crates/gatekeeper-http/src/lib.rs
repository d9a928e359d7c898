//! HTTP adapter exposing the gatekeeper decision engine to an edge
//! reverse proxy's subrequest mechanism.
//!
//! The proxy forwards the original request's coordinates in
//! `X-Original-URI` / `X-Original-Method` / `X-Original-Host` headers;
//! the adapter decodes them, runs the engine under a deadline, and
//! answers 200 (with identity headers), 403 (with the reason tag), or
//! 500.
//!
//! Boundary note: the adapter strips the query string from the original
//! URI before the engine sees it. The stripped path is both the
//! route-matching subject and the canonical signing PATH.

pub mod extract;
pub mod response;
pub mod service;

pub use extract::{OriginalRequest, SubrequestError};
pub use response::{decision_response, ResponseBody};
pub use service::{handle_request, GatekeeperService, HttpConfig, AUTHZ_PATH, HEALTH_PATH};
