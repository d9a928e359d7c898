//! Configuration for the gatekeeper service.
//!
//! All configuration is driven by environment variables.

/// Global configuration for the service.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Bind address for the HTTP listener.
    pub listen: String,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Path to the JSON store file for the in-memory repository.
    pub store_path: String,
    /// Maximum accepted deviation between a signature timestamp and the
    /// wall clock, in seconds.
    pub timestamp_tolerance_secs: i64,
    /// Per-decision deadline, in milliseconds. Every repository call in
    /// a single authorization shares this budget.
    pub decision_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8090".to_owned(),
            log_level: "info".to_owned(),
            store_path: "gatekeeper.json".to_owned(),
            timestamp_tolerance_secs: 300,
            decision_timeout_ms: 2_000,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEKEEPER_LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("GATEKEEPER_STORE") {
            config.store_path = v;
        }
        if let Ok(v) = std::env::var("TIMESTAMP_TOLERANCE_SECS") {
            if let Ok(secs) = v.parse() {
                config.timestamp_tolerance_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("DECISION_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                config.decision_timeout_ms = ms;
            }
        }

        config
    }
}
