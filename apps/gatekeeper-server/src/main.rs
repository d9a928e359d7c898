//! Gatekeeper server - out-of-band authorization for edge proxies.
//!
//! Point an nginx `auth_request` (or equivalent) at `/authz` and this
//! binary answers allow/deny for every protected request, reading
//! routes, clients, and permissions from a JSON store file.
//!
//! # Usage
//!
//! ```text
//! GATEKEEPER_STORE=gatekeeper.json GATEKEEPER_LISTEN=0.0.0.0:8090 gatekeeper-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEKEEPER_LISTEN` | `0.0.0.0:8090` | Bind address |
//! | `GATEKEEPER_STORE` | `gatekeeper.json` | Store file path |
//! | `TIMESTAMP_TOLERANCE_SECS` | `300` | Signature freshness window |
//! | `DECISION_TIMEOUT_MS` | `2000` | Per-decision deadline |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gatekeeper_auth::{SignatureVerifier, SystemClock};
use gatekeeper_core::{MemoryRepository, ServiceConfig};
use gatekeeper_engine::Authorizer;
use gatekeeper_http::{GatekeeperService, HttpConfig};

/// Server version reported in startup logs.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL`
/// config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load the repository from the configured store file.
fn load_repository(config: &ServiceConfig) -> Result<Arc<MemoryRepository>> {
    let raw = std::fs::read_to_string(&config.store_path)
        .with_context(|| format!("cannot read store file {}", config.store_path))?;
    let repository = MemoryRepository::from_json(&raw)
        .with_context(|| format!("invalid store file {}", config.store_path))?;
    Ok(Arc::new(repository))
}

/// Run the accept loop, serving connections until a shutdown signal is
/// received.
async fn serve(listener: TcpListener, service: GatekeeperService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the listener and requesting
/// the probe endpoint. Exits 0 when the service answers 200.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    let repository = load_repository(&config)?;
    info!(
        store = %config.store_path,
        routes = repository.route_count(),
        clients = repository.client_count(),
        "loaded authorization store"
    );

    let verifier = SignatureVerifier::new(
        config.timestamp_tolerance_secs,
        Arc::new(SystemClock),
    );
    let authorizer = Authorizer::new(repository, verifier);

    let http_config = HttpConfig {
        decision_timeout: std::time::Duration::from_millis(config.decision_timeout_ms),
    };
    let service = GatekeeperService::new(authorizer, http_config);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        timestamp_tolerance_secs = config.timestamp_tolerance_secs,
        decision_timeout_ms = config.decision_timeout_ms,
        version = VERSION,
        "starting gatekeeper server",
    );

    serve(listener, service).await
}
