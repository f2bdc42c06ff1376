//! CloudMock Server - in-memory mock AWS services behind one endpoint.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:4566 cloudmock-server
//! cloudmock-server --health-check
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:4566` | Bind address |
//! | `SERVICES` | *(empty = all)* | Comma-separated list of services to enable |
//! | `DEFAULT_REGION` | `us-east-1` | Region reported in ARNs and URLs |
//! | `DEFAULT_ACCOUNT_ID` | `000000000000` | Account owning every resource |
//! | `LOCALSTACK_HOST` | `localhost.localstack.cloud:4566` | Host used in generated URLs |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::time::Duration;

use anyhow::{Context, Result};
use cloudmock_core::CloudMockConfig;
use cloudmock_gateway::{Gateway, VERSION, serve};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
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

/// Upper bound for the whole `--health-check` probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Probe a running server's health endpoint (used by Docker `HEALTHCHECK`).
///
/// Healthy means a `200` status line and at least one service reported as
/// `"running"`.
async fn probe_health(addr: &str) -> Result<()> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let request =
        format!("GET /_localstack/health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;

    let status_ok = response
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        == Some("200");
    if status_ok && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CloudMockConfig::from_env().context("invalid configuration")?;

    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = matches!(
            tokio::time::timeout(PROBE_TIMEOUT, probe_health(&addr)).await,
            Ok(Ok(()))
        );
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    for name in &config.services {
        if !is_builtin(name) {
            warn!(service = %name, "requested service is not built in, skipping");
        }
    }

    let gateway = Gateway::builder(&config)
        .build()
        .context("failed to build service registry")?;
    if gateway.registry().is_empty() {
        anyhow::bail!("no services enabled; check the SERVICES variable");
    }

    let listener = TcpListener::bind(&config.gateway_listen)
        .await
        .with_context(|| format!("failed to bind {}", config.gateway_listen))?;

    info!(
        version = VERSION,
        addr = %config.gateway_listen,
        region = %config.default_region,
        services = ?gateway.service_names(),
        "cloudmock server listening",
    );

    serve(listener, gateway, async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    })
    .await;

    info!("server stopped");
    Ok(())
}

fn is_builtin(name: &str) -> bool {
    cloudmock_services::BUILTIN_NAMES.contains(&name)
}
