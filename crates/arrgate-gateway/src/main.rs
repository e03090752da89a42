//! arrgate request gateway entry point.
//!
//! Loads [`GatewaySettings`] from the environment (and the optional file
//! named by `ARRGATE_CONFIG`), initialises logging and serves the gateway.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ARRGATE_PORT` / `PORT` | `3050` | TCP port to listen on. |
//! | `ARRGATE_HOST` | `0.0.0.0` | Bind address. |
//! | `ARRGATE_ISOLATED` / `DOCKER_ENV` | `false` | Running inside a container; loopback targets go through the bridge host. |
//! | `ARRGATE_BRIDGE_HOST` | `host.docker.internal` | Hostname reaching the host machine. |
//! | `ARRGATE_REQUEST_TIMEOUT_MS` | `10000` | Per-call timeout. |
//! | `ARRGATE_LOG_FORMAT` | `pretty` | `pretty` or `json`. |
//! | `RUST_LOG` | `arrgate_gateway=info` | Log filter. |

use anyhow::Context;
use arrgate_gateway::server::GatewayServer;
use arrgate_kernel::config::{GatewaySettings, LogFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = GatewaySettings::from_process_env().context("failed to load gateway settings")?;

    // Initialise structured logging.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("arrgate_gateway=info,tower_http=info"));
    match settings.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    if settings.isolated {
        tracing::info!(
            bridge_host = %settings.bridge_host,
            "isolated network mode: loopback targets will be dialed through the bridge host"
        );
    }

    let server = GatewayServer::new(settings).context("failed to build gateway")?;
    server.start().await.context("gateway server error")?;
    Ok(())
}
