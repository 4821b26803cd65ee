//! Xahod Daemon
//!
//! Serves the dashboard entity stores over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Start with sample data
//! cargo run -p xahodd
//!
//! # Start against a data API
//! XAHOD_DATA_API_URL=http://localhost:4280 XAHOD_API_PORT=8081 cargo run -p xahodd
//! ```
//!
//! # Environment Variables
//!
//! - `XAHOD_ENV`: Environment (test, development, production)
//! - `XAHOD_API_HOST`: API host (default: 0.0.0.0)
//! - `XAHOD_API_PORT`: API port (default: 8080)
//! - `XAHOD_DATA_API_URL`: Data API base URL (required in production)
//! - `XAHOD_AUTH_TOKEN`: Bearer token for the data API
//! - `XAHOD_REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 10)
//! - `XAHOD_LOG_FORMAT`: `pretty` or `json` (default: pretty)

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use xahodd::{Config, Daemon, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration first: it decides the log format
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("xahodd=info".parse()?)
        .add_directive("xahod_store=info".parse()?)
        .add_directive("xahod_connectors=info".parse()?);

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry().with(fmt::layer()).with(filter).init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        data_api = config.data_api.base_url.as_deref().unwrap_or("sample data"),
        "Xahod Daemon"
    );

    // Create and run daemon
    let daemon = Daemon::from_config(config)?;
    daemon.run().await?;

    Ok(())
}
