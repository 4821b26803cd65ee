//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together:
//! - Entity stores (orders, transactions, transfers, markets)
//! - Fetch collaborator (data API client or stub)
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Pick the fetch collaborator
//! 3. Load every store
//! 4. Start API server
//! 5. Wait for SIGINT
//! 6. Graceful shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use xahod_connectors::DataApiClient;
use xahod_store::{FetchPort, StubFetcher};

use crate::api::{create_router, ApiState};
use crate::config::{Config, Environment};
use crate::context::AppContext;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The main Xahod daemon.
pub struct Daemon {
    /// Configuration
    config: Config,
    /// Entity stores
    context: Arc<AppContext>,
}

/// Handle to a running API server.
pub struct ApiServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(self) -> DaemonResult<()> {
        // receiver gone means the server already exited
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(|e| DaemonError::Server(format!("API server task failed: {}", e)))
    }
}

impl Daemon {
    /// Create a new daemon serving sample data (for testing/development).
    pub fn new_stub(config: Config) -> Self {
        Self::with_fetcher(config, Arc::new(StubFetcher::with_sample_data()))
    }

    /// Create a new daemon with the provided fetch collaborator.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn FetchPort>) -> Self {
        Self {
            config,
            context: Arc::new(AppContext::new(fetcher)),
        }
    }

    /// Create the daemon the configuration asks for.
    ///
    /// The data API client is used whenever a base URL is configured. The
    /// test environment always runs on the stub.
    pub fn from_config(config: Config) -> DaemonResult<Self> {
        let base_url = match (&config.environment, &config.data_api.base_url) {
            (Environment::Test, _) | (_, None) => None,
            (_, Some(url)) => Some(url.clone()),
        };

        match base_url {
            Some(url) => {
                info!(base_url = %url, "Using data API");
                let mut client =
                    DataApiClient::new(url).with_timeout(config.data_api.request_timeout);
                if let Some(token) = &config.data_api.auth_token {
                    client = client.with_auth_token(token.clone());
                }
                Ok(Self::with_fetcher(config, Arc::new(client)))
            },
            None if config.environment == Environment::Production => Err(DaemonError::Config(
                "Production requires XAHOD_DATA_API_URL".to_string(),
            )),
            None => {
                warn!(environment = %config.environment, "No data API configured, serving sample data");
                Ok(Self::new_stub(config))
            },
        }
    }

    /// Entity stores
    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    /// Run until SIGINT.
    pub async fn run(self) -> DaemonResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal");
        })
        .await
    }

    /// Run until `signal` completes.
    pub async fn run_until(self, signal: impl Future<Output = ()>) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            "Starting Xahod daemon"
        );

        // 1. Initial load; failures keep empty stores and are logged
        self.context.load_all().await?;

        // 2. Start API server
        let server = self.start_api_server().await?;
        info!(api_addr = %server.addr(), "API server started");

        // 3. Wait for shutdown
        signal.await;

        self.shutdown(server).await
    }

    /// Bind and spawn the API server.
    pub async fn start_api_server(&self) -> DaemonResult<ApiServer> {
        let state = Arc::new(ApiState {
            context: Arc::clone(&self.context),
            environment: self.config.environment,
        });

        let router = create_router(state);
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DaemonError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| DaemonError::Config(format!("Failed to get local address: {}", e)))?;

        let (shutdown, stop) = oneshot::channel::<()>();

        // Spawn the server task
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = stop.await;
            });
            if let Err(e) = serve.await {
                error!(error = %e, "API server error");
            }
        });

        Ok(ApiServer {
            addr: local_addr,
            shutdown,
            task,
        })
    }

    async fn shutdown(&self, server: ApiServer) -> DaemonResult<()> {
        info!("Initiating graceful shutdown");

        server.stop().await?;

        let records: usize = self.context.status().iter().map(|s| s.count).sum();
        info!(records, "Shutdown complete");

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
