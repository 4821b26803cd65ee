//! Xahod Daemon Library
//!
//! Runtime for the Xahod dashboard core: entity stores kept in memory,
//! loaded from the data API and served over HTTP.
//!
//! # Architecture
//!
//! - **Config**: environment-driven settings (`XAHOD_*`)
//! - **AppContext**: owns the orders, transactions, transfers and market
//!   stores
//! - **API**: axum router exposing list queries and record operations
//! - **Daemon**: lifecycle (load, serve, shutdown)

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod context;
pub mod daemon;
pub mod error;

pub use api::{create_router, ApiState, ErrorResponse, HealthResponse, StatusResponse};
pub use config::{ApiConfig, Config, DataApiConfig, Environment, LogFormat};
pub use context::{AppContext, EntityStore, StoreStatus};
pub use daemon::{ApiServer, Daemon};
pub use error::{DaemonError, DaemonResult};
