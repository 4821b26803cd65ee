//! HTTP API for the Xahod daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Status (per-store counts)
//! - List queries with filters, sorting and pagination
//! - Add, update, get and remove records by key
//! - Reload a collection from the data API
//! - Sync orders from the exchanges

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;
use xahod_domain::{ListParams, MarketAsset, Order, Transaction, Transfer};
use xahod_query::Page;
use xahod_store::{CollectionAction, StoreError};

use crate::config::Environment;
use crate::context::{AppContext, EntityStore, StoreStatus};
use crate::error::DaemonError;

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState {
    pub context: Arc<AppContext>,
    pub environment: Environment,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_api: Option<String>,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub environment: String,
    pub stores: Vec<StoreStatus>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/orders/sync", post(sync_exchange_handler))
        .merge(entity_routes::<Order>("/orders"))
        .merge(entity_routes::<Transaction>("/transactions"))
        .merge(entity_routes::<Transfer>("/transfers"))
        .merge(entity_routes::<MarketAsset>("/markets"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn entity_routes<T: EntityStore>(base: &str) -> Router<Arc<ApiState>> {
    Router::new()
        .route(base, get(list_handler::<T>).post(add_handler::<T>).put(update_handler::<T>))
        .route(&format!("{}/reload", base), post(reload_handler::<T>))
        .route(
            &format!("{}/:key", base),
            get(get_handler::<T>).delete(remove_handler::<T>),
        )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
///
/// Reports `degraded` when the data API is unreachable.
async fn health_handler(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let (status, data_api) = match state.context.health().await {
        Ok(()) => ("healthy", None),
        Err(e) => {
            warn!(error = %e, "Data API health check failed");
            ("degraded", Some(e.to_string()))
        },
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_api,
    })
}

/// Per-store counts.
async fn status_handler(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        environment: state.environment.to_string(),
        stores: state.context.status(),
    })
}

/// One page of a collection.
async fn list_handler<T: EntityStore>(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<T>>> {
    let page = T::store(&state.context)
        .query(&params)
        .map_err(|e| to_error_response(e.into()))?;

    Ok(Json(page))
}

/// Single record by key.
async fn get_handler<T: EntityStore>(
    State(state): State<Arc<ApiState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<T>> {
    T::store(&state.context)
        .find(&key)
        .map(Json)
        .ok_or_else(|| to_error_response(not_found::<T>(key)))
}

/// Upsert a record.
async fn add_handler<T: EntityStore>(
    State(state): State<Arc<ApiState>>,
    Json(record): Json<T>,
) -> ApiResult<(StatusCode, Json<T>)> {
    T::store(&state.context)
        .dispatch(CollectionAction::Add(record.clone()))
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Replace an existing record.
async fn update_handler<T: EntityStore>(
    State(state): State<Arc<ApiState>>,
    Json(record): Json<T>,
) -> ApiResult<Json<T>> {
    let store = T::store(&state.context);
    if store.find(record.key()).is_none() {
        return Err(to_error_response(not_found::<T>(record.key().to_string())));
    }

    store
        .dispatch(CollectionAction::Update(record.clone()))
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(Json(record))
}

/// Remove a record by key.
async fn remove_handler<T: EntityStore>(
    State(state): State<Arc<ApiState>>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let store = T::store(&state.context);
    if store.find(&key).is_none() {
        return Err(to_error_response(not_found::<T>(key)));
    }

    store
        .dispatch(CollectionAction::Remove(key))
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Reload a collection from the fetcher.
///
/// Answers 502 when the fetch failed; the previous records stay in place.
async fn reload_handler<T: EntityStore>(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<Json<StoreStatus>> {
    let store = T::store(&state.context);
    store.load().await.map_err(|e| to_error_response(e.into()))?;

    refreshed_status::<T>(&state)
}

/// Sync orders from the exchanges, then reload them.
async fn sync_exchange_handler(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<Json<StoreStatus>> {
    state
        .context
        .orders
        .sync_exchange()
        .await
        .map_err(|e| to_error_response(e.into()))?;

    refreshed_status::<Order>(&state)
}

fn refreshed_status<T: EntityStore>(state: &ApiState) -> ApiResult<Json<StoreStatus>> {
    if let Some(e) = T::store(&state.context).last_load_error() {
        return Err(to_error_response(e.into()));
    }

    let status = state
        .context
        .status()
        .into_iter()
        .find(|s| s.entity == T::ENTITY)
        .ok_or_else(|| to_error_response(DaemonError::Server("missing store".to_string())))?;

    Ok(Json(status))
}

// =============================================================================
// Helpers
// =============================================================================

fn not_found<T: EntityStore>(key: String) -> DaemonError {
    DaemonError::NotFound {
        entity: T::ENTITY,
        key,
    }
}

fn to_error_response(error: DaemonError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        DaemonError::NotFound { .. } => StatusCode::NOT_FOUND,
        DaemonError::Store(StoreError::Fetch(_)) | DaemonError::Fetch(_) => {
            StatusCode::BAD_GATEWAY
        },
        DaemonError::Config(_) | DaemonError::Server(_) | DaemonError::Shutdown => {
            StatusCode::INTERNAL_SERVER_ERROR
        },
        _ => StatusCode::BAD_REQUEST,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// =============================================================================
// Tests
// =============================================================================
