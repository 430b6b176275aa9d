//! HTTP request handlers and shared application state.
//!
//! Handlers translate JSON to core calls and [`VaultError`] to status codes
//! via [`ApiError`]. An in-flight query cannot be cancelled by the client:
//! dropping the connection abandons the response, but the search runs to
//! completion under its shared lock.

use std::path::Path;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use vecvault_core::{config, VaultIndex};

use crate::api::errors::ApiError;
use crate::api::models::*;

/// Shared application state passed to every handler via Axum's `State`
/// extractor. Cloning shares the underlying index.
#[derive(Clone)]
pub struct AppState {
    pub index: VaultIndex,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `POST /add`
pub async fn add(
    State(state): State<AppState>,
    payload: Result<Json<AddRequest>, JsonRejection>,
) -> Result<Json<AddResponse>, ApiError> {
    let Json(req) = payload?;
    state.index.add(req.id, &req.vec)?;
    Ok(Json(AddResponse {
        status: "ok",
        id: req.id,
    }))
}

/// `POST /query?k=&ef=`
pub async fn query(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Query(params) = params?;
    let Json(req) = payload?;

    let k = params.k.unwrap_or(config::DEFAULT_K as i64);
    let ef = params.ef.unwrap_or(config::DEFAULT_EF_SEARCH as i64);
    if k <= 0 || ef <= 0 {
        return Err(ApiError::BadRequest(
            "'k' and 'ef' must be positive".into(),
        ));
    }

    let start = Instant::now();
    let results = state.index.search(&req.vec, k as usize, ef as usize)?;
    let elapsed = start.elapsed();

    Ok(Json(QueryResponse {
        results,
        latency_us: elapsed.as_micros() as u64,
        latency_ms: elapsed.as_secs_f64() * 1e3,
    }))
}

/// `POST /save`
pub async fn save(
    State(state): State<AppState>,
    payload: Result<Json<SnapshotRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(req) = payload?;
    state.index.save(Path::new(&req.path)).map_err(|e| {
        tracing::error!(path = %req.path, error = %e, "snapshot save failed");
        ApiError::from(e)
    })?;
    tracing::info!(path = %req.path, size = state.index.size(), "snapshot saved");
    Ok(Json(SaveResponse {
        status: "ok",
        path: req.path,
    }))
}

/// `POST /load`
pub async fn load(
    State(state): State<AppState>,
    payload: Result<Json<SnapshotRequest>, JsonRejection>,
) -> Result<Json<LoadResponse>, ApiError> {
    let Json(req) = payload?;
    state.index.load(Path::new(&req.path)).map_err(|e| {
        tracing::error!(path = %req.path, error = %e, "snapshot load failed");
        ApiError::from(e)
    })?;
    let size = state.index.size();
    let dimension = state.index.dimension();
    tracing::info!(path = %req.path, size, "snapshot loaded");
    Ok(Json(LoadResponse {
        status: "ok",
        path: req.path,
        size,
        dimension,
    }))
}

/// `GET /stats`
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.index.stats();
    Json(StatsResponse {
        dim: stats.dim,
        size: stats.size,
        max_level: stats.max_level,
        params: stats.params,
        version: env!("CARGO_PKG_VERSION"),
    })
}
