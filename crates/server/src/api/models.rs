//! Request and response data transfer objects for the REST API.
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling
//! via Axum.

use serde::{Deserialize, Serialize};
use vecvault_core::{HnswParams, SearchHit};

/// Request body for `POST /add`.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub id: i32,
    pub vec: Vec<f32>,
}

/// Response body for `POST /add`.
#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub status: &'static str,
    pub id: i32,
}

/// Request body for `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub vec: Vec<f32>,
}

/// Query-string parameters for `POST /query`.
///
/// Parsed as signed integers so that negative values reach the validation
/// path and produce a 400 instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub k: Option<i64>,
    pub ef: Option<i64>,
}

/// Response body for `POST /query`.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub results: Vec<SearchHit>,
    pub latency_us: u64,
    pub latency_ms: f64,
}

/// Request body for `POST /save` and `POST /load`.
#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    pub path: String,
}

/// Response body for `POST /save`.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub status: &'static str,
    pub path: String,
}

/// Response body for `POST /load`.
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub status: &'static str,
    pub path: String,
    pub size: usize,
    pub dimension: usize,
}

/// Response body for `GET /stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub dim: usize,
    pub size: usize,
    pub max_level: i32,
    pub params: HnswParams,
    pub version: &'static str,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
