//! vecvault-server — HTTP facade for the vecvault ANN index.
//!
//! Exposes add/query/save/load/stats/health as JSON over Axum. All engine
//! logic lives in `vecvault-core`; this crate only translates HTTP to core
//! calls and core errors to status codes.

/// REST API layer: router, handlers, models, and error mapping.
pub mod api;
