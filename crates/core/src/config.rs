//! Compile-time defaults and tuning constants for vecvault.
//!
//! Runtime configuration (port, dimension, host) is handled by CLI arguments
//! in the server crate; everything here is a compile-time constant.

/// Default number of bidirectional links targeted per node.
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default size of the dynamic candidate list during index construction.
///
/// Larger values produce a better-connected graph at the cost of build speed.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default hard cap on neighbor-list length at layers above 0.
pub const HNSW_DEFAULT_MAX_M: usize = 16;

/// Default hard cap on neighbor-list length at layer 0 (typically `2 * M`).
pub const HNSW_DEFAULT_MAX_M0: usize = 32;

/// Default seed for the level-sampling RNG.
pub const HNSW_DEFAULT_SEED: u64 = 42;

/// Level-sampling multiplier: new nodes land on layer
/// `floor(-ln(r) * LEVEL_MULTIPLIER)` for uniform `r` in (0, 1].
///
/// This is `1/ln 2`, not the conventional `1/ln M`. The constant is part of
/// the on-disk graph-shape contract; changing it silently breaks determinism
/// against snapshots produced by other builds.
pub const LEVEL_MULTIPLIER: f64 = 1.0 / std::f64::consts::LN_2;

/// Default number of results returned by a query.
pub const DEFAULT_K: usize = 10;

/// Default beam width (`ef_search`) during query.
pub const DEFAULT_EF_SEARCH: usize = 50;

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default vector dimension for a server-created index.
pub const DEFAULT_DIMENSION: usize = 384;

/// Default host address to bind.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Maximum HTTP request body size in bytes (10 MB).
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;
