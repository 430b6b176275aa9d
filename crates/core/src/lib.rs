//! # vecvault-core
//!
//! Embeddable in-memory approximate nearest-neighbor engine built on a
//! Hierarchical Navigable Small World (HNSW) graph, with a SIMD-dispatched
//! distance kernel and CRC-sealed binary snapshots.
//!
//! This is the core library crate with zero async dependencies — the HTTP
//! facade lives in `vecvault-server`. [`VaultIndex`] is the thread-safe
//! entry point: queries run concurrently under a shared lock, inserts and
//! snapshot loads serialize on the exclusive side, and readers never observe
//! a partially applied mutation.

/// Compile-time defaults and tuning constants.
pub mod config;
/// The crate-wide error type.
pub mod error;
/// HNSW graph: distance kernel, storage, insertion, search.
pub mod hnsw;
/// Thread-safe public index handle.
pub mod index;
/// Snapshot persistence: codec, mmap I/O, wire format.
pub mod storage;

pub use error::VaultError;
pub use hnsw::distance::DistanceMetric;
pub use hnsw::graph::HnswParams;
pub use hnsw::search::SearchHit;
pub use index::{IndexStats, VaultIndex};
