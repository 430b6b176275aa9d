//! Error type shared across the engine.
//!
//! Every fallible operation returns [`VaultError`]; nothing in this crate
//! panics on bad input or bad snapshot bytes. Input-shape errors
//! (`InvalidParameter`, `DimensionMismatch`, `DuplicateId`) are caller
//! mistakes; the remaining variants surface snapshot I/O and validation
//! failures. The engine retries nothing and logs nothing.

use thiserror::Error;

/// Unified error type for index construction, mutation, query, and snapshots.
#[derive(Debug, Error)]
pub enum VaultError {
    /// A constructor or query argument is out of range (zero dimension,
    /// zero M, non-positive k or ef).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A supplied vector does not match the index dimension.
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension the index was constructed with.
        expected: usize,
        /// Length of the offending vector.
        got: usize,
    },

    /// The id is already present in the index.
    #[error("id {0} already exists")]
    DuplicateId(i32),

    /// A snapshot file could not be opened, mapped, read, or written.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot violates the wire format: bad magic, unknown version,
    /// truncated data, or a layout inconsistency.
    #[error("snapshot format error: {0}")]
    Format(String),

    /// The snapshot's CRC32 seal does not match its contents.
    #[error("snapshot CRC32 mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// CRC read from the file footer.
        stored: u32,
        /// CRC computed over the file prefix.
        computed: u32,
    },
}
