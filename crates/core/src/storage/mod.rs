//! Snapshot persistence: binary codec, memory-mapped file I/O, and the
//! CRC-sealed snapshot format.

/// Little-endian binary writer/reader with bounds checking.
pub mod codec;
/// Memory-mapped read and write-sized-map file access.
pub mod mmap;
/// Snapshot encode, staged decode/validate, save and load.
pub mod snapshot;

pub use snapshot::{load_index, save_index, FILE_MAGIC, FORMAT_VERSION};
