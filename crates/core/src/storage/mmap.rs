//! Memory-mapped snapshot file access.
//!
//! Reads map the whole file read-only (size taken from the file metadata);
//! writes create the file at its final length, map it writable, copy, and
//! flush. Save overwrites the target path in place — there is no temp-file
//! rename dance, so readers of a half-written file must be excluded
//! externally.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapMut};

use crate::error::VaultError;

/// Maps an existing file read-only.
pub fn map_read(path: &Path) -> Result<Mmap, VaultError> {
    let file = File::open(path)?;
    // Safety: the mapping is read-only and dropped before the load returns;
    // concurrent truncation of a snapshot being loaded is outside the
    // supported contract.
    let map = unsafe { Mmap::map(&file)? };
    Ok(map)
}

/// Creates (or truncates) `path` at `bytes.len()` and writes the buffer
/// through a writable mapping. The unmap on drop flushes to disk.
pub fn write_mapped(path: &Path, bytes: &[u8]) -> Result<(), VaultError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.set_len(bytes.len() as u64)?;
    if bytes.is_empty() {
        return Ok(());
    }
    // Safety: the file was just created with the exact length and the
    // mapping never outlives this call.
    let mut map = unsafe { MmapMut::map_mut(&file)? };
    map.copy_from_slice(bytes);
    map.flush()?;
    Ok(())
}
