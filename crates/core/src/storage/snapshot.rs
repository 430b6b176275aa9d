//! CRC-sealed binary snapshots of the whole index.
//!
//! Layout (little-endian, packed): magic, format version, dimension, the four
//! graph parameters, metric tag, entry id and max level (−1 sentinels when
//! empty), node count, then per node its id, level, length-prefixed vector
//! and per-layer neighbor lists, and finally a CRC32 over everything before
//! it. Neighbor lists store client ids, not slots, so a snapshot is portable
//! across processes regardless of insertion order.
//!
//! Loading stages the entire decoded state and validates it — including the
//! CRC and every neighbor reference — before anything is installed; a failed
//! load leaves the live index untouched.

use std::collections::HashMap;
use std::path::Path;

use crate::error::VaultError;
use crate::hnsw::distance::{DistanceCalculator, DistanceMetric};
use crate::hnsw::graph::{HnswIndex, Node};
use crate::storage::codec::{BinaryReader, BinaryWriter};
use crate::storage::mmap;

/// `"VVLT"` interpreted as a little-endian u32.
pub const FILE_MAGIC: u32 = 0x5656_4C54;

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

/// Smallest possible encoding of one node record (id + level + two empty
/// length prefixes); used to sanity-check the declared node count.
const MIN_NODE_BYTES: usize = 24;

/// Fully decoded and validated snapshot contents, ready to install.
#[derive(Debug)]
pub struct Snapshot {
    pub(crate) m: usize,
    pub(crate) ef_construction: usize,
    pub(crate) max_m: usize,
    pub(crate) max_m0: usize,
    pub(crate) metric: DistanceMetric,
    pub(crate) entry_point: Option<i32>,
    pub(crate) max_level: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) id_to_slot: HashMap<i32, usize>,
}

/// Serializes the index into the snapshot wire format, CRC seal included.
pub fn encode_index(index: &HnswIndex) -> Vec<u8> {
    // Rough payload size: header + per-node fixed fields + vector bytes.
    let estimate = 44 + index.nodes.len() * (MIN_NODE_BYTES + index.dimension() * 4 + 64);
    let mut w = BinaryWriter::with_capacity(estimate);

    w.write_u32(FILE_MAGIC);
    w.write_u32(FORMAT_VERSION);
    w.write_i32(index.dimension() as i32);
    w.write_i32(index.params.m as i32);
    w.write_i32(index.params.ef_construction as i32);
    w.write_i32(index.params.max_m as i32);
    w.write_i32(index.params.max_m0 as i32);
    w.write_u32(index.params.metric.to_wire());
    w.write_i32(index.entry_point.unwrap_or(-1));
    w.write_i32(index.current_max_level());
    w.write_u64(index.nodes.len() as u64);

    for node in &index.nodes {
        w.write_i32(node.id);
        w.write_i32(node.level as i32);
        w.write_f32_slice(&node.vector);
        w.write_u64(node.neighbors.len() as u64);
        for layer in &node.neighbors {
            w.write_i32_slice(layer);
        }
    }

    let mut bytes = w.into_bytes();
    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
    bytes
}

/// Serializes and writes the index to `path` in one shot, overwriting any
/// previous file at that path.
pub fn save_index(index: &HnswIndex, path: &Path) -> Result<(), VaultError> {
    let bytes = encode_index(index);
    mmap::write_mapped(path, &bytes)
}

/// Maps and decodes a snapshot file. Returns the staged state without
/// touching any live index.
pub fn load_index(path: &Path, expected_dim: usize) -> Result<Snapshot, VaultError> {
    let map = mmap::map_read(path)?;
    decode_snapshot(&map, expected_dim)
}

fn non_negative(value: i32, field: &str) -> Result<usize, VaultError> {
    usize::try_from(value).map_err(|_| VaultError::Format(format!("negative {field}: {value}")))
}

fn positive(value: i32, field: &str) -> Result<usize, VaultError> {
    if value <= 0 {
        return Err(VaultError::Format(format!("non-positive {field}: {value}")));
    }
    Ok(value as usize)
}

/// Decodes and fully validates a snapshot buffer.
///
/// `expected_dim` is the live index dimension; a snapshot of any other
/// dimension is rejected. Validation covers the header, every node record,
/// the CRC seal, entry/max-level consistency, and neighbor-id resolution.
pub fn decode_snapshot(bytes: &[u8], expected_dim: usize) -> Result<Snapshot, VaultError> {
    let mut r = BinaryReader::new(bytes);

    let magic = r.read_u32()?;
    if magic != FILE_MAGIC {
        return Err(VaultError::Format(format!(
            "bad magic {magic:#010x}, expected {FILE_MAGIC:#010x}"
        )));
    }
    let version = r.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(VaultError::Format(format!(
            "unsupported format version {version}"
        )));
    }

    let dim = r.read_i32()?;
    if dim != expected_dim as i32 {
        return Err(VaultError::Format(format!(
            "snapshot dimension {dim} does not match index dimension {expected_dim}"
        )));
    }

    let m = positive(r.read_i32()?, "M")?;
    let ef_construction = non_negative(r.read_i32()?, "ef_construction")?;
    let max_m = positive(r.read_i32()?, "max_M")?;
    let max_m0 = positive(r.read_i32()?, "max_M0")?;
    let metric = DistanceMetric::from_wire(r.read_u32()?)?;
    let entry_raw = r.read_i32()?;
    let max_level_raw = r.read_i32()?;

    let node_count = r.read_u64()?;
    let node_count = usize::try_from(node_count)
        .map_err(|_| VaultError::Format(format!("node count {node_count} overflows usize")))?;
    if node_count > bytes.len() / MIN_NODE_BYTES {
        return Err(VaultError::Format(format!(
            "node count {node_count} exceeds snapshot size"
        )));
    }

    let mut nodes = Vec::with_capacity(node_count);
    let mut id_to_slot = HashMap::with_capacity(node_count);
    for slot in 0..node_count {
        let id = r.read_i32()?;
        let level = non_negative(r.read_i32()?, "node level")?;

        let vector = r.read_f32_vec()?;
        if vector.len() != expected_dim {
            return Err(VaultError::Format(format!(
                "node {id}: vector length {} does not match dimension {expected_dim}",
                vector.len()
            )));
        }

        let layer_count = r.read_u64()?;
        if layer_count != (level as u64) + 1 {
            return Err(VaultError::Format(format!(
                "node {id}: layer count {layer_count} does not match level {level}"
            )));
        }
        let mut neighbors = Vec::with_capacity(level + 1);
        for _ in 0..=level {
            neighbors.push(r.read_i32_vec()?);
        }

        if id_to_slot.insert(id, slot).is_some() {
            return Err(VaultError::Format(format!("duplicate id {id}")));
        }
        nodes.push(Node {
            id,
            level,
            vector,
            neighbors,
        });
    }

    if r.remaining() != 4 {
        return Err(VaultError::Format(format!(
            "expected 4 trailing CRC bytes, found {}",
            r.remaining()
        )));
    }
    let payload_len = r.position();
    let stored = r.read_u32()?;
    let computed = crc32fast::hash(&bytes[..payload_len]);
    if stored != computed {
        return Err(VaultError::CrcMismatch { stored, computed });
    }

    let (entry_point, max_level) = if nodes.is_empty() {
        if entry_raw != -1 || max_level_raw != -1 {
            return Err(VaultError::Format(format!(
                "empty snapshot with entry {entry_raw} and max level {max_level_raw}"
            )));
        }
        (None, 0)
    } else {
        if !id_to_slot.contains_key(&entry_raw) {
            return Err(VaultError::Format(format!(
                "entry id {entry_raw} is not a stored node"
            )));
        }
        let max_level = non_negative(max_level_raw, "max level")?;
        (Some(entry_raw), max_level)
    };

    for node in &nodes {
        for layer in &node.neighbors {
            for neighbor in layer {
                if !id_to_slot.contains_key(neighbor) {
                    return Err(VaultError::Format(format!(
                        "node {}: neighbor id {neighbor} is not a stored node",
                        node.id
                    )));
                }
            }
        }
    }

    Ok(Snapshot {
        m,
        ef_construction,
        max_m,
        max_m0,
        metric,
        entry_point,
        max_level,
        nodes,
        id_to_slot,
    })
}

impl HnswIndex {
    /// Replaces the live state with a decoded snapshot and rebinds the
    /// distance kernel to the loaded metric. The level-sampling seed and RNG
    /// position are not persisted and carry over from the live index.
    pub(crate) fn install(&mut self, snapshot: Snapshot) {
        self.params.m = snapshot.m;
        self.params.ef_construction = snapshot.ef_construction;
        self.params.max_m = snapshot.max_m;
        self.params.max_m0 = snapshot.max_m0;
        self.params.metric = snapshot.metric;
        self.dist = DistanceCalculator::new(snapshot.metric);
        self.nodes = snapshot.nodes;
        self.id_to_slot = snapshot.id_to_slot;
        self.entry_point = snapshot.entry_point;
        self.max_level = snapshot.max_level;
    }
}
