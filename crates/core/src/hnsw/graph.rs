//! HNSW graph storage: nodes, parameters, id mapping, and level sampling.
//!
//! Nodes reference each other by client id rather than by slot; snapshots
//! stay portable across shuffled slot orders at the cost of a map lookup per
//! edge traversal. The id→slot map is the only path from a client id to a
//! node.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::VaultError;
use crate::hnsw::distance::{DistanceCalculator, DistanceMetric};

/// Tuning parameters for an HNSW index.
///
/// `m` is the target number of bidirectional links per insertion; `max_m` and
/// `max_m0` are the hard caps enforced by pruning above and at layer 0. The
/// seed drives level sampling only and is never persisted in snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswParams {
    /// Target bidirectional links per node.
    pub m: usize,
    /// Candidate-list size during construction.
    pub ef_construction: usize,
    /// Neighbor-list cap at layers above 0.
    pub max_m: usize,
    /// Neighbor-list cap at layer 0.
    pub max_m0: usize,
    /// Seed for the level-sampling RNG.
    pub seed: u64,
    /// Distance function for similarity.
    pub metric: DistanceMetric,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: config::HNSW_DEFAULT_M,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            max_m: config::HNSW_DEFAULT_MAX_M,
            max_m0: config::HNSW_DEFAULT_MAX_M0,
            seed: config::HNSW_DEFAULT_SEED,
            metric: DistanceMetric::L2,
        }
    }
}

/// One inserted vector and its per-layer adjacency.
///
/// `neighbors[layer]` holds client ids; the list count is always
/// `level + 1`. Nodes are never removed, and after insertion only their
/// neighbor lists change (pruning triggered by later inserts).
#[derive(Debug, Clone)]
pub struct Node {
    /// Client-chosen identifier, unique within the index.
    pub id: i32,
    /// Highest layer this node participates in.
    pub level: usize,
    /// Owned copy of the inserted floats.
    pub vector: Vec<f32>,
    /// Neighbor ids per layer, `0..=level`.
    pub neighbors: Vec<Vec<i32>>,
}

/// The HNSW graph: node storage, id mapping, entry pointer, and the bound
/// distance kernel.
///
/// This type is single-threaded; [`crate::index::VaultIndex`] wraps it in a
/// reader-writer lock for concurrent use.
#[derive(Debug)]
pub struct HnswIndex {
    pub(crate) params: HnswParams,
    pub(crate) dimension: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) id_to_slot: HashMap<i32, usize>,
    /// Client id of the topmost node; `None` iff the index is empty.
    pub(crate) entry_point: Option<i32>,
    /// Highest level present. Meaningful only when `entry_point` is set.
    pub(crate) max_level: usize,
    pub(crate) dist: DistanceCalculator,
    rng: StdRng,
}

impl HnswIndex {
    /// Creates an empty index for vectors of length `dimension`.
    pub fn new(dimension: usize, params: HnswParams) -> Result<Self, VaultError> {
        if dimension == 0 {
            return Err(VaultError::InvalidParameter(
                "dimension must be positive".into(),
            ));
        }
        if params.m == 0 {
            return Err(VaultError::InvalidParameter("M must be positive".into()));
        }
        Ok(Self {
            dist: DistanceCalculator::new(params.metric),
            rng: StdRng::seed_from_u64(params.seed),
            params,
            dimension,
            nodes: Vec::new(),
            id_to_slot: HashMap::new(),
            entry_point: None,
            max_level: 0,
        })
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when no vector has been inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vector length this index was constructed with.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Current parameters (metric may change across a snapshot load).
    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Highest level present, or −1 when empty.
    pub fn current_max_level(&self) -> i32 {
        if self.entry_point.is_some() {
            self.max_level as i32
        } else {
            -1
        }
    }

    /// Best-effort capacity hint for `n` upcoming inserts.
    pub fn reserve(&mut self, n: usize) {
        self.nodes.reserve(n);
        self.id_to_slot.reserve(n);
    }

    /// Samples a level for a new node: `floor(-ln(r) / ln 2)` for uniform
    /// `r` in (0, 1]. Deterministic for a fixed seed and insert sequence.
    pub(crate) fn random_level(&mut self) -> usize {
        let r: f64 = 1.0 - self.rng.gen::<f64>();
        (-r.ln() * config::LEVEL_MULTIPLIER) as usize
    }

    /// Resolves a client id to its storage slot.
    #[inline]
    pub(crate) fn slot_of(&self, id: i32) -> Option<usize> {
        self.id_to_slot.get(&id).copied()
    }
}
