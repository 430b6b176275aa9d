//! The thread-safe public index handle.
//!
//! [`VaultIndex`] wraps the HNSW graph in a single reader-writer lock:
//! queries, saves, and accessors take the shared mode and run concurrently;
//! inserts and loads take the exclusive mode and are serialized. Readers
//! never observe a partial insert or a partial load. There is no
//! cancellation and no timeout — blocking happens only on lock acquisition.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::VaultError;
use crate::hnsw::graph::{HnswIndex, HnswParams};
use crate::hnsw::search::{knn_search, SearchHit};
use crate::storage::snapshot;

/// Point-in-time summary of the index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    /// Vector dimension.
    pub dim: usize,
    /// Number of stored vectors.
    pub size: usize,
    /// Highest graph level, −1 when empty.
    pub max_level: i32,
    /// Current parameters (the metric may have changed via a load).
    pub params: HnswParams,
}

/// Shared handle to an in-memory ANN index.
///
/// Cloning is cheap and clones refer to the same index. Reads run
/// concurrently; `add` and `load` serialize on the writer side of the lock,
/// and a `save` holds the shared lock for the full serialization, stalling
/// concurrent inserts for its duration.
#[derive(Debug, Clone)]
pub struct VaultIndex {
    inner: Arc<RwLock<HnswIndex>>,
}

impl VaultIndex {
    /// Creates an empty index for vectors of length `dimension`.
    ///
    /// Fails with [`VaultError::InvalidParameter`] when `dimension` or
    /// `params.m` is zero.
    pub fn new(dimension: usize, params: HnswParams) -> Result<Self, VaultError> {
        Ok(Self {
            inner: Arc::new(RwLock::new(HnswIndex::new(dimension, params)?)),
        })
    }

    /// Best-effort capacity hint for `n` upcoming inserts.
    pub fn reserve(&self, n: usize) {
        self.inner.write().reserve(n);
    }

    /// Inserts a vector under a fresh id.
    pub fn add(&self, id: i32, vector: &[f32]) -> Result<(), VaultError> {
        self.inner.write().insert(id, vector)
    }

    /// Returns the `k` nearest stored vectors to `query`, ascending by
    /// distance. The beam width is `max(ef_search, k)`; an empty index
    /// yields an empty list.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<SearchHit>, VaultError> {
        if k == 0 || ef_search == 0 {
            return Err(VaultError::InvalidParameter(
                "k and ef_search must be positive".into(),
            ));
        }
        let inner = self.inner.read();
        if query.len() != inner.dimension() {
            return Err(VaultError::DimensionMismatch {
                expected: inner.dimension(),
                got: query.len(),
            });
        }
        Ok(knn_search(&inner, query, k, ef_search))
    }

    /// Writes a snapshot of the whole index to `path`, overwriting in place.
    pub fn save(&self, path: &Path) -> Result<(), VaultError> {
        let inner = self.inner.read();
        snapshot::save_index(&inner, path)
    }

    /// Replaces the whole index with the snapshot at `path`.
    ///
    /// The file is decoded and validated in full — CRC included — before
    /// anything is installed; on any failure the live index is unchanged.
    pub fn load(&self, path: &Path) -> Result<(), VaultError> {
        let mut inner = self.inner.write();
        let staged = snapshot::load_index(path, inner.dimension())?;
        inner.install(staged);
        Ok(())
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.inner.read().dimension()
    }

    /// Number of stored vectors.
    pub fn size(&self) -> usize {
        self.inner.read().len()
    }

    /// Highest graph level, −1 when empty.
    pub fn max_level(&self) -> i32 {
        self.inner.read().current_max_level()
    }

    /// Snapshot of the current parameters.
    pub fn params(&self) -> HnswParams {
        self.inner.read().params().clone()
    }

    /// Point-in-time summary under a single shared-lock acquisition.
    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read();
        IndexStats {
            dim: inner.dimension(),
            size: inner.len(),
            max_level: inner.current_max_level(),
            params: inner.params().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::distance::DistanceMetric;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;
    use std::cmp::Ordering;

    fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| (0..dim).map(|_| rng.sample(StandardNormal)).collect())
            .collect()
    }

    fn brute_force_top_k(
        query: &[f32],
        vectors: &[Vec<f32>],
        k: usize,
    ) -> Vec<i32> {
        let mut scored: Vec<(f32, i32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let d: f32 = query
                    .iter()
                    .zip(v.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (d, i as i32)
            })
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        scored.into_iter().take(k).map(|(_, id)| id).collect()
    }

    #[test]
    fn search_rejects_bad_parameters() {
        let index = VaultIndex::new(4, HnswParams::default()).unwrap();
        assert!(matches!(
            index.search(&[0.0; 4], 0, 50).unwrap_err(),
            VaultError::InvalidParameter(_)
        ));
        assert!(matches!(
            index.search(&[0.0; 4], 5, 0).unwrap_err(),
            VaultError::InvalidParameter(_)
        ));
        assert!(matches!(
            index.search(&[0.0; 3], 5, 50).unwrap_err(),
            VaultError::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn empty_index_search_is_empty() {
        let index = VaultIndex::new(4, HnswParams::default()).unwrap();
        assert!(index.search(&[0.0; 4], 10, 50).unwrap().is_empty());
    }

    #[test]
    fn stats_reflect_state() {
        let index = VaultIndex::new(3, HnswParams::default()).unwrap();
        let stats = index.stats();
        assert_eq!(stats.dim, 3);
        assert_eq!(stats.size, 0);
        assert_eq!(stats.max_level, -1);

        index.add(1, &[1.0, 0.0, 0.0]).unwrap();
        let stats = index.stats();
        assert_eq!(stats.size, 1);
        assert!(stats.max_level >= 0);
    }

    #[test]
    fn self_find_on_random_data() {
        // d=32, N=200, seed 42: each probed id should surface itself with a
        // near-zero distance when queried with its own vector.
        let vectors = random_vectors(200, 32, 42);
        let index = VaultIndex::new(32, HnswParams::default()).unwrap();
        index.reserve(vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            index.add(i as i32, v).unwrap();
        }

        let mut found = 0;
        for &probe in &[0i32, 10, 42, 100, 150] {
            let hits = index
                .search(&vectors[probe as usize], 10, 200)
                .unwrap();
            if hits
                .iter()
                .any(|h| h.id == probe && h.distance < 1e-3)
            {
                found += 1;
            }
        }
        assert!(found >= 4, "only {found}/5 self-queries found themselves");
    }

    #[test]
    fn recall_at_5_beats_095() {
        let vectors = random_vectors(200, 32, 42);
        let index = VaultIndex::new(32, HnswParams::default()).unwrap();
        for (i, v) in vectors.iter().enumerate() {
            index.add(i as i32, v).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(7);
        let mut total_overlap = 0usize;
        let queries = 20;
        for _ in 0..queries {
            let probe = rng.gen_range(0..vectors.len());
            let truth = brute_force_top_k(&vectors[probe], &vectors, 5);
            let hits = index.search(&vectors[probe], 5, 50).unwrap();
            total_overlap += hits
                .iter()
                .filter(|h| truth.contains(&h.id))
                .count();
        }
        let recall = total_overlap as f64 / (queries * 5) as f64;
        assert!(recall >= 0.95, "recall@5 = {recall}");
    }

    #[test]
    fn save_load_search_determinism() {
        // d=64, N=100, seed 12345: a fresh index loading the snapshot must
        // answer probes identically, distances bitwise-equal.
        let params = HnswParams {
            seed: 12345,
            ..HnswParams::default()
        };
        let vectors = random_vectors(100, 64, 12345);
        let index = VaultIndex::new(64, params.clone()).unwrap();
        for (i, v) in vectors.iter().enumerate() {
            index.add(i as i32, v).unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("det.vvlt");
        index.save(&path).unwrap();

        let restored = VaultIndex::new(64, params).unwrap();
        restored.load(&path).unwrap();

        let probes = random_vectors(10, 64, 1337);
        for probe in &probes {
            let a = index.search(probe, 10, 50).unwrap();
            let b = restored.search(probe, 10, 50).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn corrupt_load_preserves_live_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("victim.vvlt");

        // Live index holds only id 999.
        let live = VaultIndex::new(4, HnswParams::default()).unwrap();
        let v999 = vec![0.25, 0.5, 0.75, 1.0];
        live.add(999, &v999).unwrap();

        // A different two-member index saved to the path, then corrupted.
        let other = VaultIndex::new(4, HnswParams::default()).unwrap();
        other.add(1, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        other.add(2, &[0.0, 1.0, 0.0, 0.0]).unwrap();
        other.save(&path).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        assert!(live.load(&path).is_err());
        let hits = live.search(&v999, 1, 50).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 999);
    }

    #[test]
    fn load_of_missing_file_preserves_live_state() {
        let dir = tempfile::tempdir().unwrap();
        let live = VaultIndex::new(2, HnswParams::default()).unwrap();
        live.add(5, &[1.0, 2.0]).unwrap();

        assert!(live.load(&dir.path().join("absent.vvlt")).is_err());
        assert_eq!(live.size(), 1);
        assert_eq!(live.search(&[1.0, 2.0], 1, 10).unwrap()[0].id, 5);
    }

    #[test]
    fn metric_survives_load_across_constructor_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("angular.vvlt");

        let angular_params = HnswParams {
            metric: DistanceMetric::Angular,
            ..HnswParams::default()
        };
        let source = VaultIndex::new(2, angular_params).unwrap();
        source.add(0, &[100.0, 0.0]).unwrap();
        source.add(1, &[1.0, 1.0]).unwrap();
        source.save(&path).unwrap();

        // Constructed with L2, loaded from an angular snapshot.
        let target = VaultIndex::new(2, HnswParams::default()).unwrap();
        target.load(&path).unwrap();

        assert_eq!(target.params().metric, DistanceMetric::Angular);
        let hits = target.search(&[1.0, 0.0], 1, 10).unwrap();
        assert_eq!(hits[0].id, 0);
    }

    #[test]
    fn search_is_pure() {
        let vectors = random_vectors(50, 16, 3);
        let index = VaultIndex::new(16, HnswParams::default()).unwrap();
        for (i, v) in vectors.iter().enumerate() {
            index.add(i as i32, v).unwrap();
        }
        let probe = &vectors[25];
        let first = index.search(probe, 10, 50).unwrap();
        for _ in 0..5 {
            assert_eq!(index.search(probe, 10, 50).unwrap(), first);
        }
    }

    #[test]
    fn concurrent_queries_during_inserts() {
        let index = VaultIndex::new(8, HnswParams::default()).unwrap();
        for i in 0..50 {
            index.add(i, &[i as f32; 8]).unwrap();
        }

        let readers: Vec<_> = (0..4)
            .map(|t| {
                let handle = index.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let probe = [((t * 37 + i) % 50) as f32; 8];
                        let hits = handle.search(&probe, 5, 50).unwrap();
                        assert!(!hits.is_empty());
                    }
                })
            })
            .collect();

        let writer = {
            let handle = index.clone();
            std::thread::spawn(move || {
                for i in 50..150 {
                    handle.add(i, &[i as f32; 8]).unwrap();
                }
            })
        };

        for reader in readers {
            reader.join().unwrap();
        }
        writer.join().unwrap();
        assert_eq!(index.size(), 150);
    }
}
