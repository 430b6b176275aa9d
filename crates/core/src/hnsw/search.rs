//! Layer beam search and multi-layer KNN descent.
//!
//! `search_layer` is the shared primitive: insertion runs it with
//! `ef = max(ef_construction, M)` per linked layer, queries with `ef = 1`
//! during descent and `ef_search` at layer 0. All scratch state (heaps,
//! visited set) is local to the calling operation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::hnsw::graph::HnswIndex;
use crate::hnsw::visited::VisitedSet;

/// One query result: a stored id and its distance to the probe vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    /// Client id of the matched vector.
    pub id: i32,
    /// Distance under the index metric (lower is closer).
    pub distance: f32,
}

/// Heap entry ordered by distance, then id for a total order. Used directly
/// as the max-heap of running results and `Reverse`-wrapped as the min-heap
/// exploration frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    distance: OrderedFloat<f32>,
    id: i32,
}

/// Beam search within a single layer.
///
/// Explores the graph greedily from `entry_id`, keeping the best `ef`
/// results seen so far and stopping once the nearest unexplored candidate is
/// farther than the worst retained result. Returns up to `ef` pairs of
/// `(distance, id)` in ascending distance order. An entry id that does not
/// resolve yields an empty result.
pub(crate) fn search_layer(
    index: &HnswIndex,
    query: &[f32],
    entry_id: i32,
    ef: usize,
    layer: usize,
    visited: &mut VisitedSet,
) -> Vec<(f32, i32)> {
    visited.reset();

    let Some(entry_slot) = index.slot_of(entry_id) else {
        return Vec::new();
    };

    let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(ef * 2);
    let mut results: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef + 1);

    let entry_dist = index
        .dist
        .distance(query, &index.nodes[entry_slot].vector);
    let seed = Candidate {
        distance: OrderedFloat(entry_dist),
        id: entry_id,
    };
    frontier.push(Reverse(seed));
    results.push(seed);
    visited.mark(entry_slot);

    while let Some(Reverse(current)) = frontier.pop() {
        let worst = results.peek().map_or(f32::MAX, |r| r.distance.0);
        if results.len() >= ef && current.distance.0 > worst {
            break;
        }

        let Some(slot) = index.slot_of(current.id) else {
            continue;
        };
        let Some(neighbor_list) = index.nodes[slot].neighbors.get(layer) else {
            continue;
        };

        for &neighbor_id in neighbor_list {
            let Some(neighbor_slot) = index.slot_of(neighbor_id) else {
                continue;
            };
            if !visited.mark(neighbor_slot) {
                continue;
            }

            let dist = index
                .dist
                .distance(query, &index.nodes[neighbor_slot].vector);
            let worst = results.peek().map_or(f32::MAX, |r| r.distance.0);
            if dist < worst || results.len() < ef {
                let candidate = Candidate {
                    distance: OrderedFloat(dist),
                    id: neighbor_id,
                };
                frontier.push(Reverse(candidate));
                results.push(candidate);
                if results.len() > ef {
                    results.pop();
                }
            }
        }
    }

    results
        .into_sorted_vec()
        .into_iter()
        .map(|c| (c.distance.0, c.id))
        .collect()
}

/// Multi-layer KNN search.
///
/// Descends greedily (single-candidate beam) from the entry point to layer 1,
/// then runs an `ef`-wide beam at layer 0 and trims to `k`. The beam width is
/// clamped to at least `k`. Empty index yields an empty result.
pub fn knn_search(index: &HnswIndex, query: &[f32], k: usize, ef_search: usize) -> Vec<SearchHit> {
    let Some(mut entry) = index.entry_point else {
        return Vec::new();
    };

    let ef = ef_search.max(k);
    let mut visited = VisitedSet::new(index.nodes.len());

    for layer in (1..=index.max_level).rev() {
        let found = search_layer(index, query, entry, 1, layer, &mut visited);
        if let Some(&(_, nearest)) = found.first() {
            entry = nearest;
        }
    }

    let mut results = search_layer(index, query, entry, ef, 0, &mut visited);
    results.truncate(k);
    results
        .into_iter()
        .map(|(distance, id)| SearchHit { id, distance })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::graph::HnswParams;

    fn build(vectors: &[(i32, Vec<f32>)]) -> HnswIndex {
        let dim = vectors[0].1.len();
        let mut idx = HnswIndex::new(dim, HnswParams::default()).unwrap();
        for (id, v) in vectors {
            idx.insert(*id, v).unwrap();
        }
        idx
    }

    #[test]
    fn empty_index_returns_nothing() {
        let idx = HnswIndex::new(4, HnswParams::default()).unwrap();
        assert!(knn_search(&idx, &[0.0; 4], 5, 50).is_empty());
    }

    #[test]
    fn single_node_is_found() {
        let idx = build(&[(7, vec![1.0, 2.0, 3.0, 4.0])]);
        let hits = knn_search(&idx, &[1.0, 2.0, 3.0, 4.0], 1, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 7);
        assert!(hits[0].distance < 1e-6);
    }

    #[test]
    fn results_ascend_by_distance() {
        let idx = build(&[
            (0, vec![0.0, 0.0]),
            (1, vec![1.0, 0.0]),
            (2, vec![2.0, 0.0]),
            (3, vec![3.0, 0.0]),
            (4, vec![4.0, 0.0]),
        ]);
        let hits = knn_search(&idx, &[0.0, 0.0], 5, 50);
        assert_eq!(hits.len(), 5);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert_eq!(hits[0].id, 0);
    }

    #[test]
    fn beam_width_clamps_to_k() {
        let vectors: Vec<(i32, Vec<f32>)> =
            (0..20).map(|i| (i, vec![i as f32, 0.0])).collect();
        let idx = build(&vectors);
        // ef below k still yields k results because ef is clamped up.
        let hits = knn_search(&idx, &[0.0, 0.0], 5, 1);
        assert_eq!(hits.len(), 5);
    }

    #[test]
    fn k_trims_result_count() {
        let vectors: Vec<(i32, Vec<f32>)> =
            (0..30).map(|i| (i, vec![i as f32, 1.0])).collect();
        let idx = build(&vectors);
        let hits = knn_search(&idx, &[0.0, 1.0], 3, 50);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, 0);
    }

    #[test]
    fn unknown_entry_yields_empty_layer_result() {
        let idx = build(&[(1, vec![0.5, 0.5])]);
        let mut visited = VisitedSet::new(idx.len());
        let found = search_layer(&idx, &[0.5, 0.5], 99, 4, 0, &mut visited);
        assert!(found.is_empty());
    }

    #[test]
    fn layer_search_respects_ef() {
        let vectors: Vec<(i32, Vec<f32>)> =
            (0..50).map(|i| (i, vec![i as f32])).collect();
        let idx = build(&vectors);
        let entry = idx.entry_point.unwrap();
        let mut visited = VisitedSet::new(idx.len());
        let found = search_layer(&idx, &[25.0], entry, 8, 0, &mut visited);
        assert!(found.len() <= 8);
        assert!(!found.is_empty());
    }
}
