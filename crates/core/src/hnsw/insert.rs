//! HNSW insertion: level sampling, descent, linking, and degree-capped
//! pruning.
//!
//! New edges are added in both directions; when a back-edge pushes a
//! neighbor's list past its cap the list is rebuilt from distances measured
//! against that neighbor's own vector. Bidirectional reachability is not an
//! invariant afterwards — pruning may drop the reverse edge.

use std::cmp::Ordering;

use crate::error::VaultError;
use crate::hnsw::graph::{HnswIndex, Node};
use crate::hnsw::search::search_layer;
use crate::hnsw::visited::VisitedSet;

impl HnswIndex {
    /// Inserts a vector under a fresh id.
    ///
    /// Fails with [`VaultError::DimensionMismatch`] or
    /// [`VaultError::DuplicateId`] before any state (including the level
    /// RNG) is touched, so a failed insert leaves the graph and the level
    /// sequence unchanged.
    pub fn insert(&mut self, id: i32, vector: &[f32]) -> Result<(), VaultError> {
        if vector.len() != self.dimension {
            return Err(VaultError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        if self.id_to_slot.contains_key(&id) {
            return Err(VaultError::DuplicateId(id));
        }

        let level = self.random_level();
        let mut node = Node {
            id,
            level,
            vector: vector.to_vec(),
            neighbors: vec![Vec::new(); level + 1],
        };

        // First node becomes the entry point outright.
        let Some(mut entry) = self.entry_point else {
            self.id_to_slot.insert(id, self.nodes.len());
            self.nodes.push(node);
            self.entry_point = Some(id);
            self.max_level = level;
            return Ok(());
        };

        let mut visited = VisitedSet::new(self.nodes.len());

        // Greedy single-candidate descent through layers above the node's.
        for layer in (level + 1..=self.max_level).rev() {
            let found = search_layer(self, vector, entry, 1, layer, &mut visited);
            if let Some(&(_, nearest)) = found.first() {
                entry = nearest;
            }
        }

        // Beam-search each insertion layer and pick the node's neighbors.
        let top = level.min(self.max_level);
        let ef = self.params.ef_construction.max(self.params.m);
        for layer in (0..=top).rev() {
            let candidates = search_layer(self, vector, entry, ef, layer, &mut visited);
            let cap = self.layer_cap(layer);
            node.neighbors[layer] = select_neighbors(&candidates, cap);
            if let Some(&(_, nearest)) = candidates.first() {
                entry = nearest;
            }
        }

        let slot = self.nodes.len();
        self.id_to_slot.insert(id, slot);
        self.nodes.push(node);

        // Back-edges, pruning any neighbor list the new edge overflows.
        for layer in 0..=top {
            let cap = self.layer_cap(layer);
            let linked = self.nodes[slot].neighbors[layer].clone();
            for neighbor_id in linked {
                let Some(neighbor_slot) = self.slot_of(neighbor_id) else {
                    continue;
                };
                if layer >= self.nodes[neighbor_slot].neighbors.len() {
                    continue;
                }
                self.nodes[neighbor_slot].neighbors[layer].push(id);
                if self.nodes[neighbor_slot].neighbors[layer].len() > cap {
                    self.prune_neighbors(neighbor_slot, layer, cap);
                }
            }
        }

        if level > self.max_level {
            self.max_level = level;
            self.entry_point = Some(id);
        }
        Ok(())
    }

    fn layer_cap(&self, layer: usize) -> usize {
        if layer == 0 {
            self.params.max_m0
        } else {
            self.params.max_m
        }
    }

    /// Rebuilds one over-capacity neighbor list: scores every current member
    /// against the owning node's vector and keeps the closest `cap`.
    fn prune_neighbors(&mut self, slot: usize, layer: usize, cap: usize) {
        let members = self.nodes[slot].neighbors[layer].clone();
        let mut scored: Vec<(f32, i32)> = Vec::with_capacity(members.len());
        {
            let base = &self.nodes[slot].vector;
            for &member_id in &members {
                let Some(member_slot) = self.slot_of(member_id) else {
                    continue;
                };
                let dist = self.dist.distance(base, &self.nodes[member_slot].vector);
                scored.push((dist, member_id));
            }
        }
        self.nodes[slot].neighbors[layer] = select_neighbors(&scored, cap);
    }
}

/// Neighbor selection: closest `cap` candidates by distance.
fn select_neighbors(candidates: &[(f32, i32)], cap: usize) -> Vec<i32> {
    let mut sorted = candidates.to_vec();
    sorted.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    sorted.truncate(cap);
    sorted.into_iter().map(|(_, id)| id).collect()
}
