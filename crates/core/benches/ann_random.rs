//! ANN benchmark on synthetic Gaussian vectors.
//!
//! Builds an index from seeded N(0,1) data, computes brute-force ground
//! truth, then sweeps `ef_search` reporting recall@10, QPS, and latency
//! percentiles.
//!
//! Usage: cargo bench --bench ann_random

use std::cmp::Ordering;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use vecvault_core::{HnswParams, VaultIndex};

const N: usize = 10_000;
const DIM: usize = 128;
const QUERIES: usize = 200;
const K: usize = 10;
const DATA_SEED: u64 = 42;
const QUERY_SEED: u64 = 1337;
const EF_SWEEP: &[usize] = &[10, 20, 50, 100, 200];

fn generate_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.sample(StandardNormal)).collect())
        .collect()
}

fn brute_force_top_k(query: &[f32], database: &[Vec<f32>], k: usize) -> Vec<i32> {
    let mut scored: Vec<(f32, i32)> = database
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
    scored.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    scored.into_iter().take(k).map(|(_, id)| id).collect()
}

fn recall_at_k(found: &[i32], truth: &[i32]) -> f64 {
    let hits = found.iter().filter(|id| truth.contains(id)).count();
    hits as f64 / truth.len() as f64
}

fn percentile(sorted_us: &[f64], p: f64) -> f64 {
    let idx = ((sorted_us.len() as f64) * p) as usize;
    sorted_us[idx.min(sorted_us.len() - 1)]
}

fn main() {
    println!("=== vecvault ANN benchmark: {N} x N(0,1), d={DIM} ===");
    println!();

    println!("Generating {N} vectors (seed {DATA_SEED})...");
    let vectors = generate_vectors(N, DIM, DATA_SEED);
    let queries = generate_vectors(QUERIES, DIM, QUERY_SEED);

    let index = VaultIndex::new(DIM, HnswParams::default()).expect("valid params");
    index.reserve(N);

    let build_start = Instant::now();
    for (i, v) in vectors.iter().enumerate() {
        index.add(i as i32, v).expect("unique ids, matching dim");
    }
    let build_secs = build_start.elapsed().as_secs_f64();
    println!(
        "Build: {:.2}s ({:.0} inserts/s), max level {}",
        build_secs,
        N as f64 / build_secs,
        index.max_level()
    );

    println!("Computing brute-force ground truth for {QUERIES} queries...");
    let truth: Vec<Vec<i32>> = queries
        .iter()
        .map(|q| brute_force_top_k(q, &vectors, K))
        .collect();

    println!();
    println!(
        "{:>8} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "ef", "recall@10", "QPS", "p50 (us)", "p95 (us)", "p99 (us)"
    );
    for &ef in EF_SWEEP {
        let mut latencies_us = Vec::with_capacity(QUERIES);
        let mut recall_sum = 0.0;

        let sweep_start = Instant::now();
        for (q, gt) in queries.iter().zip(truth.iter()) {
            let start = Instant::now();
            let hits = index.search(q, K, ef).expect("valid query");
            latencies_us.push(start.elapsed().as_secs_f64() * 1e6);
            let found: Vec<i32> = hits.iter().map(|h| h.id).collect();
            recall_sum += recall_at_k(&found, gt);
        }
        let total_secs = sweep_start.elapsed().as_secs_f64();

        latencies_us.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        println!(
            "{:>8} {:>10.4} {:>10.0} {:>10.1} {:>10.1} {:>10.1}",
            ef,
            recall_sum / QUERIES as f64,
            QUERIES as f64 / total_secs,
            percentile(&latencies_us, 0.50),
            percentile(&latencies_us, 0.95),
            percentile(&latencies_us, 0.99),
        );
    }
}
