//! Citation importance via PageRank (spec §4.7): power iteration over the
//! directed graph of resolved citations, damping 0.85, capped at 100
//! iterations, convergence threshold 1e-6, scores min-max scaled to [0,1].

use std::collections::HashMap;

use crate::model::{Citation, ResourceId};

pub const DAMPING: f64 = 0.85;
pub const MAX_ITERATIONS: usize = 100;
pub const CONVERGENCE_THRESHOLD: f64 = 1e-6;

/// Run PageRank over nodes = resources with ≥1 resolved citation (as source
/// or target), edges = resolved citations. Returns scores scaled to [0,1]
/// by min-max; a graph with a single node or no edges scores everything 0.
pub fn page_rank(citations: &[Citation]) -> HashMap<ResourceId, f32> {
    let resolved: Vec<(&ResourceId, &ResourceId)> = citations
        .iter()
        .filter_map(|c| c.target_resource_id.as_ref().map(|t| (&c.source_resource_id, t)))
        .collect();

    let mut nodes: Vec<ResourceId> = Vec::new();
    let mut index = HashMap::new();
    for (source, target) in &resolved {
        for node in [*source, *target] {
            if !index.contains_key(node) {
                index.insert(node.clone(), nodes.len());
                nodes.push(node.clone());
            }
        }
    }

    let n = nodes.len();
    if n == 0 {
        return HashMap::new();
    }

    let mut out_degree = vec![0usize; n];
    let mut edges_by_source: HashMap<usize, Vec<usize>> = HashMap::new();
    for (source, target) in &resolved {
        let s = index[*source];
        let t = index[*target];
        out_degree[s] += 1;
        edges_by_source.entry(s).or_default().push(t);
    }

    let mut rank = vec![1.0 / n as f64; n];
    let base = (1.0 - DAMPING) / n as f64;

    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![base; n];

        let dangling_mass: f64 = (0..n)
            .filter(|&i| out_degree[i] == 0)
            .map(|i| rank[i])
            .sum();
        let dangling_share = DAMPING * dangling_mass / n as f64;
        for slot in next.iter_mut() {
            *slot += dangling_share;
        }

        for (source, targets) in &edges_by_source {
            let share = DAMPING * rank[*source] / out_degree[*source] as f64;
            for target in targets {
                next[*target] += share;
            }
        }

        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < CONVERGENCE_THRESHOLD {
            break;
        }
    }

    min_max_scale(&nodes, &rank)
}

fn min_max_scale(nodes: &[ResourceId], rank: &[f64]) -> HashMap<ResourceId, f32> {
    let min = rank.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = rank.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    nodes
        .iter()
        .cloned()
        .zip(rank.iter())
        .map(|(node, &score)| {
            let scaled = if span > 0.0 { (score - min) / span } else { 0.0 };
            (node, scaled as f32)
        })
        .collect()
}
