//! Literature-based discovery (spec §4.9): open discovery (Swanson-style
//! A-B-C bridging), closed discovery (known A, known C), and curator
//! validation feedback that nudges edge weights.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::model::{DiscoveryHypothesis, HypothesisType, ResourceId};
use crate::storage::{GraphStore, StorageResult};

use super::neighbors::layer_weight_for;
use super::snapshot::{cosine_similarity, fuse_weights, GraphSnapshot};

pub const DEFAULT_MIN_PLAUSIBILITY: f32 = 0.5;
const CLOSED_DISCOVERY_FAN_OUT_CAP: usize = 64;
/// Bounds the DFS explored-state count in `closed_discovery` so a dense
/// corpus can't blow up the simple-paths search.
const MAX_PATHS_EXPLORED: usize = 20_000;

/// Open discovery: find plausible C's connected to `a` only through a
/// shared bridge B, with no existing direct A–C edge.
pub fn open_discovery(
    snap: &GraphSnapshot<'_>,
    config: &Config,
    a: &ResourceId,
    min_plausibility: f32,
    limit: usize,
) -> Vec<DiscoveryHypothesis> {
    let theta = config.graph_vector_min_sim_threshold;
    let one_hop_b = snap.incident_edges(a, theta);
    let b_ids: HashSet<ResourceId> = one_hop_b.iter().map(|(id, _)| id.clone()).collect();

    let mut best_by_c: HashMap<ResourceId, (ResourceId, f32)> = HashMap::new();

    for (b_id, b_edges) in &one_hop_b {
        let fused_ab = fuse_weights(b_edges, |t| layer_weight_for(config, t));
        for (c_id, c_edges) in snap.incident_edges(b_id, theta) {
            if c_id == *a || b_ids.contains(&c_id) {
                continue;
            }
            if !snap.edges_between(a, &c_id, theta).is_empty() {
                continue;
            }
            let fused_bc = fuse_weights(&c_edges, |t| layer_weight_for(config, t));
            let path_strength = fused_ab * fused_bc;
            best_by_c
                .entry(c_id.clone())
                .and_modify(|(best_b, best_strength)| {
                    if path_strength > *best_strength {
                        *best_b = b_id.clone();
                        *best_strength = path_strength;
                    }
                })
                .or_insert((b_id.clone(), path_strength));
        }
    }

    let mut hypotheses: Vec<DiscoveryHypothesis> = best_by_c
        .into_iter()
        .map(|(c_id, (best_b, path_strength))| {
            let common_neighbors = common_neighbor_count(snap, a, &c_id, theta);
            let semantic_similarity = semantic_similarity(snap, a, &c_id);
            let plausibility_score =
                DiscoveryHypothesis::compute_plausibility(path_strength, common_neighbors, semantic_similarity);
            let mut hyp = DiscoveryHypothesis::new(a.clone(), c_id, vec![best_b], HypothesisType::Open);
            hyp.path_strength = path_strength;
            hyp.common_neighbors = common_neighbors;
            hyp.semantic_similarity = semantic_similarity;
            hyp.plausibility_score = plausibility_score;
            hyp
        })
        .filter(|h| h.plausibility_score >= min_plausibility)
        .collect();

    hypotheses.sort_by(|x, y| y.plausibility_score.partial_cmp(&x.plausibility_score).unwrap_or(Ordering::Equal));
    hypotheses.truncate(limit);
    hypotheses
}

fn common_neighbor_count(snap: &GraphSnapshot<'_>, a: &ResourceId, c: &ResourceId, theta: f32) -> u32 {
    let neighbors_a: HashSet<ResourceId> = snap.incident_edges(a, theta).into_iter().map(|(id, _)| id).collect();
    let neighbors_c: HashSet<ResourceId> = snap.incident_edges(c, theta).into_iter().map(|(id, _)| id).collect();
    neighbors_a.intersection(&neighbors_c).count() as u32
}

fn semantic_similarity(snap: &GraphSnapshot<'_>, a: &ResourceId, c: &ResourceId) -> f32 {
    match (
        snap.resource(a).and_then(|r| r.embedding.as_ref()),
        snap.resource(c).and_then(|r| r.embedding.as_ref()),
    ) {
        (Some(ea), Some(ec)) => cosine_similarity(ea, ec),
        _ => 0.0,
    }
}

fn hop_penalty(edge_count: usize) -> f32 {
    match edge_count {
        2 => 1.0,
        3 => 0.5,
        4 => 0.25,
        _ => 0.0,
    }
}

/// Closed discovery: enumerate simple paths of length 2..=4 edges between a
/// known `a` and `c`, deduplicated by bridge set, ranked by
/// `path_strength * hop_penalty`.
pub fn closed_discovery(
    snap: &GraphSnapshot<'_>,
    config: &Config,
    a: &ResourceId,
    c: &ResourceId,
    limit: usize,
) -> Vec<DiscoveryHypothesis> {
    let theta = config.graph_vector_min_sim_threshold;
    let mut results = Vec::new();
    let mut seen_bridge_sets: HashSet<Vec<ResourceId>> = HashSet::new();
    let mut explored = 0usize;

    let mut stack: Vec<(ResourceId, Vec<ResourceId>, f32)> = vec![(a.clone(), vec![a.clone()], 1.0)];

    while let Some((current, path, strength)) = stack.pop() {
        if explored >= MAX_PATHS_EXPLORED {
            break;
        }
        explored += 1;

        for (next_id, edges) in snap.incident_edges(&current, theta).into_iter().take(CLOSED_DISCOVERY_FAN_OUT_CAP) {
            if path.contains(&next_id) {
                continue;
            }
            let fused = fuse_weights(&edges, |t| layer_weight_for(config, t));
            let next_strength = strength * fused;
            let mut next_path = path.clone();
            next_path.push(next_id.clone());
            let edge_count = next_path.len() - 1;

            if next_id == *c && (2..=4).contains(&edge_count) {
                let mut bridges: Vec<ResourceId> = next_path[1..next_path.len() - 1].to_vec();
                let mut sorted_bridges = bridges.clone();
                sorted_bridges.sort();
                if seen_bridge_sets.insert(sorted_bridges) {
                    bridges.dedup();
                    let mut hyp = DiscoveryHypothesis::new(a.clone(), c.clone(), bridges, HypothesisType::Closed);
                    hyp.path_strength = next_strength;
                    hyp.plausibility_score = next_strength * hop_penalty(edge_count);
                    results.push(hyp);
                }
            } else if edge_count < 4 && next_id != *c {
                stack.push((next_id, next_path, next_strength));
            }
        }
    }

    results.sort_by(|x, y| y.plausibility_score.partial_cmp(&x.plausibility_score).unwrap_or(Ordering::Equal));
    results.truncate(limit);
    results
}

const VALIDATION_VALID_MULTIPLIER: f32 = 1.10;
const VALIDATION_INVALID_MULTIPLIER: f32 = 0.95;

/// Curator validation feedback (spec §4.9): nudge each edge on the
/// hypothesis's primary path — valid ×1.10 (clamped ≤1.0), invalid ×0.95 —
/// persisted as a per-edge multiplier so it survives graph recomputation.
pub fn apply_validation_feedback(
    store: &dyn GraphStore,
    snap: &GraphSnapshot<'_>,
    config: &Config,
    hypothesis: &DiscoveryHypothesis,
    valid: bool,
) -> StorageResult<()> {
    let theta = config.graph_vector_min_sim_threshold;
    let multiplier_delta = if valid { VALIDATION_VALID_MULTIPLIER } else { VALIDATION_INVALID_MULTIPLIER };

    let mut path = vec![hypothesis.a_resource_id.clone()];
    path.extend(hypothesis.b_resource_ids.iter().cloned());
    path.push(hypothesis.c_resource_id.clone());

    for pair in path.windows(2) {
        let (source, target) = (&pair[0], &pair[1]);
        for edge in snap.edges_between(source, target, theta) {
            let edge_type = edge.edge_type.to_string();
            let current = store.get_edge_weight_override(source, target, &edge_type)?.unwrap_or(1.0);
            let updated = (current * multiplier_delta).min(1.0);
            store.set_edge_weight_override(source, target, &edge_type, updated)?;
        }
    }
    Ok(())
}
