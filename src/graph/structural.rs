//! Optional structural graph embeddings (spec §4.9): a Weisfeiler-Lehman
//! style random-walk encoding fused with the content embedding.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::ResourceId;

use super::snapshot::GraphSnapshot;

#[derive(Debug, Clone)]
pub struct StructuralConfig {
    pub dimension: usize,
    pub walk_length: usize,
    pub window: usize,
    pub theta_content: f32,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            dimension: 64,
            walk_length: 4,
            window: 2,
            theta_content: 0.85,
        }
    }
}

/// Feature-hashed bag-of-neighborhoods embedding: each node's signature is
/// the multiset of node ids visited within `window` hops, hashed into a
/// fixed-width vector and L2-normalized — a WL-style refinement without the
/// cost of the full iterative color-refinement algorithm.
pub fn structural_embedding(snap: &GraphSnapshot<'_>, config: &StructuralConfig, id: &ResourceId) -> Vec<f32> {
    let mut vector = vec![0.0f32; config.dimension];
    let mut frontier = vec![id.clone()];
    let mut visited = std::collections::HashSet::new();
    visited.insert(id.clone());

    for depth in 0..config.window.min(config.walk_length) {
        let weight = 1.0 / (1.0 + depth as f32);
        let mut next_frontier = Vec::new();
        for node in &frontier {
            for (neighbor_id, _) in snap.incident_edges(node, config.theta_content) {
                if visited.insert(neighbor_id.clone()) {
                    let slot = hash_to_slot(neighbor_id.as_str(), config.dimension);
                    vector[slot] += weight;
                    next_frontier.push(neighbor_id);
                }
            }
        }
        frontier = next_frontier;
        if frontier.is_empty() {
            break;
        }
    }

    l2_normalize(&mut vector);
    vector
}

fn hash_to_slot(key: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % dimension as u64) as usize
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Combine content and structural embeddings: `fusion = α·content + (1−α)·structural`,
/// then L2-normalize (spec §4.9). Vectors must share a dimension; the
/// shorter one is zero-padded to compare against the longer.
pub fn fuse_content_and_structural(content: &[f32], structural: &[f32], alpha: f32) -> Vec<f32> {
    let len = content.len().max(structural.len());
    let mut fused = vec![0.0f32; len];
    for (i, slot) in fused.iter_mut().enumerate() {
        let c = content.get(i).copied().unwrap_or(0.0);
        let s = structural.get(i).copied().unwrap_or(0.0);
        *slot = alpha * c + (1.0 - alpha) * s;
    }
    l2_normalize(&mut fused);
    fused
}

/// Linear-scan top-k by cosine similarity, the fallback path when no
/// approximate-nearest-neighbor index is available (spec §4.9).
pub fn top_k_by_cosine<'a>(
    query: &[f32],
    candidates: impl Iterator<Item = (&'a ResourceId, &'a [f32])>,
    k: usize,
) -> Vec<(ResourceId, f32)> {
    let mut scored: Vec<(ResourceId, f32)> = candidates
        .map(|(id, vector)| (id.clone(), super::snapshot::cosine_similarity(query, vector)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}
