//! Score normalization and fusion (spec §4.8 steps 3–4).

use std::collections::HashMap;

use crate::model::ResourceId;

pub const RRF_K: f32 = 60.0;

/// Min-max normalize `scores` to [0,1]; a single-valued or empty set
/// normalizes to 0 for every entry (no signal to rank on).
pub fn min_max_normalize(scores: &HashMap<ResourceId, f32>) -> HashMap<ResourceId, f32> {
    if scores.is_empty() {
        return HashMap::new();
    }
    let min = scores.values().cloned().fold(f32::INFINITY, f32::min);
    let max = scores.values().cloned().fold(f32::NEG_INFINITY, f32::max);
    let span = max - min;

    scores
        .iter()
        .map(|(id, score)| {
            let normalized = if span > 0.0 { (score - min) / span } else { 0.0 };
            (id.clone(), normalized)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionMethod {
    WeightedLinear,
    ReciprocalRankFusion,
}

/// Fuse normalized lexical/semantic scores over the union of candidate ids
/// (spec §4.8 step 4). Missing candidates in a branch contribute 0.
pub fn fuse(
    lexical: &HashMap<ResourceId, f32>,
    semantic: &HashMap<ResourceId, f32>,
    method: FusionMethod,
    hybrid_weight: f32,
) -> HashMap<ResourceId, f32> {
    match method {
        FusionMethod::WeightedLinear => fuse_weighted_linear(lexical, semantic, hybrid_weight),
        FusionMethod::ReciprocalRankFusion => fuse_rrf(lexical, semantic),
    }
}

fn fuse_weighted_linear(
    lexical: &HashMap<ResourceId, f32>,
    semantic: &HashMap<ResourceId, f32>,
    hybrid_weight: f32,
) -> HashMap<ResourceId, f32> {
    let w = hybrid_weight.clamp(0.0, 1.0);
    let ids = lexical.keys().chain(semantic.keys()).cloned().collect::<std::collections::HashSet<_>>();
    ids.into_iter()
        .map(|id| {
            let lex = lexical.get(&id).copied().unwrap_or(0.0);
            let sem = semantic.get(&id).copied().unwrap_or(0.0);
            (id, (1.0 - w) * lex + w * sem)
        })
        .collect()
}

fn fuse_rrf(lexical: &HashMap<ResourceId, f32>, semantic: &HashMap<ResourceId, f32>) -> HashMap<ResourceId, f32> {
    let lex_ranks = ranks_of(lexical);
    let sem_ranks = ranks_of(semantic);
    let ids = lex_ranks.keys().chain(sem_ranks.keys()).cloned().collect::<std::collections::HashSet<_>>();

    ids.into_iter()
        .map(|id| {
            let mut score = 0.0;
            if let Some(rank) = lex_ranks.get(&id) {
                score += 1.0 / (RRF_K + *rank as f32);
            }
            if let Some(rank) = sem_ranks.get(&id) {
                score += 1.0 / (RRF_K + *rank as f32);
            }
            (id, score)
        })
        .collect()
}

fn ranks_of(scores: &HashMap<ResourceId, f32>) -> HashMap<ResourceId, usize> {
    let mut sorted: Vec<(&ResourceId, &f32)> = scores.iter().collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    sorted.into_iter().enumerate().map(|(rank, (id, _))| (id.clone(), rank + 1)).collect()
}
