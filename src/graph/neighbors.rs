//! 1-hop/2-hop neighbor queries and the global graph overview (spec §4.9).

use std::collections::HashSet;

use crate::config::Config;
use crate::model::{EdgeType, ResourceId};

use super::snapshot::{fuse_weights, GraphSnapshot};

/// Intermediate fan-out cap for 2-hop traversal (spec §4.9, default 64).
pub const DEFAULT_FAN_OUT_CAP: usize = 64;

/// Per-(neighbor, hop-path) result of a neighbor query.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub resource_id: ResourceId,
    pub hops: u8,
    /// Bridge resource for a 2-hop result; `None` for 1-hop.
    pub bridge: Option<ResourceId>,
    pub edge_types: Vec<EdgeType>,
    pub path_strength: f32,
    pub quality_overall: f32,
    pub novelty: f32,
    pub composite_score: f32,
}

/// The configured α_t layer weight for `edge_type` (spec §4.9). Shared with
/// `lbd` so open/closed discovery fuse multi-type edges the same way
/// neighbor queries do.
pub fn layer_weight_for(config: &Config, edge_type: EdgeType) -> f32 {
    match edge_type {
        EdgeType::ContentSimilarity => config.graph_weight_vector,
        EdgeType::SubjectSimilarity => config.graph_weight_tags,
        EdgeType::Citation | EdgeType::CoAuthorship | EdgeType::Temporal => config.graph_weight_classification,
    }
}

fn novelty(degree: usize) -> f32 {
    1.0 / (1.0 + (1.0 + degree as f32).ln())
}

fn composite_score(path_strength: f32, quality_overall: f32, novelty: f32) -> f32 {
    0.5 * path_strength + 0.3 * quality_overall + 0.2 * novelty
}

/// `GET /graph/resource/{id}/neighbors` (spec §4.9).
pub struct NeighborQuery {
    pub hops: u8,
    /// `None` = all edge types allowed.
    pub edge_types: Option<Vec<EdgeType>>,
    pub min_weight: f32,
    pub limit: usize,
    pub fan_out_cap: usize,
}

impl Default for NeighborQuery {
    fn default() -> Self {
        Self {
            hops: 1,
            edge_types: None,
            min_weight: 0.0,
            limit: 10,
            fan_out_cap: DEFAULT_FAN_OUT_CAP,
        }
    }
}

pub fn neighbors(
    snap: &GraphSnapshot<'_>,
    config: &Config,
    id: &ResourceId,
    query: &NeighborQuery,
) -> Vec<Neighbor> {
    let allowed = |t: EdgeType| query.edge_types.as_ref().map(|types| types.contains(&t)).unwrap_or(true);
    let theta = config.graph_vector_min_sim_threshold;

    let one_hop: Vec<(ResourceId, Vec<crate::model::GraphEdge>, f32)> = snap
        .incident_edges(id, theta)
        .into_iter()
        .filter_map(|(neighbor_id, edges)| {
            let filtered: Vec<_> = edges.into_iter().filter(|e| allowed(e.edge_type)).collect();
            if filtered.is_empty() {
                return None;
            }
            let fused = fuse_weights(&filtered, |t| layer_weight_for(config, t));
            (fused >= query.min_weight).then_some((neighbor_id, filtered, fused))
        })
        .collect();

    let mut results: Vec<Neighbor> = one_hop
        .iter()
        .map(|(neighbor_id, edges, fused)| {
            let quality_overall = snap.resource(neighbor_id).map(|r| r.quality_overall).unwrap_or(0.0);
            let novel = novelty(snap.degree(neighbor_id, theta));
            Neighbor {
                resource_id: neighbor_id.clone(),
                hops: 1,
                bridge: None,
                edge_types: edges.iter().map(|e| e.edge_type).collect(),
                path_strength: *fused,
                quality_overall,
                novelty: novel,
                composite_score: composite_score(*fused, quality_overall, novel),
            }
        })
        .collect();

    if query.hops >= 2 {
        let visited: HashSet<ResourceId> = std::iter::once(id.clone())
            .chain(one_hop.iter().map(|(n, _, _)| n.clone()))
            .collect();

        for (bridge_id, bridge_edges, bridge_fused) in one_hop.iter().take(query.fan_out_cap) {
            for (far_id, far_edges, far_fused) in snap.incident_edges(bridge_id, theta).into_iter().filter_map(
                |(far_id, edges)| {
                    if visited.contains(&far_id) {
                        return None;
                    }
                    let filtered: Vec<_> = edges.into_iter().filter(|e| allowed(e.edge_type)).collect();
                    if filtered.is_empty() {
                        return None;
                    }
                    let fused = fuse_weights(&filtered, |t| layer_weight_for(config, t));
                    Some((far_id, filtered, fused))
                },
            ) {
                let path_strength = bridge_fused * far_fused;
                if path_strength < query.min_weight {
                    continue;
                }
                let quality_overall = snap.resource(&far_id).map(|r| r.quality_overall).unwrap_or(0.0);
                let novel = novelty(snap.degree(&far_id, theta));
                // Both hops of the path contribute edge types (spec §4.9 S4):
                // origin→bridge and bridge→far.
                let mut edge_types: Vec<EdgeType> = Vec::new();
                for t in bridge_edges.iter().chain(far_edges.iter()).map(|e| e.edge_type) {
                    if !edge_types.contains(&t) {
                        edge_types.push(t);
                    }
                }
                results.push(Neighbor {
                    resource_id: far_id,
                    hops: 2,
                    bridge: Some(bridge_id.clone()),
                    edge_types,
                    path_strength,
                    quality_overall,
                    novelty: novel,
                    composite_score: composite_score(path_strength, quality_overall, novel),
                });
            }
        }
    }

    results.sort_by(|a, b| b.composite_score.partial_cmp(&a.composite_score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(query.limit);
    results
}

/// A single edge in the global overview (spec §4.9 `/graph/overview`).
#[derive(Debug, Clone)]
pub struct OverviewEdge {
    pub source_id: ResourceId,
    pub target_id: ResourceId,
    pub edge_type: EdgeType,
    pub weight: f32,
}

/// `GET /graph/overview`: content_similarity ≥ θ_content, subject_similarity
/// with Jaccard ≥ 0.3 (already the snapshot's threshold), and all citation
/// edges — sorted by weight, capped at `limit_edges`.
pub fn overview(snap: &GraphSnapshot<'_>, config: &Config, limit_edges: usize) -> Vec<OverviewEdge> {
    let theta = config.graph_vector_min_sim_threshold;
    let ids: Vec<&ResourceId> = snap.ids().collect();
    let mut edges = Vec::new();

    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            for edge in snap.edges_between(ids[i], ids[j], theta) {
                if matches!(edge.edge_type, EdgeType::ContentSimilarity | EdgeType::SubjectSimilarity | EdgeType::Citation) {
                    edges.push(OverviewEdge {
                        source_id: edge.source_id,
                        target_id: edge.target_id,
                        edge_type: edge.edge_type,
                        weight: edge.weight,
                    });
                }
            }
        }
    }

    edges.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
    edges.truncate(limit_edges);
    edges
}
