//! Graph construction from primary data (spec §4.9): a `GraphSnapshot` is a
//! point-in-time materialization of the conceptual multi-layer graph, built
//! by deriving typed edges between resources the same way the teacher's
//! `Context::recompute_raw_weights` recomputes effective weight from
//! per-adapter contributions rather than storing edges directly.

use std::collections::{HashMap, HashSet};

use crate::model::graph_edge::weight;
use crate::model::{EdgeType, GraphEdge, Resource, ResourceId};
use crate::storage::{GraphStore, StorageResult};

/// Minimum subject-overlap Jaccard for a `subject_similarity` edge (spec §4.9).
pub const SUBJECT_JACCARD_THRESHOLD: f32 = 0.3;
/// `temporal` edges link resources published within this many years of each
/// other. Spec §3 fixes the flat weight but leaves the trigger window
/// unspecified; a ±2 year window is the chosen middle ground between "same
/// year" (too narrow for slow-moving fields) and "same decade" (too coarse
/// to be a signal) — see DESIGN.md.
pub const TEMPORAL_YEAR_WINDOW: i32 = 2;

pub struct GraphSnapshot<'s> {
    store: &'s dyn GraphStore,
    resources: HashMap<ResourceId, Resource>,
    order: Vec<ResourceId>,
    citation_pairs: HashSet<(ResourceId, ResourceId)>,
}

impl<'s> GraphSnapshot<'s> {
    pub fn load(store: &'s dyn GraphStore) -> StorageResult<Self> {
        let resources = store.all_resources()?;
        let citations = store.all_citations()?;

        let mut index = HashMap::with_capacity(resources.len());
        let mut order = Vec::with_capacity(resources.len());
        for r in resources {
            order.push(r.id.clone());
            index.insert(r.id.clone(), r);
        }

        let citation_pairs = citations
            .into_iter()
            .filter_map(|c| c.target_resource_id.map(|t| (c.source_resource_id, t)))
            .collect();

        Ok(Self { store, resources: index, order, citation_pairs })
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.order.iter()
    }

    fn cites(&self, a: &ResourceId, b: &ResourceId) -> bool {
        self.citation_pairs.contains(&(a.clone(), b.clone())) || self.citation_pairs.contains(&(b.clone(), a.clone()))
    }

    /// Curator validation feedback (spec §4.9) is persisted as a per-edge
    /// multiplier rather than folded into the formula weight directly, so it
    /// survives a fresh snapshot recomputed from primary data. Checked in
    /// both directions since callers don't agree on which side is `source`.
    fn override_multiplier(&self, a: &ResourceId, b: &ResourceId, edge_type: EdgeType) -> f32 {
        let key = edge_type.to_string();
        self.store
            .get_edge_weight_override(a, b, &key)
            .ok()
            .flatten()
            .or_else(|| self.store.get_edge_weight_override(b, a, &key).ok().flatten())
            .unwrap_or(1.0)
    }

    /// Every typed edge between `a` and `b` per the spec §3 weight formulas.
    /// Order is not significant; a pair may carry 0..5 edges.
    pub fn edges_between(&self, a: &ResourceId, b: &ResourceId, theta_content: f32) -> Vec<GraphEdge> {
        let (Some(ra), Some(rb)) = (self.resources.get(a), self.resources.get(b)) else {
            return Vec::new();
        };
        let mut edges = Vec::new();

        if self.cites(a, b) {
            let w = weight::citation() * self.override_multiplier(a, b, EdgeType::Citation);
            edges.push(GraphEdge::new(a.clone(), b.clone(), EdgeType::Citation, w));
        }

        let shared_subjects = ra.subjects.intersection(&rb.subjects).count();
        let union_subjects = ra.subjects.union(&rb.subjects).count();
        if union_subjects > 0 && shared_subjects as f32 / union_subjects as f32 >= SUBJECT_JACCARD_THRESHOLD {
            let w = weight::subject_similarity() * self.override_multiplier(a, b, EdgeType::SubjectSimilarity);
            edges.push(GraphEdge::new(a.clone(), b.clone(), EdgeType::SubjectSimilarity, w));
        }

        let creators_a: HashSet<String> = ra.creators.iter().map(|c| c.to_lowercase()).collect();
        let shared_authors = rb.creators.iter().filter(|c| creators_a.contains(&c.to_lowercase())).count() as u32;
        if shared_authors > 0 {
            let w = weight::co_authorship(shared_authors) * self.override_multiplier(a, b, EdgeType::CoAuthorship);
            edges.push(GraphEdge::new(a.clone(), b.clone(), EdgeType::CoAuthorship, w));
        }

        if let (Some(ya), Some(yb)) = (ra.publication_year, rb.publication_year) {
            if (ya - yb).abs() <= TEMPORAL_YEAR_WINDOW {
                let w = weight::temporal() * self.override_multiplier(a, b, EdgeType::Temporal);
                edges.push(GraphEdge::new(a.clone(), b.clone(), EdgeType::Temporal, w));
            }
        }

        if let (Some(ea), Some(eb)) = (&ra.embedding, &rb.embedding) {
            let cosine = cosine_similarity(ea, eb);
            if let Some(w) = weight::content_similarity(cosine, theta_content) {
                let w = w * self.override_multiplier(a, b, EdgeType::ContentSimilarity);
                edges.push(GraphEdge::new(a.clone(), b.clone(), EdgeType::ContentSimilarity, w));
            }
        }

        edges
    }

    /// All resources with ≥1 typed edge to `id`, each paired with those edges.
    pub fn incident_edges(&self, id: &ResourceId, theta_content: f32) -> Vec<(ResourceId, Vec<GraphEdge>)> {
        self.order
            .iter()
            .filter(|other| *other != id)
            .filter_map(|other| {
                let edges = self.edges_between(id, other, theta_content);
                (!edges.is_empty()).then(|| (other.clone(), edges))
            })
            .collect()
    }

    /// Edge count of `id`'s 1-hop neighborhood, used by `novelty` (spec §4.9).
    pub fn degree(&self, id: &ResourceId, theta_content: f32) -> usize {
        self.incident_edges(id, theta_content).len()
    }
}

/// Fuse same-neighbor multi-type edges: `fused = 1 − Π(1 − w_t·α_t)` (spec §4.9).
pub fn fuse_weights(edges: &[GraphEdge], layer_weight: impl Fn(EdgeType) -> f32) -> f32 {
    let product: f32 = edges.iter().map(|e| 1.0 - e.weight * layer_weight(e.edge_type)).product();
    1.0 - product
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}
