//! GraphEdge — derived, weighted typed relation between two resources (spec §3, §4.9).
//!
//! Unlike [`crate::model::Citation`], a `GraphEdge` is never a row of record:
//! it is recomputed from primary data (citations, subjects, embeddings) the
//! same way the teacher's `Context::recompute_raw_weights` derives effective
//! edge weight from per-adapter contributions rather than storing it directly.

use serde::{Deserialize, Serialize};

use super::resource::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Citation,
    CoAuthorship,
    SubjectSimilarity,
    Temporal,
    ContentSimilarity,
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Citation => "citation",
            Self::CoAuthorship => "co_authorship",
            Self::SubjectSimilarity => "subject_similarity",
            Self::Temporal => "temporal",
            Self::ContentSimilarity => "content_similarity",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: ResourceId,
    pub target_id: ResourceId,
    pub edge_type: EdgeType,
    pub weight: f32,
}

impl GraphEdge {
    pub fn new(source_id: ResourceId, target_id: ResourceId, edge_type: EdgeType, weight: f32) -> Self {
        Self {
            source_id,
            target_id,
            edge_type,
            weight: weight.clamp(0.0, 1.0),
        }
    }
}

/// Weight formulas (spec §3):
/// citation → 1.0; co_authorship → 1/shared_author_count;
/// subject_similarity → 0.5 (flat); temporal → 0.3;
/// content_similarity → cosine(embed_a, embed_b), kept only if ≥ θ_content.
pub mod weight {
    pub fn citation() -> f32 {
        1.0
    }

    pub fn co_authorship(shared_author_count: u32) -> f32 {
        if shared_author_count == 0 {
            0.0
        } else {
            1.0 / shared_author_count as f32
        }
    }

    pub fn subject_similarity() -> f32 {
        0.5
    }

    pub fn temporal() -> f32 {
        0.3
    }

    /// `None` if cosine similarity is below `theta_content`.
    pub fn content_similarity(cosine: f32, theta_content: f32) -> Option<f32> {
        if cosine >= theta_content {
            Some(cosine)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co_authorship_weight_is_inverse_of_shared_count() {
        assert!((weight::co_authorship(2) - 0.5).abs() < 1e-6);
        assert_eq!(weight::co_authorship(0), 0.0);
    }

    #[test]
    fn content_similarity_filtered_below_threshold() {
        assert_eq!(weight::content_similarity(0.5, 0.85), None);
        assert_eq!(weight::content_similarity(0.9, 0.85), Some(0.9));
    }

    #[test]
    fn graph_edge_clamps_weight() {
        let e = GraphEdge::new(ResourceId::new(), ResourceId::new(), EdgeType::Citation, 1.5);
        assert_eq!(e.weight, 1.0);
    }
}
