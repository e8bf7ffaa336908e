//! DiscoveryHypothesis — persisted literature-based-discovery result (spec §3, §4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::ResourceId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HypothesisId(String);

impl HypothesisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HypothesisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HypothesisType {
    Open,
    Closed,
}

/// Validation state of a hypothesis: unset until a curator acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validation {
    Unset,
    True,
    False,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryHypothesis {
    pub id: HypothesisId,
    pub a_resource_id: ResourceId,
    pub c_resource_id: ResourceId,
    /// Ordered sequence of bridge resources, length ≥1.
    pub b_resource_ids: Vec<ResourceId>,
    pub hypothesis_type: HypothesisType,
    pub path_strength: f32,
    pub semantic_similarity: f32,
    pub common_neighbors: u32,
    pub plausibility_score: f32,
    pub is_validated: Validation,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DiscoveryHypothesis {
    pub fn new(
        a_resource_id: ResourceId,
        c_resource_id: ResourceId,
        b_resource_ids: Vec<ResourceId>,
        hypothesis_type: HypothesisType,
    ) -> Self {
        Self {
            id: HypothesisId::new(),
            a_resource_id,
            c_resource_id,
            b_resource_ids,
            hypothesis_type,
            path_strength: 0.0,
            semantic_similarity: 0.0,
            common_neighbors: 0,
            plausibility_score: 0.0,
            is_validated: Validation::Unset,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Invariant (spec §3): a ≠ c; b_resource_ids disjoint from {a, c}.
    pub fn invariant_holds(&self) -> bool {
        if self.a_resource_id == self.c_resource_id {
            return false;
        }
        !self
            .b_resource_ids
            .iter()
            .any(|b| *b == self.a_resource_id || *b == self.c_resource_id)
    }

    /// Composite plausibility (spec §4.9 open discovery):
    /// `0.4·path_strength + 0.3·min(1, common_neighbors/5) + 0.3·semantic_similarity`.
    pub fn compute_plausibility(
        path_strength: f32,
        common_neighbors: u32,
        semantic_similarity: f32,
    ) -> f32 {
        0.4 * path_strength
            + 0.3 * (common_neighbors as f32 / 5.0).min(1.0)
            + 0.3 * semantic_similarity
    }
}
