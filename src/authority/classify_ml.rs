//! Optional ML multi-label classifier (spec §4.5) and the confidence-band
//! policy applied to its output: filter <0.3, mark 0.3–0.7 `needs_review`,
//! keep ≥0.7 unconditionally.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::ai::AiError;
use crate::model::TaxonomyNode;

#[async_trait]
pub trait MlClassifier: Send + Sync {
    /// Per-taxonomy-node confidence in [0,1] for `text`.
    async fn classify(
        &self,
        text: &str,
        taxonomy: &[TaxonomyNode],
    ) -> Result<HashMap<String, f32>, AiError>;
}

/// A `(taxonomy_node_id, confidence, needs_review)` assignment surviving the
/// confidence bands.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyAssignment {
    pub taxonomy_node_id: String,
    pub confidence: f32,
    pub needs_review: bool,
}

const LOW_CONFIDENCE_CUTOFF: f32 = 0.3;
const REVIEW_CUTOFF: f32 = 0.7;

/// Apply spec §4.5's confidence bands to a raw node→confidence map.
pub fn apply_confidence_bands(scores: HashMap<String, f32>) -> Vec<TaxonomyAssignment> {
    scores
        .into_iter()
        .filter(|(_, confidence)| *confidence >= LOW_CONFIDENCE_CUTOFF)
        .map(|(taxonomy_node_id, confidence)| TaxonomyAssignment {
            taxonomy_node_id,
            needs_review: confidence < REVIEW_CUTOFF,
            confidence,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_below_low_cutoff() {
        let mut scores = HashMap::new();
        scores.insert("node-a".to_string(), 0.2);
        scores.insert("node-b".to_string(), 0.5);
        let assignments = apply_confidence_bands(scores);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].taxonomy_node_id, "node-b");
    }

    #[test]
    fn marks_mid_band_needs_review() {
        let mut scores = HashMap::new();
        scores.insert("node-a".to_string(), 0.5);
        let assignments = apply_confidence_bands(scores);
        assert!(assignments[0].needs_review);
    }

    #[test]
    fn high_confidence_not_flagged() {
        let mut scores = HashMap::new();
        scores.insert("node-a".to_string(), 0.9);
        let assignments = apply_confidence_bands(scores);
        assert!(!assignments[0].needs_review);
    }
}
