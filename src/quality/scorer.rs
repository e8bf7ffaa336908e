//! Five-dimension quality scoring (spec §4.6).

use chrono::{DateTime, Datelike, Utc};

use crate::model::{Citation, QualityDimensions, Resource};

const RECENCY_BONUS_WINDOW_DAYS: i64 = 180;
/// Saturation point for the inbound-citation-count normalization in
/// `relevance` — chosen so a handful of citations already nears full
/// relevance credit without an unbounded count dominating the score.
const RELEVANCE_CITATION_SATURATION: f64 = 50.0;

/// Extra signals the scorer needs beyond the resource itself — citation
/// counts and classification confidence live outside `Resource` proper.
pub struct QualityInputs<'a> {
    pub outbound_citations: &'a [Citation],
    pub inbound_citation_count: usize,
    pub classification_confidence: f32,
    pub now: DateTime<Utc>,
    /// Summary-only embedding, computed by the caller (the ingestion
    /// pipeline, which has `AiAdapter` in scope) alongside the resource's
    /// composite embedding. `consistency` blends `cosine(summary_embedding,
    /// resource.embedding)` in when both are present (spec §4.6).
    pub summary_embedding: Option<&'a [f32]>,
}

/// Score all five dimensions for `resource` given `inputs` (spec §4.6).
pub fn score(resource: &Resource, inputs: &QualityInputs) -> QualityDimensions {
    QualityDimensions {
        accuracy: accuracy(resource, inputs.outbound_citations),
        completeness: completeness(resource),
        consistency: consistency(resource, inputs.summary_embedding),
        timeliness: timeliness(resource, inputs.now),
        relevance: relevance(inputs.classification_confidence, inputs.inbound_citation_count),
    }
}

/// (a) resolved-citation ratio, (b) source domain reputation, (c) presence
/// of a scholarly identifier — averaged equally.
fn accuracy(resource: &Resource, outbound_citations: &[Citation]) -> f32 {
    let resolved_ratio = if outbound_citations.is_empty() {
        0.0
    } else {
        let resolved = outbound_citations.iter().filter(|c| c.is_resolved()).count();
        resolved as f32 / outbound_citations.len() as f32
    };

    let reputation = domain_reputation(&resource.source_url);

    let has_identifier = resource
        .scholarly
        .as_ref()
        .map(|s| s.doi.is_some() || s.arxiv_id.is_some())
        .unwrap_or(false);

    (resolved_ratio + reputation + if has_identifier { 1.0 } else { 0.0 }) / 3.0
}

/// Domain reputation table (spec §4.6): `.edu`/`.gov`/arxiv.org score 1.0,
/// generic `.com` scores 0.3, anything else defaults to a neutral 0.5.
pub fn domain_reputation(url: &str) -> f32 {
    let lower = url.to_lowercase();
    let host = lower
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or("");

    if host.ends_with(".edu") || host.ends_with(".gov") || host.contains("arxiv.org") {
        1.0
    } else if host.ends_with(".com") {
        0.3
    } else {
        0.5
    }
}

/// Fraction of populated fields weighted by importance (spec §4.6 table).
fn completeness(resource: &Resource) -> f32 {
    let checks: [(bool, f32); 7] = [
        (!resource.title.is_empty(), 1.0),
        (!resource.content_text.is_empty(), 1.0),
        (!resource.summary.is_empty(), 0.5),
        (!resource.subjects.is_empty(), 0.4),
        (!resource.creators.is_empty(), 0.3),
        (resource.publication_year.is_some(), 0.2),
        (resource.scholarly.as_ref().and_then(|s| s.doi.as_ref()).is_some(), 0.1),
    ];
    let total_weight: f32 = checks.iter().map(|(_, w)| w).sum();
    let earned: f32 = checks.iter().filter(|(present, _)| *present).map(|(_, w)| w).sum();
    if total_weight == 0.0 {
        0.0
    } else {
        earned / total_weight
    }
}

/// Jaccard overlap between title tokens and content tokens, stopwords
/// removed, blended 1:1 with `cosine(summary_embedding, content_embedding)`
/// when both exist (spec §4.6). This model persists one composite
/// embedding per resource rather than separate summary/content embeddings,
/// so `resource.embedding` stands in for `content_embedding` — it's built
/// from `composite_text()`, which is dominated by content. Falls back to
/// the Jaccard term alone when no summary embedding is available.
fn consistency(resource: &Resource, summary_embedding: Option<&[f32]>) -> f32 {
    let title_tokens = tokenize(&resource.title);
    let content_tokens = tokenize(&resource.content_text);
    let keyword_overlap = jaccard(&title_tokens, &content_tokens);

    match (summary_embedding, resource.embedding.as_deref()) {
        (Some(summary_vec), Some(content_vec)) if !summary_vec.is_empty() && !content_vec.is_empty() => {
            let cosine = crate::graph::cosine_similarity(summary_vec, content_vec);
            (keyword_overlap + cosine) / 2.0
        }
        _ => keyword_overlap,
    }
}

fn tokenize(text: &str) -> std::collections::HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "has", "have",
    "into", "about", "their", "its", "can", "will", "not",
];

fn jaccard(a: &std::collections::HashSet<String>, b: &std::collections::HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// `max(0, 1 − (now_year − publication_year)/20)` if the year is known, else
/// a 0.5 default, plus a bonus for being recently ingested that decays
/// linearly to zero over 180 days.
fn timeliness(resource: &Resource, now: DateTime<Utc>) -> f32 {
    let base = match resource.publication_year {
        Some(year) => (1.0 - (now.date_naive().year() - year) as f32 / 20.0).max(0.0),
        None => 0.5,
    };

    let recency_bonus = match resource.ingested_at {
        Some(ingested_at) => {
            let days_since = (now - ingested_at).num_days().max(0);
            if days_since >= RECENCY_BONUS_WINDOW_DAYS {
                0.0
            } else {
                0.1 * (1.0 - days_since as f32 / RECENCY_BONUS_WINDOW_DAYS as f32)
            }
        }
        None => 0.0,
    };

    (base + recency_bonus).min(1.0)
}

/// `classification confidence × log(1 + inbound_citation_count)`, the log
/// term normalized against [`RELEVANCE_CITATION_SATURATION`] so it saturates
/// near 1.0 instead of growing unbounded.
fn relevance(classification_confidence: f32, inbound_citation_count: usize) -> f32 {
    let raw = (1.0 + inbound_citation_count as f64).ln();
    let saturation = (1.0 + RELEVANCE_CITATION_SATURATION).ln();
    let normalized = (raw / saturation).min(1.0) as f32;
    classification_confidence * normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceId, ScholarlyMetadata};

    fn sample_resource() -> Resource {
        let mut r = Resource::new("https://example.edu/paper");
        r.title = "Deep Learning Survey".to_string();
        r.content_text = "Deep learning survey of neural network architectures.".to_string();
        r.summary = "A survey.".to_string();
        r.subjects.insert("Deep Learning".into());
        r.creators.push("A. Researcher".into());
        r.publication_year = Some(2024);
        r.scholarly = Some(ScholarlyMetadata {
            doi: Some("10.1000/xyz".into()),
            ..Default::default()
        });
        r
    }

    #[test]
    fn domain_reputation_ranks_edu_above_com() {
        assert_eq!(domain_reputation("https://mit.edu/paper"), 1.0);
        assert_eq!(domain_reputation("https://example.com/post"), 0.3);
        assert_eq!(domain_reputation("https://arxiv.org/abs/123"), 1.0);
    }

    #[test]
    fn completeness_rewards_populated_fields() {
        let r = sample_resource();
        assert!(completeness(&r) > 0.9);

        let bare = Resource::new("https://example.com/bare");
        assert!(completeness(&bare) < 0.2);
    }

    #[test]
    fn consistency_matches_overlapping_tokens() {
        let r = sample_resource();
        assert!(consistency(&r, None) > 0.0);
    }

    #[test]
    fn timeliness_defaults_without_year() {
        let mut r = sample_resource();
        r.publication_year = None;
        r.ingested_at = None;
        assert_eq!(timeliness(&r, Utc::now()), 0.5);
    }

    #[test]
    fn accuracy_rewards_resolved_citations_and_identifiers() {
        let r = sample_resource();
        let resolved = Citation::new(ResourceId::new(), "https://arxiv.org/abs/1", 0);
        let mut resolved = resolved;
        resolved.target_resource_id = Some(ResourceId::new());
        let score = accuracy(&r, &[resolved]);
        assert!(score > 0.5);
    }

    #[test]
    fn relevance_saturates_with_many_citations() {
        let high = relevance(1.0, 1000);
        let low = relevance(1.0, 1);
        assert!(high > low);
        assert!(high <= 1.0);
    }

    #[test]
    fn score_combines_all_five_dimensions() {
        let r = sample_resource();
        let inputs = QualityInputs {
            outbound_citations: &[],
            inbound_citation_count: 3,
            classification_confidence: 0.8,
            now: Utc::now(),
            summary_embedding: None,
        };
        let dims = score(&r, &inputs);
        assert!(dims.completeness > 0.0);
        assert!(dims.timeliness > 0.0);
    }

    #[test]
    fn consistency_blends_in_summary_embedding_cosine_when_present() {
        let mut r = sample_resource();
        r.embedding = Some(vec![1.0, 0.0]);
        let keyword_only = consistency(&r, None);
        let with_identical_summary_embedding = consistency(&r, Some(&[1.0, 0.0]));
        assert!(with_identical_summary_embedding > keyword_only);
    }
}
