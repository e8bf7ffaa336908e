//! Per-stage logic for the ingestion pipeline (spec §4.4 stages 2–5), split
//! out of `pipeline.rs` so each stage can be retried independently.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;

use crate::ai::AiAdapter;
use crate::authority::{canonicalize, classify, default_rules, resolve_subject, DEFAULT_RULE_THRESHOLD};
use crate::citation::extract_citations;
use crate::events::JobError;
use crate::extractor::{self, ExtractedContent};
use crate::model::{Citation, QualityDimensions, Resource, ResourceFormat};
use crate::quality::{score, QualityInputs};
use crate::storage::GraphStore;

/// Built-in seed labels offered to the zero-shot classifier alongside
/// whatever canonical subjects already exist in the corpus (spec §4.4 stage
/// 3: "zero-shot over a seed label set plus heuristic keyword extraction").
const SEED_SUBJECT_LABELS: &[&str] = &[
    "Machine Learning",
    "Artificial Intelligence",
    "Software Engineering",
    "Mathematics",
    "Psychology",
    "Biology",
    "Physics",
    "Economics",
    "History",
    "Philosophy",
];
const SUBJECT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const MAX_HEURISTIC_KEYWORDS: usize = 3;

/// Fetch and extract raw content (spec §4.4 stage 2). A non-2xx HTTP status
/// whose message names a 4xx code, or an unparseable body, is permanent;
/// anything else (timeouts, connection failures, 5xx) is transient.
pub async fn fetch_and_extract(source_url: &str, timeout: Duration) -> Result<ExtractedContent, JobError> {
    extractor::extract_url(source_url, timeout).await.map_err(classify_extract_error)
}

fn classify_extract_error(err: extractor::ExtractError) -> JobError {
    match err {
        extractor::ExtractError::Unparseable => JobError::Permanent(err.to_string()),
        extractor::ExtractError::Fetch(msg) if msg.contains("status 4") => JobError::Permanent(msg),
        extractor::ExtractError::Fetch(msg) => JobError::Transient(msg),
    }
}

/// Summary and canonicalized subjects (spec §4.4 stage 3). The summarize and
/// classify calls run concurrently since neither depends on the other;
/// embedding is computed by the caller once `title`/`subjects` are settled,
/// since it embeds [`Resource::composite_text`] rather than raw content.
pub async fn enrich(
    store: &dyn GraphStore,
    ai: &AiAdapter,
    title: &str,
    extracted_text: &str,
) -> Result<(String, BTreeSet<String>), JobError> {
    let candidate_labels = candidate_subject_labels(store).map_err(storage_transient)?;

    let (summary, subject_scores) = tokio::join!(
        ai.summarize(extracted_text),
        ai.classify_zero_shot(extracted_text, &candidate_labels),
    );

    let mut subjects = BTreeSet::new();
    for (label, confidence) in subject_scores {
        if confidence >= SUBJECT_CONFIDENCE_THRESHOLD {
            let resolved = resolve_subject(store, &label).map_err(storage_transient)?;
            subjects.insert(resolved.canonical_form);
        }
    }
    for keyword in heuristic_keywords(title) {
        let resolved = resolve_subject(store, &keyword).map_err(storage_transient)?;
        subjects.insert(resolved.canonical_form);
    }

    Ok((summary, subjects))
}

fn candidate_subject_labels(store: &dyn GraphStore) -> crate::storage::StorageResult<Vec<String>> {
    let mut labels: Vec<String> = store.all_subjects()?.into_iter().map(|s| s.canonical_form).collect();
    for seed in SEED_SUBJECT_LABELS {
        if !labels.iter().any(|l| l == seed) {
            labels.push(seed.to_string());
        }
    }
    Ok(labels)
}

/// Capitalized, non-stopword title tokens, canonicalized the same way an
/// authority subject would be — a stand-in for a fuller keyword extractor.
fn heuristic_keywords(title: &str) -> Vec<String> {
    title
        .split_whitespace()
        .filter(|word| word.chars().next().is_some_and(char::is_uppercase) && word.len() > 2)
        .take(MAX_HEURISTIC_KEYWORDS)
        .map(canonicalize)
        .collect()
}

/// Rule-based classification over title+subjects+summary (spec §4.4 stage
/// 3, §4.5). There is no ML classifier backend anywhere in this stack (see
/// DESIGN.md), so the rule-based path is always taken, never the ML one the
/// spec allows as an alternative.
pub fn classify_resource(title: &str, subjects: &BTreeSet<String>, summary: &str) -> Option<(String, f32)> {
    let text = format!("{title} {} {summary}", subjects.iter().cloned().collect::<Vec<_>>().join(" "));
    classify(&text, &default_rules(), DEFAULT_RULE_THRESHOLD)
}

/// Extract and persist citations from the raw fetched bytes (spec §4.4 stage
/// 4, §4.7). Writes unresolved; periodic resolution (C11) fills in targets.
pub fn extract_and_store_citations(
    store: &dyn GraphStore,
    resource_id: &crate::model::ResourceId,
    format: ResourceFormat,
    raw_bytes: &[u8],
    extracted_text: &str,
) -> Result<Vec<Citation>, JobError> {
    let citations = extract_citations(format, raw_bytes, extracted_text, resource_id);
    for citation in &citations {
        store.create_citation(citation).map_err(storage_transient)?;
    }
    Ok(citations)
}

/// Five-dimension quality scoring (spec §4.4 stage 5, §4.6). `needs_review`
/// is decided by the caller, which also knows whether classification was
/// flagged for review.
pub fn score_quality(
    store: &dyn GraphStore,
    resource: &Resource,
    outbound_citations: &[Citation],
    classification_confidence: f32,
    summary_embedding: Option<&[f32]>,
    weights: &[f32; 5],
) -> Result<(QualityDimensions, f32), JobError> {
    let inbound_citation_count = store.citations_by_target(&resource.id).map_err(storage_transient)?.len();
    let inputs = QualityInputs {
        outbound_citations,
        inbound_citation_count,
        classification_confidence,
        now: Utc::now(),
        summary_embedding,
    };
    let dims = score(resource, &inputs);
    let overall = dims.overall(weights);
    Ok((dims, overall))
}

fn storage_transient(err: crate::storage::StorageError) -> JobError {
    JobError::Transient(err.to_string())
}
