//! Deterministic fallbacks (spec §4.3: "Never fatal to ingestion — every
//! operation has a deterministic fallback").
//!
//! These run whenever no backend is installed, the backend is sticky-failed,
//! or a backend returns [`super::AiError::Unsupported`] for an operation it
//! doesn't implement (e.g. an embeddings-only model has nothing to say about
//! `summarize`).

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Feature-hashed bag-of-words embedding: tokenize, hash each token into one
/// of `dimension` buckets, accumulate term frequency, L2-normalize. Crude
/// compared to a learned embedding, but deterministic and dependency-free,
/// which is what a fallback needs to be.
pub fn hashing_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut buckets = vec![0f32; dimension.max(1)];
    for token in text.split_whitespace().map(str::to_lowercase) {
        if token.is_empty() {
            continue;
        }
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % buckets.len();
        buckets[idx] += 1.0;
    }
    let norm = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in buckets.iter_mut() {
            *v /= norm;
        }
    }
    buckets
}

/// Extractive summary: first `n` sentences, split on `.`/`!`/`?` boundaries.
pub fn first_n_sentences(text: &str, n: usize) -> String {
    text.split_terminator(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(n)
        .collect::<Vec<_>>()
        .join(". ")
}

/// Zero-shot classification with no model available: no evidence, no labels.
pub fn empty_classification() -> HashMap<String, f32> {
    HashMap::new()
}
