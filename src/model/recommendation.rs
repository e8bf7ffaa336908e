//! Recommendation — ephemeral or persisted candidate item (spec §3, §4.10).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub external_url: Option<String>,
    pub internal_id: Option<String>,
    pub title: String,
    pub relevance_score: f32,
    pub reason: String,
}

impl Recommendation {
    pub fn external(url: impl Into<String>, title: impl Into<String>, relevance_score: f32, reason: impl Into<String>) -> Self {
        Self {
            external_url: Some(url.into()),
            internal_id: None,
            title: title.into(),
            relevance_score: relevance_score.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }
}
