//! Citation — directed edge between a source resource and a cited target (spec §3, §4.7).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::ResourceId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationId(String);

impl CitationId {
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

impl Default for CitationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CitationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    Reference,
    Dataset,
    Code,
    General,
}

impl std::fmt::Display for CitationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Reference => "reference",
            Self::Dataset => "dataset",
            Self::Code => "code",
            Self::General => "general",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub id: CitationId,
    pub source_resource_id: ResourceId,
    pub target_url: String,
    pub target_resource_id: Option<ResourceId>,
    pub citation_type: CitationType,
    /// Context snippet, ≤100 chars around the link (spec §3).
    pub context_snippet: String,
    /// Ordinal position within the source resource.
    pub position: u32,
    /// Defaults 0; set by the PageRank pass (spec §4.7).
    pub importance_score: f32,
}

impl Citation {
    pub fn new(
        source_resource_id: ResourceId,
        target_url: impl Into<String>,
        position: u32,
    ) -> Self {
        let mut target_url = target_url.into();
        target_url.truncate(2048);
        Self {
            id: CitationId::new(),
            source_resource_id,
            target_url,
            target_resource_id: None,
            citation_type: CitationType::General,
            context_snippet: String::new(),
            position,
            importance_score: 0.0,
        }
    }

    pub fn with_context_snippet(mut self, snippet: impl Into<String>) -> Self {
        let mut s = snippet.into();
        if s.len() > 100 {
            s.truncate(100);
        }
        self.context_snippet = s;
        self
    }

    pub fn with_type(mut self, citation_type: CitationType) -> Self {
        self.citation_type = citation_type;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.target_resource_id.is_some()
    }
}

/// Classify a citation type from its target URL (spec §4.7):
/// github.com/*/archive → code, zenodo.org or *.dataset → dataset,
/// arxiv.org/doi.org → reference, else general.
pub fn classify_citation_type(target_url: &str) -> CitationType {
    let lower = target_url.to_lowercase();
    if lower.contains("github.com") && lower.contains("/archive") {
        CitationType::Code
    } else if lower.contains("zenodo.org") || lower.contains(".dataset") {
        CitationType::Dataset
    } else if lower.contains("arxiv.org") || lower.contains("doi.org") {
        CitationType::Reference
    } else {
        CitationType::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_github_archive_as_code() {
        assert_eq!(
            classify_citation_type("https://github.com/foo/bar/archive/main.zip"),
            CitationType::Code
        );
    }

    #[test]
    fn classify_arxiv_as_reference() {
        assert_eq!(
            classify_citation_type("https://arxiv.org/abs/1234.5678"),
            CitationType::Reference
        );
    }

    #[test]
    fn classify_zenodo_as_dataset() {
        assert_eq!(
            classify_citation_type("https://zenodo.org/record/123"),
            CitationType::Dataset
        );
    }

    #[test]
    fn classify_unknown_as_general() {
        assert_eq!(
            classify_citation_type("https://example.com/post"),
            CitationType::General
        );
    }

    #[test]
    fn context_snippet_truncated_to_100_chars() {
        let long = "x".repeat(200);
        let c = Citation::new(ResourceId::new(), "https://example.com", 0)
            .with_context_snippet(long);
        assert_eq!(c.context_snippet.len(), 100);
    }
}
