//! Resource — the atomic unit of knowledge (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a [`Resource`].
///
/// A stable 128-bit id, serialized as the canonical hyphenated UUID string
/// (spec §6 "Wire conventions").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
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

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Detected/declared content format (spec §3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFormat {
    Html,
    Pdf,
    Markdown,
    Text,
}

impl std::fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::Text => "text",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ResourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            "markdown" | "md" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!("unknown resource format: {other}")),
        }
    }
}

/// Ingestion state machine (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Pending,
    Extracting,
    Enriching,
    Ready,
    Failed,
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Enriching => "enriching",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// The five quality dimensions and their weighted combination (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityDimensions {
    pub accuracy: f32,
    pub completeness: f32,
    pub consistency: f32,
    pub timeliness: f32,
    pub relevance: f32,
}

/// Default dimension weights (spec §3: 0.30/0.25/0.20/0.15/0.10).
pub const DEFAULT_QUALITY_WEIGHTS: [f32; 5] = [0.30, 0.25, 0.20, 0.15, 0.10];

impl QualityDimensions {
    pub fn zero() -> Self {
        Self {
            accuracy: 0.0,
            completeness: 0.0,
            consistency: 0.0,
            timeliness: 0.0,
            relevance: 0.0,
        }
    }

    /// Weighted sum per spec §3/§4.6. `weights` order: accuracy, completeness,
    /// consistency, timeliness, relevance.
    pub fn overall(&self, weights: &[f32; 5]) -> f32 {
        self.accuracy * weights[0]
            + self.completeness * weights[1]
            + self.consistency * weights[2]
            + self.timeliness * weights[3]
            + self.relevance * weights[4]
    }
}

/// Optional scholarly metadata (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScholarlyMetadata {
    pub doi: Option<String>,
    pub arxiv_id: Option<String>,
    pub journal: Option<String>,
    pub equation_count: u32,
    pub table_count: u32,
    pub metadata_completeness: f32,
}

/// The atomic unit of knowledge (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Unique logical key after canonicalization (spec §4.4 stage 1).
    pub source_url: String,
    pub title: String,
    pub description: String,
    pub content_text: String,
    pub summary: String,
    pub format: ResourceFormat,
    pub language: Option<String>,

    pub subjects: BTreeSet<String>,
    pub creators: Vec<String>,
    pub publication_year: Option<i32>,

    /// Dense embedding, unit-normalized on write (spec invariant #1).
    pub embedding: Option<Vec<f32>>,
    /// Sparse term→weight mapping. Optional (Open Question §12.1).
    pub sparse_embedding: Option<Vec<(String, f32)>>,

    pub classification_code: Option<String>,
    /// (taxonomy_node_id, confidence) pairs.
    pub taxonomy_nodes: Vec<(String, f32)>,

    pub quality: QualityDimensions,
    pub quality_overall: f32,
    pub needs_review: bool,

    pub ingestion_status: IngestionStatus,
    pub ingestion_error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ingested_at: Option<DateTime<Utc>>,

    pub scholarly: Option<ScholarlyMetadata>,
}

impl Resource {
    /// Construct a new pending resource for `source_url` (spec §4.1 `create_resource`).
    pub fn new(source_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ResourceId::new(),
            source_url: source_url.into(),
            title: String::new(),
            description: String::new(),
            content_text: String::new(),
            summary: String::new(),
            format: ResourceFormat::Text,
            language: None,
            subjects: BTreeSet::new(),
            creators: Vec::new(),
            publication_year: None,
            embedding: None,
            sparse_embedding: None,
            classification_code: None,
            taxonomy_nodes: Vec::new(),
            quality: QualityDimensions::zero(),
            quality_overall: 0.0,
            needs_review: false,
            ingestion_status: IngestionStatus::Pending,
            ingestion_error: None,
            created_at: now,
            updated_at: now,
            ingested_at: None,
            scholarly: None,
        }
    }

    /// Composite text used as the embedding input (spec §4.3, glossary).
    pub fn composite_text(&self) -> String {
        let subjects = self.subjects.iter().cloned().collect::<Vec<_>>().join(", ");
        format!("{} · {} · {}", self.title, self.description, subjects)
    }

    /// Invariant: `embedding` nonempty ⇒ unit norm within epsilon (spec invariant #1).
    pub fn embedding_is_unit_normalized(&self, epsilon: f32) -> bool {
        match &self.embedding {
            None => true,
            Some(v) => {
                let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                (norm - 1.0).abs() <= epsilon
            }
        }
    }

    /// Invariant: ready ⇒ embedding OR content_text present (spec invariant #2).
    pub fn ready_invariant_holds(&self) -> bool {
        if self.ingestion_status != IngestionStatus::Ready {
            return true;
        }
        self.embedding.is_some() || !self.content_text.is_empty()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_resource_is_pending_with_empty_fields() {
        let r = Resource::new("https://example.com/a");
        assert_eq!(r.ingestion_status, IngestionStatus::Pending);
        assert!(r.embedding.is_none());
        assert!(r.ready_invariant_holds());
    }

    #[test]
    fn ready_without_embedding_or_content_violates_invariant() {
        let mut r = Resource::new("https://example.com/a");
        r.ingestion_status = IngestionStatus::Ready;
        assert!(!r.ready_invariant_holds());
        r.content_text = "some text".into();
        assert!(r.ready_invariant_holds());
    }

    #[test]
    fn composite_text_joins_title_description_subjects() {
        let mut r = Resource::new("https://example.com/a");
        r.title = "Deep Learning".into();
        r.description = "An overview".into();
        r.subjects.insert("AI".into());
        r.subjects.insert("Machine Learning".into());
        assert_eq!(r.composite_text(), "Deep Learning · An overview · AI, Machine Learning");
    }

    #[test]
    fn unit_norm_check_accepts_within_epsilon() {
        let mut r = Resource::new("u");
        r.embedding = Some(vec![0.6, 0.8]); // norm = 1.0
        assert!(r.embedding_is_unit_normalized(1e-6));
        r.embedding = Some(vec![1.0, 1.0]); // norm = sqrt(2)
        assert!(!r.embedding_is_unit_normalized(1e-6));
    }

    #[test]
    fn quality_overall_matches_weighted_sum() {
        let dims = QualityDimensions {
            accuracy: 1.0,
            completeness: 1.0,
            consistency: 1.0,
            timeliness: 1.0,
            relevance: 1.0,
        };
        let overall = dims.overall(&DEFAULT_QUALITY_WEIGHTS);
        assert!((overall - 1.0).abs() < 1e-6);
    }
}
