//! Storage trait definitions (spec §4.1).

use thiserror::Error;

use crate::error::{ErrorKind, HasErrorKind};
use crate::model::{
    Citation, CitationId, DiscoveryHypothesis, HypothesisId, Resource, ResourceId, Subject,
    SubjectId, TaxonomyNode, TaxonomyNodeId,
};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HasErrorKind for StorageError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ConstraintViolation(_) => ErrorKind::ConflictError,
            _ => ErrorKind::Internal,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Structured filters accepted by `search_fts`/candidate retrieval (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub language: Option<String>,
    pub year_range: Option<(i32, i32)>,
    pub classification_code: Option<String>,
    pub subjects_any: Vec<String>,
    pub subjects_all: Vec<String>,
    pub quality_range: Option<(f32, f32)>,
}

/// A partial update to a resource (spec §4.1 `update_resource`).
#[derive(Debug, Clone, Default)]
pub struct ResourcePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_text: Option<String>,
    pub summary: Option<String>,
    pub subjects: Option<std::collections::BTreeSet<String>>,
    pub embedding: Option<Option<Vec<f32>>>,
    pub classification_code: Option<Option<String>>,
    pub ingestion_status: Option<crate::model::IngestionStatus>,
    pub ingestion_error: Option<Option<String>>,
    pub quality: Option<crate::model::QualityDimensions>,
    pub quality_overall: Option<f32>,
    pub needs_review: Option<bool>,
    pub ingested_at: Option<Option<chrono::DateTime<chrono::Utc>>>,
}

/// A full-text match ranked by raw bm25-derived relevance (spec §4.1 `search_fts`).
#[derive(Debug, Clone)]
pub struct FtsMatch {
    pub id: ResourceId,
    pub raw_rank_score: f32,
}

/// Persistent store backing C1 (spec §4.1).
///
/// Implementations must be thread-safe (Send + Sync) to support concurrent
/// access from the worker pool and online query path.
pub trait GraphStore: Send + Sync {
    // --- Resources ---

    /// Atomic create with initial status=pending; returns the new id.
    fn create_resource(&self, resource: &Resource) -> StorageResult<ResourceId>;

    fn update_resource(&self, id: &ResourceId, patch: &ResourcePatch) -> StorageResult<()>;

    fn get_resource(&self, id: &ResourceId) -> StorageResult<Option<Resource>>;

    /// Look up a resource by its canonical source URL (dedupe check, spec §4.4 stage 1).
    fn find_resource_by_canonical_url(&self, canonical_url: &str) -> StorageResult<Option<Resource>>;

    /// Deletion cascades to citations, taxonomy assignments, collection
    /// memberships, annotations (spec §3 lifecycle).
    fn delete_resource(&self, id: &ResourceId) -> StorageResult<bool>;

    /// FTS5-backed lexical search over title/description/summary/content,
    /// weighted per spec §4.1 (title=3, description=2, summary=1.5,
    /// content=1) via `bm25()` column weights.
    fn search_fts(&self, query_text: &str, filter: &ResourceFilter, limit: usize) -> StorageResult<Vec<FtsMatch>>;

    /// Streaming iterator of (id, vector) — collected eagerly here since the
    /// trait object can't return `impl Iterator`; callers treat it as a
    /// stream regardless (spec §4.1 `resources_with_embedding`).
    fn resources_with_embedding(&self, filter: &ResourceFilter) -> StorageResult<Vec<(ResourceId, Vec<f32>)>>;

    /// Map id→row preserving input order; missing ids omitted (spec §4.1 `bulk_get`).
    fn bulk_get(&self, ids: &[ResourceId]) -> StorageResult<Vec<Resource>>;

    fn all_resources(&self) -> StorageResult<Vec<Resource>>;

    // --- Subjects (authority) ---

    fn upsert_subject(&self, subject: &Subject) -> StorageResult<()>;

    fn get_subject_by_canonical(&self, canonical_form: &str) -> StorageResult<Option<Subject>>;

    fn all_subjects(&self) -> StorageResult<Vec<Subject>>;

    // --- Taxonomy ---

    fn upsert_taxonomy_node(&self, node: &TaxonomyNode) -> StorageResult<()>;

    fn get_taxonomy_node(&self, id: &TaxonomyNodeId) -> StorageResult<Option<TaxonomyNode>>;

    fn all_taxonomy_nodes(&self) -> StorageResult<Vec<TaxonomyNode>>;

    // --- Citations ---

    fn create_citation(&self, citation: &Citation) -> StorageResult<CitationId>;

    fn update_citation_resolution(&self, id: &CitationId, target_resource_id: &ResourceId) -> StorageResult<()>;

    fn update_citation_importance(&self, id: &CitationId, importance_score: f32) -> StorageResult<()>;

    fn citations_by_source(&self, source_resource_id: &ResourceId) -> StorageResult<Vec<Citation>>;

    fn citations_by_target(&self, target_resource_id: &ResourceId) -> StorageResult<Vec<Citation>>;

    fn unresolved_citations(&self) -> StorageResult<Vec<Citation>>;

    fn all_citations(&self) -> StorageResult<Vec<Citation>>;

    // --- Hypotheses ---

    fn upsert_hypothesis(&self, hypothesis: &DiscoveryHypothesis) -> StorageResult<()>;

    fn get_hypothesis(&self, id: &HypothesisId) -> StorageResult<Option<DiscoveryHypothesis>>;

    fn all_hypotheses(&self) -> StorageResult<Vec<DiscoveryHypothesis>>;

    // --- Graph edge weight overrides (validation feedback, spec §4.9) ---

    fn get_edge_weight_override(&self, source: &ResourceId, target: &ResourceId, edge_type: &str) -> StorageResult<Option<f32>>;

    fn set_edge_weight_override(&self, source: &ResourceId, target: &ResourceId, edge_type: &str, delta_multiplier: f32) -> StorageResult<()>;

    /// Monotonically increasing counter bumped on every write — cheap
    /// cache-coherence signal across multiple engine instances sharing one
    /// database file (ADR-017 pattern in the teacher, via `PRAGMA data_version`).
    fn data_version(&self) -> StorageResult<i64>;
}

pub trait OpenStore: GraphStore + Sized {
    fn open(path: impl AsRef<std::path::Path>) -> StorageResult<Self>;

    fn open_in_memory() -> StorageResult<Self>;
}
