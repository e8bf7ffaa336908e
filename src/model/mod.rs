//! Core data model (spec §3).
//!
//! Mirrors the teacher's `graph::{node,edge}` split — small, serde-friendly
//! value types with a typed id wrapper per entity and invariant-preserving
//! constructors — but the entities here are the domain rows Neo Alexandria
//! actually persists rather than a generic node/edge graph.

mod citation;
mod graph_edge;
mod hypothesis;
mod recommendation;
mod resource;
mod subject;
mod taxonomy;

pub use citation::{classify_citation_type, Citation, CitationId, CitationType};
pub use graph_edge::{weight, EdgeType, GraphEdge};
pub use hypothesis::{DiscoveryHypothesis, HypothesisId, HypothesisType, Validation};
pub use recommendation::Recommendation;
pub use resource::{
    IngestionStatus, QualityDimensions, Resource, ResourceFormat, ResourceId, ScholarlyMetadata,
    DEFAULT_QUALITY_WEIGHTS,
};
pub use subject::{Subject, SubjectId};
pub use taxonomy::{TaxonomyNode, TaxonomyNodeId};
