//! Graph Engine (C9, spec §4.9): the conceptual multi-layer weighted graph
//! over resources — neighbor queries, the global overview, literature-based
//! discovery, and optional structural embeddings. Edges are never a row of
//! record; a [`GraphSnapshot`] derives them from primary data on demand.

mod lbd;
mod neighbors;
mod snapshot;
mod structural;

pub use lbd::{apply_validation_feedback, closed_discovery, open_discovery, DEFAULT_MIN_PLAUSIBILITY};
pub use neighbors::{neighbors, overview, layer_weight_for, Neighbor, NeighborQuery, OverviewEdge, DEFAULT_FAN_OUT_CAP};
pub use snapshot::{cosine_similarity, fuse_weights, GraphSnapshot, SUBJECT_JACCARD_THRESHOLD, TEMPORAL_YEAR_WINDOW};
pub use structural::{fuse_content_and_structural, structural_embedding, top_k_by_cosine, StructuralConfig};
