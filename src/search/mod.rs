//! Hybrid Search (C8, spec §4.8): parallel lexical/semantic candidate
//! retrieval, normalization, fusion, facets, and tie-broken pagination.

mod facets;
mod fusion;
mod hybrid;

pub use facets::{compute_facets, FacetCounts};
pub use fusion::{fuse, min_max_normalize, FusionMethod, RRF_K};
pub use hybrid::{
    search, SearchHit, SearchRequest, SearchResponse, DEFAULT_K_LEX, DEFAULT_K_SEM, DEFAULT_RERANK_TIMEOUT,
    DEFAULT_RERANK_TOP_N, MAX_LIMIT,
};
