//! Transport-independent API layer.
//!
//! `NeoAlexandriaApi` is the single entry point for all consumer-facing
//! operations, grounded on the teacher's `api::PlexusApi`: every transport
//! (CLI, HTTP, whatever else gets bolted on) calls through this facade
//! rather than reaching into `storage`/`search`/`graph`/`recommend`
//! directly. Read operations return the underlying subsystem's own result
//! type; operations that need richer failure semantics than a bare
//! `StorageError` get their own error enum, the same split the teacher
//! makes between its `PlexusResult`-returning reads and its
//! `AnnotateError`/`DeleteChainError`-returning compound writes.

use std::sync::Arc;

use thiserror::Error;

use crate::ai::AiAdapter;
use crate::config::Config;
use crate::events::{EventBus, RetryPolicy, Scheduler};
use crate::graph::{self, GraphSnapshot, Neighbor, NeighborQuery, OverviewEdge};
use crate::ingest::{self, IngestJob, SubmitOutcome};
use crate::model::{DiscoveryHypothesis, HypothesisId, Resource, ResourceId};
use crate::recommend::{self, ProviderCache, RecommendationResult, SearchProvider};
use crate::search::{self, SearchRequest, SearchResponse};
use crate::storage::{GraphStore, StorageError, StorageResult};

/// Single entry point for all consumer-facing operations (ingestion, search,
/// graph traversal, discovery, recommendations).
#[derive(Clone)]
pub struct NeoAlexandriaApi {
    store: Arc<dyn GraphStore>,
    ai: Arc<AiAdapter>,
    bus: Arc<EventBus>,
    scheduler: Arc<Scheduler>,
    provider: Arc<dyn SearchProvider>,
    provider_cache: Arc<ProviderCache>,
    config: Config,
}

impl NeoAlexandriaApi {
    pub fn new(
        store: Arc<dyn GraphStore>,
        ai: Arc<AiAdapter>,
        bus: Arc<EventBus>,
        scheduler: Arc<Scheduler>,
        provider: Arc<dyn SearchProvider>,
        provider_cache: Arc<ProviderCache>,
        config: Config,
    ) -> Self {
        Self { store, ai, bus, scheduler, provider, provider_cache, config }
    }

    // --- Write ---

    /// The single ingestion entry point (spec §4.4). Synchronously
    /// normalizes/dedupes/creates; the background stages are handed to the
    /// scheduler so this returns immediately with the resource's id.
    pub fn ingest(&self, source_url: &str) -> Result<SubmitOutcome, IngestError> {
        let outcome = ingest::submit(self.store.as_ref(), source_url).map_err(IngestError::Submit)?;
        if let SubmitOutcome::Created(ref id) = outcome {
            let job = IngestJob::new(self.store.clone(), self.ai.clone(), self.bus.clone(), self.config.clone(), id.clone());
            self.scheduler.submit(Arc::new(job), RetryPolicy::from_config(&self.config));
        }
        Ok(outcome)
    }

    /// Curator feedback on a discovery hypothesis (spec §4.9): nudges the
    /// weight of every edge on the hypothesis's primary path.
    pub fn validate_hypothesis(&self, hypothesis_id: &HypothesisId, valid: bool) -> Result<(), ApiError> {
        let hypothesis = self
            .store
            .get_hypothesis(hypothesis_id)
            .map_err(ApiError::Storage)?
            .ok_or_else(|| ApiError::NotFound(hypothesis_id.to_string()))?;

        let snap = GraphSnapshot::load(self.store.as_ref()).map_err(ApiError::Storage)?;
        graph::apply_validation_feedback(self.store.as_ref(), &snap, &self.config, &hypothesis, valid)
            .map_err(ApiError::Storage)?;

        let mut updated = hypothesis;
        updated.is_validated = if valid { crate::model::Validation::True } else { crate::model::Validation::False };
        self.store.upsert_hypothesis(&updated).map_err(ApiError::Storage)?;
        Ok(())
    }

    // --- Resource reads ---

    pub fn get_resource(&self, id: &ResourceId) -> StorageResult<Option<Resource>> {
        self.store.get_resource(id)
    }

    pub fn delete_resource(&self, id: &ResourceId) -> StorageResult<bool> {
        self.store.delete_resource(id)
    }

    // --- Search (C8) ---

    pub async fn search(&self, request: &SearchRequest<'_>) -> StorageResult<SearchResponse> {
        search::search(self.store.as_ref(), self.ai.as_ref(), request).await
    }

    // --- Graph (C9) ---

    pub fn neighbors(&self, id: &ResourceId, query: &NeighborQuery) -> StorageResult<Vec<Neighbor>> {
        let snap = GraphSnapshot::load(self.store.as_ref())?;
        Ok(graph::neighbors(&snap, &self.config, id, query))
    }

    pub fn overview(&self, limit_edges: usize) -> StorageResult<Vec<OverviewEdge>> {
        let snap = GraphSnapshot::load(self.store.as_ref())?;
        Ok(graph::overview(&snap, &self.config, limit_edges))
    }

    /// Open discovery (Swanson A-B-C bridging) from a known starting resource.
    pub fn discover_open(&self, a: &ResourceId, min_plausibility: f32, limit: usize) -> StorageResult<Vec<DiscoveryHypothesis>> {
        let snap = GraphSnapshot::load(self.store.as_ref())?;
        let hypotheses = graph::open_discovery(&snap, &self.config, a, min_plausibility, limit);
        for hypothesis in &hypotheses {
            self.store.upsert_hypothesis(hypothesis)?;
        }
        Ok(hypotheses)
    }

    /// Closed discovery: known `a` and `c`, ranked candidate bridging paths.
    pub fn discover_closed(&self, a: &ResourceId, c: &ResourceId, limit: usize) -> StorageResult<Vec<DiscoveryHypothesis>> {
        let snap = GraphSnapshot::load(self.store.as_ref())?;
        let hypotheses = graph::closed_discovery(&snap, &self.config, a, c, limit);
        for hypothesis in &hypotheses {
            self.store.upsert_hypothesis(hypothesis)?;
        }
        Ok(hypotheses)
    }

    pub fn get_hypothesis(&self, id: &HypothesisId) -> StorageResult<Option<DiscoveryHypothesis>> {
        self.store.get_hypothesis(id)
    }

    // --- Recommendations (C10) ---

    pub async fn recommend(&self, limit: usize) -> StorageResult<RecommendationResult> {
        recommend::recommend(
            self.store.as_ref(),
            self.provider.as_ref(),
            self.provider_cache.as_ref(),
            self.ai.as_ref(),
            &self.config,
            limit,
        )
        .await
    }

    // --- Authority / subjects ---

    pub fn all_subjects(&self) -> StorageResult<Vec<crate::model::Subject>> {
        self.store.all_subjects()
    }

    // --- Scheduler introspection ---

    pub fn dead_letter_count(&self) -> usize {
        self.scheduler.dead_letter_count()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("ingest submit failed: {0}")]
    Submit(crate::events::JobError),
}
