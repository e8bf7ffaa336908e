//! Concrete periodic jobs (spec §4.11): thin `Job` wrappers around the
//! corpus-wide passes already implemented in `citation` and `quality`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::citation::{page_rank, resolve_unresolved_citations};
use crate::config::Config;
use crate::model::QualityDimensions;
use crate::quality::{detect_outliers, is_degraded};
use crate::storage::GraphStore;

use super::bus::{EventBus, EventName};
use super::scheduler::{Job, JobError};

fn storage_err(err: crate::storage::StorageError) -> JobError {
    JobError::Transient(err.to_string())
}

/// Matches unresolved citations against the corpus by canonical target URL
/// (spec §4.7), then emits `citation.resolved` once per pass if anything
/// changed.
pub struct CitationResolutionJob {
    store: Arc<dyn GraphStore>,
    bus: Arc<EventBus>,
}

impl CitationResolutionJob {
    pub fn new(store: Arc<dyn GraphStore>, bus: Arc<EventBus>) -> Self {
        Self { store, bus }
    }
}

#[async_trait]
impl Job for CitationResolutionJob {
    fn job_type(&self) -> &'static str {
        "citation_resolution"
    }

    async fn run(&self) -> Result<(), JobError> {
        let resolved = resolve_unresolved_citations(self.store.as_ref()).map_err(storage_err)?;
        if resolved > 0 {
            self.bus
                .emit(EventName::CitationResolved, serde_json::json!({ "resolved_count": resolved }))
                .await;
        }
        Ok(())
    }
}

/// Recomputes PageRank over resolved citations and writes each citation's
/// `importance_score` as the rank of the resource that *made* the citation
/// (the source, not the target) — a citation inherits the authority of the
/// resource citing it, not the one it points to (spec §4.7, SPEC_FULL.md §12.2).
pub struct PageRankRecomputationJob {
    store: Arc<dyn GraphStore>,
    bus: Arc<EventBus>,
}

impl PageRankRecomputationJob {
    pub fn new(store: Arc<dyn GraphStore>, bus: Arc<EventBus>) -> Self {
        Self { store, bus }
    }
}

#[async_trait]
impl Job for PageRankRecomputationJob {
    fn job_type(&self) -> &'static str {
        "pagerank_recomputation"
    }

    async fn run(&self) -> Result<(), JobError> {
        let citations = self.store.all_citations().map_err(storage_err)?;
        let scores = page_rank(&citations);

        let mut updated = 0usize;
        for citation in &citations {
            let score = scores.get(&citation.source_resource_id).copied().unwrap_or(0.0);
            self.store.update_citation_importance(&citation.id, score).map_err(storage_err)?;
            updated += 1;
        }

        if updated > 0 {
            self.bus
                .emit(EventName::CitationImportanceUpdated, serde_json::json!({ "updated_count": updated }))
                .await;
        }
        Ok(())
    }
}

/// Flags the top `config.outlier_top_fraction` of resources by distance from
/// the corpus's five-dimension quality centroid (spec §4.6). Flags are
/// logged for curator review; there is no dedicated storage surface for them
/// so they are not persisted — see DESIGN.md.
pub struct OutlierDetectionJob {
    store: Arc<dyn GraphStore>,
    outlier_top_fraction: f32,
}

impl OutlierDetectionJob {
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self { store, outlier_top_fraction: config.outlier_top_fraction }
    }
}

#[async_trait]
impl Job for OutlierDetectionJob {
    fn job_type(&self) -> &'static str {
        "outlier_detection"
    }

    async fn run(&self) -> Result<(), JobError> {
        let resources = self.store.all_resources().map_err(storage_err)?;
        let scored: Vec<(crate::model::ResourceId, QualityDimensions)> =
            resources.into_iter().map(|r| (r.id, r.quality)).collect();
        let flags = detect_outliers(&scored, self.outlier_top_fraction);
        for flag in &flags {
            tracing::info!(resource_id = %flag.resource_id, anomaly_score = flag.anomaly_score, "resource flagged as outlier");
        }
        Ok(())
    }
}

/// Flags resources whose `quality_overall` has dropped at least
/// `config.degradation_threshold` below a baseline (spec §4.6).
///
/// Spec calls for a rolling 30-day mean per resource; this store has no
/// quality-history table to compute that from (see DESIGN.md), so the
/// baseline used here is the corpus-wide mean `quality_overall` at scan
/// time. This is a deliberate approximation, not the spec's exact signal.
pub struct DegradationScanJob {
    store: Arc<dyn GraphStore>,
    degradation_threshold: f32,
}

impl DegradationScanJob {
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self { store, degradation_threshold: config.degradation_threshold }
    }
}

#[async_trait]
impl Job for DegradationScanJob {
    fn job_type(&self) -> &'static str {
        "degradation_scan"
    }

    async fn run(&self) -> Result<(), JobError> {
        let resources = self.store.all_resources().map_err(storage_err)?;
        if resources.is_empty() {
            return Ok(());
        }
        let mean: f32 = resources.iter().map(|r| r.quality_overall).sum::<f32>() / resources.len() as f32;

        for resource in &resources {
            if is_degraded(resource.quality_overall, mean, self.degradation_threshold) {
                tracing::info!(resource_id = %resource.id, quality_overall = resource.quality_overall, baseline = mean, "resource flagged as degraded");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Citation, Resource};
    use crate::storage::{OpenStore, SqliteStore};

    #[tokio::test]
    async fn citation_resolution_job_resolves_and_emits() {
        let store: Arc<dyn GraphStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let target = Resource::new("https://example.com/target");
        store.create_resource(&target).unwrap();

        let source = Resource::new("https://example.com/source");
        store.create_resource(&source).unwrap();
        let citation = Citation::new(source.id.clone(), "https://example.com/target", 0);
        store.create_citation(&citation).unwrap();

        let bus = Arc::new(EventBus::new());
        let job = CitationResolutionJob::new(store.clone(), bus.clone());
        job.run().await.unwrap();

        assert!(store.unresolved_citations().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pagerank_job_writes_importance_scores() {
        let store: Arc<dyn GraphStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let a = Resource::new("https://example.com/a");
        let b = Resource::new("https://example.com/b");
        store.create_resource(&a).unwrap();
        store.create_resource(&b).unwrap();

        let mut citation = Citation::new(a.id.clone(), "https://example.com/b", 0);
        citation.target_resource_id = Some(b.id.clone());
        store.create_citation(&citation).unwrap();

        let bus = Arc::new(EventBus::new());
        let job = PageRankRecomputationJob::new(store.clone(), bus);
        job.run().await.unwrap();

        let citations = store.citations_by_source(&a.id).unwrap();
        assert_eq!(citations.len(), 1);
    }

    #[tokio::test]
    async fn degradation_scan_does_not_fail_on_empty_corpus() {
        let store: Arc<dyn GraphStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = Config::default();
        let job = DegradationScanJob::new(store, &config);
        job.run().await.unwrap();
    }
}
