//! Ingestion orchestrator (spec §4.4): `submit()` is the synchronous half
//! (normalize, dedupe, create — returns immediately), `process()` is the
//! background half (fetch → enrich → citations → quality → finalize),
//! wrapped as a scheduler [`Job`] by [`IngestJob`] so a caller gets the
//! "returns immediately" behavior spec §4.4 requires without blocking on
//! the background work itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ai::AiAdapter;
use crate::config::Config;
use crate::events::{EventBus, EventName, Job, JobError};
use crate::model::{IngestionStatus, Resource, ResourceId};
use crate::storage::{GraphStore, ResourcePatch};

use super::normalize::canonicalize_source_url;
use super::retry::{ingest_retry_policy, retry_stage};
use super::stages;

/// Outcome of [`submit`]: either a freshly created pending resource, or the
/// id of an already-ingested one (idempotent re-submission, spec §4.4 stage 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(ResourceId),
    AlreadyIngested(ResourceId),
}

impl SubmitOutcome {
    pub fn id(&self) -> &ResourceId {
        match self {
            Self::Created(id) | Self::AlreadyIngested(id) => id,
        }
    }
}

/// Stage 1: canonicalize `source_url`, dedupe against the store, and create
/// a pending resource if none exists. Synchronous and fast; the caller is
/// expected to hand the returned id's background work off to a scheduler.
pub fn submit(store: &dyn GraphStore, source_url: &str) -> Result<SubmitOutcome, JobError> {
    let canonical = canonicalize_source_url(source_url);

    if let Some(existing) = store.find_resource_by_canonical_url(&canonical).map_err(storage_err)? {
        return Ok(SubmitOutcome::AlreadyIngested(existing.id));
    }

    let resource = Resource::new(canonical);
    let id = store.create_resource(&resource).map_err(storage_err)?;
    Ok(SubmitOutcome::Created(id))
}

/// Stages 2–6: fetch/extract, enrich, extract citations, score quality,
/// finalize. Each retryable stage is wrapped in [`retry_stage`]; a permanent
/// failure (or final transient exhaustion) transitions the resource to
/// `failed` and emits `resource.ingest_failed` instead of propagating.
pub async fn process(
    store: &dyn GraphStore,
    ai: &AiAdapter,
    bus: &EventBus,
    config: &Config,
    resource_id: &ResourceId,
) -> Result<(), JobError> {
    match run_stages(store, ai, config, resource_id).await {
        Ok(()) => Ok(()),
        Err(err) => {
            fail_resource(store, bus, resource_id, &err).await?;
            Err(err)
        }
    }
}

async fn run_stages(
    store: &dyn GraphStore,
    ai: &AiAdapter,
    config: &Config,
    resource_id: &ResourceId,
) -> Result<(), JobError> {
    let policy = ingest_retry_policy(config);

    // Stage 2: fetch & extract.
    store
        .update_resource(resource_id, &ResourcePatch { ingestion_status: Some(IngestionStatus::Extracting), ..Default::default() })
        .map_err(storage_err)?;

    let resource = get_resource(store, resource_id)?;
    let extracted = retry_stage(&policy, || stages::fetch_and_extract(&resource.source_url, config.fetch_timeout)).await?;

    // Stage 3: enrich. Title falls back to the canonical URL when extraction
    // found none (e.g. a bare-text resource with no heading).
    store
        .update_resource(resource_id, &ResourcePatch { ingestion_status: Some(IngestionStatus::Enriching), ..Default::default() })
        .map_err(storage_err)?;

    let title = if extracted.title.is_empty() { resource.source_url.clone() } else { extracted.title.clone() };
    let (summary, subjects) =
        retry_stage(&policy, || stages::enrich(store, ai, &title, &extracted.extracted_text)).await?;

    let classification = stages::classify_resource(&title, &subjects, &summary);
    let (classification_code, classification_confidence, classification_needs_review) = match &classification {
        // The rule-based classifier's own accept threshold already acts as
        // its confidence gate (see DESIGN.md); an accepted code is always
        // treated as high-confidence, so it never alone triggers review.
        Some((code, _score)) => (Some(code.clone()), 1.0, false),
        None => (None, 0.0, false),
    };

    let mut enriched = resource.clone();
    enriched.title = title;
    enriched.content_text = extracted.extracted_text.clone();
    enriched.summary = summary.clone();
    // `description` has no independent source in this pipeline (the
    // extractor produces no meta-description); the generated summary fills
    // the role `composite_text` expects of it.
    enriched.description = summary.clone();
    enriched.subjects = subjects.clone();
    enriched.format = extracted.detected_format;
    enriched.classification_code = classification_code.clone();

    let embedding = ai.embed(&enriched.composite_text()).await;
    enriched.embedding = Some(embedding.clone());

    store
        .update_resource(
            resource_id,
            &ResourcePatch {
                title: Some(enriched.title.clone()),
                description: Some(enriched.description.clone()),
                content_text: Some(enriched.content_text.clone()),
                summary: Some(enriched.summary.clone()),
                subjects: Some(enriched.subjects.clone()),
                embedding: Some(Some(embedding)),
                classification_code: Some(enriched.classification_code.clone()),
                ..Default::default()
            },
        )
        .map_err(storage_err)?;

    // Stage 4: citations.
    let citations = retry_stage(&policy, || {
        std::future::ready(stages::extract_and_store_citations(
            store,
            resource_id,
            enriched.format,
            &extracted.raw_bytes,
            &enriched.content_text,
        ))
    })
    .await?;

    // Stage 5: quality. A summary-only embedding is computed here (the
    // scorer itself is sync and has no AI adapter in scope) so `consistency`
    // can blend in `cosine(summary_embedding, content_embedding)` per spec
    // §4.6 alongside the keyword-overlap term.
    let summary_embedding = if enriched.summary.is_empty() { None } else { Some(ai.embed(&enriched.summary).await) };
    let (dims, overall) = retry_stage(&policy, || {
        std::future::ready(stages::score_quality(
            store,
            &enriched,
            &citations,
            classification_confidence,
            summary_embedding.as_deref(),
            &config.quality_weights,
        ))
    })
    .await?;
    let needs_review = overall < 0.5 || classification_needs_review;

    store
        .update_resource(
            resource_id,
            &ResourcePatch {
                quality: Some(dims),
                quality_overall: Some(overall),
                needs_review: Some(needs_review),
                ..Default::default()
            },
        )
        .map_err(storage_err)?;

    Ok(())
}

async fn fail_resource(store: &dyn GraphStore, bus: &EventBus, resource_id: &ResourceId, err: &JobError) -> Result<(), JobError> {
    let message = err.to_string();
    store
        .update_resource(
            resource_id,
            &ResourcePatch {
                ingestion_status: Some(IngestionStatus::Failed),
                ingestion_error: Some(Some(message.clone())),
                ..Default::default()
            },
        )
        .map_err(storage_err)?;

    bus.emit(EventName::ResourceIngestFailed, json!({ "resource_id": resource_id.as_str(), "error": message })).await;
    Ok(())
}

fn get_resource(store: &dyn GraphStore, id: &ResourceId) -> Result<Resource, JobError> {
    store
        .get_resource(id)
        .map_err(storage_err)?
        .ok_or_else(|| JobError::Permanent(format!("resource {id} disappeared mid-ingestion")))
}

fn storage_err(err: crate::storage::StorageError) -> JobError {
    JobError::Transient(err.to_string())
}

/// Stage 6: finalize — status→ready, `ingested_at`=now, emit
/// `resource.created` and `resource.ready`. Split out of `process()` so
/// finalize only runs once `run_stages` has fully succeeded.
async fn finalize(store: &dyn GraphStore, bus: &EventBus, resource_id: &ResourceId) -> Result<(), JobError> {
    let now = chrono::Utc::now();
    store
        .update_resource(
            resource_id,
            &ResourcePatch {
                ingestion_status: Some(IngestionStatus::Ready),
                ingested_at: Some(Some(now)),
                ..Default::default()
            },
        )
        .map_err(storage_err)?;

    let payload = json!({ "resource_id": resource_id.as_str() });
    bus.emit(EventName::ResourceCreated, payload.clone()).await;
    bus.emit(EventName::ResourceReady, payload).await;
    Ok(())
}

/// A scheduler [`Job`] wrapping the background half of ingestion. `Arc`-owned
/// dependencies (rather than the `&dyn GraphStore`/`&AiAdapter` style used
/// elsewhere) because a `Job` must be `'static` to be spawned.
pub struct IngestJob {
    store: Arc<dyn GraphStore>,
    ai: Arc<AiAdapter>,
    bus: Arc<EventBus>,
    config: Config,
    resource_id: ResourceId,
}

impl IngestJob {
    pub fn new(store: Arc<dyn GraphStore>, ai: Arc<AiAdapter>, bus: Arc<EventBus>, config: Config, resource_id: ResourceId) -> Self {
        Self { store, ai, bus, config, resource_id }
    }
}

#[async_trait]
impl Job for IngestJob {
    fn job_type(&self) -> &'static str {
        "ingest"
    }

    async fn run(&self) -> Result<(), JobError> {
        process(self.store.as_ref(), self.ai.as_ref(), self.bus.as_ref(), &self.config, &self.resource_id).await?;
        finalize(self.store.as_ref(), self.bus.as_ref(), &self.resource_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::storage::{OpenStore, SqliteStore};

    fn test_adapter() -> AiAdapter {
        AiAdapter::with_backend(8, 10, Arc::new(MockBackend::unavailable()))
    }

    #[test]
    fn submit_creates_pending_resource() {
        let store = SqliteStore::open_in_memory().unwrap();
        let outcome = submit(&store, "https://Example.com/Page#frag").unwrap();
        let SubmitOutcome::Created(id) = outcome else { panic!("expected Created") };
        let resource = store.get_resource(&id).unwrap().unwrap();
        assert_eq!(resource.ingestion_status, IngestionStatus::Pending);
        assert_eq!(resource.source_url, "https://example.com/Page");
    }

    #[test]
    fn submit_is_idempotent_on_canonical_url() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = submit(&store, "https://example.com/a?utm_source=x").unwrap();
        let second = submit(&store, "https://example.com/a").unwrap();
        assert_eq!(first.id(), second.id());
        assert!(matches!(second, SubmitOutcome::AlreadyIngested(_)));
    }

    /// Mirrors `extractor::fetch`'s own test: an unreachable host fails fast
    /// and deterministically without needing real network access, which
    /// exercises `process()`'s transient-then-exhausted failure path.
    #[tokio::test]
    async fn process_marks_resource_failed_and_emits_on_unreachable_host() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ai = test_adapter();
        let bus = EventBus::new();
        let config = Config {
            ingestion_max_retries: 1,
            fetch_timeout: std::time::Duration::from_millis(200),
            ..Config::default()
        };

        let outcome = submit(&store, "http://127.0.0.1:1/unreachable").unwrap();
        let id = outcome.id().clone();

        let result = process(&store, &ai, &bus, &config, &id).await;
        assert!(result.is_err());

        let resource = store.get_resource(&id).unwrap().unwrap();
        assert_eq!(resource.ingestion_status, IngestionStatus::Failed);
        assert!(resource.ingestion_error.is_some());
    }

    #[tokio::test]
    async fn finalize_marks_ready_and_emits_created_and_ready() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bus = EventBus::new();
        let outcome = submit(&store, "https://example.com/a").unwrap();
        let id = outcome.id().clone();

        finalize(&store, &bus, &id).await.unwrap();

        let resource = store.get_resource(&id).unwrap().unwrap();
        assert_eq!(resource.ingestion_status, IngestionStatus::Ready);
        assert!(resource.ingested_at.is_some());
    }
}
