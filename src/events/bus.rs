//! In-process pub/sub (spec §4.11): closed event-name catalog, priority-ordered
//! subscribers, FIFO delivery per event name.
//!
//! Grounded on the teacher's `adapter::sink::AdapterSink` (async emission with
//! a result describing what happened rather than a bare `Result<(), E>`), but
//! simplified: there are no per-item commit/reject semantics here, only
//! per-handler success/failure.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

/// Closed set of event names (spec §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    ResourceCreated,
    ResourceUpdated,
    ResourceContentChanged,
    ResourceDeleted,
    ResourceReady,
    ResourceIngestFailed,
    CitationResolved,
    CitationImportanceUpdated,
    GraphInvalidated,
    GraphValidated,
    TaxonomyNodeUpdated,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceCreated => "resource.created",
            Self::ResourceUpdated => "resource.updated",
            Self::ResourceContentChanged => "resource.content_changed",
            Self::ResourceDeleted => "resource.deleted",
            Self::ResourceReady => "resource.ready",
            Self::ResourceIngestFailed => "resource.ingest_failed",
            Self::CitationResolved => "citation.resolved",
            Self::CitationImportanceUpdated => "citation.importance_updated",
            Self::GraphInvalidated => "graph.invalidated",
            Self::GraphValidated => "graph.validated",
            Self::TaxonomyNodeUpdated => "taxonomy.node_updated",
        }
    }
}

/// Event payload: a free-form JSON object, the same loosely-typed envelope
/// the teacher passes through `Emission`/provenance metadata.
pub type EventPayload = serde_json::Value;

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error("{0}")]
    Failed(String),
}

/// A single event subscriber. `is_async` controls delivery mode: `false`
/// (default) runs inline before `emit()` returns; `true` is spawned onto the
/// tokio worker pool and its failure is only ever logged, never observed by
/// the emitter.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, payload: &EventPayload) -> Result<(), EventHandlerError>;

    fn is_async(&self) -> bool {
        false
    }
}

#[derive(Clone)]
struct Subscription {
    handler: Arc<dyn EventHandler>,
    priority: i32,
}

/// Summary of one `emit()` call, for callers (and tests) that want to confirm
/// delivery happened without reaching into logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOutcome {
    pub dispatched_inline: usize,
    pub spawned: usize,
}

/// Single-process event bus. Subscriptions are stored per event name;
/// `emit()` serializes itself per event name (via a per-name async mutex) so
/// that concurrent emits of the same event are delivered FIFO, as spec §4.11
/// and §5 require, while emits of distinct event names proceed independently.
pub struct EventBus {
    subscribers: DashMap<EventName, Vec<Subscription>>,
    locks: DashMap<EventName, Arc<AsyncMutex<()>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// Register a handler for `event`. Handlers fire in ascending `priority`
    /// order (lower runs first); ties keep subscription order.
    pub fn subscribe(&self, event: EventName, handler: Arc<dyn EventHandler>, priority: i32) {
        self.subscribers.entry(event).or_default().push(Subscription { handler, priority });
    }

    pub fn subscriber_count(&self, event: EventName) -> usize {
        self.subscribers.get(&event).map(|s| s.len()).unwrap_or(0)
    }

    /// Deliver `payload` to every subscriber of `event`. Inline handlers run
    /// in priority order and their failures are logged, not propagated —
    /// one bad handler never blocks the rest. Async handlers are spawned and
    /// not awaited here.
    pub async fn emit(&self, event: EventName, payload: EventPayload) -> EmitOutcome {
        let lock = self
            .locks
            .entry(event)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let _order = lock.lock().await;

        let mut subs: Vec<Subscription> = self.subscribers.get(&event).map(|s| s.clone()).unwrap_or_default();
        subs.sort_by_key(|s| s.priority);

        let mut outcome = EmitOutcome::default();
        for sub in subs {
            if sub.handler.is_async() {
                let handler = sub.handler.clone();
                let payload = payload.clone();
                let name = event;
                tokio::spawn(async move {
                    if let Err(err) = handler.handle(&payload).await {
                        tracing::warn!(event = name.as_str(), %err, "async event handler failed");
                    }
                });
                outcome.spawned += 1;
            } else if let Err(err) = sub.handler.handle(&payload).await {
                tracing::warn!(event = event.as_str(), %err, "event handler failed");
                outcome.dispatched_inline += 1;
            } else {
                outcome.dispatched_inline += 1;
            }
        }
        outcome
    }
}

/// Convenience handler wrapping a plain closure, for subscribers that don't
/// need their own type.
pub struct FnHandler<F> {
    f: F,
    is_async: bool,
}

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self { f, is_async: false }
    }

    pub fn spawned(f: F) -> Self {
        Self { f, is_async: true }
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&EventPayload) -> Result<(), EventHandlerError> + Send + Sync,
{
    async fn handle(&self, payload: &EventPayload) -> Result<(), EventHandlerError> {
        (self.f)(payload)
    }

    fn is_async(&self) -> bool {
        self.is_async
    }
}
