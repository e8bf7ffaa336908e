//! Uniform facade (spec §4.3).
//!
//! Mirrors the teacher's `SubprocessClient::get_peer` pattern: a
//! mutex-guarded lazy singleton, built on first call and reused after. Where
//! the teacher's peer connection simply fails per-call when unreachable, we
//! add the spec's sticky-failure TTL so a down backend doesn't force every
//! ingestion through a doomed retry.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::error::AiError;
use super::fallback;
use super::traits::AiBackend;

type InitFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn AiBackend>, AiError>> + Send>>;
type InitFn = Box<dyn Fn() -> InitFuture + Send + Sync>;

const DEFAULT_STICKY_FAILURE_TTL: Duration = Duration::from_secs(5 * 60);
const SUMMARY_FALLBACK_SENTENCES: usize = 3;

enum BackendState {
    Uninit,
    Ready(Arc<dyn AiBackend>),
    Failed(Instant),
}

/// Lazily-initialized `embed`/`summarize`/`classify_zero_shot` facade. Every
/// public method is infallible: a backend failure or absence silently routes
/// to the matching deterministic fallback in [`super::fallback`].
pub struct AiAdapter {
    state: Mutex<BackendState>,
    init: InitFn,
    sticky_failure_ttl: Duration,
    dimension: usize,
    embedding_cache: Mutex<LruCache<[u8; 32], Vec<f32>>>,
}

impl AiAdapter {
    /// Build an adapter around an async backend factory, invoked at most
    /// once (per failure window) no matter how many concurrent callers ask
    /// for it at the same time.
    pub fn new<F, Fut>(dimension: usize, cache_size: usize, init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn AiBackend>, AiError>> + Send + 'static,
    {
        Self {
            state: Mutex::new(BackendState::Uninit),
            init: Box::new(move || Box::pin(init())),
            sticky_failure_ttl: DEFAULT_STICKY_FAILURE_TTL,
            dimension,
            embedding_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(cache_size.max(1)).expect("cache_size.max(1) is nonzero"),
            )),
        }
    }

    /// Build an adapter that is already backed by `backend` — useful for
    /// tests and for the no-model-configured case where the caller supplies
    /// [`super::mock::MockBackend::unavailable`].
    pub fn with_backend(dimension: usize, cache_size: usize, backend: Arc<dyn AiBackend>) -> Self {
        Self::new(dimension, cache_size, move || {
            let backend = backend.clone();
            async move { Ok(backend) }
        })
    }

    #[cfg(test)]
    fn with_sticky_failure_ttl(mut self, ttl: Duration) -> Self {
        self.sticky_failure_ttl = ttl;
        self
    }

    /// Resolve the backend, running init at most once; returns `None` if
    /// uninitialized, sticky-failed, or init itself failed (all three mean
    /// "use the fallback," never "return an error").
    async fn backend(&self) -> Option<Arc<dyn AiBackend>> {
        let mut guard = self.state.lock().await;
        match &*guard {
            BackendState::Ready(backend) => return Some(backend.clone()),
            BackendState::Failed(at) if at.elapsed() < self.sticky_failure_ttl => return None,
            _ => {}
        }

        match (self.init)().await {
            Ok(backend) => {
                *guard = BackendState::Ready(backend.clone());
                Some(backend)
            }
            Err(_) => {
                *guard = BackendState::Failed(Instant::now());
                None
            }
        }
    }

    /// Embed `text`, L2-normalized, memoized by SHA-256 of `text`.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        let key = sha256(text);
        if let Some(cached) = self.embedding_cache.lock().await.get(&key) {
            return cached.clone();
        }

        let raw = match self.backend().await {
            Some(backend) => match backend.embed(text).await {
                Ok(v) if !v.is_empty() => v,
                _ => fallback::hashing_embed(text, self.dimension),
            },
            None => fallback::hashing_embed(text, self.dimension),
        };
        let normalized = l2_normalize(raw);

        self.embedding_cache.lock().await.put(key, normalized.clone());
        normalized
    }

    /// Summarize `text`, falling back to first-N-sentences extraction.
    pub async fn summarize(&self, text: &str) -> String {
        match self.backend().await {
            Some(backend) => match backend.summarize(text).await {
                Ok(summary) if !summary.trim().is_empty() => summary,
                _ => fallback::first_n_sentences(text, SUMMARY_FALLBACK_SENTENCES),
            },
            None => fallback::first_n_sentences(text, SUMMARY_FALLBACK_SENTENCES),
        }
    }

    /// Score `text` against `candidate_labels`, falling back to an empty map.
    pub async fn classify_zero_shot(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> HashMap<String, f32> {
        match self.backend().await {
            Some(backend) => backend
                .classify_zero_shot(text, candidate_labels)
                .await
                .unwrap_or_else(|_| fallback::empty_classification()),
            None => fallback::empty_classification(),
        }
    }
}

fn sha256(text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockBackend;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn embed_uses_backend_when_available() {
        let backend = Arc::new(MockBackend::available().with_embedding("hello", vec![3.0, 4.0]));
        let adapter = AiAdapter::with_backend(2, 10, backend);
        let v = adapter.embed("hello").await;
        assert!((norm(&v) - 1.0).abs() < 1e-5);
        assert!((v[0] - 0.6).abs() < 1e-5);
    }

    #[tokio::test]
    async fn embed_falls_back_when_backend_unavailable() {
        let backend = Arc::new(MockBackend::unavailable());
        let adapter = AiAdapter::with_backend(32, 10, backend);
        let v = adapter.embed("fallback please").await;
        assert_eq!(v.len(), 32);
    }

    #[tokio::test]
    async fn embed_result_is_memoized() {
        let backend = Arc::new(MockBackend::available().with_embedding("hello", vec![1.0, 0.0]));
        let adapter = AiAdapter::with_backend(2, 10, backend);
        let first = adapter.embed("hello").await;
        // Second call must not require the backend to have "hello" anymore.
        let second = adapter.embed("hello").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn summarize_falls_back_to_first_sentences_when_unavailable() {
        let backend = Arc::new(MockBackend::unavailable());
        let adapter = AiAdapter::with_backend(8, 10, backend);
        let summary = adapter
            .summarize("First sentence. Second sentence. Third. Fourth.")
            .await;
        assert_eq!(summary, "First sentence. Second sentence. Third");
    }

    #[tokio::test]
    async fn classify_falls_back_to_empty_map_when_unavailable() {
        let backend = Arc::new(MockBackend::unavailable());
        let adapter = AiAdapter::with_backend(8, 10, backend);
        let labels = vec!["science".to_string(), "history".to_string()];
        let scores = adapter.classify_zero_shot("some text", &labels).await;
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn init_failure_is_sticky_until_ttl_elapses() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let adapter = AiAdapter::new(8, 10, move || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AiError::Unavailable("always down".into()))
            }
        })
        .with_sticky_failure_ttl(Duration::from_millis(20));

        let _ = adapter.embed("a").await;
        let _ = adapter.embed("b").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "second call should hit the sticky failure, not re-init");

        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = adapter.embed("c").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2, "init should retry once the TTL has elapsed");
    }
}
