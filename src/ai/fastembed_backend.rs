//! Real embedding backend (behind the `embeddings` feature), grounded on the
//! `TextEmbedding::try_new(InitOptions::new(..))` / `model.embed(vec![text],
//! None)` pattern used for local ONNX sentence embeddings. Only implements
//! `embed` — `summarize`/`classify_zero_shot` are unsupported here, so
//! `AiAdapter` falls back to the deterministic paths for those.

use std::collections::HashMap;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;

use super::error::AiError;
use super::traits::AiBackend;

/// Wraps a `fastembed::TextEmbedding`. Model init is blocking (loads/
/// downloads ONNX weights) so it's done once inside a `spawn_blocking`; the
/// loaded model is then reused for every `embed` call.
pub struct FastEmbedBackend {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedBackend {
    /// Load the default sentence-embedding model. Blocking; call this from
    /// inside the lazy-init path of `AiAdapter`, not on a hot request path.
    pub async fn load() -> Result<Self, AiError> {
        let model = tokio::task::spawn_blocking(|| {
            TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
        })
        .await
        .map_err(|e| AiError::Unavailable(format!("embedding model init task panicked: {e}")))?
        .map_err(|e| AiError::Unavailable(format!("failed to load embedding model: {e}")))?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

#[async_trait]
impl AiBackend for FastEmbedBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let mut model = self.model.lock().await;
        let owned = text.to_string();
        let mut vectors = model
            .embed(vec![owned.as_str()], None)
            .map_err(|e| AiError::InferenceFailed(e.to_string()))?;
        vectors
            .pop()
            .ok_or_else(|| AiError::InferenceFailed("embedding model returned no vector".into()))
    }

    async fn summarize(&self, _text: &str) -> Result<String, AiError> {
        Err(AiError::Unsupported)
    }

    async fn classify_zero_shot(
        &self,
        _text: &str,
        _candidate_labels: &[String],
    ) -> Result<HashMap<String, f32>, AiError> {
        Err(AiError::Unsupported)
    }
}
