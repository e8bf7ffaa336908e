//! Backend trait (spec §4.3).
//!
//! Generalizes the teacher's `LlmOrcClient` (`is_available` + `invoke`) into
//! the three concrete operations the knowledge-management pipeline actually
//! needs. A single backend may implement all three, or only the ones it has
//! a model for — [`super::AiAdapter`] falls back per-operation when a
//! backend returns [`super::AiError::Unsupported`] or is unavailable.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::AiError;

#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Embed `text` into a dense vector. Implementations need not
    /// L2-normalize; [`super::AiAdapter`] does that uniformly on the result.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError>;

    /// Produce a short abstractive summary of `text`.
    async fn summarize(&self, text: &str) -> Result<String, AiError>;

    /// Score `text` against each of `candidate_labels`, each score in [0,1].
    async fn classify_zero_shot(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<HashMap<String, f32>, AiError>;
}
