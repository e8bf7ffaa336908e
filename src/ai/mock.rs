//! Canned-response backend for tests, the same role the teacher's
//! `MockClient` plays for `LlmOrcClient`.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::AiError;
use super::traits::AiBackend;

pub struct MockBackend {
    available: bool,
    embeddings: HashMap<String, Vec<f32>>,
    summaries: HashMap<String, String>,
    classifications: HashMap<String, HashMap<String, f32>>,
}

impl MockBackend {
    pub fn available() -> Self {
        Self {
            available: true,
            embeddings: HashMap::new(),
            summaries: HashMap::new(),
            classifications: HashMap::new(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::available()
        }
    }

    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.embeddings.insert(text.into(), vector);
        self
    }

    pub fn with_summary(mut self, text: impl Into<String>, summary: impl Into<String>) -> Self {
        self.summaries.insert(text.into(), summary.into());
        self
    }

    pub fn with_classification(
        mut self,
        text: impl Into<String>,
        scores: HashMap<String, f32>,
    ) -> Self {
        self.classifications.insert(text.into(), scores);
        self
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        if !self.available {
            return Err(AiError::Unavailable("mock backend configured as unavailable".into()));
        }
        self.embeddings
            .get(text)
            .cloned()
            .ok_or_else(|| AiError::InferenceFailed(format!("no mock embedding for '{text}'")))
    }

    async fn summarize(&self, text: &str) -> Result<String, AiError> {
        if !self.available {
            return Err(AiError::Unavailable("mock backend configured as unavailable".into()));
        }
        self.summaries
            .get(text)
            .cloned()
            .ok_or_else(|| AiError::InferenceFailed(format!("no mock summary for '{text}'")))
    }

    async fn classify_zero_shot(
        &self,
        text: &str,
        _candidate_labels: &[String],
    ) -> Result<HashMap<String, f32>, AiError> {
        if !self.available {
            return Err(AiError::Unavailable("mock backend configured as unavailable".into()));
        }
        self.classifications
            .get(text)
            .cloned()
            .ok_or_else(|| AiError::InferenceFailed(format!("no mock classification for '{text}'")))
    }
}
