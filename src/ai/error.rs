//! AI backend error type (spec §4.3).
//!
//! Every [`super::AiBackend`] operation is fallible, but the facade
//! ([`super::AiAdapter`]) never propagates these — they only ever trigger a
//! deterministic fallback. The type exists so backends have a uniform way to
//! say "not available right now," the same role `LlmOrcError::Unavailable`
//! plays for the teacher's ensemble client.

use thiserror::Error;

use crate::error::{ErrorKind, HasErrorKind};

#[derive(Debug, Error)]
pub enum AiError {
    #[error("model backend unavailable: {0}")]
    Unavailable(String),
    #[error("model backend does not support this operation")]
    Unsupported,
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

impl HasErrorKind for AiError {
    fn error_kind(&self) -> ErrorKind {
        ErrorKind::ModelUnavailable
    }
}
