//! AI Adapter (C3, spec §4.3).
//!
//! Generalizes the teacher's `llm_orc::LlmOrcClient` trait-plus-mock pattern
//! into three narrower operations (`embed`, `summarize`,
//! `classify_zero_shot`) behind one lazily-initialized facade,
//! [`AiAdapter`]. Every public operation is infallible — a missing or
//! sticky-failed backend routes straight to a deterministic fallback in
//! [`fallback`], so a down model never blocks ingestion.

mod error;
mod facade;
mod fallback;
mod mock;
mod traits;

#[cfg(feature = "embeddings")]
mod fastembed_backend;

pub use error::AiError;
pub use facade::AiAdapter;
pub use mock::MockBackend;
pub use traits::AiBackend;

#[cfg(feature = "embeddings")]
pub use fastembed_backend::FastEmbedBackend;
