//! Crate-wide error kinds (spec §7).
//!
//! Every subsystem defines its own `thiserror`-derived error enum (as the
//! teacher does with `StorageError`/`AdapterError`), and reports one of
//! these closed kinds through [`HasErrorKind`] so that a transport layer —
//! which this crate does not implement, see spec §1 — can translate any
//! error into the right HTTP status without matching on every variant.

use thiserror::Error;

/// Closed set of error kinds from spec §7, table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ValidationError,
    ConflictError,
    PermissionDenied,
    FetchError,
    ExtractionError,
    ModelUnavailable,
    Timeout,
    DependencyDegraded,
    Internal,
}

pub trait HasErrorKind {
    fn error_kind(&self) -> ErrorKind;
}

/// Top-level error for the public API facade ([`crate::api::NeoAlexandriaApi`]).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("extraction error: {0}")]
    Extraction(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("dependency degraded: {0}")]
    DependencyDegraded(String),
    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl HasErrorKind for CoreError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Conflict(_) => ErrorKind::ConflictError,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Fetch(_) => ErrorKind::FetchError,
            Self::Extraction(_) => ErrorKind::ExtractionError,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::DependencyDegraded(_) => ErrorKind::DependencyDegraded,
            Self::Storage(e) => e.error_kind(),
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
