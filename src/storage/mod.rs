//! Storage & Index Layer (C1, spec §4.1).
//!
//! The primary implementation is [`SqliteStore`], an FTS-and-relational
//! store behind the [`GraphStore`] trait. When the `embeddings` feature is
//! on, [`SqliteVecStore`] adds a persistent ANN index used by the hybrid
//! search candidate-retrieval stage (spec §4.8).

mod sqlite;
#[cfg(feature = "embeddings")]
mod sqlite_vec;
mod traits;

pub use sqlite::SqliteStore;
#[cfg(feature = "embeddings")]
pub use sqlite_vec::SqliteVecStore;
pub use traits::{FtsMatch, GraphStore, OpenStore, ResourceFilter, ResourcePatch, StorageError, StorageResult};
