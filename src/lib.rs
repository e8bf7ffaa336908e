//! Neo Alexandria: hybrid retrieval and graph-intelligence engine for a
//! personal knowledge-management backend.
//!
//! Ingests web pages, PDFs, and notes into a single [`model::Resource`]
//! representation, then layers search, a multi-signal knowledge graph,
//! citation analysis, literature-based discovery, and personalized
//! recommendation on top of that corpus.
//!
//! # Example
//!
//! ```no_run
//! use neo_alexandria_core::{config::Config, storage::{OpenStore, SqliteStore}};
//!
//! let config = Config::from_env();
//! let store = SqliteStore::open(&config.database_url).expect("open store");
//! ```

pub mod ai;
pub mod api;
pub mod authority;
pub mod citation;
pub mod config;
pub mod error;
pub mod events;
pub mod extractor;
pub mod graph;
pub mod ingest;
pub mod model;
pub mod quality;
pub mod recommend;
pub mod search;
pub mod storage;

pub use config::Config;
pub use error::{CoreError, CoreResult, ErrorKind, HasErrorKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
