//! Neo Alexandria CLI.
//!
//! Usage:
//!   neo-alexandria serve [--db path]
//!   neo-alexandria ingest <url> [--db path]
//!   neo-alexandria migrate [--db path]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use neo_alexandria_core::ai::AiAdapter;
use neo_alexandria_core::api::NeoAlexandriaApi;
use neo_alexandria_core::config::Config;
use neo_alexandria_core::events::{EventBus, Scheduler};
use neo_alexandria_core::model::IngestionStatus;
use neo_alexandria_core::recommend::{DuckDuckGoProvider, ProviderCache};
use neo_alexandria_core::storage::{OpenStore, SqliteStore};

#[derive(Parser)]
#[command(name = "neo-alexandria", version, about = "Personal knowledge-management backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the worker pool and scheduler, and keep the process alive.
    Serve {
        /// Path to the SQLite database file.
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Ingest a single URL synchronously (processes through to `ready`/`failed`).
    Ingest {
        url: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Open the database, applying the embedded schema migrations.
    Migrate {
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Serve { db } => run_serve(db),
        Commands::Ingest { url, db } => run_ingest(url, db),
        Commands::Migrate { db } => run_migrate(db),
    };
    std::process::exit(code);
}

fn resolved_config(db: Option<PathBuf>) -> Config {
    let mut config = Config::from_env();
    if let Some(db) = db {
        config.database_url = db.to_string_lossy().into_owned();
    }
    config
}

fn open_store(config: &Config) -> Result<SqliteStore, i32> {
    if let Some(parent) = std::path::Path::new(&config.database_url).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    SqliteStore::open(&config.database_url).map_err(|err| {
        eprintln!("error: failed to open database {}: {err}", config.database_url);
        1
    })
}

fn build_ai_adapter(config: &Config) -> AiAdapter {
    let dimension = config.embedding_dimension;
    let cache_size = config.embedding_cache_size;

    #[cfg(feature = "embeddings")]
    {
        AiAdapter::new(dimension, cache_size, || async {
            neo_alexandria_core::ai::FastEmbedBackend::load()
                .await
                .map(|backend| Arc::new(backend) as Arc<dyn neo_alexandria_core::ai::AiBackend>)
        })
    }

    // No `embeddings` feature: stay on the facade's deterministic fallbacks
    // rather than ever reaching for a model that isn't compiled in.
    #[cfg(not(feature = "embeddings"))]
    {
        AiAdapter::with_backend(dimension, cache_size, Arc::new(neo_alexandria_core::ai::MockBackend::unavailable()))
    }
}

fn build_api(store: Arc<SqliteStore>, config: Config) -> Result<NeoAlexandriaApi, i32> {
    let ai = Arc::new(build_ai_adapter(&config));
    let bus = Arc::new(EventBus::new());
    let scheduler = Arc::new(Scheduler::new(&config));
    let provider = DuckDuckGoProvider::new(config.search_timeout).map_err(|err| {
        eprintln!("error: failed to build search provider: {err}");
        1
    })?;
    let cache = Arc::new(ProviderCache::new(Duration::from_secs(300)));
    Ok(NeoAlexandriaApi::new(store, ai, bus, scheduler, Arc::new(provider), cache, config))
}

fn run_migrate(db: Option<PathBuf>) -> i32 {
    let config = resolved_config(db);
    match open_store(&config) {
        Ok(_) => {
            tracing::info!(database_url = %config.database_url, "schema up to date");
            0
        }
        Err(code) => code,
    }
}

fn run_serve(db: Option<PathBuf>) -> i32 {
    let config = resolved_config(db);
    let store = match open_store(&config) {
        Ok(store) => Arc::new(store),
        Err(code) => return code,
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start async runtime: {err}");
            return 1;
        }
    };

    runtime.block_on(async move {
        let _api = match build_api(store, config) {
            Ok(api) => api,
            Err(code) => std::process::exit(code),
        };
        tracing::info!("neo-alexandria serving; press ctrl-c to stop");
        // The HTTP routing layer is out of scope (spec §1 non-goal); this
        // keeps the worker pool and scheduler alive for out-of-process
        // ingestion triggers (e.g. a periodic cron calling `ingest`).
        tokio::signal::ctrl_c().await.ok();
    });
    0
}

fn run_ingest(url: String, db: Option<PathBuf>) -> i32 {
    let config = resolved_config(db);
    let store = match open_store(&config) {
        Ok(store) => Arc::new(store),
        Err(code) => return code,
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start async runtime: {err}");
            return 1;
        }
    };

    runtime.block_on(async move {
        let api = match build_api(store, config) {
            Ok(api) => api,
            Err(code) => return code,
        };

        let outcome = match api.ingest(&url) {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("error: {err}");
                return 1;
            }
        };

        let id = outcome.id().clone();
        println!("{id}");

        // Poll briefly so `ingest` as a scripting entry point can report the
        // terminal state instead of always printing `pending`.
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(250)).await;
            match api.get_resource(&id) {
                Ok(Some(resource))
                    if matches!(resource.ingestion_status, IngestionStatus::Ready | IngestionStatus::Failed) =>
                {
                    println!("{}", resource.ingestion_status);
                    return 0;
                }
                Ok(_) => continue,
                Err(err) => {
                    eprintln!("error: {err}");
                    return 1;
                }
            }
        }
        eprintln!("warning: ingestion still in progress after timeout, check later with the resource id above");
        0
    })
}
