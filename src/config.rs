//! Runtime configuration (spec §6 "Configuration").
//!
//! Loaded from environment variables with typed defaults — no config-file
//! format is introduced. The default database path is resolved via `dirs`
//! the way a CLI tool conventionally places its state under the user's data
//! directory rather than the current working directory.

use std::time::Duration;

/// `$XDG_DATA_HOME/neo-alexandria/neo_alexandria.sqlite3` (or the platform
/// equivalent via `dirs::data_dir`), falling back to a relative filename if
/// no data directory can be resolved.
fn default_database_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("neo-alexandria").join("neo_alexandria.sqlite3"))
        .and_then(|path| path.to_str().map(str::to_string))
        .unwrap_or_else(|| "neo_alexandria.sqlite3".to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub embedding_dimension: usize,
    pub default_hybrid_search_weight: f32,
    pub embedding_cache_size: usize,

    pub graph_weight_vector: f32,
    pub graph_weight_tags: f32,
    pub graph_weight_classification: f32,
    pub graph_vector_min_sim_threshold: f32,
    pub default_graph_neighbors: usize,
    pub graph_overview_max_edges: usize,

    pub recommendation_profile_size: usize,
    pub recommendation_keyword_count: usize,
    pub recommendation_candidates_per_keyword: usize,
    pub search_timeout: Duration,

    pub worker_pool_size: usize,
    pub ingestion_max_retries: u32,
    pub fetch_timeout: Duration,

    /// Five weights, summing to 1 (spec §4.6): accuracy, completeness,
    /// consistency, timeliness, relevance.
    pub quality_weights: [f32; 5],

    /// Fraction of resources flagged by the periodic outlier pass (default 5%).
    pub outlier_top_fraction: f32,
    /// A resource is "degraded" when its latest quality_overall falls this
    /// fraction below its rolling 30-day mean (default 20%).
    pub degradation_threshold: f32,

    /// Cadence for the four periodic scheduler tasks (spec §4.11).
    pub citation_resolution_interval: Duration,
    pub pagerank_recomputation_interval: Duration,
    pub outlier_detection_interval: Duration,
    pub degradation_scan_interval: Duration,

    /// Max attempts per scheduled job before it is dead-lettered.
    pub scheduler_max_retries: u32,
    /// Dead letters retained per job type before the oldest is dropped.
    pub scheduler_dead_letter_cap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_path(),
            embedding_dimension: 768,
            default_hybrid_search_weight: 0.5,
            embedding_cache_size: 1000,
            graph_weight_vector: 0.6,
            graph_weight_tags: 0.3,
            graph_weight_classification: 0.1,
            graph_vector_min_sim_threshold: 0.85,
            default_graph_neighbors: 7,
            graph_overview_max_edges: 50,
            recommendation_profile_size: 50,
            recommendation_keyword_count: 5,
            recommendation_candidates_per_keyword: 10,
            search_timeout: Duration::from_secs(10),
            worker_pool_size: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            ingestion_max_retries: 5,
            fetch_timeout: Duration::from_secs(15),
            quality_weights: crate::model::DEFAULT_QUALITY_WEIGHTS,
            outlier_top_fraction: 0.05,
            degradation_threshold: 0.2,
            citation_resolution_interval: Duration::from_secs(24 * 60 * 60),
            pagerank_recomputation_interval: Duration::from_secs(7 * 24 * 60 * 60),
            outlier_detection_interval: Duration::from_secs(24 * 60 * 60),
            degradation_scan_interval: Duration::from_secs(7 * 24 * 60 * 60),
            scheduler_max_retries: 3,
            scheduler_dead_letter_cap: 100,
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults for unset or unparsable
    /// variables. Never fails — matches the teacher's "never fatal" posture
    /// for ambient configuration.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env_or("DATABASE_URL", defaults.database_url),
            embedding_dimension: env_parsed_or("EMBEDDING_DIMENSION", defaults.embedding_dimension),
            default_hybrid_search_weight: env_parsed_or(
                "DEFAULT_HYBRID_SEARCH_WEIGHT",
                defaults.default_hybrid_search_weight,
            ),
            embedding_cache_size: env_parsed_or("EMBEDDING_CACHE_SIZE", defaults.embedding_cache_size),
            graph_weight_vector: env_parsed_or("GRAPH_WEIGHT_VECTOR", defaults.graph_weight_vector),
            graph_weight_tags: env_parsed_or("GRAPH_WEIGHT_TAGS", defaults.graph_weight_tags),
            graph_weight_classification: env_parsed_or(
                "GRAPH_WEIGHT_CLASSIFICATION",
                defaults.graph_weight_classification,
            ),
            graph_vector_min_sim_threshold: env_parsed_or(
                "GRAPH_VECTOR_MIN_SIM_THRESHOLD",
                defaults.graph_vector_min_sim_threshold,
            ),
            default_graph_neighbors: env_parsed_or(
                "DEFAULT_GRAPH_NEIGHBORS",
                defaults.default_graph_neighbors,
            ),
            graph_overview_max_edges: env_parsed_or(
                "GRAPH_OVERVIEW_MAX_EDGES",
                defaults.graph_overview_max_edges,
            ),
            recommendation_profile_size: env_parsed_or(
                "RECOMMENDATION_PROFILE_SIZE",
                defaults.recommendation_profile_size,
            ),
            recommendation_keyword_count: env_parsed_or(
                "RECOMMENDATION_KEYWORD_COUNT",
                defaults.recommendation_keyword_count,
            ),
            recommendation_candidates_per_keyword: env_parsed_or(
                "RECOMMENDATION_CANDIDATES_PER_KEYWORD",
                defaults.recommendation_candidates_per_keyword,
            ),
            search_timeout: Duration::from_secs(env_parsed_or("SEARCH_TIMEOUT", 10)),
            worker_pool_size: env_parsed_or("WORKER_POOL_SIZE", defaults.worker_pool_size),
            ingestion_max_retries: env_parsed_or(
                "INGESTION_MAX_RETRIES",
                defaults.ingestion_max_retries,
            ),
            fetch_timeout: Duration::from_secs(env_parsed_or("FETCH_TIMEOUT", 15)),
            quality_weights: parse_quality_weights(defaults.quality_weights),
            outlier_top_fraction: env_parsed_or("OUTLIER_TOP_FRACTION", defaults.outlier_top_fraction),
            degradation_threshold: env_parsed_or(
                "DEGRADATION_THRESHOLD",
                defaults.degradation_threshold,
            ),
            citation_resolution_interval: Duration::from_secs(env_parsed_or(
                "CITATION_RESOLUTION_INTERVAL_SECS",
                defaults.citation_resolution_interval.as_secs(),
            )),
            pagerank_recomputation_interval: Duration::from_secs(env_parsed_or(
                "PAGERANK_RECOMPUTATION_INTERVAL_SECS",
                defaults.pagerank_recomputation_interval.as_secs(),
            )),
            outlier_detection_interval: Duration::from_secs(env_parsed_or(
                "OUTLIER_DETECTION_INTERVAL_SECS",
                defaults.outlier_detection_interval.as_secs(),
            )),
            degradation_scan_interval: Duration::from_secs(env_parsed_or(
                "DEGRADATION_SCAN_INTERVAL_SECS",
                defaults.degradation_scan_interval.as_secs(),
            )),
            scheduler_max_retries: env_parsed_or("SCHEDULER_MAX_RETRIES", defaults.scheduler_max_retries),
            scheduler_dead_letter_cap: env_parsed_or(
                "SCHEDULER_DEAD_LETTER_CAP",
                defaults.scheduler_dead_letter_cap,
            ),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_quality_weights(default: [f32; 5]) -> [f32; 5] {
    let Ok(raw) = std::env::var("QUALITY_WEIGHTS") else {
        return default;
    };
    let parsed: Vec<f32> = raw.split(',').filter_map(|s| s.trim().parse().ok()).collect();
    if parsed.len() == 5 {
        let sum: f32 = parsed.iter().sum();
        if (sum - 1.0).abs() < 1e-3 {
            return [parsed[0], parsed[1], parsed[2], parsed[3], parsed[4]];
        }
    }
    default
}
