//! Process configuration. Reconciles the two config shapes retrieved from the
//! teacher snapshot (`ai_api_key`/`ai_categories` vs. `cfg.model.*`/`cfg.api.*`)
//! into one `ServerConfig`, loaded the same way the teacher loads
//! `config.toml`: a `config::Config` builder merged with environment
//! overrides, behind a `lazy_static` singleton named `cfg` so call sites read
//! it like a global constant.
use std::{collections::HashMap, time::Duration};

use config::{Config, ConfigError, Environment, File};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub temperature: f64,
    pub email_confidence_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptLimits {
    pub rate_limit_per_sec: f64,
    pub refill_interval_ms: u64,
    pub refill_amount: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenLimits {
    pub daily_user_quota: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub key: String,
    pub prompt_limits: PromptLimits,
    pub token_limits: TokenLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    /// When true, stages log their intermediate scores but never write back
    /// to the rule/semantic-cache stores (used by the pattern-learning test
    /// harness so fixtures stay stable).
    pub training_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub redis_url: String,
    pub consumer_group: String,
    pub block_ms: u64,
    pub batch_size: usize,
    pub reap_interval_secs: u64,
    pub idle_threshold_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    pub consecutive_failure_threshold: u32,
    pub failure_ratio_threshold: f64,
    pub min_requests_in_window: u32,
    pub window_secs: u64,
    pub open_duration_secs: u64,
    pub half_open_trial_requests: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub compression_threshold_bytes: usize,
    pub hot_ttl_secs: u64,
    pub warm_ttl_days: u64,
    pub list_ttl_secs: u64,
    pub retention_horizon_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationConfig {
    pub embedding_dim: usize,
    pub early_exit_threshold: f64,
    pub llm_fallback_threshold: f64,
    pub semantic_cache_write_threshold: f64,
    pub semantic_cache_dedup_similarity: f64,
    pub semantic_cache_query_similarity: f64,
    pub auto_label_similarity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    pub channel_buffer_size: usize,
    pub heartbeat_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    model: ModelConfig,
    api: ApiConfig,
    settings: SettingsConfig,
    categories: Vec<String>,
    heuristics: HashMap<String, String>,
    stream: StreamConfig,
    breaker: BreakerConfig,
    cache: CacheConfig,
    classification: ClassificationConfig,
    realtime: RealtimeConfig,
    graph: GraphConfig,
}

pub struct ServerConfig {
    pub model: ModelConfig,
    pub api: ApiConfig,
    pub settings: SettingsConfig,
    pub categories: Vec<String>,
    pub heuristics: HashMap<String, String>,
    pub stream: StreamConfig,
    pub breaker: BreakerConfig,
    pub cache: CacheConfig,
    pub classification: ClassificationConfig,
    pub realtime: RealtimeConfig,
    pub graph: GraphConfig,
}

impl ServerConfig {
    fn from_file() -> Result<Self, ConfigError> {
        let root = env!("CARGO_MANIFEST_DIR");
        let path = format!("{root}/config.toml");
        let file: ConfigFile = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(ServerConfig {
            model: file.model,
            api: file.api,
            settings: file.settings,
            categories: file.categories,
            heuristics: file.heuristics,
            stream: file.stream,
            breaker: file.breaker,
            cache: file.cache,
            classification: file.classification,
            realtime: file.realtime,
            graph: file.graph,
        })
    }

    pub fn block_wait(&self) -> Duration {
        Duration::from_millis(self.stream.block_ms)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.stream.reap_interval_secs)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.stream.idle_threshold_secs)
    }
}

impl std::fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "model={}, categories={:?}, stream_group={}",
            self.model.id, self.categories, self.stream.consumer_group
        )
    }
}

lazy_static! {
    #[allow(non_upper_case_globals)]
    pub static ref cfg: ServerConfig =
        ServerConfig::from_file().expect("config.toml is required and must be valid");
}
