//! Environment-variable configuration.
//!
//! There is no config file format: every tunable is read from the
//! process environment with a typed default, mirroring how the rest of
//! this codebase's binaries are configured. `PipelineConfig::from_env`
//! is the single place that knows the variable names and defaults.

use geosignal_types::Tier;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub tier: Tier,
    pub database_url: String,
    pub db_pool_max_connections: u32,
    pub max_selected_entries: i64,
    pub run_budget: Duration,

    pub max_concurrent_fetches: usize,
    pub per_domain_concurrency: usize,
    pub fetch_timeout: Duration,
    pub request_delay: Duration,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown: Duration,
    pub playwright_enabled: bool,

    pub min_content_length: usize,

    pub minhash_threshold: f64,
    pub minhash_shingle_size: usize,

    pub embedding_batch_size: usize,
    pub embedding_dim: usize,

    pub cluster_cosine_threshold: f32,
    pub cluster_knn_k: usize,

    pub local_summarizer_workers: usize,
    pub premium_pass_fraction: f64,
    pub oracle_max_retries: u32,

    pub abandoned_run_timeout: Duration,

    pub score_weight_member_count: f64,
    pub score_weight_domain_diversity: f64,
    pub score_weight_language_diversity: f64,
    pub score_weight_temporal_burstiness: f64,
    pub alert_top_k: usize,
    pub alert_webhook_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

fn env_var_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn env_duration_secs_or(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    env_var_or(name, default_secs).map(Duration::from_secs)
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let tier_raw = env_var_or::<String>("PIPELINE_TIER", "B".to_string())?;
        let tier = Tier::from_str(&tier_raw).map_err(|_| ConfigError::Invalid {
            name: "PIPELINE_TIER",
            value: tier_raw,
        })?;

        Ok(Self {
            tier,
            database_url,
            db_pool_max_connections: env_var_or("DB_POOL_MAX_CONNECTIONS", 20)?,
            max_selected_entries: env_var_or("MAX_SELECTED_ENTRIES", 10_000)?,
            run_budget: env_duration_secs_or("RUN_BUDGET_SECONDS", 4 * 3600)?,

            max_concurrent_fetches: env_var_or("MAX_CONCURRENT_FETCHES", 50)?,
            per_domain_concurrency: env_var_or("PER_DOMAIN_CONCURRENCY", 3)?,
            fetch_timeout: env_duration_secs_or("FETCH_TIMEOUT_SECONDS", 30)?,
            request_delay: env_duration_secs_or("REQUEST_DELAY_SECONDS", 0)?,
            circuit_breaker_threshold: env_var_or("CIRCUIT_BREAKER_THRESHOLD", 5)?,
            circuit_breaker_cooldown: env_duration_secs_or("CIRCUIT_BREAKER_COOLDOWN_SECONDS", 300)?,
            playwright_enabled: env_var_or("PLAYWRIGHT_ENABLED", false)?,

            min_content_length: env_var_or("MIN_CONTENT_LENGTH", 250)?,

            minhash_threshold: env_var_or("MINHASH_THRESHOLD", 0.8)?,
            minhash_shingle_size: env_var_or("MINHASH_SHINGLE_SIZE", 5)?,

            embedding_batch_size: env_var_or("EMBEDDING_BATCH_SIZE", 64)?,
            embedding_dim: env_var_or("EMBEDDING_DIM", 384)?,

            cluster_cosine_threshold: env_var_or("CLUSTER_COSINE_THRESHOLD", 0.65)?,
            cluster_knn_k: env_var_or("CLUSTER_KNN_K", 10)?,

            local_summarizer_workers: env_var_or("LOCAL_SUMMARIZER_WORKERS", 8)?,
            premium_pass_fraction: env_var_or("PREMIUM_PASS_FRACTION", 0.1)?,
            oracle_max_retries: env_var_or("ORACLE_MAX_RETRIES", 3)?,

            abandoned_run_timeout: env_duration_secs_or("ABANDONED_RUN_TIMEOUT_SECONDS", 7200)?,

            score_weight_member_count: env_var_or("SCORE_WEIGHT_MEMBER_COUNT", 0.4)?,
            score_weight_domain_diversity: env_var_or("SCORE_WEIGHT_DOMAIN_DIVERSITY", 0.25)?,
            score_weight_language_diversity: env_var_or("SCORE_WEIGHT_LANGUAGE_DIVERSITY", 0.15)?,
            score_weight_temporal_burstiness: env_var_or(
                "SCORE_WEIGHT_TEMPORAL_BURSTINESS",
                0.2,
            )?,
            alert_top_k: env_var_or("ALERT_TOP_K", 10)?,
            alert_webhook_url: std::env::var("ALERT_WEBHOOK_URL").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("MAX_CONCURRENT_FETCHES");
        std::env::remove_var("PIPELINE_TIER");
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");

        let cfg = PipelineConfig::from_env().unwrap();
        assert_eq!(cfg.max_concurrent_fetches, 50);
        assert_eq!(cfg.tier, Tier::B);

        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("DATABASE_URL");
        assert!(matches!(
            PipelineConfig::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn invalid_tier_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");
        std::env::set_var("PIPELINE_TIER", "Z");

        assert!(matches!(
            PipelineConfig::from_env(),
            Err(ConfigError::Invalid { name: "PIPELINE_TIER", .. })
        ));

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("PIPELINE_TIER");
    }
}
