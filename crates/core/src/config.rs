//! Pipeline configuration.
//!
//! Every tunable lives in one explicit struct handed to the pipeline at
//! construction. Business logic never reads the process environment;
//! [`PipelineConfig::from_env`] is called once by the binaries.

use std::env;
use std::time::Duration;

use crate::i18n;

/// Hard cap on the 2-item dish-name form before falling back to the
/// comma-joined variant, and on single-name truncation.
pub const DISH_NAME_MAX_LEN: usize = 60;

/// All pipeline tunables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum full-text relevance rank to accept a local corpus hit.
    pub search_rank_threshold: f64,
    /// TTL for cached match results. Hours, not seconds — nutrition
    /// facts do not change.
    pub match_cache_ttl: Duration,
    /// Per-call timeout for remote collaborators.
    pub provider_timeout: Duration,
    /// Bounded retry attempts before a provider call counts as a miss.
    pub provider_retry_attempts: u32,
    /// Initial backoff delay between provider retries.
    pub provider_retry_initial_delay: Duration,
    /// How many items of one job are matched concurrently.
    pub match_concurrency: usize,
    /// Upper bound on candidates accepted from the extraction step.
    pub max_items_per_job: usize,
    /// Sub-score below which a health-score factor emits feedback.
    pub feedback_threshold: f64,
    /// Locale fallback chain for message lookup, always implicitly
    /// terminated by English.
    pub locale_fallback_chain: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_rank_threshold: 0.1,
            match_cache_ttl: Duration::from_secs(24 * 3600),
            provider_timeout: Duration::from_secs(8),
            provider_retry_attempts: 2,
            provider_retry_initial_delay: Duration::from_millis(250),
            match_concurrency: 4,
            max_items_per_job: 25,
            feedback_threshold: 60.0,
            locale_fallback_chain: i18n::DEFAULT_FALLBACK_CHAIN
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl PipelineConfig {
    /// Build a config from `MEALSCAN_*` environment variables, keeping
    /// the documented default for anything unset or unparsable.
    ///
    /// Called once at binary startup (after `dotenvy::dotenv()`), never
    /// from inside pipeline code.
    pub fn from_env() -> Self {
        let d = Self::default();
        let fallback_chain = env::var("MEALSCAN_LOCALE_FALLBACKS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(d.locale_fallback_chain);

        Self {
            search_rank_threshold: env_parse(
                "MEALSCAN_SEARCH_RANK_THRESHOLD",
                d.search_rank_threshold,
            ),
            match_cache_ttl: Duration::from_secs(
                env_parse("MEALSCAN_MATCH_CACHE_TTL_HOURS", 24u64) * 3600,
            ),
            provider_timeout: Duration::from_secs(env_parse(
                "MEALSCAN_PROVIDER_TIMEOUT_SECS",
                8u64,
            )),
            provider_retry_attempts: env_parse(
                "MEALSCAN_PROVIDER_RETRY_ATTEMPTS",
                d.provider_retry_attempts,
            ),
            provider_retry_initial_delay: Duration::from_millis(env_parse(
                "MEALSCAN_PROVIDER_RETRY_INITIAL_MS",
                250u64,
            )),
            match_concurrency: env_parse("MEALSCAN_MATCH_CONCURRENCY", d.match_concurrency),
            max_items_per_job: env_parse("MEALSCAN_MAX_ITEMS_PER_JOB", d.max_items_per_job),
            feedback_threshold: env_parse("MEALSCAN_FEEDBACK_THRESHOLD", d.feedback_threshold),
            locale_fallback_chain: fallback_chain,
        }
    }
}
