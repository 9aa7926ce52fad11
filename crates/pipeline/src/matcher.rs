//! Nutrition matching engine.
//!
//! For each normalized candidate the engine walks a strict source
//! cascade — local full-text corpus, then remote nutrition provider,
//! then the vision estimate as a verbatim fallback — stopping at the
//! first confident hit. Outcomes are cached by `(normalized name,
//! locale)` with an hours-scale TTL so repeated requests skip the
//! cascade entirely.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mealscan_core::config::PipelineConfig;
use mealscan_core::error::CoreError;
use mealscan_core::normalize::normalize;
use mealscan_core::nutrients::{
    energy_density, round1, AnalyzedItem, ItemSource, Nutrients, NutrientsPer100g,
};
use mealscan_core::ports::{Cache, FoodCandidate, LocalFoodSearch, NutritionProvider};

/// Cache namespace for matching outcomes.
pub const MATCH_NAMESPACE: &str = "match";

/// A portion-independent matching outcome, as stored in the cache.
///
/// Caching the per-100g basis instead of absolute values lets one
/// cached entry serve any portion size of the same food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMatch {
    pub source: ItemSource,
    pub provider_id: Option<String>,
    pub confidence: Option<f64>,
    pub is_fallback: bool,
    pub per_100g: NutrientsPer100g,
}

/// The source cascade plus its cache.
pub struct MatchEngine {
    search: Arc<dyn LocalFoodSearch>,
    provider: Arc<dyn NutritionProvider>,
    cache: Arc<dyn Cache>,
    config: PipelineConfig,
}

impl MatchEngine {
    pub fn new(
        search: Arc<dyn LocalFoodSearch>,
        provider: Arc<dyn NutritionProvider>,
        cache: Arc<dyn Cache>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            search,
            provider,
            cache,
            config,
        }
    }

    /// Resolve one candidate into an analyzed item.
    ///
    /// Infallible by design: the vision estimate is always available as
    /// the last cascade step, so source failures degrade confidence
    /// instead of failing the job.
    pub async fn match_candidate(&self, candidate: &FoodCandidate, locale: &str) -> AnalyzedItem {
        let normalized = normalize(&candidate.name, locale);
        let cache_key = format!("{locale}:{normalized}");

        if let Some(cached) = self.cache_lookup(&cache_key).await {
            tracing::debug!(name = %normalized, locale, "match cache hit");
            return self.build_item(candidate, &cached);
        }

        let outcome = self.cascade(candidate, &normalized, locale).await;

        // A fallback derived from a zero-gram candidate has no usable
        // per-100g basis; don't poison the cache with it.
        if !(outcome.is_fallback && candidate.portion_g <= 0.0) {
            self.cache_store(&cache_key, &outcome).await;
        }

        self.build_item(candidate, &outcome)
    }

    /// Walk the cascade in strict priority order.
    async fn cascade(
        &self,
        candidate: &FoodCandidate,
        normalized: &str,
        locale: &str,
    ) -> CachedMatch {
        // 1. Local full-text corpus.
        match self.search.search(normalized).await {
            Ok(Some(hit)) if hit.rank >= self.config.search_rank_threshold => {
                tracing::debug!(name = %normalized, rank = hit.rank, "local corpus hit");
                return CachedMatch {
                    source: ItemSource::Provider,
                    provider_id: None,
                    confidence: Some(hit.rank.min(1.0)),
                    is_fallback: false,
                    per_100g: hit.per_100g,
                };
            }
            Ok(_) => {}
            Err(e) => {
                // Treated as a miss, not an error: degrade to the next source.
                tracing::warn!(name = %normalized, error = %e, "local search failed");
            }
        }

        // 2. Remote nutrition provider, with bounded retries.
        match self.lookup_with_retry(normalized, locale).await {
            Ok(Some(found)) => {
                tracing::debug!(
                    name = %normalized,
                    provider_id = %found.provider_id,
                    "provider hit",
                );
                return CachedMatch {
                    source: ItemSource::Provider,
                    provider_id: Some(found.provider_id),
                    confidence: Some(found.confidence),
                    is_fallback: false,
                    per_100g: found.per_100g,
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(name = %normalized, error = %e, "provider exhausted, falling back");
            }
        }

        // 3. Vision estimate, verbatim.
        CachedMatch {
            source: ItemSource::Vision,
            provider_id: None,
            confidence: None,
            is_fallback: true,
            per_100g: NutrientsPer100g::from_portion(
                &Nutrients {
                    calories: candidate.calories,
                    protein_g: candidate.protein_g,
                    carbs_g: candidate.carbs_g,
                    fat_g: candidate.fat_g,
                    ..Default::default()
                },
                candidate.portion_g,
            )
            .unwrap_or_default(),
        }
    }

    /// Retry provider lookups with exponential backoff before treating
    /// the source as unavailable.
    async fn lookup_with_retry(
        &self,
        normalized: &str,
        locale: &str,
    ) -> Result<Option<mealscan_core::ports::ProviderFood>, CoreError> {
        let mut delay = self.config.provider_retry_initial_delay;
        let mut last_err = None;

        for attempt in 1..=self.config.provider_retry_attempts.max(1) {
            match self.provider.lookup(normalized, locale).await {
                Ok(found) => return Ok(found),
                Err(e) => {
                    tracing::debug!(
                        name = %normalized,
                        attempt,
                        error = %e,
                        "provider lookup failed",
                    );
                    last_err = Some(e);
                    if attempt < self.config.provider_retry_attempts.max(1) {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| CoreError::ProviderUnavailable("no attempts made".into())))
    }

    /// Materialize an outcome for this candidate's portion.
    fn build_item(&self, candidate: &FoodCandidate, outcome: &CachedMatch) -> AnalyzedItem {
        let nutrients = if outcome.is_fallback {
            // Vision macros are used verbatim; the per-100g basis only
            // exists so cache hits can serve other portion sizes.
            Nutrients {
                calories: round1(candidate.calories),
                protein_g: round1(candidate.protein_g),
                carbs_g: round1(candidate.carbs_g),
                fat_g: round1(candidate.fat_g),
                energy_density: energy_density(round1(candidate.calories), candidate.portion_g),
                ..Default::default()
            }
            .clamped()
        } else {
            outcome.per_100g.scale(candidate.portion_g)
        };

        AnalyzedItem {
            id: Uuid::new_v4(),
            name: candidate.name.clone(),
            original_name: candidate.name.clone(),
            portion_g: candidate.portion_g,
            nutrients,
            source: outcome.source,
            provider_id: outcome.provider_id.clone(),
            confidence: outcome.confidence,
            is_fallback: outcome.is_fallback,
            // Stamped by the sanity pass at snapshot assembly.
            is_suspicious: false,
        }
    }

    async fn cache_lookup(&self, key: &str) -> Option<CachedMatch> {
        match self.cache.get(MATCH_NAMESPACE, key).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn cache_store(&self, key: &str, outcome: &CachedMatch) {
        let value = match serde_json::to_value(outcome) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache serialization failed");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .put(MATCH_NAMESPACE, key, &value, self.config.match_cache_ttl)
            .await
        {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }
}
