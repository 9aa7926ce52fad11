//! Full pipeline run: extraction → matching → aggregation → scoring →
//! sanity → snapshot assembly.
//!
//! The runner is stateless between calls; it owns the matching engine
//! plus the vision and translation collaborators, and produces a
//! complete [`AnalysisSnapshot`] without touching persistence.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use mealscan_core::aggregate::aggregate;
use mealscan_core::config::PipelineConfig;
use mealscan_core::dish_name;
use mealscan_core::error::CoreError;
use mealscan_core::health_score;
use mealscan_core::job::AnalysisInput;
use mealscan_core::nutrients::AnalyzedItem;
use mealscan_core::ports::{Translator, VisionExtractor};
use mealscan_core::sanity;
use mealscan_core::snapshot::AnalysisSnapshot;

use crate::matcher::MatchEngine;

pub struct PipelineRunner {
    vision: Arc<dyn VisionExtractor>,
    translator: Arc<dyn Translator>,
    matcher: MatchEngine,
    config: PipelineConfig,
}

impl PipelineRunner {
    pub fn new(
        vision: Arc<dyn VisionExtractor>,
        translator: Arc<dyn Translator>,
        matcher: MatchEngine,
        config: PipelineConfig,
    ) -> Self {
        Self {
            vision,
            translator,
            matcher,
            config,
        }
    }

    /// Run the full pipeline against an original input.
    ///
    /// Fails only when the extraction step itself is unreachable;
    /// lookup-source failures degrade inside the matching cascade.
    pub async fn analyze(
        &self,
        input: &AnalysisInput,
        locale: &str,
    ) -> Result<AnalysisSnapshot, CoreError> {
        let mut candidates = self.vision.extract(input, locale).await?;

        // Extraction output is untrusted; a candidate without a usable
        // mass cannot produce an item.
        let before = candidates.len();
        candidates.retain(|c| c.portion_g.is_finite() && c.portion_g >= 0.0);
        if candidates.len() < before {
            tracing::warn!(
                dropped = before - candidates.len(),
                "dropping extraction candidates with invalid portion mass",
            );
        }

        if candidates.len() > self.config.max_items_per_job {
            tracing::warn!(
                count = candidates.len(),
                max = self.config.max_items_per_job,
                "truncating extraction candidates",
            );
            candidates.truncate(self.config.max_items_per_job);
        }

        // Items are independent; match them concurrently. `buffered`
        // preserves candidate order, so snapshots stay deterministic.
        let items: Vec<AnalyzedItem> = stream::iter(candidates.iter())
            .map(|candidate| self.matcher.match_candidate(candidate, locale))
            .buffered(self.config.match_concurrency.max(1))
            .collect()
            .await;

        let items = self.localize_items(items, locale).await;
        Ok(self.assemble(items, locale).await)
    }

    /// Re-score an already-merged item list (manual-edit path) into a
    /// fresh snapshot. Items keep whatever localization they carry.
    pub async fn assemble(&self, mut items: Vec<AnalyzedItem>, locale: &str) -> AnalysisSnapshot {
        sanity::flag_suspicious_items(&mut items);
        let totals = aggregate(&items);
        let score = health_score::score(&totals, &items, locale, &self.config);
        let report = sanity::check(&items, &totals);

        let chain = &self.config.locale_fallback_chain;
        let localized_names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        let original_names: Vec<&str> = items.iter().map(|i| i.original_name.as_str()).collect();

        AnalysisSnapshot {
            dish_name: dish_name::compose(&localized_names, locale, chain),
            original_dish_name: dish_name::compose(&original_names, locale, chain),
            items,
            totals,
            health_score: score,
            locale: locale.to_string(),
            findings: report.findings,
            is_suspicious: report.is_suspicious,
            needs_review: report.needs_review,
        }
    }

    /// Best-effort display-name localization. English keeps the
    /// extraction names; any translation failure falls back to the
    /// original-language name rather than failing the run.
    async fn localize_items(
        &self,
        mut items: Vec<AnalyzedItem>,
        locale: &str,
    ) -> Vec<AnalyzedItem> {
        if locale == "en" {
            return items;
        }
        for item in &mut items {
            match self.translator.translate(&item.original_name, locale).await {
                Ok(translated) if !translated.trim().is_empty() => item.name = translated,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        name = %item.original_name,
                        locale,
                        error = %e,
                        "translation failed, keeping original name",
                    );
                }
            }
        }
        items
    }
}
