//! Analysis result snapshots and the legacy item-shape adapter.
//!
//! Snapshots are immutable and append-only: every successful run,
//! manual edit or re-analysis appends a new [`AnalysisSnapshot`] to the
//! job's history, and the "current" result is simply the newest one.
//! Historical rows written by older app versions store items as
//! `{label, kcal, gramsMean}`; [`ItemRecord`] normalizes both shapes
//! into the canonical [`AnalyzedItem`] at the read boundary so the rest
//! of the pipeline never branches on record vintage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::health_score::HealthScore;
use crate::nutrients::{
    energy_density, AnalysisTotals, AnalyzedItem, ItemSource, Nutrients,
};
use crate::sanity::SanityFinding;
use crate::types::{DbId, Timestamp};

/// An immutable outcome of running (or re-running) the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub items: Vec<AnalyzedItem>,
    pub totals: AnalysisTotals,
    pub health_score: HealthScore,
    pub locale: String,
    /// Localized dish name (best-effort translation).
    pub dish_name: String,
    /// Dish name composed from the pre-localization item names.
    pub original_dish_name: String,
    pub findings: Vec<SanityFinding>,
    pub is_suspicious: bool,
    pub needs_review: bool,
}

/// A persisted snapshot: the domain value plus its storage identity.
#[derive(Debug, Clone, Serialize)]
pub struct StoredSnapshot {
    pub id: DbId,
    pub job_id: DbId,
    /// Opaque token handed to external callers instead of the row id.
    pub public_token: String,
    pub created_at: Timestamp,
    pub snapshot: AnalysisSnapshot,
}

// ---------------------------------------------------------------------------
// Legacy adapter
// ---------------------------------------------------------------------------

/// Tagged-variant adapter for the two historical item shapes.
///
/// Deserialization tries the modern shape first; anything carrying the
/// old `{label, kcal, gramsMean}` fields falls through to the legacy
/// variant. Serialization always emits the modern shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemRecord {
    Modern(AnalyzedItem),
    Legacy {
        label: String,
        kcal: f64,
        #[serde(rename = "gramsMean")]
        grams_mean: f64,
    },
}

impl ItemRecord {
    /// Normalize into the canonical item shape.
    ///
    /// Legacy rows carried only a calorie estimate, so they come back
    /// as vision-sourced fallbacks with zeroed macro fields; the sanity
    /// checker will mark such snapshots for review when appropriate.
    pub fn into_item(self) -> AnalyzedItem {
        match self {
            Self::Modern(item) => item,
            Self::Legacy {
                label,
                kcal,
                grams_mean,
            } => AnalyzedItem {
                id: Uuid::new_v4(),
                name: label.clone(),
                original_name: label,
                portion_g: grams_mean,
                nutrients: Nutrients {
                    calories: kcal,
                    energy_density: energy_density(kcal, grams_mean),
                    ..Default::default()
                }
                .clamped(),
                source: ItemSource::Vision,
                provider_id: None,
                confidence: None,
                is_fallback: true,
                is_suspicious: false,
            },
        }
    }
}

/// Parse a stored JSON item array, accepting both shapes.
pub fn parse_items(value: serde_json::Value) -> Result<Vec<AnalyzedItem>, serde_json::Error> {
    let records: Vec<ItemRecord> = serde_json::from_value(value)?;
    Ok(records.into_iter().map(ItemRecord::into_item).collect())
}
