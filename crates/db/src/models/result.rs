//! Row model for the `analysis_results` table.
//!
//! The JSONB columns are decoded lazily here rather than via sqlx's
//! `Json<T>` wrapper so the legacy item-shape adapter can run at the
//! read boundary.

use sqlx::FromRow;

use mealscan_core::error::CoreError;
use mealscan_core::health_score::HealthScore;
use mealscan_core::nutrients::AnalysisTotals;
use mealscan_core::sanity::SanityFinding;
use mealscan_core::snapshot::{parse_items, AnalysisSnapshot, StoredSnapshot};
use mealscan_core::types::{DbId, Timestamp};

/// A row from `analysis_results`.
#[derive(Debug, Clone, FromRow)]
pub struct ResultRow {
    pub id: DbId,
    pub job_id: DbId,
    pub public_token: String,
    pub locale: String,
    pub dish_name: String,
    pub original_dish_name: String,
    pub items: serde_json::Value,
    pub totals: serde_json::Value,
    pub health_score: serde_json::Value,
    pub findings: serde_json::Value,
    pub is_suspicious: bool,
    pub needs_review: bool,
    pub created_at: Timestamp,
}

impl ResultRow {
    /// Decode the JSONB columns into the domain snapshot. Items accept
    /// both the modern and the legacy `{label, kcal, gramsMean}` shape.
    pub fn into_stored(self) -> Result<StoredSnapshot, CoreError> {
        let decode = |column: &str, e: serde_json::Error| {
            CoreError::Persistence(format!("result {}: {column}: {e}", self.id))
        };

        let items = parse_items(self.items).map_err(|e| decode("items", e))?;
        let totals: AnalysisTotals =
            serde_json::from_value(self.totals).map_err(|e| decode("totals", e))?;
        let health_score: HealthScore =
            serde_json::from_value(self.health_score).map_err(|e| decode("health_score", e))?;
        let findings: Vec<SanityFinding> =
            serde_json::from_value(self.findings).map_err(|e| decode("findings", e))?;

        Ok(StoredSnapshot {
            id: self.id,
            job_id: self.job_id,
            public_token: self.public_token,
            created_at: self.created_at,
            snapshot: AnalysisSnapshot {
                items,
                totals,
                health_score,
                locale: self.locale,
                dish_name: self.dish_name,
                original_dish_name: self.original_dish_name,
                findings,
                is_suspicious: self.is_suspicious,
                needs_review: self.needs_review,
            },
        })
    }
}
