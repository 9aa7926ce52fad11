//! Repository for the `foods` full-text corpus.

use sqlx::PgPool;

use crate::models::food::FoodRow;

/// Nutrient column list shared by `foods` queries.
const COLUMNS: &str =
    "name, calories, protein_g, carbs_g, fat_g, fiber_g, sugars_g, saturated_fat_g";

/// Read access to the local nutrition corpus.
pub struct FoodRepo;

impl FoodRepo {
    /// Best full-text match for a normalized food name.
    ///
    /// Uses the `simple` text search configuration: names are already
    /// normalized and the corpus mixes locales, so language stemming
    /// would hurt more than help. Rank thresholding is the caller's
    /// concern.
    pub async fn best_match(
        pool: &PgPool,
        normalized_name: &str,
    ) -> Result<Option<FoodRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}, \
                    ts_rank(search_vector, plainto_tsquery('simple', $1)) AS rank \
             FROM foods \
             WHERE search_vector @@ plainto_tsquery('simple', $1) \
             ORDER BY rank DESC, name ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, FoodRow>(&query)
            .bind(normalized_name)
            .fetch_optional(pool)
            .await
    }
}
