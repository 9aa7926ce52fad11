//! Row model for the `foods` corpus table.

use sqlx::FromRow;

use mealscan_core::nutrients::NutrientsPer100g;
use mealscan_core::ports::SearchHit;

/// A ranked row from a full-text `foods` query. Nutrients are per 100 g.
#[derive(Debug, Clone, FromRow)]
pub struct FoodRow {
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugars_g: f64,
    pub saturated_fat_g: f64,
    /// `ts_rank` relevance (Postgres `real`).
    pub rank: f32,
}

impl FoodRow {
    pub fn into_hit(self) -> SearchHit {
        SearchHit {
            name: self.name,
            per_100g: NutrientsPer100g {
                calories: self.calories,
                protein_g: self.protein_g,
                carbs_g: self.carbs_g,
                fat_g: self.fat_g,
                fiber_g: self.fiber_g,
                sugars_g: self.sugars_g,
                saturated_fat_g: self.saturated_fat_g,
            },
            rank: f64::from(self.rank),
        }
    }
}
