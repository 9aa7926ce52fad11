//! Nutrient value types shared by every pipeline stage.
//!
//! Two bases exist: [`Nutrients`] carries absolute values for a
//! concrete portion (plus the derived energy density), while
//! [`NutrientsPer100g`] is the portion-independent basis returned by
//! the lookup sources and stored in the match cache.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kilocalories per gram of protein.
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
/// Kilocalories per gram of carbohydrate.
pub const KCAL_PER_G_CARBS: f64 = 4.0;
/// Kilocalories per gram of fat.
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Round to one decimal place (the precision used for every derived
/// nutrient figure, matching the energy-density invariant).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Energy density in kcal per 100 g. Zero when the portion is zero.
pub fn energy_density(calories: f64, portion_g: f64) -> f64 {
    if portion_g > 0.0 {
        round1(calories / portion_g * 100.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Absolute nutrients (per portion)
// ---------------------------------------------------------------------------

/// Absolute nutrient values for one portion of one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugars_g: f64,
    pub saturated_fat_g: f64,
    /// kcal per 100 g of this item's portion.
    pub energy_density: f64,
}

impl Nutrients {
    /// Clamp every field to zero or above. Lookup sources occasionally
    /// return small negative values from unit conversion.
    pub fn clamped(mut self) -> Self {
        for field in [
            &mut self.calories,
            &mut self.protein_g,
            &mut self.carbs_g,
            &mut self.fat_g,
            &mut self.fiber_g,
            &mut self.sugars_g,
            &mut self.saturated_fat_g,
            &mut self.energy_density,
        ] {
            if *field < 0.0 {
                *field = 0.0;
            }
        }
        self
    }

    /// Calories implied by the macro fields alone (4/4/9 rule).
    pub fn macro_calories(&self) -> f64 {
        self.protein_g * KCAL_PER_G_PROTEIN
            + self.carbs_g * KCAL_PER_G_CARBS
            + self.fat_g * KCAL_PER_G_FAT
    }
}

// ---------------------------------------------------------------------------
// Per-100g basis
// ---------------------------------------------------------------------------

/// Nutrients normalized to a 100 g basis, as returned by the local
/// corpus and the remote provider, and as stored in the match cache so
/// one cached entry serves any portion size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientsPer100g {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugars_g: f64,
    pub saturated_fat_g: f64,
}

impl NutrientsPer100g {
    /// Scale to an absolute portion. The item's energy density equals
    /// the per-100g calorie figure by construction.
    pub fn scale(&self, portion_g: f64) -> Nutrients {
        let f = portion_g / 100.0;
        Nutrients {
            calories: round1(self.calories * f),
            protein_g: round1(self.protein_g * f),
            carbs_g: round1(self.carbs_g * f),
            fat_g: round1(self.fat_g * f),
            fiber_g: round1(self.fiber_g * f),
            sugars_g: round1(self.sugars_g * f),
            saturated_fat_g: round1(self.saturated_fat_g * f),
            energy_density: energy_density(round1(self.calories * f), portion_g),
        }
        .clamped()
    }

    /// Derive a per-100g basis from absolute values for a known portion.
    /// Returns `None` when the portion is zero (nothing to normalize by).
    pub fn from_portion(nutrients: &Nutrients, portion_g: f64) -> Option<Self> {
        if portion_g <= 0.0 {
            return None;
        }
        let f = 100.0 / portion_g;
        Some(Self {
            calories: round1(nutrients.calories * f),
            protein_g: round1(nutrients.protein_g * f),
            carbs_g: round1(nutrients.carbs_g * f),
            fat_g: round1(nutrients.fat_g * f),
            fiber_g: round1(nutrients.fiber_g * f),
            sugars_g: round1(nutrients.sugars_g * f),
            saturated_fat_g: round1(nutrients.saturated_fat_g * f),
        })
    }
}

// ---------------------------------------------------------------------------
// Analyzed item
// ---------------------------------------------------------------------------

/// Which source of the matching cascade produced an item's nutrients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Vision-estimated macros used verbatim (cascade fallback).
    Vision,
    /// Remote nutrition provider hit, carries a provider identity.
    Provider,
    /// Values supplied directly by the user in a manual edit.
    Manual,
}

/// One food item inside an analysis snapshot.
///
/// Owned exclusively by the snapshot that contains it; reconciliation
/// always produces fresh copies, never shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedItem {
    pub id: Uuid,
    /// Display name, possibly localized.
    pub name: String,
    /// Pre-localization name as produced by the extraction step.
    pub original_name: String,
    /// Grams. Expected > 0; zero only for ignored rows.
    pub portion_g: f64,
    pub nutrients: Nutrients,
    pub source: ItemSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default)]
    pub is_suspicious: bool,
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Job-level nutrient totals. Always derived by summation over the
/// snapshot's items, never hand-edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTotals {
    pub portion_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugars_g: f64,
    pub saturated_fat_g: f64,
    /// kcal per 100 g of the combined portion.
    pub energy_density: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round1_rounds_half_up() {
        assert_eq!(round1(1.25), 1.3);
        assert_eq!(round1(1.24), 1.2);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn energy_density_guards_zero_portion() {
        assert_eq!(energy_density(250.0, 0.0), 0.0);
        assert_eq!(energy_density(250.0, 100.0), 250.0);
        assert_eq!(energy_density(100.0, 300.0), 33.3);
    }

    #[test]
    fn scale_to_portion() {
        let per100 = NutrientsPer100g {
            calories: 165.0,
            protein_g: 31.0,
            carbs_g: 0.0,
            fat_g: 3.6,
            fiber_g: 0.0,
            sugars_g: 0.0,
            saturated_fat_g: 1.0,
        };
        let n = per100.scale(150.0);
        assert_eq!(n.calories, 247.5);
        assert_eq!(n.protein_g, 46.5);
        assert_eq!(n.fat_g, 5.4);
        // Density of the scaled portion matches the per-100g calories.
        assert_eq!(n.energy_density, 165.0);
    }

    #[test]
    fn from_portion_roundtrip() {
        let n = Nutrients {
            calories: 200.0,
            protein_g: 10.0,
            carbs_g: 20.0,
            fat_g: 8.0,
            ..Default::default()
        };
        let per100 = NutrientsPer100g::from_portion(&n, 100.0).unwrap();
        assert_eq!(per100.calories, 200.0);
        assert_eq!(per100.protein_g, 10.0);
    }

    #[test]
    fn from_portion_zero_is_none() {
        assert!(NutrientsPer100g::from_portion(&Nutrients::default(), 0.0).is_none());
    }

    #[test]
    fn clamped_removes_negatives() {
        let n = Nutrients {
            calories: -1.0,
            protein_g: 5.0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(n.calories, 0.0);
        assert_eq!(n.protein_g, 5.0);
    }

    #[test]
    fn macro_calories_four_four_nine() {
        let n = Nutrients {
            protein_g: 10.0,
            carbs_g: 10.0,
            fat_g: 10.0,
            ..Default::default()
        };
        assert_eq!(n.macro_calories(), 170.0);
    }
}
