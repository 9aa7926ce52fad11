//! Nutrient aggregation.
//!
//! Totals are always recomputed in full from the current item list;
//! there is no incremental update path, which keeps the summation
//! invariant (`totals == Σ items`) trivially true for every snapshot.

use crate::nutrients::{energy_density, round1, AnalysisTotals, AnalyzedItem};

/// Sum per-item nutrients into job-level totals and derive energy
/// density (kcal per 100 g, zero when the combined portion is zero).
pub fn aggregate(items: &[AnalyzedItem]) -> AnalysisTotals {
    let mut totals = AnalysisTotals::default();

    for item in items {
        totals.portion_g += item.portion_g;
        totals.calories += item.nutrients.calories;
        totals.protein_g += item.nutrients.protein_g;
        totals.carbs_g += item.nutrients.carbs_g;
        totals.fat_g += item.nutrients.fat_g;
        totals.fiber_g += item.nutrients.fiber_g;
        totals.sugars_g += item.nutrients.sugars_g;
        totals.saturated_fat_g += item.nutrients.saturated_fat_g;
    }

    totals.portion_g = round1(totals.portion_g);
    totals.calories = round1(totals.calories);
    totals.protein_g = round1(totals.protein_g);
    totals.carbs_g = round1(totals.carbs_g);
    totals.fat_g = round1(totals.fat_g);
    totals.fiber_g = round1(totals.fiber_g);
    totals.sugars_g = round1(totals.sugars_g);
    totals.saturated_fat_g = round1(totals.saturated_fat_g);
    totals.energy_density = energy_density(totals.calories, totals.portion_g);

    totals
}
