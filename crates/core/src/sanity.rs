//! Sanity checking for numerically impossible results.
//!
//! Findings are typed data, not errors: they mark a snapshot for human
//! review but never block persistence.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::nutrients::{AnalysisTotals, AnalyzedItem};

/// Relative tolerance for the 4/4/9 macro-vs-calorie consistency check.
pub const MACRO_KCAL_TOLERANCE: f64 = 0.10;

/// Energy density above which a non-oil dish is implausible (pure fat
/// tops out around 900 kcal/100g).
pub const MAX_PLAUSIBLE_DENSITY: f64 = 900.0;

/// Energy density below which a caloric dish is implausible.
pub const MIN_PLAUSIBLE_DENSITY: f64 = 5.0;

/// Name fragments identifying oils and near-pure fats, which may
/// legitimately sit at the top of the density scale.
const OIL_KEYWORDS: &[&str] = &[
    "oil", "butter", "ghee", "margarine", "lard", "mayonnaise", "масло", "майонез",
    "huile", "beurre", "май",
];

/// One advisory inconsistency detected in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SanityFinding {
    /// The 4/4/9 calories implied by the macros disagree with the
    /// reported calories by more than the tolerance.
    MacroKcalMismatch {
        reported_kcal: f64,
        macro_kcal: f64,
        relative_error: f64,
    },
    /// Energy density outside the plausible band for the dish type.
    SuspiciousEnergyDensity { energy_density: f64 },
}

/// Outcome of the sanity pass: the findings plus the derived flags
/// stored on the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityReport {
    pub findings: Vec<SanityFinding>,
    pub is_suspicious: bool,
    pub needs_review: bool,
}

fn oil_like_name(name: &str) -> bool {
    let name = normalize(name, "en");
    OIL_KEYWORDS.iter().any(|k| name.contains(k))
}

fn is_oil_like(items: &[AnalyzedItem]) -> bool {
    items.iter().any(|i| oil_like_name(&i.name))
}

/// Check macro/calorie agreement on the totals.
pub fn macro_kcal_mismatch(totals: &AnalysisTotals) -> Option<SanityFinding> {
    let macro_kcal = totals.protein_g * 4.0 + totals.carbs_g * 4.0 + totals.fat_g * 9.0;
    let relative_error = (macro_kcal - totals.calories).abs() / totals.calories.max(1.0);
    if relative_error > MACRO_KCAL_TOLERANCE {
        Some(SanityFinding::MacroKcalMismatch {
            reported_kcal: totals.calories,
            macro_kcal,
            relative_error,
        })
    } else {
        None
    }
}

/// Check the totals' energy density against the plausible band.
pub fn suspicious_energy_density(
    totals: &AnalysisTotals,
    items: &[AnalyzedItem],
) -> Option<SanityFinding> {
    let d = totals.energy_density;
    let too_dense = d > MAX_PLAUSIBLE_DENSITY && !is_oil_like(items);
    let too_thin = d > 0.0 && d < MIN_PLAUSIBLE_DENSITY && totals.calories > 0.0;
    if too_dense || too_thin {
        Some(SanityFinding::SuspiciousEnergyDensity { energy_density: d })
    } else {
        None
    }
}

/// Whether the snapshot needs human review: a non-empty item list that
/// sums to nothing, or any item with real mass but all-zero macros.
pub fn needs_review(items: &[AnalyzedItem], totals: &AnalysisTotals) -> bool {
    let all_totals_zero = totals.calories == 0.0
        && totals.protein_g == 0.0
        && totals.carbs_g == 0.0
        && totals.fat_g == 0.0;
    if !items.is_empty() && all_totals_zero {
        return true;
    }
    items.iter().any(|i| {
        i.portion_g > 0.0
            && i.nutrients.calories == 0.0
            && i.nutrients.protein_g == 0.0
            && i.nutrients.carbs_g == 0.0
            && i.nutrients.fat_g == 0.0
    })
}

/// Per-item plausibility: real mass with all-zero macros, or an
/// energy density outside the band the totals are held to.
pub fn item_is_suspicious(item: &AnalyzedItem) -> bool {
    let n = &item.nutrients;
    let zero_macros = item.portion_g > 0.0
        && n.calories == 0.0
        && n.protein_g == 0.0
        && n.carbs_g == 0.0
        && n.fat_g == 0.0;
    let too_dense = n.energy_density > MAX_PLAUSIBLE_DENSITY && !oil_like_name(&item.name);
    let too_thin =
        n.energy_density > 0.0 && n.energy_density < MIN_PLAUSIBLE_DENSITY && n.calories > 0.0;
    zero_macros || too_dense || too_thin
}

/// Stamp [`AnalyzedItem::is_suspicious`] on every item. Runs on each
/// assembly, so earlier flags are recomputed rather than carried over.
pub fn flag_suspicious_items(items: &mut [AnalyzedItem]) {
    for item in items.iter_mut() {
        item.is_suspicious = item_is_suspicious(item);
    }
}

/// Run both checks and derive the snapshot flags.
pub fn check(items: &[AnalyzedItem], totals: &AnalysisTotals) -> SanityReport {
    let mut findings = Vec::new();
    if let Some(f) = macro_kcal_mismatch(totals) {
        findings.push(f);
    }
    if let Some(f) = suspicious_energy_density(totals, items) {
        findings.push(f);
    }
    SanityReport {
        is_suspicious: !findings.is_empty(),
        needs_review: needs_review(items, totals),
        findings,
    }
}
