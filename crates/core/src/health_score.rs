//! Weighted health scoring.
//!
//! Four independent sub-scores (0–100) are combined with fixed weights
//! into an overall score, a letter grade, and per-factor feedback.
//! The computation is deterministic: identical inputs always produce
//! identical scores and feedback lists.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::i18n;
use crate::nutrients::{
    round1, AnalysisTotals, AnalyzedItem, ItemSource, KCAL_PER_G_CARBS, KCAL_PER_G_FAT,
    KCAL_PER_G_PROTEIN,
};

// ---------------------------------------------------------------------------
// Weights (sum to 1.0)
// ---------------------------------------------------------------------------

pub const WEIGHT_MACRO_BALANCE: f64 = 0.35;
pub const WEIGHT_CALORIE_DENSITY: f64 = 0.25;
pub const WEIGHT_PROTEIN_QUALITY: f64 = 0.25;
pub const WEIGHT_PROCESSING_LEVEL: f64 = 0.15;

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

/// Target calorie shares: protein / carbs / fat.
pub const TARGET_PROTEIN_SHARE: f64 = 0.25;
pub const TARGET_CARBS_SHARE: f64 = 0.45;
pub const TARGET_FAT_SHARE: f64 = 0.30;

/// Healthy energy-density band, kcal per 100 g.
pub const DENSITY_BAND_LOW: f64 = 40.0;
pub const DENSITY_BAND_HIGH: f64 = 250.0;
/// Density at which the calorie-density sub-score reaches zero.
pub const DENSITY_ZERO_SCORE: f64 = 900.0;

/// Grams of protein per 100 g of meal mass that earn full protein marks.
pub const PROTEIN_FULL_MARKS_PER_100G: f64 = 15.0;

/// Maximum penalty for vision-fallback mass share (processing factor).
const FALLBACK_PENALTY: f64 = 40.0;
/// Penalty per item whose name matches a processed-food keyword.
const PROCESSED_ITEM_PENALTY: f64 = 15.0;
/// Processed-item penalty cap (number of items counted).
const PROCESSED_ITEM_CAP: usize = 4;

/// Name fragments that flag an item as highly processed. Matched
/// against the normalized item name across the supported locales.
const PROCESSED_KEYWORDS: &[&str] = &[
    "sausage", "nugget", "soda", "cola", "chips", "fries", "fried", "instant", "candy",
    "bacon", "hot dog", "burger", "колбаса", "сосиска", "чипсы", "наггетс", "картофель фри",
    "saucisse", "frites", "pane", "шұжық",
];

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Letter grade derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    /// Fixed breakpoints: A ≥ 85, B ≥ 70, C ≥ 55, D ≥ 40, else E.
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::A
        } else if score >= 70.0 {
            Self::B
        } else if score >= 55.0 {
            Self::C
        } else if score >= 40.0 {
            Self::D
        } else {
            Self::E
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }
}

/// One factor of the breakdown: its fixed weight and its 0–100 sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub weight: f64,
    pub score: f64,
}

/// Full health score attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// Overall weighted score, 0–100, one decimal.
    pub score: f64,
    pub grade: Grade,
    pub macro_balance: FactorScore,
    pub calorie_density: FactorScore,
    pub protein_quality: FactorScore,
    pub processing_level: FactorScore,
    /// One localized message per weak factor, in fixed factor order.
    pub feedback: Vec<String>,
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

/// Closeness of the protein/carb/fat calorie split to the target
/// profile. Zero when the macros carry no calories at all.
pub fn macro_balance_score(totals: &AnalysisTotals) -> f64 {
    let macro_kcal = totals.protein_g * KCAL_PER_G_PROTEIN
        + totals.carbs_g * KCAL_PER_G_CARBS
        + totals.fat_g * KCAL_PER_G_FAT;
    if macro_kcal <= 0.0 {
        return 0.0;
    }

    let p = totals.protein_g * KCAL_PER_G_PROTEIN / macro_kcal;
    let c = totals.carbs_g * KCAL_PER_G_CARBS / macro_kcal;
    let f = totals.fat_g * KCAL_PER_G_FAT / macro_kcal;

    // L1 distance between the actual and target share vectors is at
    // most 2, so (1 - dist/2) maps perfectly-balanced to 1.0 and the
    // farthest possible split to 0.0.
    let dist = (p - TARGET_PROTEIN_SHARE).abs()
        + (c - TARGET_CARBS_SHARE).abs()
        + (f - TARGET_FAT_SHARE).abs();
    round1(((1.0 - dist / 2.0) * 100.0).clamp(0.0, 100.0))
}

/// Energy density vs the healthy band. Full marks inside the band,
/// linear falloff on either side, zero score at [`DENSITY_ZERO_SCORE`].
pub fn calorie_density_score(energy_density: f64) -> f64 {
    let score = if energy_density <= 0.0 {
        0.0
    } else if energy_density < DENSITY_BAND_LOW {
        energy_density / DENSITY_BAND_LOW * 100.0
    } else if energy_density <= DENSITY_BAND_HIGH {
        100.0
    } else {
        100.0 - (energy_density - DENSITY_BAND_HIGH) / (DENSITY_ZERO_SCORE - DENSITY_BAND_HIGH) * 100.0
    };
    round1(score.clamp(0.0, 100.0))
}

/// Protein grams relative to total mass, discounted by how much of the
/// meal's mass comes from low-confidence (vision-fallback) matches.
pub fn protein_quality_score(totals: &AnalysisTotals, items: &[AnalyzedItem]) -> f64 {
    if totals.portion_g <= 0.0 {
        return 0.0;
    }
    let protein_per_100g = totals.protein_g / totals.portion_g * 100.0;
    let base = (protein_per_100g / PROTEIN_FULL_MARKS_PER_100G).min(1.0) * 100.0;

    let mass: f64 = items.iter().map(|i| i.portion_g).sum();
    let confident_mass: f64 = items
        .iter()
        .filter(|i| i.source != ItemSource::Vision)
        .map(|i| i.portion_g)
        .sum();
    let confident_share = if mass > 0.0 { confident_mass / mass } else { 0.0 };

    round1((base * (0.8 + 0.2 * confident_share)).clamp(0.0, 100.0))
}

/// Heuristic processing penalty: vision-fallback mass share plus a
/// per-item hit for processed-food keywords in the normalized name.
pub fn processing_level_score(items: &[AnalyzedItem]) -> f64 {
    let mass: f64 = items.iter().map(|i| i.portion_g).sum();
    let fallback_mass: f64 = items
        .iter()
        .filter(|i| i.is_fallback)
        .map(|i| i.portion_g)
        .sum();
    let fallback_share = if mass > 0.0 { fallback_mass / mass } else { 0.0 };

    let processed_count = items
        .iter()
        .filter(|i| {
            let name = crate::normalize::normalize(&i.name, "en");
            PROCESSED_KEYWORDS.iter().any(|k| name.contains(k))
        })
        .count()
        .min(PROCESSED_ITEM_CAP);

    round1(
        (100.0 - FALLBACK_PENALTY * fallback_share
            - PROCESSED_ITEM_PENALTY * processed_count as f64)
            .clamp(0.0, 100.0),
    )
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

/// Compute the full health score for a snapshot.
pub fn score(
    totals: &AnalysisTotals,
    items: &[AnalyzedItem],
    locale: &str,
    config: &PipelineConfig,
) -> HealthScore {
    let macro_balance = macro_balance_score(totals);
    let calorie_density = calorie_density_score(totals.energy_density);
    let protein_quality = protein_quality_score(totals, items);
    let processing_level = processing_level_score(items);

    let overall = round1(
        (macro_balance * WEIGHT_MACRO_BALANCE
            + calorie_density * WEIGHT_CALORIE_DENSITY
            + protein_quality * WEIGHT_PROTEIN_QUALITY
            + processing_level * WEIGHT_PROCESSING_LEVEL)
            .clamp(0.0, 100.0),
    );

    // Feedback in fixed factor order so identical inputs always yield
    // an identical, stably-ordered list.
    let mut feedback = Vec::new();
    let chain = &config.locale_fallback_chain;
    for (sub_score, key) in [
        (macro_balance, "feedback.macro_balance"),
        (calorie_density, "feedback.calorie_density"),
        (protein_quality, "feedback.protein_quality"),
        (processing_level, "feedback.processing_level"),
    ] {
        if sub_score < config.feedback_threshold {
            feedback.push(i18n::message(locale, chain, key));
        }
    }

    HealthScore {
        score: overall,
        grade: Grade::from_score(overall),
        macro_balance: FactorScore {
            weight: WEIGHT_MACRO_BALANCE,
            score: macro_balance,
        },
        calorie_density: FactorScore {
            weight: WEIGHT_CALORIE_DENSITY,
            score: calorie_density,
        },
        protein_quality: FactorScore {
            weight: WEIGHT_PROTEIN_QUALITY,
            score: protein_quality,
        },
        processing_level: FactorScore {
            weight: WEIGHT_PROCESSING_LEVEL,
            score: processing_level,
        },
        feedback,
    }
}
