//! Manual-edit merge logic.
//!
//! Pure half of the reconciler: merging a caller's edited item list
//! into a prior snapshot's items. The orchestration (re-running the
//! aggregator, scorer and sanity checker, then appending the new
//! snapshot) lives in the pipeline crate.

use uuid::Uuid;

use crate::error::CoreError;
use crate::nutrients::{energy_density, round1, AnalyzedItem, ItemSource, Nutrients};

/// One edited item as supplied by the caller.
///
/// `portion_g` is mandatory; every nutrient field is an optional
/// explicit override. Fields left `None` on a matched item are scaled
/// from the prior values by the portion factor.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ItemEdit {
    /// Id of the prior item this edit targets. When absent the edit is
    /// matched by its position in the edit list.
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub portion_g: f64,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugars_g: Option<f64>,
    pub saturated_fat_g: Option<f64>,
}

fn validate(edits: &[ItemEdit]) -> Result<(), CoreError> {
    for (idx, edit) in edits.iter().enumerate() {
        if edit.portion_g < 0.0 {
            return Err(CoreError::Validation(format!(
                "edit #{idx}: portion_g must not be negative, got {}",
                edit.portion_g
            )));
        }
        for (field, value) in [
            ("calories", edit.calories),
            ("protein_g", edit.protein_g),
            ("carbs_g", edit.carbs_g),
            ("fat_g", edit.fat_g),
            ("fiber_g", edit.fiber_g),
            ("sugars_g", edit.sugars_g),
            ("saturated_fat_g", edit.saturated_fat_g),
        ] {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(CoreError::Validation(format!(
                        "edit #{idx}: {field} must not be negative, got {v}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Scale one prior item by the portion factor, applying explicit
/// overrides field by field.
fn apply_edit(prior: &AnalyzedItem, edit: &ItemEdit) -> AnalyzedItem {
    // Guard a degenerate prior portion: scaling from nothing is
    // meaningless, so fall back to a factor of 1.
    let factor = if prior.portion_g > 0.0 {
        edit.portion_g / prior.portion_g
    } else {
        1.0
    };

    let scaled = |old: f64, of: Option<f64>| round1(of.unwrap_or(old * factor));

    let calories = scaled(prior.nutrients.calories, edit.calories);
    let nutrients = Nutrients {
        calories,
        protein_g: scaled(prior.nutrients.protein_g, edit.protein_g),
        carbs_g: scaled(prior.nutrients.carbs_g, edit.carbs_g),
        fat_g: scaled(prior.nutrients.fat_g, edit.fat_g),
        fiber_g: scaled(prior.nutrients.fiber_g, edit.fiber_g),
        sugars_g: scaled(prior.nutrients.sugars_g, edit.sugars_g),
        saturated_fat_g: scaled(prior.nutrients.saturated_fat_g, edit.saturated_fat_g),
        energy_density: energy_density(calories, edit.portion_g),
    };

    AnalyzedItem {
        id: prior.id,
        name: edit.name.clone().unwrap_or_else(|| prior.name.clone()),
        original_name: prior.original_name.clone(),
        portion_g: edit.portion_g,
        nutrients,
        // Scaled values still derive from the original source; only
        // brand-new rows become Manual.
        source: prior.source,
        provider_id: prior.provider_id.clone(),
        confidence: prior.confidence,
        is_fallback: prior.is_fallback,
        // Recomputed by the sanity pass at assembly.
        is_suspicious: false,
    }
}

/// Build a brand-new item directly from supplied values.
fn new_manual_item(idx: usize, edit: &ItemEdit) -> Result<AnalyzedItem, CoreError> {
    let name = edit
        .name
        .clone()
        .ok_or_else(|| {
            CoreError::Validation(format!("edit #{idx}: a new item requires a name"))
        })?;

    let calories = round1(edit.calories.unwrap_or(0.0));
    let nutrients = Nutrients {
        calories,
        protein_g: round1(edit.protein_g.unwrap_or(0.0)),
        carbs_g: round1(edit.carbs_g.unwrap_or(0.0)),
        fat_g: round1(edit.fat_g.unwrap_or(0.0)),
        fiber_g: round1(edit.fiber_g.unwrap_or(0.0)),
        sugars_g: round1(edit.sugars_g.unwrap_or(0.0)),
        saturated_fat_g: round1(edit.saturated_fat_g.unwrap_or(0.0)),
        energy_density: energy_density(calories, edit.portion_g),
    };

    Ok(AnalyzedItem {
        id: edit.id.unwrap_or_else(Uuid::new_v4),
        original_name: name.clone(),
        name,
        portion_g: edit.portion_g,
        nutrients,
        source: ItemSource::Manual,
        provider_id: None,
        confidence: None,
        is_fallback: false,
        is_suspicious: false,
    })
}

/// Merge edits into a prior item list.
///
/// Matching: by id when the edit carries one, otherwise by the edit's
/// position in the edit list. Prior items untouched by any edit are
/// carried over as-is; edits that match nothing become new Manual
/// items appended after the prior items.
pub fn merge_manual_edits(
    prior: &[AnalyzedItem],
    edits: &[ItemEdit],
) -> Result<Vec<AnalyzedItem>, CoreError> {
    validate(edits)?;

    // edit index -> prior index
    let mut assignment: Vec<Option<usize>> = vec![None; edits.len()];
    let mut taken = vec![false; prior.len()];

    // Id matches claim their targets first so a positional edit can
    // never steal an explicitly-addressed item.
    for (edit_idx, edit) in edits.iter().enumerate() {
        if let Some(id) = edit.id {
            if let Some(prior_idx) = prior.iter().position(|p| p.id == id) {
                if !taken[prior_idx] {
                    assignment[edit_idx] = Some(prior_idx);
                    taken[prior_idx] = true;
                }
            }
        }
    }
    for (edit_idx, edit) in edits.iter().enumerate() {
        if edit.id.is_none() && edit_idx < prior.len() && !taken[edit_idx] {
            assignment[edit_idx] = Some(edit_idx);
            taken[edit_idx] = true;
        }
    }

    // prior index -> merged item (or untouched copy).
    let mut merged: Vec<AnalyzedItem> = Vec::with_capacity(prior.len() + edits.len());
    for (prior_idx, item) in prior.iter().enumerate() {
        match assignment
            .iter()
            .position(|a| *a == Some(prior_idx))
        {
            Some(edit_idx) => merged.push(apply_edit(item, &edits[edit_idx])),
            None => merged.push(item.clone()),
        }
    }

    for (edit_idx, edit) in edits.iter().enumerate() {
        if assignment[edit_idx].is_none() {
            merged.push(new_manual_item(edit_idx, edit)?);
        }
    }

    Ok(merged)
}
