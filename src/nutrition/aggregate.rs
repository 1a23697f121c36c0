//! Nutrient scaling and aggregation
//!
//! Turns a per-serving nutrient map plus an amount consumed into the
//! nutrients actually eaten, and sums those across entries.

use serde::Serialize;

use super::{Nutrient, NutritionDict};
use crate::units::{QuantityError, QuantityResult, Quantity};

/// Energy per gram of each macronutrient
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Number of servings represented by `consumed`
///
/// - Weight: grams consumed / grams per serving
/// - Volume: milliliters consumed / milliliters per serving
/// - Anything else: the consumed amount is used as-is, with no conversion
pub fn consumption_scale(consumed: &Quantity, serving_size: &Quantity) -> QuantityResult<f64> {
    if consumed.unit.is_weight() {
        let serving = serving_size.to_grams()?.value();
        return ratio(consumed.to_grams()?.value(), serving);
    }

    if consumed.unit.is_volume() {
        let serving = serving_size.to_milliliters()?.value();
        return ratio(consumed.to_milliliters()?.value(), serving);
    }

    Ok(consumed.value())
}

fn ratio(amount: f64, per_serving: f64) -> QuantityResult<f64> {
    if per_serving == 0.0 {
        return Err(QuantityError::DivisionByZero);
    }
    Ok(amount / per_serving)
}

/// One consumed item: its per-serving nutrients, serving size, and amount
#[derive(Debug, Clone, Copy)]
pub struct Consumption<'a> {
    pub nutrients: &'a NutritionDict,
    pub serving_size: &'a Quantity,
    pub amount: &'a Quantity,
}

impl<'a> Consumption<'a> {
    pub fn new(nutrients: &'a NutritionDict, serving_size: &'a Quantity, amount: &'a Quantity) -> Self {
        Self {
            nutrients,
            serving_size,
            amount,
        }
    }

    /// Nutrients actually consumed
    ///
    /// An amount that cannot be related to the serving size contributes
    /// nothing; the failure is logged rather than returned.
    pub fn nutrients(&self) -> NutritionDict {
        let scale = consumption_scale(self.amount, self.serving_size).unwrap_or_else(|e| {
            tracing::warn!(
                "Cannot scale {} against serving size {}: {}. Counting as 0 servings.",
                self.amount,
                self.serving_size,
                e
            );
            0.0
        });
        self.nutrients.scaled(scale)
    }
}

/// Sum of consumed nutrients across entries
pub fn aggregate<'a, I>(entries: I) -> NutritionDict
where
    I: IntoIterator<Item = Consumption<'a>>,
{
    entries.into_iter().map(|entry| entry.nutrients()).sum()
}

/// Nutrients in a whole container
pub fn per_container(per_serving: &NutritionDict, servings_per_container: f64) -> NutritionDict {
    per_serving.scaled(servings_per_container)
}

/// Share of energy coming from each macronutrient
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacroBreakdown {
    pub carbs_kcal: f64,
    pub protein_kcal: f64,
    pub fat_kcal: f64,
    pub carbs_percent: f64,
    pub protein_percent: f64,
    pub fat_percent: f64,
}

impl MacroBreakdown {
    pub fn from_dict(dict: &NutritionDict) -> Self {
        let carbs_kcal = dict.amount(Nutrient::TotalCarbs) * KCAL_PER_G_CARBS;
        let protein_kcal = dict.amount(Nutrient::Protein) * KCAL_PER_G_PROTEIN;
        let fat_kcal = dict.amount(Nutrient::TotalFat) * KCAL_PER_G_FAT;
        let total = carbs_kcal + protein_kcal + fat_kcal;

        let percent = |kcal: f64| if total > 0.0 { kcal / total * 100.0 } else { 0.0 };

        Self {
            carbs_kcal,
            protein_kcal,
            fat_kcal,
            carbs_percent: percent(carbs_kcal),
            protein_percent: percent(protein_kcal),
            fat_percent: percent(fat_kcal),
        }
    }

    pub fn total_kcal(&self) -> f64 {
        self.carbs_kcal + self.protein_kcal + self.fat_kcal
    }
}
