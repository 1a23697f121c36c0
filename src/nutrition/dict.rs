//! Nutrient amount map
//!
//! Used for food items, recipes, log entries, and days.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Nutrient;
use crate::units::Quantity;

/// Amount of each nutrient, keyed by nutrient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutritionDict(BTreeMap<Nutrient, Quantity>);

impl NutritionDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decimal amounts expressed in each nutrient's canonical unit
    pub fn from_canonical<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (Nutrient, f64)>,
    {
        values
            .into_iter()
            .map(|(nutrient, value)| (nutrient, Quantity::raw(value, nutrient.canonical_unit())))
            .collect()
    }

    pub fn insert(&mut self, nutrient: Nutrient, amount: Quantity) -> Option<Quantity> {
        self.0.insert(nutrient, amount)
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<&Quantity> {
        self.0.get(&nutrient)
    }

    /// Decimal amount in the nutrient's canonical unit, 0 when absent
    ///
    /// An amount stored in a unit that cannot be converted to the canonical
    /// one is reported as its plain value.
    pub fn amount(&self, nutrient: Nutrient) -> f64 {
        match self.0.get(&nutrient) {
            Some(quantity) => quantity
                .convert(&nutrient.canonical_unit())
                .map(|q| q.value())
                .unwrap_or_else(|_| quantity.value()),
            None => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, &Quantity)> {
        self.0.iter().map(|(n, q)| (*n, q))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every amount multiplied by `scale`
    pub fn scaled(&self, scale: f64) -> Self {
        self.0
            .iter()
            .map(|(nutrient, amount)| (*nutrient, amount * scale))
            .collect()
    }

    /// Add `other` into this map, nutrient by nutrient
    ///
    /// Magnitudes are added as-is; the first unit seen for a nutrient stays
    /// the running unit. Callers holding mixed units convert before summing.
    pub fn accumulate(&mut self, other: &NutritionDict) {
        for (nutrient, amount) in &other.0 {
            match self.0.get_mut(nutrient) {
                Some(running) => {
                    *running = &*running + amount;
                }
                None => {
                    self.0.insert(*nutrient, amount.clone());
                }
            }
        }
    }
}

impl FromIterator<(Nutrient, Quantity)> for NutritionDict {
    fn from_iter<I: IntoIterator<Item = (Nutrient, Quantity)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::ops::Add for NutritionDict {
    type Output = NutritionDict;

    fn add(mut self, other: NutritionDict) -> NutritionDict {
        self.accumulate(&other);
        self
    }
}

impl std::ops::Mul<f64> for NutritionDict {
    type Output = NutritionDict;

    fn mul(self, scale: f64) -> NutritionDict {
        self.scaled(scale)
    }
}

impl std::iter::Sum for NutritionDict {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutritionDict::new(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Magnitude, Unit};

    fn sample() -> NutritionDict {
        NutritionDict::from_canonical([
            (Nutrient::Energy, 120.0),
            (Nutrient::Protein, 4.0),
            (Nutrient::Sodium, 200.0),
        ])
    }

    #[test]
    fn test_from_canonical_uses_canonical_units() {
        let dict = sample();
        assert_eq!(dict.get(Nutrient::Energy), Some(&Quantity::calories(120.0)));
        assert_eq!(dict.get(Nutrient::Sodium), Some(&Quantity::milligrams(200.0)));
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_amount_converts_to_canonical_unit() {
        let mut dict = NutritionDict::new();
        dict.insert(Nutrient::Sodium, Quantity::grams(0.25));
        assert!((dict.amount(Nutrient::Sodium) - 250.0).abs() < 1e-9);
        assert_eq!(dict.amount(Nutrient::Iron), 0.0);
    }

    #[test]
    fn test_scaled() {
        let doubled = sample().scaled(2.0);
        assert_eq!(doubled.amount(Nutrient::Energy), 240.0);
        assert_eq!(doubled.amount(Nutrient::Protein), 8.0);
    }

    #[test]
    fn test_scaled_keeps_rational_amounts() {
        let mut dict = NutritionDict::new();
        dict.insert(
            Nutrient::Protein,
            Quantity::new(Magnitude::rational(1.0, 3.0), Unit::Gram),
        );
        let scaled = dict.scaled(3.0);
        let protein = scaled.get(Nutrient::Protein).unwrap();
        assert_eq!(protein.magnitude, Magnitude::rational(3.0, 3.0));
    }

    #[test]
    fn test_accumulate_same_units() {
        let mut total = sample();
        total.accumulate(&sample());
        assert_eq!(total.amount(Nutrient::Energy), 240.0);
        assert_eq!(total.amount(Nutrient::Sodium), 400.0);
    }

    #[test]
    fn test_accumulate_keeps_first_unit_without_converting() {
        let mut total = NutritionDict::new();
        total.insert(Nutrient::Sodium, Quantity::milligrams(100.0));

        let mut other = NutritionDict::new();
        other.insert(Nutrient::Sodium, Quantity::grams(0.1));
        other.insert(Nutrient::Iron, Quantity::milligrams(2.0));

        total.accumulate(&other);
        let sodium = total.get(Nutrient::Sodium).unwrap();
        assert_eq!(sodium.unit, Unit::Milligram);
        assert!((sodium.value() - 100.1).abs() < 1e-9);
        assert_eq!(total.amount(Nutrient::Iron), 2.0);
    }

    #[test]
    fn test_accumulate_unconvertible_adds_magnitudes() {
        let mut total = NutritionDict::new();
        total.insert(Nutrient::Energy, Quantity::calories(100.0));

        let mut other = NutritionDict::new();
        other.insert(Nutrient::Energy, Quantity::grams(5.0));

        total.accumulate(&other);
        assert_eq!(total.get(Nutrient::Energy), Some(&Quantity::calories(105.0)));
    }

    #[test]
    fn test_sum() {
        let total: NutritionDict = vec![sample(), sample(), sample()].into_iter().sum();
        assert_eq!(total.amount(Nutrient::Energy), 360.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut dict = sample();
        dict.insert(
            Nutrient::TotalFat,
            Quantity::new(Magnitude::rational(1.0, 2.0), Unit::Gram),
        );
        let json = serde_json::to_string(&dict).unwrap();
        assert!(json.starts_with(r#"{"energy":"#));
        let back: NutritionDict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dict);
    }
}
