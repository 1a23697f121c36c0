//! Unit types and conversion constants
//!
//! Provides the closed set of measurement units, their classification, and
//! the fixed factors used to convert within the weight and volume families.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::QuantityError;

// ============================================================================
// Weight Conversion Constants (to milligrams)
// ============================================================================

/// Milligrams per microgram
pub const MG_PER_UG: f64 = 0.001;
/// Milligrams per gram
pub const MG_PER_G: f64 = 1000.0;
/// Milligrams per kilogram
pub const MG_PER_KG: f64 = 1_000_000.0;
/// Milligrams per ounce (28.3495 g)
pub const MG_PER_OZ: f64 = 28_349.5;
/// Milligrams per pound (453.592 g)
pub const MG_PER_LB: f64 = 453_592.0;

// ============================================================================
// Volume Conversion Constants (to milliliters)
// ============================================================================

/// Milliliters per teaspoon
pub const ML_PER_TSP: f64 = 4.92892;
/// Milliliters per tablespoon
pub const ML_PER_TBSP: f64 = 14.7868;
/// Milliliters per fluid ounce
pub const ML_PER_FL_OZ: f64 = 29.5735;
/// Milliliters per cup (nutrition-label cup)
pub const ML_PER_CUP: f64 = 240.0;
/// Milliliters per pint (US)
pub const ML_PER_PINT: f64 = 473.176;
/// Milliliters per quart (US)
pub const ML_PER_QUART: f64 = 946.353;
/// Milliliters per gallon (US)
pub const ML_PER_GALLON: f64 = 3785.41;
/// Milliliters per liter
pub const ML_PER_LITER: f64 = 1000.0;

/// Family a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFamily {
    Energy,
    Weight,
    Volume,
    /// Multiplier of a food's own serving size
    Serving,
    /// Free-text unit with no physical meaning ("packet", "slice")
    Custom,
}

impl UnitFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitFamily::Energy => "energy",
            UnitFamily::Weight => "weight",
            UnitFamily::Volume => "volume",
            UnitFamily::Serving => "serving",
            UnitFamily::Custom => "custom",
        }
    }
}

impl fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measurement unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Calorie,
    Ounce,
    Pound,
    Microgram,
    Milligram,
    Gram,
    Kilogram,
    Teaspoon,
    Tablespoon,
    FluidOunce,
    Cup,
    Pint,
    Quart,
    Gallon,
    Milliliter,
    Liter,
    Serving,
    Custom(String),
}

impl Unit {
    /// Every unit except `Custom`, in declaration order
    pub const BUILTIN: [Unit; 17] = [
        Unit::Calorie,
        Unit::Ounce,
        Unit::Pound,
        Unit::Microgram,
        Unit::Milligram,
        Unit::Gram,
        Unit::Kilogram,
        Unit::Teaspoon,
        Unit::Tablespoon,
        Unit::FluidOunce,
        Unit::Cup,
        Unit::Pint,
        Unit::Quart,
        Unit::Gallon,
        Unit::Milliliter,
        Unit::Liter,
        Unit::Serving,
    ];

    /// Display abbreviation; a custom unit is its own name
    pub fn abbreviation(&self) -> &str {
        match self {
            Unit::Calorie => "cal",
            Unit::Ounce => "oz",
            Unit::Pound => "lb",
            Unit::Microgram => "µg",
            Unit::Milligram => "mg",
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Teaspoon => "tsp",
            Unit::Tablespoon => "tbsp",
            Unit::FluidOunce => "fl oz",
            Unit::Cup => "cup",
            Unit::Pint => "pt",
            Unit::Quart => "qt",
            Unit::Gallon => "gal",
            Unit::Milliliter => "mL",
            Unit::Liter => "L",
            Unit::Serving => "serving",
            Unit::Custom(name) => name,
        }
    }

    pub fn family(&self) -> UnitFamily {
        if self.is_weight() {
            UnitFamily::Weight
        } else if self.is_volume() {
            UnitFamily::Volume
        } else {
            match self {
                Unit::Calorie => UnitFamily::Energy,
                Unit::Serving => UnitFamily::Serving,
                _ => UnitFamily::Custom,
            }
        }
    }

    pub fn is_si(&self) -> bool {
        matches!(
            self,
            Unit::Microgram
                | Unit::Milligram
                | Unit::Gram
                | Unit::Kilogram
                | Unit::Milliliter
                | Unit::Liter
        )
    }

    pub fn is_weight(&self) -> bool {
        WeightUnit::try_from(self).is_ok()
    }

    pub fn is_volume(&self) -> bool {
        VolumeUnit::try_from(self).is_ok()
    }

    /// Size of one unit relative to the family base (milligram or milliliter)
    ///
    /// Energy, serving and custom units have no factor.
    pub fn base_factor(&self) -> Option<f64> {
        if let Ok(weight) = WeightUnit::try_from(self) {
            return Some(weight.milligrams_per_unit());
        }
        VolumeUnit::try_from(self)
            .ok()
            .map(VolumeUnit::milliliters_per_unit)
    }

    /// Parse a unit name or abbreviation
    ///
    /// Matching is case-insensitive and accepts singular and plural names.
    /// Unrecognized text becomes a custom unit; blank text is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }

        let lower = trimmed.to_lowercase();
        let unit = match lower.as_str() {
            "cal" | "kcal" | "calorie" | "calories" | "kilocalorie" | "kilocalories" => {
                Unit::Calorie
            }
            "oz" | "ounce" | "ounces" => Unit::Ounce,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pound,
            "µg" | "μg" | "ug" | "mcg" | "microgram" | "micrograms" => Unit::Microgram,
            "mg" | "milligram" | "milligrams" => Unit::Milligram,
            "g" | "gram" | "grams" => Unit::Gram,
            "kg" | "kilogram" | "kilograms" => Unit::Kilogram,
            "tsp" | "teaspoon" | "teaspoons" => Unit::Teaspoon,
            "tbsp" | "tablespoon" | "tablespoons" => Unit::Tablespoon,
            "fl oz" | "floz" | "fl_oz" | "fluid ounce" | "fluid ounces" | "fluid_ounce" => {
                Unit::FluidOunce
            }
            "cup" | "cups" => Unit::Cup,
            "pt" | "pint" | "pints" => Unit::Pint,
            "qt" | "quart" | "quarts" => Unit::Quart,
            "gal" | "gallon" | "gallons" => Unit::Gallon,
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Unit::Milliliter
            }
            "l" | "liter" | "liters" | "litre" | "litres" => Unit::Liter,
            "serving" | "servings" => Unit::Serving,
            _ => Unit::Custom(trimmed.to_string()),
        };
        Some(unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// A unit statically known to be a weight
///
/// Conversions between two `WeightUnit`s cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightUnit {
    Ounce,
    Pound,
    Microgram,
    Milligram,
    Gram,
    Kilogram,
}

impl WeightUnit {
    pub fn milligrams_per_unit(self) -> f64 {
        match self {
            WeightUnit::Ounce => MG_PER_OZ,
            WeightUnit::Pound => MG_PER_LB,
            WeightUnit::Microgram => MG_PER_UG,
            WeightUnit::Milligram => 1.0,
            WeightUnit::Gram => MG_PER_G,
            WeightUnit::Kilogram => MG_PER_KG,
        }
    }

    /// Convert a decimal amount of this unit into `target`
    pub fn convert(self, value: f64, target: WeightUnit) -> f64 {
        value * self.milligrams_per_unit() / target.milligrams_per_unit()
    }
}

impl From<WeightUnit> for Unit {
    fn from(unit: WeightUnit) -> Self {
        match unit {
            WeightUnit::Ounce => Unit::Ounce,
            WeightUnit::Pound => Unit::Pound,
            WeightUnit::Microgram => Unit::Microgram,
            WeightUnit::Milligram => Unit::Milligram,
            WeightUnit::Gram => Unit::Gram,
            WeightUnit::Kilogram => Unit::Kilogram,
        }
    }
}

impl TryFrom<&Unit> for WeightUnit {
    type Error = QuantityError;

    fn try_from(unit: &Unit) -> Result<Self, Self::Error> {
        match unit {
            Unit::Ounce => Ok(WeightUnit::Ounce),
            Unit::Pound => Ok(WeightUnit::Pound),
            Unit::Microgram => Ok(WeightUnit::Microgram),
            Unit::Milligram => Ok(WeightUnit::Milligram),
            Unit::Gram => Ok(WeightUnit::Gram),
            Unit::Kilogram => Ok(WeightUnit::Kilogram),
            other => Err(QuantityError::InvalidUnit {
                unit: other.clone(),
                expected: UnitFamily::Weight,
            }),
        }
    }
}

/// A unit statically known to be a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeUnit {
    Teaspoon,
    Tablespoon,
    FluidOunce,
    Cup,
    Pint,
    Quart,
    Gallon,
    Milliliter,
    Liter,
}

impl VolumeUnit {
    pub fn milliliters_per_unit(self) -> f64 {
        match self {
            VolumeUnit::Teaspoon => ML_PER_TSP,
            VolumeUnit::Tablespoon => ML_PER_TBSP,
            VolumeUnit::FluidOunce => ML_PER_FL_OZ,
            VolumeUnit::Cup => ML_PER_CUP,
            VolumeUnit::Pint => ML_PER_PINT,
            VolumeUnit::Quart => ML_PER_QUART,
            VolumeUnit::Gallon => ML_PER_GALLON,
            VolumeUnit::Milliliter => 1.0,
            VolumeUnit::Liter => ML_PER_LITER,
        }
    }

    /// Convert a decimal amount of this unit into `target`
    pub fn convert(self, value: f64, target: VolumeUnit) -> f64 {
        value * self.milliliters_per_unit() / target.milliliters_per_unit()
    }
}

impl From<VolumeUnit> for Unit {
    fn from(unit: VolumeUnit) -> Self {
        match unit {
            VolumeUnit::Teaspoon => Unit::Teaspoon,
            VolumeUnit::Tablespoon => Unit::Tablespoon,
            VolumeUnit::FluidOunce => Unit::FluidOunce,
            VolumeUnit::Cup => Unit::Cup,
            VolumeUnit::Pint => Unit::Pint,
            VolumeUnit::Quart => Unit::Quart,
            VolumeUnit::Gallon => Unit::Gallon,
            VolumeUnit::Milliliter => Unit::Milliliter,
            VolumeUnit::Liter => Unit::Liter,
        }
    }
}

impl TryFrom<&Unit> for VolumeUnit {
    type Error = QuantityError;

    fn try_from(unit: &Unit) -> Result<Self, Self::Error> {
        match unit {
            Unit::Teaspoon => Ok(VolumeUnit::Teaspoon),
            Unit::Tablespoon => Ok(VolumeUnit::Tablespoon),
            Unit::FluidOunce => Ok(VolumeUnit::FluidOunce),
            Unit::Cup => Ok(VolumeUnit::Cup),
            Unit::Pint => Ok(VolumeUnit::Pint),
            Unit::Quart => Ok(VolumeUnit::Quart),
            Unit::Gallon => Ok(VolumeUnit::Gallon),
            Unit::Milliliter => Ok(VolumeUnit::Milliliter),
            Unit::Liter => Ok(VolumeUnit::Liter),
            other => Err(QuantityError::InvalidUnit {
                unit: other.clone(),
                expected: UnitFamily::Volume,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_weight_units() {
        assert!(Unit::Gram.is_weight());
        assert!(Unit::Ounce.is_weight());
        assert!(Unit::Pound.is_weight());
        assert!(Unit::Microgram.is_weight());
        assert!(!Unit::Cup.is_weight());
        assert!(!Unit::Calorie.is_weight());
        assert!(!Unit::Serving.is_weight());
    }

    #[test]
    fn test_classify_volume_units() {
        assert!(Unit::Milliliter.is_volume());
        assert!(Unit::Tablespoon.is_volume());
        assert!(Unit::Gallon.is_volume());
        assert!(!Unit::Kilogram.is_volume());
        assert!(!Unit::Custom("packet".to_string()).is_volume());
    }

    #[test]
    fn test_si_units() {
        assert!(Unit::Gram.is_si());
        assert!(Unit::Liter.is_si());
        assert!(!Unit::Ounce.is_si());
        assert!(!Unit::Cup.is_si());
        assert!(!Unit::Calorie.is_si());
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(Unit::FluidOunce.abbreviation(), "fl oz");
        assert_eq!(Unit::Milliliter.abbreviation(), "mL");
        assert_eq!(Unit::Serving.abbreviation(), "serving");
        assert_eq!(Unit::Custom("packet".to_string()).abbreviation(), "packet");
        assert_eq!(Unit::Custom("packet".to_string()).to_string(), "packet");
    }

    #[test]
    fn test_family() {
        assert_eq!(Unit::Calorie.family(), UnitFamily::Energy);
        assert_eq!(Unit::Pint.family(), UnitFamily::Volume);
        assert_eq!(Unit::Kilogram.family(), UnitFamily::Weight);
        assert_eq!(Unit::Serving.family(), UnitFamily::Serving);
        assert_eq!(Unit::Custom("slice".into()).family(), UnitFamily::Custom);
    }

    #[test]
    fn test_base_factor() {
        assert_eq!(Unit::Pound.base_factor(), Some(MG_PER_LB));
        assert_eq!(Unit::Gram.base_factor(), Some(1000.0));
        assert_eq!(Unit::Cup.base_factor(), Some(240.0));
        assert_eq!(Unit::Serving.base_factor(), None);
        assert_eq!(Unit::Calorie.base_factor(), None);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(Unit::parse("g"), Some(Unit::Gram));
        assert_eq!(Unit::parse("Grams"), Some(Unit::Gram));
        assert_eq!(Unit::parse("TBSP"), Some(Unit::Tablespoon));
        assert_eq!(Unit::parse("fl oz"), Some(Unit::FluidOunce));
        assert_eq!(Unit::parse("kcal"), Some(Unit::Calorie));
        assert_eq!(Unit::parse("mcg"), Some(Unit::Microgram));
        assert_eq!(Unit::parse(" servings "), Some(Unit::Serving));
        assert_eq!(
            Unit::parse("Packet"),
            Some(Unit::Custom("Packet".to_string()))
        );
        assert_eq!(Unit::parse("   "), None);
    }

    #[test]
    fn test_typed_conversions() {
        let grams = WeightUnit::Kilogram.convert(1.5, WeightUnit::Gram);
        assert!((grams - 1500.0).abs() < 1e-9);

        let ml = VolumeUnit::Cup.convert(2.0, VolumeUnit::Milliliter);
        assert!((ml - 480.0).abs() < 1e-9);

        assert!(WeightUnit::try_from(&Unit::Cup).is_err());
        assert_eq!(Unit::from(VolumeUnit::Quart), Unit::Quart);
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&Unit::FluidOunce).unwrap();
        assert_eq!(json, r#""fluid_ounce""#);

        let custom = Unit::Custom("packet".to_string());
        let json = serde_json::to_string(&custom).unwrap();
        assert_eq!(json, r#"{"custom":"packet"}"#);
        let back: Unit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, custom);
    }
}
