//! Unit MCP Tools
//!
//! Quantity parsing and conversion, plus the shared text parsers the other
//! tool modules use for amounts and nutrient maps.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::nutrition::{Nutrient, NutritionDict};
use crate::units::{Magnitude, Quantity, Unit, UnitFamily};

/// A nutrient amount shaped for display
#[derive(Debug, Serialize)]
pub struct NutrientAmount {
    pub nutrient: &'static str,
    pub name: &'static str,
    pub amount: f64,
    pub unit: String,
    pub display: String,
}

/// Response for convert_quantity
#[derive(Debug, Serialize)]
pub struct ConvertQuantityResponse {
    pub input: String,
    pub output: String,
    pub value: f64,
    pub quantity: Quantity,
}

/// Response for parse_quantity
#[derive(Debug, Serialize)]
pub struct ParseQuantityResponse {
    pub display: String,
    pub value: f64,
    pub exact_fraction: bool,
    pub unit: Unit,
    pub family: UnitFamily,
    pub quantity: Quantity,
}

/// One row of list_units
#[derive(Debug, Serialize)]
pub struct UnitInfo {
    pub unit: Unit,
    pub abbreviation: String,
    pub family: UnitFamily,
    pub is_si: bool,
    /// Milligrams or milliliters per unit
    pub base_factor: Option<f64>,
}

/// One row of the nutrient table in list_units
#[derive(Debug, Serialize)]
pub struct NutrientInfo {
    pub nutrient: &'static str,
    pub name: &'static str,
    pub canonical_unit: String,
}

/// Response for list_units
#[derive(Debug, Serialize)]
pub struct ListUnitsResponse {
    pub units: Vec<UnitInfo>,
    pub nutrients: Vec<NutrientInfo>,
}

/// Parse free text such as "1/3 cup" or "250 g" into a quantity
pub fn parse_amount(text: &str) -> Result<Quantity, String> {
    let quantity = Quantity::parse(text)
        .ok_or_else(|| format!("Could not parse amount '{}'. Expected e.g. \"250 g\" or \"1/3 cup\"", text))?;

    if quantity.value() < 0.0 {
        return Err(format!("Amount cannot be negative: {}", text));
    }

    Ok(quantity)
}

/// Parse a nutrient map keyed by nutrient name, values in canonical units
pub fn parse_nutrients(values: &BTreeMap<String, f64>) -> Result<NutritionDict, String> {
    let mut dict = NutritionDict::new();
    for (key, value) in values {
        let nutrient = Nutrient::from_str(key).ok_or_else(|| {
            format!(
                "Unknown nutrient '{}'. Known nutrients: {}",
                key,
                Nutrient::ALL.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ")
            )
        })?;
        if !value.is_finite() || *value < 0.0 {
            return Err(format!("{} cannot be negative", nutrient.display_name()));
        }
        dict.insert(nutrient, Quantity::raw(*value, nutrient.canonical_unit()));
    }
    Ok(dict)
}

/// Flatten a nutrient map into display rows in nutrient order
pub fn nutrient_amounts(dict: &NutritionDict) -> Vec<NutrientAmount> {
    dict.iter()
        .map(|(nutrient, quantity)| NutrientAmount {
            nutrient: nutrient.as_str(),
            name: nutrient.display_name(),
            amount: dict.amount(nutrient),
            unit: nutrient.canonical_unit().abbreviation().to_string(),
            display: quantity.to_string(),
        })
        .collect()
}

/// Convert a free-text amount to another unit
pub fn convert_quantity(amount: &str, to_unit: &str) -> Result<ConvertQuantityResponse, String> {
    let quantity = parse_amount(amount)?;
    let target = Unit::parse(to_unit).ok_or_else(|| "to_unit cannot be empty".to_string())?;

    let converted = quantity
        .convert(&target)
        .map_err(|e| format!("Cannot convert {}: {}", quantity, e))?;

    Ok(ConvertQuantityResponse {
        input: quantity.to_string(),
        output: converted.to_string(),
        value: converted.value(),
        quantity: converted,
    })
}

/// Parse a free-text amount and describe it
pub fn parse_quantity(text: &str) -> Result<ParseQuantityResponse, String> {
    let quantity = parse_amount(text)?;

    Ok(ParseQuantityResponse {
        display: quantity.to_string(),
        value: quantity.value(),
        exact_fraction: matches!(quantity.magnitude, Magnitude::Rational { .. }),
        unit: quantity.unit.clone(),
        family: quantity.unit.family(),
        quantity,
    })
}

/// All built-in units and nutrients
pub fn list_units() -> ListUnitsResponse {
    let units = Unit::BUILTIN
        .iter()
        .map(|unit| UnitInfo {
            unit: unit.clone(),
            abbreviation: unit.abbreviation().to_string(),
            family: unit.family(),
            is_si: unit.is_si(),
            base_factor: unit.base_factor(),
        })
        .collect();

    let nutrients = Nutrient::ALL
        .iter()
        .map(|nutrient| NutrientInfo {
            nutrient: nutrient.as_str(),
            name: nutrient.display_name(),
            canonical_unit: nutrient.canonical_unit().abbreviation().to_string(),
        })
        .collect();

    ListUnitsResponse { units, nutrients }
}
