//! Nutrient enumeration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::Unit;

/// A tracked nutrient
///
/// Declaration order is label order and is used for map ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Energy,
    TotalCarbs,
    DietaryFiber,
    TotalSugars,
    AddedSugars,
    TotalFat,
    SaturatedFat,
    TransFat,
    PolyunsaturatedFat,
    MonounsaturatedFat,
    Protein,
    Sodium,
    Cholesterol,
    Calcium,
    VitaminD,
    Iron,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 17] = [
        Nutrient::Energy,
        Nutrient::TotalCarbs,
        Nutrient::DietaryFiber,
        Nutrient::TotalSugars,
        Nutrient::AddedSugars,
        Nutrient::TotalFat,
        Nutrient::SaturatedFat,
        Nutrient::TransFat,
        Nutrient::PolyunsaturatedFat,
        Nutrient::MonounsaturatedFat,
        Nutrient::Protein,
        Nutrient::Sodium,
        Nutrient::Cholesterol,
        Nutrient::Calcium,
        Nutrient::VitaminD,
        Nutrient::Iron,
        Nutrient::Potassium,
    ];

    /// Unit amounts of this nutrient are displayed in
    pub fn canonical_unit(&self) -> Unit {
        match self {
            Nutrient::Energy => Unit::Calorie,
            Nutrient::Sodium
            | Nutrient::Cholesterol
            | Nutrient::Calcium
            | Nutrient::Iron
            | Nutrient::Potassium => Unit::Milligram,
            Nutrient::VitaminD => Unit::Microgram,
            _ => Unit::Gram,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Nutrient::Energy => "Calories",
            Nutrient::TotalCarbs => "Total Carbohydrate",
            Nutrient::DietaryFiber => "Dietary Fiber",
            Nutrient::TotalSugars => "Total Sugars",
            Nutrient::AddedSugars => "Added Sugars",
            Nutrient::TotalFat => "Total Fat",
            Nutrient::SaturatedFat => "Saturated Fat",
            Nutrient::TransFat => "Trans Fat",
            Nutrient::PolyunsaturatedFat => "Polyunsaturated Fat",
            Nutrient::MonounsaturatedFat => "Monounsaturated Fat",
            Nutrient::Protein => "Protein",
            Nutrient::Sodium => "Sodium",
            Nutrient::Cholesterol => "Cholesterol",
            Nutrient::Calcium => "Calcium",
            Nutrient::VitaminD => "Vitamin D",
            Nutrient::Iron => "Iron",
            Nutrient::Potassium => "Potassium",
        }
    }

    /// Key used in JSON and tool parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Energy => "energy",
            Nutrient::TotalCarbs => "total_carbs",
            Nutrient::DietaryFiber => "dietary_fiber",
            Nutrient::TotalSugars => "total_sugars",
            Nutrient::AddedSugars => "added_sugars",
            Nutrient::TotalFat => "total_fat",
            Nutrient::SaturatedFat => "saturated_fat",
            Nutrient::TransFat => "trans_fat",
            Nutrient::PolyunsaturatedFat => "polyunsaturated_fat",
            Nutrient::MonounsaturatedFat => "monounsaturated_fat",
            Nutrient::Protein => "protein",
            Nutrient::Sodium => "sodium",
            Nutrient::Cholesterol => "cholesterol",
            Nutrient::Calcium => "calcium",
            Nutrient::VitaminD => "vitamin_d",
            Nutrient::Iron => "iron",
            Nutrient::Potassium => "potassium",
        }
    }

    /// Parse a key, also accepting a few common label spellings
    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "calories" | "kcal" => return Some(Nutrient::Energy),
            "carbs" | "carbohydrates" | "total_carbohydrate" => return Some(Nutrient::TotalCarbs),
            "fiber" => return Some(Nutrient::DietaryFiber),
            "sugar" | "sugars" => return Some(Nutrient::TotalSugars),
            "fat" => return Some(Nutrient::TotalFat),
            _ => {}
        }
        Nutrient::ALL.into_iter().find(|n| n.as_str() == key)
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
