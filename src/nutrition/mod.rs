//! Nutrition calculation module
//!
//! Nutrient maps, consumption scaling, aggregation, and cost per serving.

pub mod aggregate;
pub mod cost;
pub mod dict;
pub mod nutrient;

pub use aggregate::{aggregate, consumption_scale, per_container, Consumption, MacroBreakdown};
pub use cost::{cost_of, cost_per_serving};
pub use dict::NutritionDict;
pub use nutrient::Nutrient;
