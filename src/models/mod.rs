//! Data models
//!
//! Rust structs representing database entities.

mod day;
mod food_item;
mod log_entry;
mod recipe;
mod recipe_ingredient;
mod store_price;

pub use day::Day;
pub use food_item::{FoodItem, FoodItemCreate, FoodItemUpdate};
pub use log_entry::{
    recalculate_day_nutrients, LogEntry, LogEntryCreate, LogEntryDetail,
    LogEntryUpdate, LogSource, Meal,
};
pub use recipe::{Recipe, RecipeCreate, RecipeUpdate};
pub use recipe_ingredient::{
    calculate_recipe_nutrients, cascade_recalculate_from_food_item,
    cascade_recalculate_from_recipe, recalculate_recipe_nutrients,
    CascadeRecalculateResult, RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail,
    RecipeIngredientUpdate,
};
pub use store_price::{StorePrice, StorePriceCreate};

use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read a JSON text column into a value
fn json_column<T: DeserializeOwned>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| {
        let index = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

/// Encode a value for a JSON text column
fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}
