//! Pantry Status Tool
//!
//! Runtime status of the pantry service and the usage guide served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants
pub const PANTRY_INSTRUCTIONS: &str = r#"
# Pantry Manager Instructions

This guide explains how to record food, recipes, prices and what was eaten.

## Amounts

Every amount is plain text: a number followed by a unit.

| Kind | Units |
|------|-------|
| Weight | mcg, mg, g, kg, oz, lb |
| Volume | ml, l, tsp, tbsp, fl oz, cup, pt, qt, gal |
| Serving | serving (a bare number also means servings) |
| Anything else | custom, e.g. `2 slices`, `1 scoop` |

Numbers may be decimals (`1.5 cup`), fractions (`1/3 cup`) or mixed numbers (`1 1/2 cup`).
Fractions are kept exact, so `1/3 cup` stays one third rather than 0.333.

Use `parse_quantity` to check how text will be read and `convert_quantity` to move
between units of the same kind. Weight and volume never convert into each other.

---

## Food Items

A food item is described by its label:

- `serving_size` - the serving the label's numbers refer to (`30 g`, `1/3 cup`, `2 slices`)
- `servings_per_container` - needed for pricing
- `nutrients` - amounts for ONE serving, keyed by nutrient name

Nutrient keys: `energy` (kcal), `protein`, `total_carbs`, `dietary_fiber`, `total_sugars`,
`added_sugars`, `total_fat`, `saturated_fat`, `trans_fat`, `polyunsaturated_fat`,
`monounsaturated_fat` (g), `sodium`, `cholesterol`, `calcium`, `iron`, `potassium` (mg),
`vitamin_d` (mcg). Label names such as "Calories" or "Total Fat" are accepted too.
Call `list_units` for the full list.

Search before adding to avoid duplicates: `search_food_items`.

---

## Recipes

1. `create_recipe` with `servings_produced`
2. `add_recipe_ingredient` for each food item and the amount used

Weight amounts need a weight serving size and volume amounts a volume one.
Any other amount (servings or a custom unit such as `slices`) is read as a
number of servings as-is: with a serving size of `2 slices`, log `1` or
`1 serving` for two slices, not `2 slices`.
Recipe nutrients are stored per serving and refresh whenever an ingredient,
a food item or the servings produced change.

---

## Logging Food

`log_food` with a `meal` (breakfast, lunch, dinner, snack) and either
`food_item_id` or `recipe_id` plus the amount eaten. The date defaults to today.

- `amount: "2"` - two servings
- `amount: "45 g"` - converted against the food item's serving size
- `amount: "1.5 serving"` of a recipe - one and a half of its servings

`get_day` shows entries grouped by meal with totals. Day totals are kept in sync
when food items or recipes change. `recalculate_day_nutrition` forces a refresh.

---

## Prices

`add_store_price` records the price of one container at a store.
`get_cost_per_serving` uses the latest price, optionally limited to a store,
and can price an arbitrary amount such as `25 g`.
"#;

/// Runtime status of the pantry service
#[derive(Debug, Clone, Serialize)]
pub struct PantryStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Collects runtime information for the status tool
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Snapshot of build, database and process state
    pub fn get_status(&self) -> PantryStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        PantryStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/pantry.db"));
        let status = tracker.get_status();

        assert_eq!(status.database_path, "/nonexistent/pantry.db");
        assert!(status.database_size_bytes.is_none());
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_instructions_explain_custom_amounts() {
        assert!(PANTRY_INSTRUCTIONS.contains("number of servings as-is"));
    }

    #[test]
    fn test_instructions_name_the_tools() {
        for tool in ["log_food", "add_recipe_ingredient", "get_cost_per_serving", "parse_quantity"] {
            assert!(PANTRY_INSTRUCTIONS.contains(tool), "missing {}", tool);
        }
    }
}
