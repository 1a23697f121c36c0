//! Log Entry model
//!
//! Represents food eaten on a day, either a food item or a recipe.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{json_column, to_json, Day, FoodItem, Recipe};
use crate::db::{DbError, DbResult};
use crate::nutrition::{Consumption, NutritionDict};
use crate::units::Quantity;

/// Meal type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Unspecified,
}

impl Meal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
            Meal::Snack => "snack",
            Meal::Unspecified => "unspecified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(Meal::Breakfast),
            "lunch" => Some(Meal::Lunch),
            "dinner" => Some(Meal::Dinner),
            "snack" | "snacks" => Some(Meal::Snack),
            "unspecified" | "" => Some(Meal::Unspecified),
            _ => None,
        }
    }
}

/// What a log entry refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LogSource {
    FoodItem(i64),
    Recipe(i64),
}

impl LogSource {
    pub fn kind(&self) -> &'static str {
        match self {
            LogSource::FoodItem(_) => "food_item",
            LogSource::Recipe(_) => "recipe",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LogSource::FoodItem(id) | LogSource::Recipe(id) => *id,
        }
    }

    fn columns(&self) -> (Option<i64>, Option<i64>) {
        match self {
            LogSource::FoodItem(id) => (Some(*id), None),
            LogSource::Recipe(id) => (None, Some(*id)),
        }
    }
}

/// A log entry representing consumed food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub day_id: i64,
    pub meal: Meal,
    pub source: LogSource,
    pub amount: Quantity,
    pub cached_nutrients: NutritionDict,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Log entry with source details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryDetail {
    pub id: i64,
    pub date: String,
    pub meal: Meal,
    pub source_type: String,
    pub source_id: i64,
    pub source_name: String,
    pub amount: Quantity,
    pub nutrients: NutritionDict,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Data for logging food on a date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryCreate {
    pub date: String,
    pub meal: Meal,
    pub source: LogSource,
    pub amount: Quantity,
    pub notes: Option<String>,
}

/// Data for updating a log entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntryUpdate {
    pub meal: Option<Meal>,
    pub amount: Option<Quantity>,
    pub notes: Option<String>,
}

impl LogEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal: String = row.get("meal")?;
        let food_item_id: Option<i64> = row.get("food_item_id")?;
        let recipe_id: Option<i64> = row.get("recipe_id")?;

        // The table CHECK guarantees exactly one of the two
        let source = match (food_item_id, recipe_id) {
            (Some(id), _) => LogSource::FoodItem(id),
            (None, Some(id)) => LogSource::Recipe(id),
            (None, None) => return Err(rusqlite::Error::InvalidColumnType(
                0,
                "food_item_id".to_string(),
                rusqlite::types::Type::Null,
            )),
        };

        Ok(Self {
            id: row.get("id")?,
            day_id: row.get("day_id")?,
            meal: Meal::from_str(&meal).unwrap_or(Meal::Unspecified),
            source,
            amount: json_column(row, "amount")?,
            cached_nutrients: json_column(row, "cached_nutrients")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Log food on a date, creating the day if needed
    pub fn create(conn: &Connection, data: &LogEntryCreate) -> DbResult<Self> {
        let nutrients = source_nutrients(conn, &data.source, &data.amount)?;
        let day = Day::get_or_create(conn, &data.date)?;
        let (food_item_id, recipe_id) = data.source.columns();

        conn.execute(
            r#"
            INSERT INTO log_entries (
                day_id, meal, food_item_id, recipe_id, amount, cached_nutrients, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                day.id,
                data.meal.as_str(),
                food_item_id,
                recipe_id,
                to_json(&data.amount)?,
                to_json(&nutrients)?,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let entry = Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::NotFound(format!("Log entry {}", id)))?;

        recalculate_day_nutrients(conn, day.id)?;

        Ok(entry)
    }

    /// Get a log entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM log_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All entries for a day in meal order
    pub fn list_for_day(conn: &Connection, day_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM log_entries
            WHERE day_id = ?1
            ORDER BY CASE meal
                WHEN 'breakfast' THEN 0
                WHEN 'lunch' THEN 1
                WHEN 'dinner' THEN 2
                WHEN 'snack' THEN 3
                ELSE 4
            END, id
            "#,
        )?;

        let entries = stmt
            .query_map([day_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Entries for a day with source names
    pub fn list_details_for_day(conn: &Connection, day_id: i64) -> DbResult<Vec<LogEntryDetail>> {
        let day = Day::get_by_id(conn, day_id)?
            .ok_or_else(|| DbError::NotFound(format!("Day {}", day_id)))?;

        let mut details = Vec::new();
        for entry in Self::list_for_day(conn, day_id)? {
            let source_name = match entry.source {
                LogSource::FoodItem(id) => FoodItem::get_by_id(conn, id)?
                    .ok_or_else(|| DbError::NotFound(format!("Food item {}", id)))?
                    .name,
                LogSource::Recipe(id) => Recipe::get_by_id(conn, id)?
                    .ok_or_else(|| DbError::NotFound(format!("Recipe {}", id)))?
                    .name,
            };

            details.push(LogEntryDetail {
                id: entry.id,
                date: day.date.clone(),
                meal: entry.meal,
                source_type: entry.source.kind().to_string(),
                source_id: entry.source.id(),
                source_name,
                amount: entry.amount,
                nutrients: entry.cached_nutrients,
                notes: entry.notes,
                created_at: entry.created_at,
            });
        }

        Ok(details)
    }

    /// Update a log entry and refresh its day
    pub fn update(conn: &Connection, id: i64, data: &LogEntryUpdate) -> DbResult<Option<Self>> {
        let Some(entry) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let meal = data.meal.unwrap_or(entry.meal);
        let amount = data.amount.as_ref().unwrap_or(&entry.amount);
        let notes = data.notes.as_ref().or(entry.notes.as_ref());
        let nutrients = source_nutrients(conn, &entry.source, amount)?;

        conn.execute(
            r#"
            UPDATE log_entries
            SET meal = ?1, amount = ?2, cached_nutrients = ?3, notes = ?4,
                updated_at = datetime('now')
            WHERE id = ?5
            "#,
            params![meal.as_str(), to_json(amount)?, to_json(&nutrients)?, notes, id],
        )?;

        recalculate_day_nutrients(conn, entry.day_id)?;

        Self::get_by_id(conn, id)
    }

    /// Delete a log entry and refresh its day
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let Some(entry) = Self::get_by_id(conn, id)? else {
            return Ok(false);
        };

        conn.execute("DELETE FROM log_entries WHERE id = ?1", [id])?;
        recalculate_day_nutrients(conn, entry.day_id)?;

        Ok(true)
    }
}

/// Nutrients in `amount` of a food item or recipe as it currently stands
fn source_nutrients(conn: &Connection, source: &LogSource, amount: &Quantity) -> DbResult<NutritionDict> {
    let nutrients = match source {
        LogSource::FoodItem(id) => {
            let food = FoodItem::get_by_id(conn, *id)?
                .ok_or_else(|| DbError::NotFound(format!("Food item {}", id)))?;
            Consumption::new(&food.nutrients, &food.serving_size, amount).nutrients()
        }
        LogSource::Recipe(id) => {
            let recipe = Recipe::get_by_id(conn, *id)?
                .ok_or_else(|| DbError::NotFound(format!("Recipe {}", id)))?;
            let serving = recipe.serving_size();
            Consumption::new(&recipe.cached_nutrients, &serving, amount).nutrients()
        }
    };
    Ok(nutrients)
}

/// Recalculate and update cached nutrients for a day
///
/// Each entry is refreshed from its food item or recipe before the day
/// total is summed, so edits to sources flow through.
pub fn recalculate_day_nutrients(conn: &Connection, day_id: i64) -> DbResult<NutritionDict> {
    let entries = LogEntry::list_for_day(conn, day_id)?;

    let mut total = NutritionDict::new();
    for entry in &entries {
        let nutrients = source_nutrients(conn, &entry.source, &entry.amount)?;
        conn.execute(
            "UPDATE log_entries SET cached_nutrients = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![to_json(&nutrients)?, entry.id],
        )?;
        total.accumulate(&nutrients);
    }

    Day::update_cached_nutrients(conn, day_id, &total)?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{
        cascade_recalculate_from_food_item, FoodItemCreate, FoodItemUpdate, RecipeCreate,
        RecipeIngredient, RecipeIngredientCreate,
    };
    use crate::nutrition::Nutrient;
    use crate::units::Unit;

    fn food(conn: &Connection, name: &str, serving: Quantity, kcal: f64, protein: f64) -> DbResult<FoodItem> {
        FoodItem::create(
            conn,
            &FoodItemCreate {
                name: name.to_string(),
                brand: None,
                barcode: None,
                serving_size: serving,
                servings_per_container: None,
                nutrients: NutritionDict::from_canonical([
                    (Nutrient::Energy, kcal),
                    (Nutrient::Protein, protein),
                ]),
                notes: None,
            },
        )
    }

    fn log(date: &str, meal: Meal, source: LogSource, amount: Quantity) -> LogEntryCreate {
        LogEntryCreate {
            date: date.to_string(),
            meal,
            source,
            amount,
            notes: None,
        }
    }

    #[test]
    fn test_day_totals_follow_entries() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let oats = food(conn, "Oats", Quantity::grams(40.0), 150.0, 5.0)?;
            let egg = food(conn, "Egg", Quantity::raw(1.0, Unit::Custom("egg".into())), 70.0, 6.0)?;

            // 60 g oats = 1.5 servings, 2 eggs = 2 servings
            let oat_entry = LogEntry::create(
                conn,
                &log("2026-03-01", Meal::Breakfast, LogSource::FoodItem(oats.id), Quantity::grams(60.0)),
            )?;
            LogEntry::create(
                conn,
                &log(
                    "2026-03-01",
                    Meal::Breakfast,
                    LogSource::FoodItem(egg.id),
                    Quantity::raw(2.0, Unit::Custom("egg".into())),
                ),
            )?;

            let day = Day::get_by_date(conn, "2026-03-01")?.unwrap();
            assert!((day.cached_nutrients.amount(Nutrient::Energy) - 365.0).abs() < 1e-9);
            assert!((day.cached_nutrients.amount(Nutrient::Protein) - 19.5).abs() < 1e-9);
            let summed: NutritionDict = LogEntry::list_for_day(conn, day.id)?
                .into_iter()
                .map(|e| e.cached_nutrients)
                .sum();
            assert_eq!(summed, day.cached_nutrients);

            LogEntry::update(
                conn,
                oat_entry.id,
                &LogEntryUpdate {
                    amount: Some(Quantity::grams(80.0)),
                    ..Default::default()
                },
            )?;
            let day = Day::get_by_id(conn, day.id)?.unwrap();
            assert!((day.cached_nutrients.amount(Nutrient::Energy) - 440.0).abs() < 1e-9);

            LogEntry::delete(conn, oat_entry.id)?;
            let day = Day::get_by_id(conn, day.id)?.unwrap();
            assert!((day.cached_nutrients.amount(Nutrient::Energy) - 140.0).abs() < 1e-9);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_food_edit_cascades_to_recipes_and_days() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let rice = food(conn, "Rice", Quantity::grams(100.0), 130.0, 2.5)?;
            let bowl = Recipe::create(
                conn,
                &RecipeCreate {
                    name: "Rice bowl".to_string(),
                    servings_produced: 2.0,
                    notes: None,
                },
            )?;
            RecipeIngredient::create(
                conn,
                &RecipeIngredientCreate {
                    recipe_id: bowl.id,
                    food_item_id: rice.id,
                    amount: Quantity::grams(400.0),
                    notes: None,
                },
            )?;

            // Half a serving of a 260 kcal serving
            LogEntry::create(
                conn,
                &log("2026-03-02", Meal::Dinner, LogSource::Recipe(bowl.id), Quantity::servings(0.5)),
            )?;
            let day = Day::get_by_date(conn, "2026-03-02")?.unwrap();
            assert!((day.cached_nutrients.amount(Nutrient::Energy) - 130.0).abs() < 1e-9);

            FoodItem::update(
                conn,
                rice.id,
                &FoodItemUpdate {
                    nutrients: Some(NutritionDict::from_canonical([(Nutrient::Energy, 100.0)])),
                    ..Default::default()
                },
            )?;
            let result = cascade_recalculate_from_food_item(conn, rice.id)?;
            assert_eq!(result.recipes_recalculated, vec![bowl.id]);
            assert_eq!(result.days_recalculated, vec![day.id]);

            let day = Day::get_by_id(conn, day.id)?.unwrap();
            assert!((day.cached_nutrients.amount(Nutrient::Energy) - 100.0).abs() < 1e-9);

            let details = LogEntry::list_details_for_day(conn, day.id)?;
            assert_eq!(details[0].source_type, "recipe");
            assert_eq!(details[0].source_name, "Rice bowl");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_meal_from_str() {
        assert_eq!(Meal::from_str("Lunch"), Some(Meal::Lunch));
        assert_eq!(Meal::from_str(""), Some(Meal::Unspecified));
        assert_eq!(Meal::from_str("brunch"), None);
    }
}
