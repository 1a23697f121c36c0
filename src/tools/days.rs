//! Day and Log Entry MCP Tools
//!
//! Tools for logging food and reading back daily totals.

use chrono::NaiveDate;
use serde::Serialize;

use super::units::{nutrient_amounts, parse_amount, NutrientAmount};
use crate::db::{Database, DbError};
use crate::models::{
    recalculate_day_nutrients, Day, FoodItem, LogEntry, LogEntryCreate, LogEntryDetail,
    LogEntryUpdate, LogSource, Meal, Recipe,
};
use crate::nutrition::{consumption_scale, MacroBreakdown, Nutrient, NutritionDict};
use crate::units::Quantity;

/// Day with log entries for detailed view
#[derive(Debug, Serialize)]
pub struct DayDetail {
    pub id: i64,
    pub date: String,
    pub meals: DayMeals,
    pub nutrients_total: Vec<NutrientAmount>,
    pub macros: MacroBreakdown,
    pub notes: Option<String>,
}

/// Entries organized by meal
#[derive(Debug, Default, Serialize)]
pub struct DayMeals {
    pub breakfast: Vec<EntryLine>,
    pub lunch: Vec<EntryLine>,
    pub dinner: Vec<EntryLine>,
    pub snack: Vec<EntryLine>,
    pub unspecified: Vec<EntryLine>,
}

/// One log entry shaped for display
#[derive(Debug, Serialize)]
pub struct EntryLine {
    pub id: i64,
    pub source_type: String,
    pub source_id: i64,
    pub source_name: String,
    pub amount: String,
    pub calories: f64,
    pub notes: Option<String>,
}

impl From<LogEntryDetail> for EntryLine {
    fn from(detail: LogEntryDetail) -> Self {
        Self {
            id: detail.id,
            calories: detail.nutrients.amount(Nutrient::Energy),
            source_type: detail.source_type,
            source_id: detail.source_id,
            source_name: detail.source_name,
            amount: detail.amount.to_string(),
            notes: detail.notes,
        }
    }
}

/// Day summary for listing
#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub id: i64,
    pub date: String,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

/// Response for list_days
#[derive(Debug, Serialize)]
pub struct ListDaysResponse {
    pub days: Vec<DaySummary>,
    pub limit: i64,
    pub offset: i64,
}

/// Response for log_food
#[derive(Debug, Serialize)]
pub struct LogFoodResponse {
    pub id: i64,
    pub day_id: i64,
    pub date: String,
    pub meal: String,
    pub source_type: String,
    pub source_name: String,
    pub amount: String,
    pub nutrients: Vec<NutrientAmount>,
    pub day_total_calories: f64,
}

/// Response for update_log_entry
#[derive(Debug, Serialize)]
pub struct UpdateLogEntryResponse {
    pub id: i64,
    pub meal: String,
    pub amount: String,
    pub nutrients: Vec<NutrientAmount>,
    pub updated_at: String,
}

/// Response for recalculate_day_nutrition
#[derive(Debug, Serialize)]
pub struct RecalculateDayNutritionResponse {
    pub day_id: i64,
    pub date: String,
    pub nutrients: Vec<NutrientAmount>,
}

/// Validate an ISO date, defaulting to today
pub fn resolve_date(date: Option<&str>) -> Result<String, String> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|d| d.format("%Y-%m-%d").to_string())
            .map_err(|_| format!("Invalid date '{}'. Expected YYYY-MM-DD", date)),
        None => Ok(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()),
    }
}

fn parse_meal(meal: &str) -> Result<Meal, String> {
    Meal::from_str(meal).ok_or_else(|| {
        format!(
            "Invalid meal '{}'. Expected breakfast, lunch, dinner, snack, or unspecified",
            meal
        )
    })
}

/// Name of the logged source, after checking `amount` relates to its serving size
fn check_measurable(
    conn: &rusqlite::Connection,
    source: &LogSource,
    amount: &Quantity,
) -> Result<String, String> {
    let (source_name, serving_size) = match *source {
        LogSource::FoodItem(id) => {
            let food_item = FoodItem::get_by_id(conn, id)
                .map_err(|e| format!("Database error checking food item: {}", e))?
                .ok_or_else(|| format!("Food item not found with id: {}", id))?;
            (food_item.name, food_item.serving_size)
        }
        LogSource::Recipe(id) => {
            let recipe = Recipe::get_by_id(conn, id)
                .map_err(|e| format!("Database error checking recipe: {}", e))?
                .ok_or_else(|| format!("Recipe not found with id: {}", id))?;
            let serving_size = recipe.serving_size();
            (recipe.name, serving_size)
        }
    };

    consumption_scale(amount, &serving_size).map_err(|e| {
        format!(
            "Amount {} cannot be measured against {}'s serving size {}: {}",
            amount, source_name, serving_size, e
        )
    })?;

    Ok(source_name)
}

// ============================================================================
// Day Tools
// ============================================================================

/// Get a day with full details including entries
pub fn get_day(db: &Database, date: &str) -> Result<Option<DayDetail>, String> {
    let date = resolve_date(Some(date))?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let day = Day::get_by_date(&conn, &date)
        .map_err(|e| format!("Failed to get day: {}", e))?;

    match day {
        Some(day) => {
            let entries = LogEntry::list_details_for_day(&conn, day.id)
                .map_err(|e| format!("Failed to get log entries: {}", e))?;

            let mut meals = DayMeals::default();
            for entry in entries {
                let bucket = match entry.meal {
                    Meal::Breakfast => &mut meals.breakfast,
                    Meal::Lunch => &mut meals.lunch,
                    Meal::Dinner => &mut meals.dinner,
                    Meal::Snack => &mut meals.snack,
                    Meal::Unspecified => &mut meals.unspecified,
                };
                bucket.push(EntryLine::from(entry));
            }

            Ok(Some(DayDetail {
                id: day.id,
                date: day.date,
                meals,
                nutrients_total: nutrient_amounts(&day.cached_nutrients),
                macros: MacroBreakdown::from_dict(&day.cached_nutrients),
                notes: day.notes,
            }))
        }
        None => Ok(None),
    }
}

/// List days with optional date range, newest first
pub fn list_days(
    db: &Database,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListDaysResponse, String> {
    let limit = limit.clamp(1, 366);
    let offset = offset.max(0);
    let start_date = start_date.map(|d| resolve_date(Some(d))).transpose()?;
    let end_date = end_date.map(|d| resolve_date(Some(d))).transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let days = Day::list(&conn, start_date.as_deref(), end_date.as_deref(), limit, offset)
        .map_err(|e| format!("Failed to list days: {}", e))?;

    let days = days
        .iter()
        .map(|day| {
            let totals = &day.cached_nutrients;
            DaySummary {
                id: day.id,
                date: day.date.clone(),
                total_calories: totals.amount(Nutrient::Energy),
                total_protein: totals.amount(Nutrient::Protein),
                total_carbs: totals.amount(Nutrient::TotalCarbs),
                total_fat: totals.amount(Nutrient::TotalFat),
            }
        })
        .collect();

    Ok(ListDaysResponse { days, limit, offset })
}

/// Set notes on a day, creating it if needed
pub fn update_day(db: &Database, date: &str, notes: &str) -> Result<Option<DayDetail>, String> {
    let date = resolve_date(Some(date))?;
    {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let day = Day::get_or_create(&conn, &date)
            .map_err(|e| format!("Failed to get day: {}", e))?;
        Day::update_notes(&conn, day.id, notes)
            .map_err(|e| format!("Failed to update day: {}", e))?;
    }

    get_day(db, &date)
}

// ============================================================================
// Log Entry Tools
// ============================================================================

/// Log a food item or recipe eaten on a date
pub fn log_food(
    db: &Database,
    date: Option<&str>,
    meal: &str,
    food_item_id: Option<i64>,
    recipe_id: Option<i64>,
    amount: &str,
    notes: Option<String>,
) -> Result<LogFoodResponse, String> {
    let source = match (food_item_id, recipe_id) {
        (Some(id), None) => LogSource::FoodItem(id),
        (None, Some(id)) => LogSource::Recipe(id),
        (None, None) => return Err("Must provide either food_item_id or recipe_id".to_string()),
        (Some(_), Some(_)) => {
            return Err("Provide only one of food_item_id or recipe_id, not both".to_string())
        }
    };

    let date = resolve_date(date)?;
    let meal = parse_meal(meal)?;
    let amount = parse_amount(amount)?;
    if amount.value() <= 0.0 {
        return Err("amount must be greater than 0".to_string());
    }

    let source_name = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        check_measurable(&conn, &source, &amount)?
    };

    // The entry and its day total land together or not at all
    let (entry, day) = db
        .with_transaction(|tx| {
            let entry = LogEntry::create(
                tx,
                &LogEntryCreate {
                    date,
                    meal,
                    source,
                    amount,
                    notes,
                },
            )?;
            let day = Day::get_by_id(tx, entry.day_id)?
                .ok_or_else(|| DbError::NotFound(format!("Day {}", entry.day_id)))?;
            Ok((entry, day))
        })
        .map_err(|e| format!("Failed to log food: {}", e))?;

    tracing::info!("Logged {} ({}) on {}", source_name, entry.amount, day.date);

    Ok(LogFoodResponse {
        id: entry.id,
        day_id: day.id,
        date: day.date,
        meal: entry.meal.as_str().to_string(),
        source_type: entry.source.kind().to_string(),
        source_name,
        amount: entry.amount.to_string(),
        nutrients: nutrient_amounts(&entry.cached_nutrients),
        day_total_calories: day.cached_nutrients.amount(Nutrient::Energy),
    })
}

/// Update a log entry
pub fn update_log_entry(
    db: &Database,
    id: i64,
    meal: Option<&str>,
    amount: Option<&str>,
    notes: Option<String>,
) -> Result<Option<UpdateLogEntryResponse>, String> {
    let meal = meal.map(parse_meal).transpose()?;
    let amount = amount.map(parse_amount).transpose()?;
    if amount.as_ref().is_some_and(|a| a.value() <= 0.0) {
        return Err("amount must be greater than 0".to_string());
    }

    if let Some(ref amount) = amount {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let Some(existing) = LogEntry::get_by_id(&conn, id)
            .map_err(|e| format!("Failed to get log entry: {}", e))?
        else {
            return Ok(None);
        };
        check_measurable(&conn, &existing.source, amount)?;
    }

    let updated = db
        .with_transaction(|tx| LogEntry::update(tx, id, &LogEntryUpdate { meal, amount, notes }))
        .map_err(|e| format!("Failed to update log entry: {}", e))?;

    Ok(updated.map(|entry| UpdateLogEntryResponse {
        id: entry.id,
        meal: entry.meal.as_str().to_string(),
        amount: entry.amount.to_string(),
        nutrients: nutrient_amounts(&entry.cached_nutrients),
        updated_at: entry.updated_at,
    }))
}

/// Delete a log entry
pub fn delete_log_entry(db: &Database, id: i64) -> Result<bool, String> {
    db.with_transaction(|tx| LogEntry::delete(tx, id))
        .map_err(|e| format!("Failed to delete log entry: {}", e))
}

/// Force recalculate day nutrition from current food items and recipes
pub fn recalculate_day_nutrition(db: &Database, date: &str) -> Result<RecalculateDayNutritionResponse, String> {
    let date = resolve_date(Some(date))?;

    let recalculated = db
        .with_transaction(|tx| {
            let Some(day) = Day::get_by_date(tx, &date)? else {
                return Ok(None);
            };
            let nutrients: NutritionDict = recalculate_day_nutrients(tx, day.id)?;
            Ok(Some((day, nutrients)))
        })
        .map_err(|e| format!("Failed to recalculate nutrition: {}", e))?;

    let (day, nutrients) = recalculated.ok_or_else(|| format!("Day not found: {}", date))?;

    Ok(RecalculateDayNutritionResponse {
        day_id: day.id,
        date: day.date,
        nutrients: nutrient_amounts(&nutrients),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::food_items::{add_food_item, FoodItemInput};
    use crate::tools::recipes::{add_recipe_ingredient, create_recipe};
    use std::collections::BTreeMap;

    fn add_food(db: &Database, name: &str, serving_size: &str, calories: f64, protein: f64) -> i64 {
        let mut nutrients = BTreeMap::new();
        nutrients.insert("energy".to_string(), calories);
        nutrients.insert("protein".to_string(), protein);
        add_food_item(
            db,
            FoodItemInput {
                name: name.to_string(),
                serving_size: serving_size.to_string(),
                nutrients,
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_log_food_and_read_day() {
        let db = Database::in_memory().unwrap();
        let yogurt = add_food(&db, "Greek Yogurt", "170 g", 100.0, 17.0);
        let granola = add_food(&db, "Granola", "1/3 cup", 140.0, 3.0);

        let first = log_food(&db, Some("2026-05-01"), "breakfast", Some(yogurt), None, "1.5", None).unwrap();
        assert!((first.day_total_calories - 150.0).abs() < 1e-9);

        // 2/3 cup is two servings of 1/3 cup
        let second = log_food(&db, Some("2026-05-01"), "Breakfast", Some(granola), None, "2/3 cup", None).unwrap();
        assert!((second.day_total_calories - 430.0).abs() < 1e-6);

        let day = get_day(&db, "2026-05-01").unwrap().unwrap();
        assert_eq!(day.meals.breakfast.len(), 2);
        assert!(day.meals.lunch.is_empty());

        let listed = list_days(&db, None, None, 10, 0).unwrap();
        assert_eq!(listed.days.len(), 1);
        assert!((listed.days[0].total_protein - 31.5).abs() < 1e-6);
    }

    #[test]
    fn test_log_food_validation() {
        let db = Database::in_memory().unwrap();
        let yogurt = add_food(&db, "Greek Yogurt", "170 g", 100.0, 17.0);

        assert!(log_food(&db, None, "lunch", None, None, "1", None).is_err());
        assert!(log_food(&db, None, "lunch", Some(yogurt), Some(1), "1", None).is_err());
        assert!(log_food(&db, None, "brunch", Some(yogurt), None, "1", None).is_err());
        assert!(log_food(&db, Some("05/01/2026"), "lunch", Some(yogurt), None, "1", None).is_err());
        assert!(log_food(&db, None, "lunch", Some(yogurt), None, "1 cup", None).is_err());
        assert!(log_food(&db, None, "lunch", Some(9999), None, "1", None).is_err());
    }

    #[test]
    fn test_recipe_entry_update_and_delete() {
        let db = Database::in_memory().unwrap();
        let beans = add_food(&db, "Black Beans", "130 g", 110.0, 7.0);
        let chili = create_recipe(&db, "Chili", 4.0, None).unwrap();
        add_recipe_ingredient(&db, chili.id, beans, "520 g", None).unwrap();

        let entry = log_food(&db, Some("2026-05-02"), "dinner", None, Some(chili.id), "2 servings", None).unwrap();
        assert!((entry.day_total_calories - 220.0).abs() < 1e-9);

        let updated = update_log_entry(&db, entry.id, Some("lunch"), Some("1 serving"), None)
            .unwrap()
            .unwrap();
        assert_eq!(updated.meal, "lunch");
        assert!(update_log_entry(&db, entry.id, None, Some("100 g"), None).is_err());

        let recalculated = recalculate_day_nutrition(&db, "2026-05-02").unwrap();
        let energy = recalculated.nutrients.iter().find(|n| n.nutrient == "energy").unwrap();
        assert!((energy.amount - 110.0).abs() < 1e-9);

        assert!(delete_log_entry(&db, entry.id).unwrap());
        let day = get_day(&db, "2026-05-02").unwrap().unwrap();
        assert!(day.nutrients_total.is_empty());
    }

    #[test]
    fn test_failed_day_recalculation_keeps_no_entry() {
        let db = Database::in_memory().unwrap();
        let yogurt = add_food(&db, "Greek Yogurt", "170 g", 100.0, 17.0);
        let first = log_food(&db, Some("2026-05-03"), "lunch", Some(yogurt), None, "1", None).unwrap();

        // An unreadable stored amount makes the day total impossible to rebuild
        {
            let conn = db.get_conn().unwrap();
            conn.execute("UPDATE log_entries SET amount = 'oops' WHERE id = ?1", [first.id])
                .unwrap();
        }

        let err = log_food(&db, Some("2026-05-03"), "dinner", Some(yogurt), None, "2", None).unwrap_err();
        assert!(err.contains("Failed to log food"));

        let conn = db.get_conn().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM log_entries WHERE day_id = ?1",
                [first.day_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_resolve_date() {
        assert_eq!(resolve_date(Some("2026-02-28")).unwrap(), "2026-02-28");
        assert!(resolve_date(Some("2026-02-30")).is_err());
        assert_eq!(resolve_date(None).unwrap().len(), 10);
    }
}
