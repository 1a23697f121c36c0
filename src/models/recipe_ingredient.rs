//! Recipe Ingredient model
//!
//! Links a food item to a recipe with the amount used.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::log_entry::recalculate_day_nutrients;
use super::{json_column, to_json, FoodItem, Recipe};
use crate::db::{DbError, DbResult};
use crate::nutrition::{aggregate, Consumption, NutritionDict};
use crate::units::Quantity;

/// A recipe ingredient linking a food item to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub food_item_id: i64,
    pub amount: Quantity,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe ingredient with food item details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: i64,
    pub food_item_id: i64,
    pub food_item_name: String,
    pub amount: Quantity,
    pub notes: Option<String>,
}

/// Data for adding an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub recipe_id: i64,
    pub food_item_id: i64,
    pub amount: Quantity,
    pub notes: Option<String>,
}

/// Data for updating a recipe ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeIngredientUpdate {
    pub amount: Option<Quantity>,
    pub notes: Option<String>,
}

impl RecipeIngredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            food_item_id: row.get("food_item_id")?,
            amount: json_column(row, "amount")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Add an ingredient to a recipe and refresh the recipe and its days
    pub fn create(conn: &Connection, data: &RecipeIngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, food_item_id, amount, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.recipe_id,
                data.food_item_id,
                to_json(&data.amount)?,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let ingredient = Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::NotFound(format!("Recipe ingredient {}", id)))?;

        cascade_recalculate_from_recipe(conn, data.recipe_id)?;

        Ok(ingredient)
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(ingredient) => Ok(Some(ingredient)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All ingredients of a recipe
    pub fn list_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY id ASC",
        )?;

        let ingredients = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// All ingredients of a recipe with food item names
    pub fn list_details_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<RecipeIngredientDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ri.id, ri.food_item_id, f.name AS food_item_name, ri.amount, ri.notes
            FROM recipe_ingredients ri
            INNER JOIN food_items f ON f.id = ri.food_item_id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.id ASC
            "#,
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                Ok(RecipeIngredientDetail {
                    id: row.get("id")?,
                    food_item_id: row.get("food_item_id")?,
                    food_item_name: row.get("food_item_name")?,
                    amount: json_column(row, "amount")?,
                    notes: row.get("notes")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Update an ingredient and refresh the recipe and its days
    pub fn update(conn: &Connection, id: i64, data: &RecipeIngredientUpdate) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let amount = data.amount.as_ref().unwrap_or(&existing.amount);
        let notes = data.notes.as_ref().or(existing.notes.as_ref());

        conn.execute(
            r#"
            UPDATE recipe_ingredients
            SET amount = ?1, notes = ?2, updated_at = datetime('now')
            WHERE id = ?3
            "#,
            params![to_json(amount)?, notes, id],
        )?;

        cascade_recalculate_from_recipe(conn, existing.recipe_id)?;

        Self::get_by_id(conn, id)
    }

    /// Remove an ingredient and refresh the recipe and its days
    /// Returns Ok(true) if removed, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(false);
        };

        conn.execute("DELETE FROM recipe_ingredients WHERE id = ?1", [id])?;
        cascade_recalculate_from_recipe(conn, existing.recipe_id)?;

        Ok(true)
    }
}

/// Per-serving nutrients of a recipe from its current ingredients
pub fn calculate_recipe_nutrients(conn: &Connection, recipe_id: i64) -> DbResult<NutritionDict> {
    let recipe = Recipe::get_by_id(conn, recipe_id)?
        .ok_or_else(|| DbError::NotFound(format!("Recipe {}", recipe_id)))?;

    if recipe.servings_produced <= 0.0 {
        return Err(DbError::Invalid(format!(
            "Recipe {} produces {} servings",
            recipe_id, recipe.servings_produced
        )));
    }

    let mut lines = Vec::new();
    for ingredient in RecipeIngredient::list_for_recipe(conn, recipe_id)? {
        let food = FoodItem::get_by_id(conn, ingredient.food_item_id)?
            .ok_or_else(|| DbError::NotFound(format!("Food item {}", ingredient.food_item_id)))?;
        lines.push((food, ingredient.amount));
    }

    let whole_recipe = aggregate(
        lines
            .iter()
            .map(|(food, amount)| Consumption::new(&food.nutrients, &food.serving_size, amount)),
    );

    Ok(whole_recipe.scaled(1.0 / recipe.servings_produced))
}

/// Recalculate and store a recipe's per-serving nutrients
pub fn recalculate_recipe_nutrients(conn: &Connection, recipe_id: i64) -> DbResult<NutritionDict> {
    let nutrients = calculate_recipe_nutrients(conn, recipe_id)?;
    Recipe::update_cached_nutrients(conn, recipe_id, &nutrients)?;
    tracing::debug!("Recalculated nutrients for recipe {}", recipe_id);
    Ok(nutrients)
}

/// Result of cascading recalculation
#[derive(Debug, Clone, Default, Serialize)]
pub struct CascadeRecalculateResult {
    pub recipes_recalculated: Vec<i64>,
    pub days_recalculated: Vec<i64>,
}

/// Cascading recalculation: when a food item changes, recalculate the
/// recipes that use it and every day that logged it directly or through
/// one of those recipes
pub fn cascade_recalculate_from_food_item(
    conn: &Connection,
    food_item_id: i64,
) -> DbResult<CascadeRecalculateResult> {
    let mut result = CascadeRecalculateResult::default();

    let recipe_ids = FoodItem::get_recipe_ids_using_item(conn, food_item_id)?;
    for recipe_id in &recipe_ids {
        recalculate_recipe_nutrients(conn, *recipe_id)?;
        result.recipes_recalculated.push(*recipe_id);
    }

    let mut day_ids: BTreeSet<i64> = BTreeSet::new();
    {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT day_id FROM log_entries WHERE food_item_id = ?1",
        )?;
        let rows = stmt.query_map([food_item_id], |row| row.get(0))?;
        for day_id in rows {
            day_ids.insert(day_id?);
        }
    }
    {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT day_id FROM log_entries WHERE recipe_id = ?1",
        )?;
        for recipe_id in &recipe_ids {
            let rows = stmt.query_map([*recipe_id], |row| row.get(0))?;
            for day_id in rows {
                day_ids.insert(day_id?);
            }
        }
    }

    for day_id in day_ids {
        recalculate_day_nutrients(conn, day_id)?;
        result.days_recalculated.push(day_id);
    }

    tracing::info!(
        "Food item {} changed: {} recipes and {} days recalculated",
        food_item_id,
        result.recipes_recalculated.len(),
        result.days_recalculated.len()
    );

    Ok(result)
}

/// Recalculate a recipe and every day that logged it
pub fn cascade_recalculate_from_recipe(conn: &Connection, recipe_id: i64) -> DbResult<CascadeRecalculateResult> {
    recalculate_recipe_nutrients(conn, recipe_id)?;

    let day_ids = {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT day_id FROM log_entries WHERE recipe_id = ?1 ORDER BY day_id",
        )?;
        let rows = stmt.query_map([recipe_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<i64>, _>>()?
    };

    for day_id in &day_ids {
        recalculate_day_nutrients(conn, *day_id)?;
    }

    Ok(CascadeRecalculateResult {
        recipes_recalculated: vec![recipe_id],
        days_recalculated: day_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{FoodItemCreate, RecipeCreate};
    use crate::nutrition::Nutrient;
    use crate::units::Unit;

    fn food(conn: &Connection, name: &str, serving: Quantity, kcal: f64) -> DbResult<FoodItem> {
        FoodItem::create(
            conn,
            &FoodItemCreate {
                name: name.to_string(),
                brand: None,
                barcode: None,
                serving_size: serving,
                servings_per_container: None,
                nutrients: NutritionDict::from_canonical([(Nutrient::Energy, kcal)]),
                notes: None,
            },
        )
    }

    #[test]
    fn test_recipe_nutrients_follow_ingredients() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let flour = food(conn, "Flour", Quantity::grams(100.0), 360.0)?;
            let milk = food(conn, "Milk", Quantity::raw(1.0, Unit::Cup), 120.0)?;
            let recipe = Recipe::create(
                conn,
                &RecipeCreate {
                    name: "Pancakes".to_string(),
                    servings_produced: 4.0,
                    notes: None,
                },
            )?;

            // 250 g flour = 900 kcal, 2 cups milk = 240 kcal; 1140 / 4 servings
            RecipeIngredient::create(
                conn,
                &RecipeIngredientCreate {
                    recipe_id: recipe.id,
                    food_item_id: flour.id,
                    amount: Quantity::grams(250.0),
                    notes: None,
                },
            )?;
            let milk_line = RecipeIngredient::create(
                conn,
                &RecipeIngredientCreate {
                    recipe_id: recipe.id,
                    food_item_id: milk.id,
                    amount: Quantity::milliliters(480.0),
                    notes: None,
                },
            )?;

            let stored = Recipe::get_by_id(conn, recipe.id)?.unwrap();
            assert!((stored.cached_nutrients.amount(Nutrient::Energy) - 285.0).abs() < 1e-9);

            RecipeIngredient::delete(conn, milk_line.id)?;
            let stored = Recipe::get_by_id(conn, recipe.id)?.unwrap();
            assert!((stored.cached_nutrients.amount(Nutrient::Energy) - 225.0).abs() < 1e-9);

            let details = RecipeIngredient::list_details_for_recipe(conn, recipe.id)?;
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].food_item_name, "Flour");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_food_item_in_recipe_cannot_be_deleted() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let flour = food(conn, "Flour", Quantity::grams(100.0), 360.0)?;
            let recipe = Recipe::create(
                conn,
                &RecipeCreate {
                    name: "Bread".to_string(),
                    servings_produced: 1.0,
                    notes: None,
                },
            )?;
            RecipeIngredient::create(
                conn,
                &RecipeIngredientCreate {
                    recipe_id: recipe.id,
                    food_item_id: flour.id,
                    amount: Quantity::grams(500.0),
                    notes: None,
                },
            )?;

            assert!(FoodItem::delete(conn, flour.id).is_err());
            assert_eq!(FoodItem::get_usage_count(conn, flour.id)?, 1);
            Ok(())
        })
        .unwrap();
    }
}
