//! Recipe MCP Tools
//!
//! Tools for managing recipes and their ingredients.

use serde::Serialize;

use super::units::{nutrient_amounts, parse_amount, NutrientAmount};
use crate::db::Database;
use crate::models::{
    cascade_recalculate_from_recipe, FoodItem, Recipe, RecipeCreate, RecipeIngredient,
    RecipeIngredientCreate, RecipeIngredientUpdate, RecipeUpdate,
};
use crate::nutrition::{consumption_scale, MacroBreakdown, Nutrient};
use crate::units::Quantity;

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub servings_produced: f64,
    pub created_at: String,
}

/// Ingredient line in a recipe detail
#[derive(Debug, Serialize)]
pub struct IngredientLine {
    pub id: i64,
    pub food_item_id: i64,
    pub food_item_name: String,
    pub amount: String,
    pub notes: Option<String>,
}

/// Full recipe detail with ingredients
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub servings_produced: f64,
    pub ingredients: Vec<IngredientLine>,
    pub nutrients_per_serving: Vec<NutrientAmount>,
    pub macros: MacroBreakdown,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub times_logged: i64,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub servings_produced: f64,
    pub calories_per_serving: f64,
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for update_recipe
#[derive(Debug, Serialize)]
pub struct UpdateRecipeResponse {
    pub success: bool,
    pub updated_at: String,
    pub days_recalculated: Vec<i64>,
}

/// Response for add_recipe_ingredient / update_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub food_item_id: i64,
    pub amount: String,
    pub calories_per_serving: f64,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct RecipeDeleteBlockedResponse {
    pub error: String,
    pub times_logged: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_servings(servings: f64) -> Result<(), String> {
    if !servings.is_finite() || servings <= 0.0 {
        return Err("servings_produced must be greater than 0".to_string());
    }
    Ok(())
}

fn calories_per_serving(conn: &rusqlite::Connection, recipe_id: i64) -> Result<f64, String> {
    let recipe = Recipe::get_by_id(conn, recipe_id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", recipe_id))?;
    Ok(recipe.cached_nutrients.amount(Nutrient::Energy))
}

/// Reject amounts that can never be scaled against a food's serving size
fn check_measurable(amount: &Quantity, food_item: &FoodItem) -> Result<(), String> {
    consumption_scale(amount, &food_item.serving_size)
        .map(|_| ())
        .map_err(|e| {
            format!(
                "Amount {} cannot be measured against {}'s serving size {}: {}",
                amount, food_item.name, food_item.serving_size, e
            )
        })
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe
pub fn create_recipe(
    db: &Database,
    name: &str,
    servings_produced: f64,
    notes: Option<String>,
) -> Result<CreateRecipeResponse, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }
    validate_servings(servings_produced)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(
        &conn,
        &RecipeCreate {
            name: name.to_string(),
            servings_produced,
            notes,
        },
    )
    .map_err(|e| format!("Failed to create recipe: {}", e))?;

    tracing::info!("Created recipe {} ({})", recipe.id, recipe.name);

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        servings_produced: recipe.servings_produced,
        created_at: recipe.created_at,
    })
}

/// Get a recipe with ingredients and per-serving nutrients
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(recipe) = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
    else {
        return Ok(None);
    };

    let ingredients = RecipeIngredient::list_details_for_recipe(&conn, id)
        .map_err(|e| format!("Failed to get ingredients: {}", e))?
        .into_iter()
        .map(|detail| IngredientLine {
            id: detail.id,
            food_item_id: detail.food_item_id,
            food_item_name: detail.food_item_name,
            amount: detail.amount.to_string(),
            notes: detail.notes,
        })
        .collect();

    let times_logged = Recipe::get_log_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check log usage: {}", e))?;

    Ok(Some(RecipeDetail {
        id: recipe.id,
        name: recipe.name,
        servings_produced: recipe.servings_produced,
        ingredients,
        nutrients_per_serving: nutrient_amounts(&recipe.cached_nutrients),
        macros: MacroBreakdown::from_dict(&recipe.cached_nutrients),
        notes: recipe.notes,
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
        times_logged,
    }))
}

/// List recipes with optional name filter
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;
    let total = Recipe::count(&conn, query)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    let recipes = recipes
        .iter()
        .map(|r| RecipeSummary {
            id: r.id,
            name: r.name.clone(),
            servings_produced: r.servings_produced,
            calories_per_serving: r.cached_nutrients.amount(Nutrient::Energy),
        })
        .collect();

    Ok(ListRecipesResponse {
        recipes,
        total,
        limit,
        offset,
    })
}

/// Update recipe metadata; a new serving count flows through to logged days
pub fn update_recipe(
    db: &Database,
    id: i64,
    name: Option<String>,
    servings_produced: Option<f64>,
    notes: Option<String>,
) -> Result<UpdateRecipeResponse, String> {
    if let Some(ref name) = name {
        if name.trim().is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }
    }
    if let Some(servings) = servings_produced {
        validate_servings(servings)?;
    }

    let data = RecipeUpdate {
        name: name.map(|n| n.trim().to_string()),
        servings_produced,
        notes,
    };

    db.with_transaction(|tx| {
        let Some(recipe) = Recipe::update(tx, id, &data)? else {
            return Ok(None);
        };
        let cascade = cascade_recalculate_from_recipe(tx, id)?;
        Ok(Some((recipe, cascade)))
    })
    .map_err(|e| format!("Failed to update recipe: {}", e))?
    .map(|(recipe, cascade)| UpdateRecipeResponse {
        success: true,
        updated_at: recipe.updated_at,
        days_recalculated: cascade.days_recalculated,
    })
    .ok_or_else(|| format!("Recipe not found with id: {}", id))
}

/// Delete a recipe (blocked if logged)
pub fn delete_recipe(
    db: &Database,
    id: i64,
) -> Result<Result<RecipeDeleteSuccessResponse, RecipeDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", id));
    }

    let times_logged = Recipe::get_log_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check log usage: {}", e))?;

    if times_logged > 0 {
        return Ok(Err(RecipeDeleteBlockedResponse {
            error: format!("Cannot delete recipe: logged {} times in the food log", times_logged),
            times_logged,
        }));
    }

    // Ingredients cascade
    Recipe::delete(&conn, id)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;

    Ok(Ok(RecipeDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

// ============================================================================
// Recipe Ingredient Tools
// ============================================================================

/// Add an ingredient to a recipe
pub fn add_recipe_ingredient(
    db: &Database,
    recipe_id: i64,
    food_item_id: i64,
    amount: &str,
    notes: Option<String>,
) -> Result<IngredientResponse, String> {
    let amount = parse_amount(amount)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", recipe_id));
    }

    let food_item = FoodItem::get_by_id(&conn, food_item_id)
        .map_err(|e| format!("Database error checking food item: {}", e))?
        .ok_or_else(|| format!("Food item not found with id: {}", food_item_id))?;

    check_measurable(&amount, &food_item)?;

    let existing = RecipeIngredient::list_for_recipe(&conn, recipe_id)
        .map_err(|e| format!("Database error checking existing ingredients: {}", e))?;
    if existing.iter().any(|i| i.food_item_id == food_item_id) {
        return Err(format!(
            "Food item {} is already an ingredient in recipe {}. Use update_recipe_ingredient to modify the amount.",
            food_item_id, recipe_id
        ));
    }

    drop(conn);

    // The ingredient and the recipe/day recalculation it triggers commit together
    let ingredient = db
        .with_transaction(|tx| {
            RecipeIngredient::create(
                tx,
                &RecipeIngredientCreate {
                    recipe_id,
                    food_item_id,
                    amount,
                    notes,
                },
            )
        })
        .map_err(|e| format!("Failed to add ingredient: {}", e))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Ok(IngredientResponse {
        id: ingredient.id,
        recipe_id: ingredient.recipe_id,
        food_item_id: ingredient.food_item_id,
        amount: ingredient.amount.to_string(),
        calories_per_serving: calories_per_serving(&conn, recipe_id)?,
    })
}

/// Update a recipe ingredient
pub fn update_recipe_ingredient(
    db: &Database,
    id: i64,
    amount: Option<&str>,
    notes: Option<String>,
) -> Result<Option<IngredientResponse>, String> {
    let amount = amount.map(parse_amount).transpose()?;

    if let Some(ref amount) = amount {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let Some(existing) = RecipeIngredient::get_by_id(&conn, id)
            .map_err(|e| format!("Failed to get ingredient: {}", e))?
        else {
            return Ok(None);
        };
        let food_item = FoodItem::get_by_id(&conn, existing.food_item_id)
            .map_err(|e| format!("Database error checking food item: {}", e))?
            .ok_or_else(|| format!("Food item not found with id: {}", existing.food_item_id))?;
        check_measurable(amount, &food_item)?;
    }

    let updated = db
        .with_transaction(|tx| RecipeIngredient::update(tx, id, &RecipeIngredientUpdate { amount, notes }))
        .map_err(|e| format!("Failed to update ingredient: {}", e))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    match updated {
        Some(ingredient) => Ok(Some(IngredientResponse {
            id: ingredient.id,
            recipe_id: ingredient.recipe_id,
            food_item_id: ingredient.food_item_id,
            amount: ingredient.amount.to_string(),
            calories_per_serving: calories_per_serving(&conn, ingredient.recipe_id)?,
        })),
        None => Ok(None),
    }
}

/// Remove an ingredient from a recipe
pub fn remove_recipe_ingredient(db: &Database, id: i64) -> Result<bool, String> {
    db.with_transaction(|tx| RecipeIngredient::delete(tx, id))
        .map_err(|e| format!("Failed to remove ingredient: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::food_items::{add_food_item, FoodItemInput};
    use std::collections::BTreeMap;

    fn add_food(db: &Database, name: &str, serving_size: &str, calories: f64) -> i64 {
        let mut nutrients = BTreeMap::new();
        nutrients.insert("energy".to_string(), calories);
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
    fn test_recipe_ingredients_update_per_serving_calories() {
        let db = Database::in_memory().unwrap();
        let pasta = add_food(&db, "Pasta", "56 g", 200.0);
        let sauce = add_food(&db, "Tomato Sauce", "1/2 cup", 70.0);

        let recipe = create_recipe(&db, "Pasta night", 4.0, None).unwrap();

        // 448 g pasta = 8 servings = 1600 kcal
        add_recipe_ingredient(&db, recipe.id, pasta, "448 g", None).unwrap();
        // 2 cups sauce = 4 servings = 280 kcal
        let sauce_line = add_recipe_ingredient(&db, recipe.id, sauce, "2 cups", None).unwrap();
        assert!((sauce_line.calories_per_serving - 470.0).abs() < 1e-9);

        let updated = update_recipe_ingredient(&db, sauce_line.id, Some("1 cup"), None)
            .unwrap()
            .unwrap();
        assert!((updated.calories_per_serving - 435.0).abs() < 1e-9);

        let detail = get_recipe(&db, recipe.id).unwrap().unwrap();
        assert_eq!(detail.ingredients.len(), 2);
        assert_eq!(detail.ingredients[1].amount, "1 cup");
    }

    #[test]
    fn test_add_recipe_ingredient_rejects_mismatched_units() {
        let db = Database::in_memory().unwrap();
        let flour = add_food(&db, "Flour", "30 g", 110.0);
        let recipe = create_recipe(&db, "Bread", 1.0, None).unwrap();

        let err = add_recipe_ingredient(&db, recipe.id, flour, "1 cup", None).unwrap_err();
        assert!(err.contains("cannot be measured"));

        let line = add_recipe_ingredient(&db, recipe.id, flour, "300 g", None).unwrap();
        assert!(update_recipe_ingredient(&db, line.id, Some("2 tbsp"), None).is_err());
        assert!(update_recipe_ingredient(&db, 9999, Some("10 g"), None).unwrap().is_none());
    }

    #[test]
    fn test_update_and_delete_recipe() {
        let db = Database::in_memory().unwrap();
        let oats = add_food(&db, "Oats", "40 g", 150.0);
        let recipe = create_recipe(&db, "Overnight oats", 2.0, None).unwrap();
        add_recipe_ingredient(&db, recipe.id, oats, "80 g", None).unwrap();

        update_recipe(&db, recipe.id, None, Some(1.0), None).unwrap();
        let listed = list_recipes(&db, Some("oats"), 10, 0).unwrap();
        assert_eq!(listed.total, 1);
        assert!((listed.recipes[0].calories_per_serving - 300.0).abs() < 1e-9);

        assert!(create_recipe(&db, "Nothing", 0.0, None).is_err());

        let deleted = delete_recipe(&db, recipe.id).unwrap();
        assert!(deleted.is_ok());
        assert!(get_recipe(&db, recipe.id).unwrap().is_none());
    }
}
