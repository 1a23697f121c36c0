//! Food Item MCP Tools
//!
//! Tools for managing food items in the database.

use std::collections::BTreeMap;

use serde::Serialize;

use super::units::{nutrient_amounts, parse_amount, parse_nutrients, NutrientAmount};
use crate::db::Database;
use crate::models::{
    cascade_recalculate_from_food_item, FoodItem, FoodItemCreate, FoodItemUpdate, StorePrice,
};
use crate::nutrition::{per_container, MacroBreakdown, Nutrient};
use crate::units::Quantity;

/// Fields accepted by add_food_item
#[derive(Debug, Clone, Default)]
pub struct FoodItemInput {
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: String,
    pub servings_per_container: Option<f64>,
    pub nutrients: BTreeMap<String, f64>,
    pub notes: Option<String>,
}

/// Fields accepted by update_food_item
#[derive(Debug, Clone, Default)]
pub struct FoodItemChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: Option<String>,
    pub servings_per_container: Option<f64>,
    pub nutrients: Option<BTreeMap<String, f64>>,
    pub notes: Option<String>,
}

/// Response for add_food_item
#[derive(Debug, Serialize)]
pub struct AddFoodItemResponse {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size: String,
    pub created_at: String,
}

/// Response for search_food_items
#[derive(Debug, Serialize)]
pub struct SearchFoodItemsResponse {
    pub items: Vec<FoodItemSummary>,
    pub total: usize,
}

/// Summary of a food item for list/search results
#[derive(Debug, Serialize)]
pub struct FoodItemSummary {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size: String,
    pub calories: f64,
}

impl From<&FoodItem> for FoodItemSummary {
    fn from(item: &FoodItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            brand: item.brand.clone(),
            serving_size: item.serving_size.to_string(),
            calories: item.nutrients.amount(Nutrient::Energy),
        }
    }
}

/// Full food item detail response
#[derive(Debug, Serialize)]
pub struct FoodItemDetail {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: Quantity,
    pub serving_size_display: String,
    pub servings_per_container: Option<f64>,
    pub nutrients_per_serving: Vec<NutrientAmount>,
    pub nutrients_per_container: Option<Vec<NutrientAmount>>,
    pub macros: MacroBreakdown,
    pub latest_price: Option<StorePrice>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub usage_count: i64,
    pub used_in_recipes: Vec<String>,
}

impl FoodItemDetail {
    pub fn from_food_item(
        item: FoodItem,
        usage_count: i64,
        used_in_recipes: Vec<String>,
        latest_price: Option<StorePrice>,
    ) -> Self {
        let nutrients_per_container = item
            .servings_per_container
            .map(|servings| nutrient_amounts(&per_container(&item.nutrients, servings)));

        Self {
            id: item.id,
            name: item.name,
            brand: item.brand,
            barcode: item.barcode,
            serving_size_display: item.serving_size.to_string(),
            serving_size: item.serving_size,
            servings_per_container: item.servings_per_container,
            nutrients_per_serving: nutrient_amounts(&item.nutrients),
            nutrients_per_container,
            macros: MacroBreakdown::from_dict(&item.nutrients),
            latest_price,
            notes: item.notes,
            created_at: item.created_at,
            updated_at: item.updated_at,
            usage_count,
            used_in_recipes,
        }
    }
}

/// Response for list_food_items
#[derive(Debug, Serialize)]
pub struct ListFoodItemsResponse {
    pub items: Vec<FoodItemSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for update_food_item
#[derive(Debug, Serialize)]
pub struct UpdateFoodItemResponse {
    pub success: bool,
    pub updated_at: String,
    pub recipes_recalculated: Vec<i64>,
    pub days_recalculated: Vec<i64>,
}

/// Response for delete_food_item blocked
#[derive(Debug, Serialize)]
pub struct DeleteFoodItemBlockedResponse {
    pub error: String,
    pub usage_count: i64,
    pub used_in_recipes: Vec<String>,
}

/// Response for successful delete_food_item
#[derive(Debug, Serialize)]
pub struct DeleteFoodItemSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_serving_size(text: &str) -> Result<Quantity, String> {
    let serving_size = parse_amount(text)?;
    if serving_size.value() <= 0.0 {
        return Err("serving_size must be greater than 0".to_string());
    }
    Ok(serving_size)
}

fn validate_servings_per_container(value: Option<f64>) -> Result<(), String> {
    match value {
        Some(servings) if !servings.is_finite() || servings <= 0.0 => {
            Err("servings_per_container must be greater than 0".to_string())
        }
        _ => Ok(()),
    }
}

/// Add a new food item
pub fn add_food_item(db: &Database, input: FoodItemInput) -> Result<AddFoodItemResponse, String> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err("Food item name cannot be empty".to_string());
    }

    let serving_size = validate_serving_size(&input.serving_size)?;
    validate_servings_per_container(input.servings_per_container)?;
    let nutrients = parse_nutrients(&input.nutrients)?;

    let data = FoodItemCreate {
        name: name.to_string(),
        brand: input.brand,
        barcode: input.barcode,
        serving_size,
        servings_per_container: input.servings_per_container,
        nutrients,
        notes: input.notes,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = FoodItem::create(&conn, &data)
        .map_err(|e| format!("Failed to create food item: {}", e))?;

    tracing::info!("Added food item {} ({})", item.id, item.name);

    Ok(AddFoodItemResponse {
        id: item.id,
        name: item.name,
        brand: item.brand,
        serving_size: item.serving_size.to_string(),
        created_at: item.created_at,
    })
}

/// Search food items by name or brand
pub fn search_food_items(db: &Database, query: &str, limit: i64) -> Result<SearchFoodItemsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = FoodItem::search(&conn, query, limit)
        .map_err(|e| format!("Search failed: {}", e))?;

    let summaries: Vec<FoodItemSummary> = items.iter().map(FoodItemSummary::from).collect();
    let total = summaries.len();

    Ok(SearchFoodItemsResponse {
        items: summaries,
        total,
    })
}

/// Get a food item by ID or barcode with usage information
pub fn get_food_item(db: &Database, id: Option<i64>, barcode: Option<&str>) -> Result<Option<FoodItemDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = match (id, barcode) {
        (Some(id), _) => FoodItem::get_by_id(&conn, id),
        (None, Some(barcode)) => FoodItem::get_by_barcode(&conn, barcode),
        (None, None) => return Err("Provide either id or barcode".to_string()),
    }
    .map_err(|e| format!("Failed to get food item: {}", e))?;

    match item {
        Some(item) => {
            let usage_count = FoodItem::get_usage_count(&conn, item.id)
                .map_err(|e| format!("Failed to get usage count: {}", e))?;
            let used_in_recipes = FoodItem::get_used_in_recipes(&conn, item.id)
                .map_err(|e| format!("Failed to get recipe usage: {}", e))?;
            let latest_price = StorePrice::latest_for_food_item(&conn, item.id, None)
                .map_err(|e| format!("Failed to get prices: {}", e))?;

            Ok(Some(FoodItemDetail::from_food_item(item, usage_count, used_in_recipes, latest_price)))
        }
        None => Ok(None),
    }
}

/// List food items with sorting and pagination
pub fn list_food_items(
    db: &Database,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListFoodItemsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = FoodItem::list(&conn, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list food items: {}", e))?;

    let total = FoodItem::count(&conn)
        .map_err(|e| format!("Failed to count food items: {}", e))?;

    let summaries: Vec<FoodItemSummary> = items.iter().map(FoodItemSummary::from).collect();

    Ok(ListFoodItemsResponse {
        items: summaries,
        total,
        limit,
        offset,
    })
}

/// Update a food item, then recalculate recipes and days that use it
pub fn update_food_item(
    db: &Database,
    id: i64,
    changes: FoodItemChanges,
) -> Result<UpdateFoodItemResponse, String> {
    if let Some(ref name) = changes.name {
        if name.trim().is_empty() {
            return Err("Food item name cannot be empty".to_string());
        }
    }
    let serving_size = changes
        .serving_size
        .as_deref()
        .map(validate_serving_size)
        .transpose()?;
    validate_servings_per_container(changes.servings_per_container)?;
    let nutrients = changes.nutrients.as_ref().map(parse_nutrients).transpose()?;

    let data = FoodItemUpdate {
        name: changes.name.map(|n| n.trim().to_string()),
        brand: changes.brand,
        barcode: changes.barcode,
        serving_size,
        servings_per_container: changes.servings_per_container,
        nutrients,
        notes: changes.notes,
    };

    db.with_transaction(|tx| {
        let Some(item) = FoodItem::update(tx, id, &data)? else {
            return Ok(None);
        };
        let cascade = cascade_recalculate_from_food_item(tx, id)?;
        Ok(Some((item, cascade)))
    })
    .map_err(|e| format!("Failed to update food item: {}", e))?
    .map(|(item, cascade)| UpdateFoodItemResponse {
        success: true,
        updated_at: item.updated_at,
        recipes_recalculated: cascade.recipes_recalculated,
        days_recalculated: cascade.days_recalculated,
    })
    .ok_or_else(|| format!("Food item not found with id: {}", id))
}

/// Delete a food item (blocked if used in any recipe or log entry)
pub fn delete_food_item(
    db: &Database,
    id: i64,
) -> Result<Result<DeleteFoodItemSuccessResponse, DeleteFoodItemBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food_item = FoodItem::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if food_item.is_none() {
        return Err(format!("Food item not found with id: {}", id));
    }

    let usage_count = FoodItem::get_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;

    if usage_count > 0 {
        let used_in_recipes = FoodItem::get_used_in_recipes(&conn, id)
            .map_err(|e| format!("Failed to get recipe usage: {}", e))?;

        return Ok(Err(DeleteFoodItemBlockedResponse {
            error: format!(
                "Cannot delete food item: used {} time(s) in recipes or the food log",
                usage_count
            ),
            usage_count,
            used_in_recipes,
        }));
    }

    FoodItem::delete(&conn, id)
        .map_err(|e| format!("Failed to delete food item: {}", e))?;

    Ok(Ok(DeleteFoodItemSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peanut_butter() -> FoodItemInput {
        let mut nutrients = BTreeMap::new();
        nutrients.insert("calories".to_string(), 190.0);
        nutrients.insert("protein".to_string(), 7.0);
        nutrients.insert("total_fat".to_string(), 16.0);
        nutrients.insert("total_carbs".to_string(), 8.0);
        FoodItemInput {
            name: "Peanut Butter".to_string(),
            serving_size: "2 tbsp".to_string(),
            servings_per_container: Some(15.0),
            nutrients,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get_food_item() {
        let db = Database::in_memory().unwrap();
        let added = add_food_item(&db, peanut_butter()).unwrap();
        assert_eq!(added.serving_size, "2 tbsp");

        let detail = get_food_item(&db, Some(added.id), None).unwrap().unwrap();
        assert_eq!(detail.nutrients_per_serving.len(), 4);
        assert!((detail.macros.fat_kcal - 144.0).abs() < 1e-9);
        let per_container = detail.nutrients_per_container.unwrap();
        let energy = per_container.iter().find(|n| n.nutrient == "energy").unwrap();
        assert!((energy.amount - 2850.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_food_item_validation() {
        let db = Database::in_memory().unwrap();

        let mut blank = peanut_butter();
        blank.name = "  ".to_string();
        assert!(add_food_item(&db, blank).is_err());

        let mut zero = peanut_butter();
        zero.serving_size = "0 g".to_string();
        assert!(add_food_item(&db, zero).is_err());

        let mut negative = peanut_butter();
        negative.nutrients.insert("sodium".to_string(), -5.0);
        assert!(add_food_item(&db, negative).is_err());
    }

    #[test]
    fn test_update_and_delete_food_item() {
        let db = Database::in_memory().unwrap();
        let added = add_food_item(&db, peanut_butter()).unwrap();

        let response = update_food_item(
            &db,
            added.id,
            FoodItemChanges {
                serving_size: Some("32 g".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(response.recipes_recalculated.is_empty());

        assert!(update_food_item(&db, 9999, FoodItemChanges::default()).is_err());

        let deleted = delete_food_item(&db, added.id).unwrap();
        assert!(deleted.is_ok());
        assert!(get_food_item(&db, Some(added.id), None).unwrap().is_none());
    }
}
