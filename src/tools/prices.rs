//! Store Price MCP Tools
//!
//! Tools for recording what food costs and pricing servings.

use serde::Serialize;

use super::days::resolve_date;
use super::units::parse_amount;
use crate::db::Database;
use crate::models::{FoodItem, StorePrice, StorePriceCreate};
use crate::nutrition::{cost_of, cost_per_serving};

/// Response for list_store_prices
#[derive(Debug, Serialize)]
pub struct ListStorePricesResponse {
    pub food_item_id: i64,
    pub food_item_name: String,
    pub prices: Vec<StorePrice>,
}

/// Response for get_cost_per_serving
#[derive(Debug, Serialize)]
pub struct CostPerServingResponse {
    pub food_item_id: i64,
    pub food_item_name: String,
    pub store: String,
    pub observed_on: String,
    pub container_price: f64,
    pub servings_per_container: Option<f64>,
    pub serving_size: String,
    pub cost_per_serving: f64,
    pub amount: Option<String>,
    pub cost_of_amount: Option<f64>,
}

/// Response for delete_store_price
#[derive(Debug, Serialize)]
pub struct DeleteStorePriceResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn load_food_item(conn: &rusqlite::Connection, id: i64) -> Result<FoodItem, String> {
    FoodItem::get_by_id(conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Food item not found with id: {}", id))
}

/// Record the price of one container of a food item
pub fn add_store_price(
    db: &Database,
    food_item_id: i64,
    store: &str,
    price: f64,
    observed_on: Option<&str>,
    notes: Option<String>,
) -> Result<StorePrice, String> {
    let store = store.trim();
    if store.is_empty() {
        return Err("Store name cannot be empty".to_string());
    }
    if !price.is_finite() || price < 0.0 {
        return Err("price cannot be negative".to_string());
    }
    let observed_on = resolve_date(observed_on)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_food_item(&conn, food_item_id)?;

    let created = StorePrice::create(
        &conn,
        &StorePriceCreate {
            food_item_id,
            store: store.to_string(),
            price,
            observed_on,
            notes,
        },
    )
    .map_err(|e| format!("Failed to add store price: {}", e))?;

    tracing::info!("Recorded price {} at {} for food item {}", created.price, created.store, food_item_id);

    Ok(created)
}

/// Price history for a food item, newest first
pub fn list_store_prices(
    db: &Database,
    food_item_id: i64,
    store: Option<&str>,
) -> Result<ListStorePricesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let food_item = load_food_item(&conn, food_item_id)?;

    let prices = StorePrice::list_for_food_item(&conn, food_item_id, store)
        .map_err(|e| format!("Failed to list store prices: {}", e))?;

    Ok(ListStorePricesResponse {
        food_item_id,
        food_item_name: food_item.name,
        prices,
    })
}

/// Delete a recorded price
pub fn delete_store_price(db: &Database, id: i64) -> Result<DeleteStorePriceResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = StorePrice::delete(&conn, id)
        .map_err(|e| format!("Failed to delete store price: {}", e))?;

    if !deleted {
        return Err(format!("Store price not found with id: {}", id));
    }

    Ok(DeleteStorePriceResponse {
        success: true,
        deleted_id: id,
    })
}

/// Cost of one serving, and optionally of an amount, from the latest price
pub fn get_cost_per_serving(
    db: &Database,
    food_item_id: i64,
    store: Option<&str>,
    amount: Option<&str>,
) -> Result<CostPerServingResponse, String> {
    let amount = amount.map(parse_amount).transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let food_item = load_food_item(&conn, food_item_id)?;

    let price = StorePrice::latest_for_food_item(&conn, food_item_id, store)
        .map_err(|e| format!("Failed to get store price: {}", e))?
        .ok_or_else(|| match store {
            Some(store) => format!("No price recorded for {} at {}", food_item.name, store),
            None => format!("No price recorded for {}", food_item.name),
        })?;

    let per_serving = cost_per_serving(price.price, food_item.servings_per_container)
        .map_err(|e| format!("Cannot price a serving of {}: {}", food_item.name, e))?;

    let cost_of_amount = match &amount {
        Some(amount) => Some(
            cost_of(
                price.price,
                food_item.servings_per_container,
                amount,
                &food_item.serving_size,
            )
            .map_err(|e| format!("Cannot price {} of {}: {}", amount, food_item.name, e))?,
        ),
        None => None,
    };

    Ok(CostPerServingResponse {
        food_item_id,
        food_item_name: food_item.name,
        store: price.store,
        observed_on: price.observed_on,
        container_price: price.price,
        servings_per_container: food_item.servings_per_container,
        serving_size: food_item.serving_size.to_string(),
        cost_per_serving: per_serving,
        amount: amount.map(|a| a.to_string()),
        cost_of_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::food_items::{add_food_item, FoodItemInput};

    fn add_coffee(db: &Database, servings_per_container: Option<f64>) -> i64 {
        add_food_item(
            db,
            FoodItemInput {
                name: "Ground Coffee".to_string(),
                serving_size: "10 g".to_string(),
                servings_per_container,
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_cost_per_serving_uses_latest_price() {
        let db = Database::in_memory().unwrap();
        let coffee = add_coffee(&db, Some(34.0));

        add_store_price(&db, coffee, "Costco", 13.6, Some("2026-01-05"), None).unwrap();
        add_store_price(&db, coffee, "Costco", 17.0, Some("2026-04-05"), None).unwrap();

        let cost = get_cost_per_serving(&db, coffee, None, Some("25 g")).unwrap();
        assert_eq!(cost.observed_on, "2026-04-05");
        assert!((cost.cost_per_serving - 0.5).abs() < 1e-9);
        assert!((cost.cost_of_amount.unwrap() - 1.25).abs() < 1e-9);

        let history = list_store_prices(&db, coffee, Some("costco")).unwrap();
        assert_eq!(history.prices.len(), 2);
    }

    #[test]
    fn test_cost_requires_servings_per_container() {
        let db = Database::in_memory().unwrap();
        let coffee = add_coffee(&db, None);
        add_store_price(&db, coffee, "Aldi", 6.0, None, None).unwrap();

        let err = get_cost_per_serving(&db, coffee, None, None).unwrap_err();
        assert!(err.contains("servings per container"));
    }

    #[test]
    fn test_add_store_price_validation() {
        let db = Database::in_memory().unwrap();
        let coffee = add_coffee(&db, Some(34.0));

        assert!(add_store_price(&db, coffee, "", 5.0, None, None).is_err());
        assert!(add_store_price(&db, coffee, "Aldi", 5.0, Some("April 5th"), None).is_err());
        assert!(add_store_price(&db, 9999, "Aldi", 5.0, None, None).is_err());

        let price = add_store_price(&db, coffee, "Aldi", 5.0, None, None).unwrap();
        assert!(delete_store_price(&db, price.id).unwrap().success);
        assert!(delete_store_price(&db, price.id).is_err());
    }
}
