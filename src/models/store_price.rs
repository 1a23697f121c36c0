//! Store price model
//!
//! Price observations for a food item's container at a given store.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// A price observed for one container of a food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorePrice {
    pub id: i64,
    pub food_item_id: i64,
    pub store: String,
    pub price: f64,
    /// ISO date the price was seen
    pub observed_on: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Data for recording a price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorePriceCreate {
    pub food_item_id: i64,
    pub store: String,
    pub price: f64,
    pub observed_on: String,
    pub notes: Option<String>,
}

impl StorePrice {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            food_item_id: row.get("food_item_id")?,
            store: row.get("store")?,
            price: row.get("price")?,
            observed_on: row.get("observed_on")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Record a new price
    pub fn create(conn: &Connection, data: &StorePriceCreate) -> DbResult<Self> {
        if !data.price.is_finite() || data.price < 0.0 {
            return Err(DbError::Invalid(format!("price must be non-negative, got {}", data.price)));
        }

        conn.execute(
            r#"
            INSERT INTO store_prices (food_item_id, store, price, observed_on, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![data.food_item_id, data.store, data.price, data.observed_on, data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Store price {}", id)))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM store_prices WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(price) => Ok(Some(price)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Prices for a food item, newest first, optionally for one store
    pub fn list_for_food_item(conn: &Connection, food_item_id: i64, store: Option<&str>) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM store_prices
            WHERE food_item_id = ?1 AND (?2 IS NULL OR store = ?2 COLLATE NOCASE)
            ORDER BY observed_on DESC, id DESC
            "#,
        )?;

        let prices = stmt
            .query_map(params![food_item_id, store], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(prices)
    }

    /// Most recent price for a food item, optionally for one store
    pub fn latest_for_food_item(conn: &Connection, food_item_id: i64, store: Option<&str>) -> DbResult<Option<Self>> {
        Ok(Self::list_for_food_item(conn, food_item_id, store)?.into_iter().next())
    }

    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM store_prices WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{FoodItem, FoodItemCreate};
    use crate::nutrition::NutritionDict;
    use crate::units::Quantity;

    fn price(food_item_id: i64, store: &str, price: f64, observed_on: &str) -> StorePriceCreate {
        StorePriceCreate {
            food_item_id,
            store: store.to_string(),
            price,
            observed_on: observed_on.to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_latest_price_per_store() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let rice = FoodItem::create(
                conn,
                &FoodItemCreate {
                    name: "Rice".to_string(),
                    brand: None,
                    barcode: None,
                    serving_size: Quantity::grams(45.0),
                    servings_per_container: Some(20.0),
                    nutrients: NutritionDict::new(),
                    notes: None,
                },
            )?;

            StorePrice::create(conn, &price(rice.id, "Aldi", 3.49, "2026-01-10"))?;
            StorePrice::create(conn, &price(rice.id, "Aldi", 3.79, "2026-03-02"))?;
            StorePrice::create(conn, &price(rice.id, "Kroger", 4.29, "2026-02-14"))?;

            let latest = StorePrice::latest_for_food_item(conn, rice.id, None)?.unwrap();
            assert_eq!(latest.price, 3.79);

            let kroger = StorePrice::latest_for_food_item(conn, rice.id, Some("kroger"))?.unwrap();
            assert_eq!(kroger.store, "Kroger");

            assert_eq!(StorePrice::list_for_food_item(conn, rice.id, Some("Aldi"))?.len(), 2);
            assert!(StorePrice::create(conn, &price(rice.id, "Aldi", -1.0, "2026-03-03")).is_err());
            Ok(())
        })
        .unwrap();
    }
}
