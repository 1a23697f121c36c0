//! Food Item model
//!
//! A cataloged food with its serving size and per-serving nutrients.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{json_column, to_json};
use crate::db::{DbError, DbResult};
use crate::nutrition::NutritionDict;
use crate::units::Quantity;

/// A food item with nutritional information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: Quantity,
    pub servings_per_container: Option<f64>,
    /// Per serving
    pub nutrients: NutritionDict,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCreate {
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: Quantity,
    pub servings_per_container: Option<f64>,
    #[serde(default)]
    pub nutrients: NutritionDict,
    pub notes: Option<String>,
}

/// Data for updating a food item; `nutrients` replaces the whole map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodItemUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: Option<Quantity>,
    pub servings_per_container: Option<f64>,
    pub nutrients: Option<NutritionDict>,
    pub notes: Option<String>,
}

impl FoodItem {
    /// Create a FoodItem from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
            barcode: row.get("barcode")?,
            serving_size: json_column(row, "serving_size")?,
            servings_per_container: row.get("servings_per_container")?,
            nutrients: json_column(row, "nutrients")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new food item into the database
    pub fn create(conn: &Connection, data: &FoodItemCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO food_items (
                name, brand, barcode, serving_size, servings_per_container, nutrients, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.name,
                data.brand,
                data.barcode,
                to_json(&data.serving_size)?,
                data.servings_per_container,
                to_json(&data.nutrients)?,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!("Created food item {} ({})", id, data.name);
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Food item {}", id)))
    }

    /// Get a food item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a food item by barcode
    pub fn get_by_barcode(conn: &Connection, barcode: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE barcode = ?1 LIMIT 1")?;

        let result = stmt.query_row([barcode], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search food items by name, brand or barcode
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM food_items
            WHERE name LIKE ?1 OR brand LIKE ?1 OR barcode LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let items = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// List food items with sorting and pagination
    pub fn list(
        conn: &Connection,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "desc" { "DESC" } else { "ASC" };
        let sort_col = match sort_by.to_lowercase().as_str() {
            "created_at" => "created_at",
            "updated_at" => "updated_at",
            _ => "name",
        };

        let sql = format!(
            "SELECT * FROM food_items ORDER BY {} {} LIMIT ?1 OFFSET ?2",
            sort_col, order
        );
        let mut stmt = conn.prepare(&sql)?;

        let items = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Count total food items
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM food_items", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Update a food item
    pub fn update(conn: &Connection, id: i64, data: &FoodItemUpdate) -> DbResult<Option<Self>> {
        // Build dynamic UPDATE query
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        macro_rules! add_json_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(to_json(val)?));
                }
            };
        }

        add_update!(name, "name");
        add_update!(brand, "brand");
        add_update!(barcode, "barcode");
        add_json_update!(serving_size, "serving_size");
        add_update!(servings_per_container, "servings_per_container");
        add_json_update!(nutrients, "nutrients");
        add_update!(notes, "notes");

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE food_items SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Get the count of recipes using this food item
    pub fn get_recipe_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE food_item_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get the count of log entries directly using this food item
    pub fn get_log_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM log_entries WHERE food_item_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get total usage count (recipes + direct log entries)
    pub fn get_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let recipe_count = Self::get_recipe_usage_count(conn, id)?;
        let log_count = Self::get_log_usage_count(conn, id)?;
        Ok(recipe_count + log_count)
    }

    /// Get recipe names that use this food item
    pub fn get_used_in_recipes(conn: &Connection, id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT r.name FROM recipes r
            INNER JOIN recipe_ingredients ri ON r.id = ri.recipe_id
            WHERE ri.food_item_id = ?1
            ORDER BY r.name
            "#,
        )?;

        let names = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// Get recipe IDs that use this food item (for recalculation)
    pub fn get_recipe_ids_using_item(conn: &Connection, id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT recipe_id FROM recipe_ingredients WHERE food_item_id = ?1",
        )?;

        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    /// Delete a food item
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        // Fails if used in recipes or log entries due to foreign key constraints
        let rows = conn.execute("DELETE FROM food_items WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
