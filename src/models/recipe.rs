//! Recipe model
//!
//! Represents a recipe with cached per-serving nutrients.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{json_column, to_json};
use crate::db::{DbError, DbResult};
use crate::nutrition::NutritionDict;
use crate::units::Quantity;

/// A recipe with cached nutrition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub servings_produced: f64,
    /// Per serving, recalculated when ingredients change
    pub cached_nutrients: NutritionDict,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default = "default_servings")]
    pub servings_produced: f64,
    pub notes: Option<String>,
}

fn default_servings() -> f64 {
    1.0
}

/// Data for updating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub servings_produced: Option<f64>,
    pub notes: Option<String>,
}

impl Recipe {
    /// A recipe is always portioned in whole servings of itself
    pub fn serving_size(&self) -> Quantity {
        Quantity::servings(1.0)
    }

    /// Create a Recipe from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            servings_produced: row.get("servings_produced")?,
            cached_nutrients: json_column(row, "cached_nutrients")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new recipe into the database
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipes (name, servings_produced, notes)
            VALUES (?1, ?2, ?3)
            "#,
            params![data.name, data.servings_produced, data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Recipe {}", id)))
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List recipes, optionally filtered by name
    pub fn list(conn: &Connection, query: Option<&str>, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query.unwrap_or(""));
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM recipes
            WHERE name LIKE ?1
            ORDER BY name ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let recipes = stmt
            .query_map(params![pattern, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// Count recipes, optionally filtered by name
    pub fn count(conn: &Connection, query: Option<&str>) -> DbResult<i64> {
        let pattern = format!("%{}%", query.unwrap_or(""));
        let count = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE name LIKE ?1",
            [pattern],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Update recipe metadata
    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(servings) = data.servings_produced {
            updates.push(format!("servings_produced = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(servings));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Replace the cached per-serving nutrients
    pub fn update_cached_nutrients(conn: &Connection, id: i64, nutrients: &NutritionDict) -> DbResult<()> {
        conn.execute(
            "UPDATE recipes SET cached_nutrients = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![to_json(nutrients)?, id],
        )?;
        Ok(())
    }

    /// Number of log entries that reference this recipe
    pub fn get_log_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM log_entries WHERE recipe_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a recipe (ingredients cascade)
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
