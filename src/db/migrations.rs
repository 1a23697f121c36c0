//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        tracing::info!("Applying schema migration v1");
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Highest applied migration, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: Initial schema
///
/// Quantities and nutrient maps are JSON text so that exact fractions and
/// custom units survive storage unchanged.
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- FOOD ITEMS
        -- ============================================
        CREATE TABLE food_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            brand TEXT,
            barcode TEXT,
            serving_size TEXT NOT NULL,          -- Quantity JSON, e.g. 30 g
            servings_per_container REAL,
            nutrients TEXT NOT NULL DEFAULT '{}', -- NutritionDict JSON, per serving
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_items_name ON food_items(name);
        CREATE INDEX idx_food_items_barcode ON food_items(barcode);

        -- ============================================
        -- RECIPES
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            servings_produced REAL NOT NULL DEFAULT 1.0,
            cached_nutrients TEXT NOT NULL DEFAULT '{}', -- per serving
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            food_item_id INTEGER NOT NULL REFERENCES food_items(id) ON DELETE RESTRICT,
            amount TEXT NOT NULL,                -- Quantity JSON
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX idx_recipe_ingredients_food ON recipe_ingredients(food_item_id);

        -- ============================================
        -- STORE PRICES
        -- ============================================
        CREATE TABLE store_prices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            food_item_id INTEGER NOT NULL REFERENCES food_items(id) ON DELETE CASCADE,
            store TEXT NOT NULL,
            price REAL NOT NULL,                 -- per container
            observed_on TEXT NOT NULL,           -- ISO date
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_store_prices_food ON store_prices(food_item_id, observed_on);

        -- ============================================
        -- DAYS AND LOG ENTRIES
        -- ============================================
        CREATE TABLE days (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL UNIQUE,           -- ISO date: YYYY-MM-DD
            cached_nutrients TEXT NOT NULL DEFAULT '{}',
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE log_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            day_id INTEGER NOT NULL REFERENCES days(id) ON DELETE CASCADE,
            meal TEXT NOT NULL DEFAULT 'unspecified'
                CHECK(meal IN ('breakfast', 'lunch', 'dinner', 'snack', 'unspecified')),
            food_item_id INTEGER REFERENCES food_items(id) ON DELETE RESTRICT,
            recipe_id INTEGER REFERENCES recipes(id) ON DELETE RESTRICT,
            amount TEXT NOT NULL,                -- Quantity JSON
            cached_nutrients TEXT NOT NULL DEFAULT '{}',
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((food_item_id IS NULL) != (recipe_id IS NULL))
        );

        CREATE INDEX idx_log_entries_day ON log_entries(day_id);
        CREATE INDEX idx_log_entries_food ON log_entries(food_item_id);
        CREATE INDEX idx_log_entries_recipe ON log_entries(recipe_id);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('food_items', 'recipes', 'recipe_ingredients', 'store_prices', 'days', 'log_entries')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 6);
    }
}
