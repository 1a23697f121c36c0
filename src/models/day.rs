//! Day model
//!
//! Represents a logged day with aggregated nutrient totals.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{json_column, to_json};
use crate::db::{DbError, DbResult};
use crate::nutrition::NutritionDict;

/// A day container for log entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Day {
    pub id: i64,
    pub date: String, // ISO date: "2026-01-09"
    pub cached_nutrients: NutritionDict,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Day {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            cached_nutrients: json_column(row, "cached_nutrients")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get a day by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM days WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(day) => Ok(Some(day)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a day by date
    pub fn get_by_date(conn: &Connection, date: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM days WHERE date = ?1")?;

        let result = stmt.query_row([date], Self::from_row);
        match result {
            Ok(day) => Ok(Some(day)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get or create a day by date
    pub fn get_or_create(conn: &Connection, date: &str) -> DbResult<Self> {
        if let Some(day) = Self::get_by_date(conn, date)? {
            return Ok(day);
        }

        conn.execute("INSERT INTO days (date) VALUES (?1)", [date])?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Day {}", date)))
    }

    /// List days with optional date range, newest first
    pub fn list(
        conn: &Connection,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let mut sql = String::from("SELECT * FROM days WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(start) = start_date {
            params_vec.push(Box::new(start.to_string()));
            sql.push_str(&format!(" AND date >= ?{}", params_vec.len()));
        }

        if let Some(end) = end_date {
            params_vec.push(Box::new(end.to_string()));
            sql.push_str(&format!(" AND date <= ?{}", params_vec.len()));
        }

        sql.push_str(" ORDER BY date DESC");

        params_vec.push(Box::new(limit));
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len()));

        params_vec.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let days = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(days)
    }

    /// Set the notes for a day
    pub fn update_notes(conn: &Connection, id: i64, notes: &str) -> DbResult<Option<Self>> {
        conn.execute(
            "UPDATE days SET notes = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![notes, id],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Replace the cached nutrient totals for a day
    pub fn update_cached_nutrients(conn: &Connection, id: i64, nutrients: &NutritionDict) -> DbResult<()> {
        conn.execute(
            "UPDATE days SET cached_nutrients = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![to_json(nutrients)?, id],
        )?;
        Ok(())
    }

    /// Delete a day and its entries
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM days WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_get_or_create_is_stable() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let first = Day::get_or_create(conn, "2026-02-01")?;
            let again = Day::get_or_create(conn, "2026-02-01")?;
            assert_eq!(first.id, again.id);
            assert!(first.cached_nutrients.is_empty());

            Day::get_or_create(conn, "2026-02-03")?;
            Day::get_or_create(conn, "2026-01-20")?;

            let february = Day::list(conn, Some("2026-02-01"), None, 10, 0)?;
            let dates: Vec<&str> = february.iter().map(|d| d.date.as_str()).collect();
            assert_eq!(dates, vec!["2026-02-03", "2026-02-01"]);

            let noted = Day::update_notes(conn, first.id, "long run")?.unwrap();
            assert_eq!(noted.notes.as_deref(), Some("long run"));
            Ok(())
        })
        .unwrap();
    }
}
