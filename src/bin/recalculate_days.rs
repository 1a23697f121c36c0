//! Rebuild cached nutrition for recipes and days
//! Usage: cargo run --bin recalculate_days -- [YYYY-MM-DD]
//!
//! With a date only that day is refreshed. Without one every recipe is
//! recalculated first, then every day.

use pantry::db::{self, Database, DbResult};
use pantry::models::{recalculate_day_nutrients, recalculate_recipe_nutrients, Day, Recipe};
use pantry::nutrition::Nutrient;
use rusqlite::Connection;

const PAGE: i64 = 500;

fn recalculate_day(conn: &Connection, day: &Day) -> DbResult<()> {
    let before = day.cached_nutrients.amount(Nutrient::Energy);
    let after = recalculate_day_nutrients(conn, day.id)?.amount(Nutrient::Energy);
    println!("{}: {:.1} kcal -> {:.1} kcal", day.date, before, after);
    Ok(())
}

fn recalculate_everything(conn: &Connection) -> DbResult<()> {
    let mut recipes = 0;
    let mut offset = 0;
    loop {
        let page = Recipe::list(conn, None, PAGE, offset)?;
        for recipe in &page {
            recalculate_recipe_nutrients(conn, recipe.id)?;
            recipes += 1;
        }
        if (page.len() as i64) < PAGE {
            break;
        }
        offset += PAGE;
    }
    println!("Recalculated {} recipes", recipes);

    let mut days = 0;
    let mut offset = 0;
    loop {
        let page = Day::list(conn, None, None, PAGE, offset)?;
        for day in &page {
            recalculate_day(conn, day)?;
            days += 1;
        }
        if (page.len() as i64) < PAGE {
            break;
        }
        offset += PAGE;
    }
    println!("Recalculated {} days", days);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let date = std::env::args().nth(1);

    let db_path = db::database_path();
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;

    database.with_transaction(|tx| {
        db::migrations::run_migrations(tx)?;
        match date.as_deref() {
            Some(date) => match Day::get_by_date(tx, date)? {
                Some(day) => recalculate_day(tx, &day),
                None => {
                    println!("No data found for date: {}", date);
                    Ok(())
                }
            },
            None => recalculate_everything(tx),
        }
    })?;

    Ok(())
}
