//! Pantry Manager
//!
//! An MCP server for food items, recipes, store prices and a daily food log.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use pantry::mcp::PantryService;
use pantry::{build_info, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries MCP frames
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pantry=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let db_path = db::database_path();
    eprintln!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = db::Database::new(&db_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let service = PantryService::new(db_path, database);

    let server = service.serve((stdin(), stdout())).await?;
    tracing::info!("Pantry MCP server ready");

    server.waiting().await?;

    Ok(())
}
