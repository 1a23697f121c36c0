//! MCP server layer

mod server;

pub use server::PantryService;
