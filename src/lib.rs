//! Pantry Manager Library
//!
//! Quantities and units, nutrient arithmetic, and the food/recipe/price/day
//! store behind the pantry MCP server.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
pub mod units;
