//! Pantry Tools module
//!
//! MCP tool implementations for the pantry manager.

pub mod days;
pub mod food_items;
pub mod prices;
pub mod recipes;
pub mod status;
pub mod units;
