//! Pantry MCP Server Implementation
//!
//! Implements the MCP server with all pantry tools.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::tools::days;
use crate::tools::food_items::{self, FoodItemChanges, FoodItemInput};
use crate::tools::prices;
use crate::tools::recipes;
use crate::tools::status::StatusTracker;
use crate::tools::units;

/// Pantry MCP Service
#[derive(Clone)]
pub struct PantryService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<PantryService>,
}

impl PantryService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Unit Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertQuantityParams {
    /// Amount to convert, e.g. "1 1/2 cup" or "250 g"
    pub amount: String,
    /// Target unit, e.g. "ml" or "oz"
    pub to_unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ParseQuantityParams {
    /// Text to parse, e.g. "1/3 cup"
    pub text: String,
}

// ============================================================================
// Food Item Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodItemParams {
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    /// Label serving size, e.g. "30 g", "1/3 cup", "2 slices"
    pub serving_size: String,
    pub servings_per_container: Option<f64>,
    /// Nutrient amounts for one serving, keyed by nutrient name (e.g. {"energy": 120, "protein": 4})
    #[serde(default)]
    pub nutrients: BTreeMap<String, f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodItemsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFoodItemParams {
    pub id: Option<i64>,
    /// Look up by barcode instead of id
    pub barcode: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodItemsParams {
    /// name, created_at or updated_at
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// asc or desc
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_sort_by() -> String { "name".to_string() }
fn default_sort_order() -> String { "asc".to_string() }
fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodItemParams {
    pub id: i64,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub serving_size: Option<String>,
    pub servings_per_container: Option<f64>,
    /// Replaces the whole nutrient set when given
    pub nutrients: Option<BTreeMap<String, f64>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteFoodItemParams {
    pub id: i64,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    #[serde(default = "default_servings_produced")]
    pub servings_produced: f64,
    pub notes: Option<String>,
}

fn default_servings_produced() -> f64 { 1.0 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRecipeParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Filter by name
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    pub id: i64,
    pub name: Option<String>,
    pub servings_produced: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRecipeParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeIngredientParams {
    pub recipe_id: i64,
    pub food_item_id: i64,
    /// Amount used, e.g. "200 g", "2", "1/2 cup"
    pub amount: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeIngredientParams {
    pub id: i64,
    pub amount: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveRecipeIngredientParams {
    pub id: i64,
}

// ============================================================================
// Store Price Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddStorePriceParams {
    pub food_item_id: i64,
    pub store: String,
    /// Price of one container
    pub price: f64,
    /// YYYY-MM-DD, defaults to today
    pub observed_on: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListStorePricesParams {
    pub food_item_id: i64,
    pub store: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteStorePriceParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCostPerServingParams {
    pub food_item_id: i64,
    /// Only use prices from this store
    pub store: Option<String>,
    /// Also price this amount, e.g. "25 g"
    pub amount: Option<String>,
}

// ============================================================================
// Day and Log Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// breakfast, lunch, dinner or snack
    #[serde(default = "default_meal")]
    pub meal: String,
    pub food_item_id: Option<i64>,
    pub recipe_id: Option<i64>,
    /// Amount eaten, e.g. "2" (servings), "45 g", "1/2 cup"
    #[serde(default = "default_amount")]
    pub amount: String,
    pub notes: Option<String>,
}

fn default_meal() -> String { "unspecified".to_string() }
fn default_amount() -> String { "1 serving".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDayParams {
    /// YYYY-MM-DD
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDaysParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_days_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_days_limit() -> i64 { 30 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateDayParams {
    pub date: String,
    pub notes: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateLogEntryParams {
    pub id: i64,
    pub meal: Option<String>,
    pub amount: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteLogEntryParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecalculateDayNutritionParams {
    pub date: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl PantryService {
    // --- Status ---

    #[tool(description = "Get the current status of the pantry service including build info, database status, and process information")]
    async fn pantry_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get instructions for recording food items, recipes, prices and meals. Call this when starting a session or when unsure how amounts and units work.")]
    fn pantry_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::PANTRY_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(PANTRY_INSTRUCTIONS)]))
    }

    // --- Units ---

    #[tool(description = "Convert an amount to another unit of the same kind (weight, volume, energy)")]
    fn convert_quantity(&self, Parameters(p): Parameters<ConvertQuantityParams>) -> Result<CallToolResult, McpError> {
        let result = units::convert_quantity(&p.amount, &p.to_unit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Show how an amount like '1 1/2 cup' is read: magnitude, unit and unit family")]
    fn parse_quantity(&self, Parameters(p): Parameters<ParseQuantityParams>) -> Result<CallToolResult, McpError> {
        let result = units::parse_quantity(&p.text).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List the recognised units and nutrients")]
    fn list_units(&self) -> Result<CallToolResult, McpError> {
        let result = units::list_units();
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Food Items ---

    #[tool(description = "Create a new food item from its label: serving size, servings per container and nutrients per serving")]
    fn add_food_item(&self, Parameters(p): Parameters<AddFoodItemParams>) -> Result<CallToolResult, McpError> {
        let input = FoodItemInput {
            name: p.name,
            brand: p.brand,
            barcode: p.barcode,
            serving_size: p.serving_size,
            servings_per_container: p.servings_per_container,
            nutrients: p.nutrients,
            notes: p.notes,
        };
        let result = food_items::add_food_item(&self.database, input).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Search food items by name, brand or barcode")]
    fn search_food_items(&self, Parameters(p): Parameters<SearchFoodItemsParams>) -> Result<CallToolResult, McpError> {
        let result = food_items::search_food_items(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a food item by id or barcode with nutrients per serving and per container, latest price and recipe usage")]
    fn get_food_item(&self, Parameters(p): Parameters<GetFoodItemParams>) -> Result<CallToolResult, McpError> {
        let result = food_items::get_food_item(&self.database, p.id, p.barcode.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(item) => serde_json::to_string_pretty(&item),
            None => Ok(serde_json::json!({"error": "Food item not found", "id": p.id, "barcode": p.barcode}).to_string()),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List all food items with sorting and pagination")]
    fn list_food_items(&self, Parameters(p): Parameters<ListFoodItemsParams>) -> Result<CallToolResult, McpError> {
        let result = food_items::list_food_items(&self.database, &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a food item. Recipes and days that use it are recalculated.")]
    fn update_food_item(&self, Parameters(p): Parameters<UpdateFoodItemParams>) -> Result<CallToolResult, McpError> {
        let changes = FoodItemChanges {
            name: p.name,
            brand: p.brand,
            barcode: p.barcode,
            serving_size: p.serving_size,
            servings_per_container: p.servings_per_container,
            nutrients: p.nutrients,
            notes: p.notes,
        };
        let result = food_items::update_food_item(&self.database, p.id, changes).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a food item. Blocked while it is used in a recipe or logged on a day.")]
    fn delete_food_item(&self, Parameters(p): Parameters<DeleteFoodItemParams>) -> Result<CallToolResult, McpError> {
        let result = food_items::delete_food_item(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe. Add ingredients with add_recipe_ingredient.")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::create_recipe(&self.database, &p.name, p.servings_produced, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a recipe with its ingredients and nutrients per serving")]
    fn get_recipe(&self, Parameters(p): Parameters<GetRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(recipe) => serde_json::to_string_pretty(&recipe),
            None => Ok(format!(r#"{{"error": "Recipe not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List recipes, optionally filtered by name")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a recipe's name, servings produced or notes. Days that logged it are recalculated.")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::update_recipe(&self.database, p.id, p.name, p.servings_produced, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a recipe and its ingredients. Blocked while it is logged on a day.")]
    fn delete_recipe(&self, Parameters(p): Parameters<DeleteRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Add a food item to a recipe. The amount must relate to the food item's serving size.")]
    fn add_recipe_ingredient(&self, Parameters(p): Parameters<AddRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::add_recipe_ingredient(&self.database, p.recipe_id, p.food_item_id, &p.amount, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update an ingredient's amount or notes")]
    fn update_recipe_ingredient(&self, Parameters(p): Parameters<UpdateRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::update_recipe_ingredient(&self.database, p.id, p.amount.as_deref(), p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(ingredient) => serde_json::to_string_pretty(&ingredient),
            None => Ok(format!(r#"{{"error": "Ingredient not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove an ingredient from its recipe")]
    fn remove_recipe_ingredient(&self, Parameters(p): Parameters<RemoveRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let deleted = recipes::remove_recipe_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::json!({"success": deleted, "id": p.id}).to_string();
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Store Prices ---

    #[tool(description = "Record the price of one container of a food item at a store")]
    fn add_store_price(&self, Parameters(p): Parameters<AddStorePriceParams>) -> Result<CallToolResult, McpError> {
        let result = prices::add_store_price(&self.database, p.food_item_id, &p.store, p.price, p.observed_on.as_deref(), p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List recorded prices for a food item, newest first")]
    fn list_store_prices(&self, Parameters(p): Parameters<ListStorePricesParams>) -> Result<CallToolResult, McpError> {
        let result = prices::list_store_prices(&self.database, p.food_item_id, p.store.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a recorded price")]
    fn delete_store_price(&self, Parameters(p): Parameters<DeleteStorePriceParams>) -> Result<CallToolResult, McpError> {
        let result = prices::delete_store_price(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Cost of one serving from the latest price, and optionally the cost of an amount")]
    fn get_cost_per_serving(&self, Parameters(p): Parameters<GetCostPerServingParams>) -> Result<CallToolResult, McpError> {
        let result = prices::get_cost_per_serving(&self.database, p.food_item_id, p.store.as_deref(), p.amount.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Days ---

    #[tool(description = "Log food eaten. Provide either food_item_id OR recipe_id (not both). Creates the day if needed.")]
    fn log_food(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let result = days::log_food(&self.database, p.date.as_deref(), &p.meal, p.food_item_id, p.recipe_id, &p.amount, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a day with its entries grouped by meal and nutrition totals")]
    fn get_day(&self, Parameters(p): Parameters<GetDayParams>) -> Result<CallToolResult, McpError> {
        let result = days::get_day(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(day) => serde_json::to_string_pretty(&day),
            None => Ok(format!(r#"{{"error": "Day not found", "date": "{}"}}"#, p.date)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List days with optional date range filter and pagination")]
    fn list_days(&self, Parameters(p): Parameters<ListDaysParams>) -> Result<CallToolResult, McpError> {
        let result = days::list_days(&self.database, p.start_date.as_deref(), p.end_date.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update day notes")]
    fn update_day(&self, Parameters(p): Parameters<UpdateDayParams>) -> Result<CallToolResult, McpError> {
        let result = days::update_day(&self.database, &p.date, &p.notes).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(day) => serde_json::to_string_pretty(&day),
            None => Ok(format!(r#"{{"error": "Day not found", "date": "{}"}}"#, p.date)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a log entry's meal, amount or notes")]
    fn update_log_entry(&self, Parameters(p): Parameters<UpdateLogEntryParams>) -> Result<CallToolResult, McpError> {
        let result = days::update_log_entry(&self.database, p.id, p.meal.as_deref(), p.amount.as_deref(), p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(entry) => serde_json::to_string_pretty(&entry),
            None => Ok(format!(r#"{{"error": "Log entry not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a log entry")]
    fn delete_log_entry(&self, Parameters(p): Parameters<DeleteLogEntryParams>) -> Result<CallToolResult, McpError> {
        let deleted = days::delete_log_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::json!({"success": deleted, "id": p.id}).to_string();
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Force recalculate cached nutrition totals for a day")]
    fn recalculate_day_nutrition(&self, Parameters(p): Parameters<RecalculateDayNutritionParams>) -> Result<CallToolResult, McpError> {
        let result = days::recalculate_day_nutrition(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for PantryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pantry".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Pantry Manager".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Pantry Manager - Food items, recipes, store prices and a daily food log. \
                 IMPORTANT: Call pantry_instructions before logging food or entering labels. \
                 Amounts are text like '1 1/2 cup', '30 g' or '2' (servings). \
                 Units: convert_quantity, parse_quantity, list_units. \
                 Food: add/search/get/list/update/delete_food_item. \
                 Recipes: create/get/list/update/delete_recipe, add/update/remove_recipe_ingredient. \
                 Prices: add_store_price, list_store_prices, delete_store_price, get_cost_per_serving. \
                 Days: log_food, get_day, list_days, update_day, update_log_entry, delete_log_entry, recalculate_day_nutrition. \
                 Status: pantry_status."
                    .into(),
            ),
        }
    }
}
