//! REST DTOs with serde derives for HTTP API

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ===== Category DTOs =====

/// A `(name, type)` field declaration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldDefinition {
    /// Field name; normalized to lowercase with underscores
    #[schema(example = "Asset Tag")]
    pub name: String,

    /// One of `string`, `integer`, `float`, `boolean`, `date`
    #[serde(rename = "type")]
    #[schema(example = "string")]
    pub field_type: String,
}

/// Category definition, used both to create a category and to add fields
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryCreate {
    #[schema(example = "Laptop")]
    pub category_name: String,

    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FieldDeleteRequest {
    pub category_name: String,
    pub field_name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryDelete {
    pub category_name: String,
}

/// Registry record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    /// Category (and table) name
    #[schema(example = "laptop")]
    pub table: String,

    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryCreatedResponse {
    pub message: String,
    pub category: CategoryDto,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldFailureDto {
    pub name: String,
    pub reason: String,
}

/// Outcome of adding fields; `failed` is non-empty on partial success
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddFieldsResponse {
    pub message: String,
    pub added: Vec<String>,
    pub failed: Vec<FieldFailureDto>,
    pub updated_fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackfillResponse {
    pub message: String,
    pub added: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DriftReportDto {
    pub category_name: String,
    pub table_exists: bool,
    /// Declared but missing as a column
    pub registry_only: Vec<String>,
    /// Present as a column but not declared
    pub table_only: Vec<String>,
    pub clean: bool,
}

// ===== Asset DTOs =====

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssetInput {
    #[schema(example = "laptop")]
    pub table_name: String,

    /// Column name to value
    #[schema(value_type = Object)]
    pub data: IndexMap<String, serde_json::Value>,
}

/// `table_name` + `identifier` query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct AssetQuery {
    pub table_name: String,
    pub identifier: String,
}

/// `table_name` query parameter
#[derive(Debug, Clone, Deserialize)]
pub struct TableQuery {
    pub table_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchResponse {
    pub table_name: String,

    /// Matching rows, columns in table order
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<IndexMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReassignAssetInput {
    pub table_name: String,
    pub identifier: String,
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub section: Option<String>,
    pub date_of_return: Option<chrono::NaiveDate>,
    pub date_of_reassign: Option<chrono::NaiveDate>,
    pub date_of_update: Option<chrono::NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReassignResponse {
    pub message: String,
    pub updated: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportedSheetDto {
    pub table: String,
    pub created: bool,
    pub rows: usize,
    pub primary_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportResponse {
    pub message: String,
    pub imported: Vec<ImportedSheetDto>,
    /// Sheets without data rows
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStatsDto {
    pub total_categories: usize,
    pub total_users: u64,
    pub total_assets: u64,

    #[schema(value_type = Object)]
    pub asset_counts_by_category: IndexMap<String, u64>,

    /// Rows with `asset_status = 'Active'`
    #[schema(value_type = Object)]
    pub active_asset_counts_by_category: IndexMap<String, u64>,
}

// ===== Auth DTOs =====

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreate {
    pub username: String,
    #[schema(example = "asha@example.com")]
    pub mail: String,
    pub password: String,
    #[serde(default = "default_role")]
    #[schema(example = "User")]
    pub role: String,
}

fn default_role() -> String {
    "User".to_string()
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserLogin {
    pub mail: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDto {
    pub username: String,
    pub mail: String,
    pub role: String,
}

// ===== Generic =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
