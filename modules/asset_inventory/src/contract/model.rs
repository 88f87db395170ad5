//! Contract models for the asset inventory
//!
//! These models are transport-agnostic and shared by the domain, storage and
//! REST layers. NO serde derives - REST DTOs live in `api::rest::dto`.

use indexmap::IndexMap;

/// Field names that may act as a category's primary key
pub const ASSET_KEY_FIELDS: [&str; 2] = ["asset_tag", "asset_code"];

/// Columns required by the reassignment workflow
pub const REASSIGNMENT_FIELDS: [&str; 9] = [
    "username",
    "userid",
    "department",
    "location",
    "section",
    "dateofreturn",
    "dateofreassign",
    "dateofupdate",
    "remarks",
];

/// Table holding the schema registry
pub const REGISTRY_TABLE: &str = "category_info";

/// Table holding registered users
pub const USERS_TABLE: &str = "users";

/// Internal tables that are never exposed as categories
pub const RESERVED_TABLES: [&str; 2] = [REGISTRY_TABLE, USERS_TABLE];

/// Declared type of a category field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

impl FieldType {
    /// Canonical lowercase name, as stored in the registry
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }

    /// Strict parse; `None` for anything outside the declared set
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    /// Lenient parse used for category creation: unknown types become strings
    pub fn parse_or_string(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::String)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(name, type)` pair belonging to a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A user-defined asset type; `name` doubles as the physical table name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl Category {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// One asset row, keyed by column name in physical column order
pub type AssetRow = IndexMap<String, serde_json::Value>;

/// A field that could not be added physically
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub name: String,
    pub reason: String,
}

/// Result of adding fields to an existing category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddFieldsOutcome {
    pub category: String,
    /// Fields that now exist both physically and in the registry
    pub added: Vec<String>,
    /// The field that stopped the operation, if any
    pub failed: Vec<FieldFailure>,
    /// Registry field list after the operation
    pub fields: Vec<FieldDef>,
}

/// Differences between the registry and the live table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DriftReport {
    pub category: String,
    pub table_exists: bool,
    /// Declared in the registry, missing as a physical column
    pub registry_only: Vec<String>,
    /// Physical columns the registry does not list
    pub table_only: Vec<String>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.table_exists && self.registry_only.is_empty() && self.table_only.is_empty()
    }
}

/// Per-sheet outcome of a spreadsheet import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSheet {
    pub table: String,
    pub created: bool,
    pub rows: usize,
    pub primary_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: Vec<ImportedSheet>,
    /// Sheets without data rows
    pub skipped: Vec<String>,
}

/// Full contents of one physical table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<AssetRow>,
}

/// Aggregated counters for the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub categories: usize,
    pub users: u64,
    pub assets: u64,
    pub asset_counts_by_category: IndexMap<String, u64>,
    pub active_asset_counts_by_category: IndexMap<String, u64>,
}

/// Registered account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub mail: String,
    pub role: String,
    pub hashed_password: String,
}

/// Registration input, password still in clear text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub mail: String,
    pub password: String,
    pub role: String,
}

/// Identity resolved from a verified bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub mail: String,
    pub username: String,
    pub role: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// Issued bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
}
