//! Contract layer - transport-agnostic models and errors

pub mod error;
pub mod model;

pub use error::InventoryError;
pub use model::{
    AccessToken, AddFieldsOutcome, AssetRow, Category, DashboardStats, DriftReport, FieldDef,
    FieldFailure, FieldType, ImportSummary, ImportedSheet, NewUser, Principal, TableSnapshot,
    User, ASSET_KEY_FIELDS, REASSIGNMENT_FIELDS, REGISTRY_TABLE, RESERVED_TABLES, USERS_TABLE,
};
