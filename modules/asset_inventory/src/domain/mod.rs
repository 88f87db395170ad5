//! Domain layer - business logic and services

pub mod assets;
pub mod bulk;
pub mod naming;
pub mod registry;
pub mod repository;
pub mod schema;
pub mod service;
pub mod spreadsheet;
pub mod validation;

pub use repository::{AssetRepository, CatalogRepository, CatalogTx, UserRepository};
pub use service::Service;

use crate::contract::InventoryError;

/// Raised by repositories when an insert hits an existing primary key
#[derive(Debug, thiserror::Error)]
#[error("duplicate key in table '{table}'")]
pub struct DuplicateKey {
    pub table: String,
}

/// Map a repository failure to `Internal`, logging the cause
pub(crate) fn storage_error(context: &'static str) -> impl FnOnce(anyhow::Error) -> InventoryError {
    move |error| InventoryError::internal(context, error)
}
