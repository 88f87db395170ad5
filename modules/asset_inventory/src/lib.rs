//! Asset Inventory Module
//!
//! Runtime-defined asset categories, each backed by its own SQL table.
//! A registry table records every category's declared fields, and asset
//! rows, spreadsheet import/export and bearer-token auth are layered on top.

// Public exports
pub mod contract;
pub use contract::{Category, FieldDef, FieldType, InventoryError};

pub mod config;
pub use config::Config;

pub mod module;
pub use module::InventoryModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
