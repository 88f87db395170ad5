//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{AssetRow, Category, FieldDef, User};
use anyhow::Result;
use async_trait::async_trait;

use super::schema::{CellValue, ColumnInfo, ColumnSpec, TableSpec};

/// Schema registry plus physical table catalog
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Open a transaction spanning registry writes and DDL
    async fn begin(&self) -> Result<Box<dyn CatalogTx>>;

    /// Registry record for a category
    async fn find(&self, name: &str) -> Result<Option<Category>>;

    /// Every registry record, ordered by name
    async fn list_all(&self) -> Result<Vec<Category>>;

    /// Live columns of a table in physical order, `None` if the table is absent
    async fn columns(&self, table: &str) -> Result<Option<Vec<ColumnInfo>>>;
}

/// A unit of work over the registry and the physical schema.
///
/// Nothing is visible to other connections until [`CatalogTx::commit`];
/// dropping the transaction rolls everything back.
#[async_trait]
pub trait CatalogTx: Send {
    async fn find(&mut self, name: &str) -> Result<Option<Category>>;

    async fn insert(&mut self, category: &Category) -> Result<()>;

    /// Replace the stored field list (single-row write)
    async fn update_fields(&mut self, name: &str, fields: &[FieldDef]) -> Result<()>;

    /// Remove the registry record; `false` if there was none
    async fn delete(&mut self, name: &str) -> Result<bool>;

    async fn columns(&mut self, table: &str) -> Result<Option<Vec<ColumnInfo>>>;

    async fn create_table(&mut self, spec: &TableSpec) -> Result<()>;

    /// Add one column. A failure is isolated to this column; the
    /// transaction stays usable.
    async fn add_column(&mut self, table: &str, column: &ColumnSpec) -> Result<()>;

    async fn drop_column(&mut self, table: &str, column: &str) -> Result<()>;

    /// Drop a table if it exists
    async fn drop_table(&mut self, table: &str) -> Result<()>;

    /// Insert rows; every row has one value per column
    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<CellValue>],
    ) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Row-level access to category tables
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Insert a single row
    async fn insert(&self, table: &str, values: &[(String, CellValue)]) -> Result<()>;

    /// Rows whose `key_column` equals `identifier`, decoded using `columns`
    async fn find_by(
        &self,
        table: &str,
        columns: &[ColumnInfo],
        key_column: &str,
        identifier: &CellValue,
    ) -> Result<Vec<AssetRow>>;

    /// Apply each change as its own UPDATE scoped by
    /// `key_1 = value_1 OR key_2 = value_2 ...`, committing once.
    /// Returns the number of rows touched by the last statement.
    async fn update_by_keys(
        &self,
        table: &str,
        keys: &[(String, CellValue)],
        changes: &[(String, CellValue)],
    ) -> Result<u64>;

    /// Delete rows whose `key_column` equals `identifier`
    async fn delete_by(&self, table: &str, key_column: &str, identifier: &CellValue) -> Result<u64>;

    /// Every row of a table
    async fn fetch_all(&self, table: &str, columns: &[ColumnInfo]) -> Result<Vec<AssetRow>>;

    /// Row count, optionally restricted to `column = value`
    async fn count(&self, table: &str, filter: Option<(&str, CellValue)>) -> Result<u64>;
}

/// Registered accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;

    async fn find_by_mail(&self, mail: &str) -> Result<Option<User>>;

    async fn count(&self) -> Result<u64>;
}
