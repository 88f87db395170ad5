//! Domain service - category lifecycle and dynamic table management
//!
//! Every schema mutation opens one [`CatalogTx`] and performs both the DDL
//! and the registry write inside it, so the registry and the physical table
//! either change together or not at all.

use crate::contract::{
    AddFieldsOutcome, Category, DriftReport, FieldDef, FieldFailure, FieldType, InventoryError,
    REASSIGNMENT_FIELDS,
};
use std::sync::Arc;

use super::naming::{canonical_identifier, is_asset_key};
use super::registry;
use super::repository::{AssetRepository, CatalogRepository, CatalogTx, UserRepository};
use super::schema::{ColumnInfo, ColumnKind, ColumnSpec, TableSpec};
use super::storage_error;
use super::validation::{check_not_reserved, normalize_fields, validate_category};

/// Domain service for categories, assets and bulk transfer
pub struct Service {
    pub(crate) catalog: Arc<dyn CatalogRepository>,
    pub(crate) assets: Arc<dyn AssetRepository>,
    pub(crate) users: Arc<dyn UserRepository>,
}

impl Service {
    /// Create a new service instance
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        assets: Arc<dyn AssetRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            catalog,
            assets,
            users,
        }
    }

    // ===== Category Operations =====

    /// Create the physical table and register the category
    pub async fn create_category(
        &self,
        name: &str,
        fields: &[FieldDef],
    ) -> Result<Category, InventoryError> {
        // Rejected before anything touches the database
        let category = validate_category(name, fields)?;

        let mut tx = self.begin().await?;

        if table_columns(tx.as_mut(), &category.name).await?.is_some() {
            return Err(InventoryError::conflict(format!(
                "Table '{}' already exists",
                category.name
            )));
        }

        tx.create_table(&TableSpec::for_category(&category))
            .await
            .map_err(storage_error("table creation failed"))?;

        let category = registry::register(tx.as_mut(), &category.name, &category.fields).await?;

        commit(tx).await?;

        tracing::info!(
            category = %category.name,
            fields = category.fields.len(),
            "category created"
        );
        Ok(category)
    }

    /// Get a category's registry record
    pub async fn get_category(&self, name: &str) -> Result<Category, InventoryError> {
        let name = canonical_identifier(name)?;
        registry::lookup(self.catalog.as_ref(), &name).await
    }

    /// List all categories and their fields
    pub async fn list_categories(&self) -> Result<Vec<Category>, InventoryError> {
        registry::list_all(self.catalog.as_ref()).await
    }

    /// Add new columns to an existing category.
    ///
    /// Columns are added one by one; the first failure stops the loop and
    /// only the fields that physically succeeded are registered.
    pub async fn add_fields(
        &self,
        name: &str,
        fields: &[FieldDef],
    ) -> Result<AddFieldsOutcome, InventoryError> {
        let name = canonical_identifier(name)?;

        if fields.is_empty() {
            return Err(InventoryError::validation(
                "At least one new field is required",
            ));
        }
        let fields = normalize_fields(fields)?;

        let mut tx = self.begin().await?;

        if table_columns(tx.as_mut(), &name).await?.is_none() {
            return Err(InventoryError::not_found("table", name));
        }

        let category = registry::lookup_in(tx.as_mut(), &name).await?;
        if let Some(dup) = fields.iter().find(|f| category.field(&f.name).is_some()) {
            return Err(InventoryError::conflict(format!(
                "Field '{}' already exists in category '{}'",
                dup.name, name
            )));
        }

        let mut added = Vec::new();
        let mut failed = Vec::new();
        for field in &fields {
            let column = ColumnSpec::new(&field.name, ColumnKind::for_field(field.field_type));
            match tx.add_column(&name, &column).await {
                Ok(()) => added.push(field.clone()),
                Err(e) => {
                    tracing::warn!(
                        category = %name,
                        field = %field.name,
                        error = %e,
                        "failed to add column, stopping"
                    );
                    failed.push(FieldFailure {
                        name: field.name.clone(),
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        let fields = if added.is_empty() {
            category.fields
        } else {
            registry::append_fields(tx.as_mut(), &name, &added).await?
        };

        commit(tx).await?;

        tracing::info!(category = %name, added = added.len(), failed = failed.len(), "fields added");
        Ok(AddFieldsOutcome {
            category: name,
            added: added.into_iter().map(|f| f.name).collect(),
            failed,
            fields,
        })
    }

    /// Drop a column from a category's table and registry entry.
    ///
    /// The asset key column is the table's primary key. Backends that allow
    /// dropping it leave the category without a searchable column; SQLite
    /// refuses, which surfaces as a conflict and leaves everything unchanged.
    pub async fn delete_field(&self, name: &str, field_name: &str) -> Result<(), InventoryError> {
        let name = canonical_identifier(name)?;
        let field_name = canonical_identifier(field_name)?;

        let mut tx = self.begin().await?;

        let columns = table_columns(tx.as_mut(), &name)
            .await?
            .ok_or_else(|| InventoryError::not_found("category", name.clone()))?;

        if !columns.iter().any(|c| c.name == field_name) {
            return Err(InventoryError::not_found(
                "field",
                format!("{}.{}", name, field_name),
            ));
        }

        if let Err(e) = tx.drop_column(&name, &field_name).await {
            if is_asset_key(&field_name) {
                tracing::warn!(
                    category = %name,
                    field = %field_name,
                    error = %e,
                    "asset key column not dropped"
                );
                return Err(InventoryError::conflict(format!(
                    "Asset key column '{}' of category '{}' cannot be dropped by this database",
                    field_name, name
                )));
            }
            return Err(storage_error("drop column failed")(e));
        }

        let registered = tx
            .find(&name)
            .await
            .map_err(storage_error("registry lookup failed"))?
            .is_some();
        if registered {
            registry::remove_field(tx.as_mut(), &name, &field_name).await?;
        } else {
            tracing::warn!(category = %name, "dropped column of an unregistered table");
        }

        commit(tx).await?;

        tracing::info!(category = %name, field = %field_name, "field deleted");
        Ok(())
    }

    /// Drop the table (if present) and the registry record
    pub async fn delete_category(&self, name: &str) -> Result<(), InventoryError> {
        let name = canonical_identifier(name)?;
        check_not_reserved(&name)?;

        let mut tx = self.begin().await?;

        tx.drop_table(&name)
            .await
            .map_err(storage_error("drop table failed"))?;
        let had_record = registry::delete(tx.as_mut(), &name).await?;

        commit(tx).await?;

        tracing::info!(category = %name, had_record, "category deleted");
        Ok(())
    }

    /// Make sure every reassignment column exists, as free text.
    ///
    /// Returns the names that were added to the registry.
    pub async fn backfill_reassignment_fields(
        &self,
        name: &str,
    ) -> Result<Vec<String>, InventoryError> {
        let name = canonical_identifier(name)?;

        let mut tx = self.begin().await?;

        let columns = table_columns(tx.as_mut(), &name)
            .await?
            .ok_or_else(|| InventoryError::not_found("table", name.clone()))?;
        let category = registry::lookup_in(tx.as_mut(), &name).await?;

        for field in REASSIGNMENT_FIELDS {
            if !columns.iter().any(|c| c.name == field) {
                tx.add_column(&name, &ColumnSpec::new(field, ColumnKind::Text))
                    .await
                    .map_err(storage_error("add reassignment column failed"))?;
            }
        }

        let missing: Vec<FieldDef> = REASSIGNMENT_FIELDS
            .iter()
            .filter(|f| category.field(f).is_none())
            .map(|f| FieldDef::new(*f, FieldType::String))
            .collect();

        if !missing.is_empty() {
            registry::append_fields(tx.as_mut(), &name, &missing).await?;
        }

        commit(tx).await?;

        let added: Vec<String> = missing.into_iter().map(|f| f.name).collect();
        tracing::info!(category = %name, added = ?added, "reassignment fields backfilled");
        Ok(added)
    }

    // ===== Drift Detection =====

    /// Compare the registry field list with the live table
    pub async fn check_drift(&self, name: &str) -> Result<DriftReport, InventoryError> {
        let name = canonical_identifier(name)?;
        let category = registry::lookup(self.catalog.as_ref(), &name).await?;
        let columns = self
            .catalog
            .columns(&name)
            .await
            .map_err(storage_error("column introspection failed"))?;

        Ok(drift_between(&category, columns.as_deref()))
    }

    /// Bring registry and table back in line.
    ///
    /// Registry-only fields are added as columns (or the whole table is
    /// recreated if it is gone); table-only columns are registered with the
    /// type their physical column suggests.
    pub async fn reconcile(&self, name: &str) -> Result<DriftReport, InventoryError> {
        let name = canonical_identifier(name)?;

        let mut tx = self.begin().await?;

        let category = registry::lookup_in(tx.as_mut(), &name).await?;
        let columns = table_columns(tx.as_mut(), &name).await?;
        let drift = drift_between(&category, columns.as_deref());

        if drift.is_clean() {
            return Ok(drift);
        }

        match &columns {
            None => {
                tx.create_table(&TableSpec::for_category(&category))
                    .await
                    .map_err(storage_error("table recreation failed"))?;
            }
            Some(columns) => {
                let spec = TableSpec::for_category(&category);
                for column in spec
                    .columns
                    .into_iter()
                    .filter(|c| drift.registry_only.contains(&c.name))
                {
                    // Existing tables never get a second primary key
                    let column = ColumnSpec {
                        primary_key: false,
                        ..column
                    };
                    tx.add_column(&name, &column)
                        .await
                        .map_err(storage_error("add missing column failed"))?;
                }

                if !drift.table_only.is_empty() {
                    let mut fields = category.fields.clone();
                    fields.extend(
                        columns
                            .iter()
                            .filter(|c| drift.table_only.contains(&c.name))
                            .map(|c| FieldDef::new(&c.name, c.kind.field_type())),
                    );
                    tx.update_fields(&name, &fields)
                        .await
                        .map_err(storage_error("registry update failed"))?;
                }
            }
        }

        commit(tx).await?;

        tracing::info!(
            category = %name,
            registry_only = ?drift.registry_only,
            table_only = ?drift.table_only,
            "category reconciled"
        );
        Ok(drift)
    }

    // ===== Helper Methods =====

    pub(crate) async fn begin(&self) -> Result<Box<dyn CatalogTx>, InventoryError> {
        self.catalog
            .begin()
            .await
            .map_err(storage_error("failed to open transaction"))
    }

    /// Live columns of a table, `NotFound` if it does not exist
    pub(crate) async fn live_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, InventoryError> {
        self.catalog
            .columns(table)
            .await
            .map_err(storage_error("column introspection failed"))?
            .ok_or_else(|| InventoryError::not_found("table", table))
    }
}

pub(crate) async fn table_columns(
    tx: &mut dyn CatalogTx,
    table: &str,
) -> Result<Option<Vec<ColumnInfo>>, InventoryError> {
    tx.columns(table)
        .await
        .map_err(storage_error("column introspection failed"))
}

pub(crate) async fn commit(tx: Box<dyn CatalogTx>) -> Result<(), InventoryError> {
    tx.commit().await.map_err(storage_error("commit failed"))
}

fn drift_between(category: &Category, columns: Option<&[ColumnInfo]>) -> DriftReport {
    let Some(columns) = columns else {
        return DriftReport {
            category: category.name.clone(),
            table_exists: false,
            registry_only: category.field_names().map(str::to_string).collect(),
            table_only: Vec::new(),
        };
    };

    DriftReport {
        category: category.name.clone(),
        table_exists: true,
        registry_only: category
            .field_names()
            .filter(|f| !columns.iter().any(|c| c.name == *f))
            .map(str::to_string)
            .collect(),
        table_only: columns
            .iter()
            .filter(|c| category.field(&c.name).is_none())
            .map(|c| c.name.clone())
            .collect(),
    }
}
