//! Asset row operations against category tables

use crate::contract::{AssetRow, Category, DashboardStats, FieldType, InventoryError};
use indexmap::IndexMap;
use std::collections::HashMap;

use super::naming::{canonical_identifier, is_asset_key, loose_key};
use super::registry;
use super::schema::{parse_date_value, CellValue, ColumnKind};
use super::service::Service;
use super::{storage_error, DuplicateKey};

/// Optional reassignment attributes, in the order they are applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassignment {
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

impl Reassignment {
    /// Supplied attributes as `(input name, value)` pairs; nulls are dropped
    pub fn changes(&self) -> Vec<(String, serde_json::Value)> {
        let text = |name: &str, v: &Option<String>| {
            v.as_ref()
                .map(|v| (name.to_string(), serde_json::Value::String(v.clone())))
        };
        let date = |name: &str, v: &Option<chrono::NaiveDate>| {
            v.map(|d| {
                (
                    name.to_string(),
                    serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
                )
            })
        };

        [
            text("user_name", &self.user_name),
            text("user_id", &self.user_id),
            text("email", &self.email),
            text("department", &self.department),
            text("location", &self.location),
            text("section", &self.section),
            date("date_of_return", &self.date_of_return),
            date("date_of_reassign", &self.date_of_reassign),
            date("date_of_update", &self.date_of_update),
            text("remarks", &self.remarks),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Registry fields that can identify an asset (`asset_tag` / `asset_code`)
pub fn key_columns(category: &Category) -> Result<Vec<String>, InventoryError> {
    let keys: Vec<String> = category
        .field_names()
        .filter(|f| is_asset_key(f))
        .map(str::to_string)
        .collect();

    if keys.is_empty() {
        return Err(InventoryError::not_found(
            "searchable field (asset tag/code)",
            category.name.clone(),
        ));
    }
    Ok(keys)
}

impl Service {
    /// Insert one asset row.
    ///
    /// Columns are checked against the live table; values bound to date
    /// columns must be `YYYY-MM-DD`.
    pub async fn insert_asset(
        &self,
        table: &str,
        data: &IndexMap<String, serde_json::Value>,
    ) -> Result<(), InventoryError> {
        let table = canonical_identifier(table)?;
        if data.is_empty() {
            return Err(InventoryError::validation("Table name and data required"));
        }

        let columns = self.live_columns(&table).await?;

        let mut values = Vec::with_capacity(data.len());
        for (raw_column, value) in data {
            let column = canonical_identifier(raw_column)?;
            let info = columns.iter().find(|c| c.name == column).ok_or_else(|| {
                InventoryError::validation(format!(
                    "Column '{}' does not exist in '{}'",
                    column, table
                ))
            })?;

            let cell = if info.kind == ColumnKind::Date {
                parse_date_value(&column, value)?
            } else {
                CellValue::from(value).conform(info.kind)
            };
            values.push((column, cell));
        }

        self.assets.insert(&table, &values).await.map_err(|e| {
            if e.downcast_ref::<DuplicateKey>().is_some() {
                InventoryError::conflict(format!("Asset already exists in '{}'", table))
            } else {
                InventoryError::internal("asset insert failed", e)
            }
        })?;

        tracing::debug!(table = %table, columns = values.len(), "asset inserted");
        Ok(())
    }

    /// Find assets by asset tag/code, trying each key column in turn
    pub async fn search_asset(
        &self,
        table: &str,
        identifier: &str,
    ) -> Result<Vec<AssetRow>, InventoryError> {
        let table = canonical_identifier(table)?;
        let category = registry::lookup(self.catalog.as_ref(), &table).await?;
        let keys = key_columns(&category)?;
        let columns = self.live_columns(&table).await?;

        for key in &keys {
            let Some(info) = columns.iter().find(|c| &c.name == key) else {
                tracing::warn!(table = %table, column = %key, "key column missing from table");
                continue;
            };

            let identifier = info.kind.coerce_text(identifier);
            match self.assets.find_by(&table, &columns, key, &identifier).await {
                Ok(rows) if !rows.is_empty() => return Ok(rows),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(table = %table, column = %key, error = %e, "search failed");
                }
            }
        }

        Err(InventoryError::not_found("asset", identifier))
    }

    /// Update fields of the asset matching `identifier`.
    ///
    /// Input names are matched loosely (case, spaces and underscores are
    /// ignored) against the registry; unmatched names are skipped.
    pub async fn update_asset(
        &self,
        table: &str,
        identifier: &str,
        changes: &[(String, serde_json::Value)],
    ) -> Result<Vec<String>, InventoryError> {
        let table = canonical_identifier(table)?;
        let category = registry::lookup(self.catalog.as_ref(), &table).await?;

        let by_loose_key: HashMap<String, (&str, FieldType)> = category
            .fields
            .iter()
            .map(|f| (loose_key(&f.name), (f.name.as_str(), f.field_type)))
            .collect();

        let mut matched = Vec::new();
        for (input, value) in changes {
            let Some((field, field_type)) = by_loose_key.get(&loose_key(input)) else {
                tracing::warn!(table = %table, field = %input, "not a field of this category, skipped");
                continue;
            };

            let cell = if *field_type == FieldType::Date {
                parse_date_value(field, value)?
            } else {
                CellValue::from(value).conform(ColumnKind::for_field(*field_type))
            };
            matched.push((field.to_string(), cell));
        }

        if matched.is_empty() {
            return Err(InventoryError::validation("No valid fields to update."));
        }

        let columns = self.live_columns(&table).await?;
        let keys: Vec<(String, CellValue)> = key_columns(&category)?
            .into_iter()
            .filter_map(|key| {
                let info = columns.iter().find(|c| c.name == key)?;
                Some((key, info.kind.coerce_text(identifier)))
            })
            .collect();
        if keys.is_empty() {
            return Err(InventoryError::not_found(
                "searchable field (asset tag/code)",
                table,
            ));
        }

        let affected = self
            .assets
            .update_by_keys(&table, &keys, &matched)
            .await
            .map_err(storage_error("asset update failed"))?;

        if affected == 0 {
            return Err(InventoryError::not_found("asset", identifier));
        }

        let updated: Vec<String> = matched.into_iter().map(|(f, _)| f).collect();
        tracing::info!(table = %table, identifier, fields = ?updated, "asset updated");
        Ok(updated)
    }

    /// Apply a reassignment to the asset matching `identifier`
    pub async fn reassign_asset(
        &self,
        table: &str,
        identifier: &str,
        reassignment: &Reassignment,
    ) -> Result<Vec<String>, InventoryError> {
        let changes = reassignment.changes();
        if changes.is_empty() {
            return Err(InventoryError::validation("No valid fields to update."));
        }
        self.update_asset(table, identifier, &changes).await
    }

    /// Delete assets by asset tag/code; succeeds on the first key column that matches
    pub async fn delete_asset(&self, table: &str, identifier: &str) -> Result<(), InventoryError> {
        let table = canonical_identifier(table)?;
        let category = registry::lookup(self.catalog.as_ref(), &table).await?;
        let keys = key_columns(&category)?;
        let columns = self.live_columns(&table).await?;

        for key in &keys {
            let Some(info) = columns.iter().find(|c| &c.name == key) else {
                tracing::warn!(table = %table, column = %key, "key column missing from table");
                continue;
            };

            let value = info.kind.coerce_text(identifier);
            match self.assets.delete_by(&table, key, &value).await {
                Ok(n) if n > 0 => {
                    tracing::info!(table = %table, identifier, deleted = n, "asset deleted");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(table = %table, column = %key, error = %e, "delete failed");
                }
            }
        }

        Err(InventoryError::not_found("asset", identifier))
    }

    /// Counters for the admin dashboard.
    ///
    /// A category whose table cannot be counted contributes zero.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, InventoryError> {
        let categories = registry::list_all(self.catalog.as_ref()).await?;
        let users = self
            .users
            .count()
            .await
            .map_err(storage_error("user count failed"))?;

        let mut stats = DashboardStats {
            categories: categories.len(),
            users,
            ..Default::default()
        };

        for category in &categories {
            let (total, active) = match self.count_assets(&category.name).await {
                Ok(counts) => counts,
                Err(e) => {
                    tracing::warn!(category = %category.name, error = %e, "asset count failed");
                    (0, 0)
                }
            };
            stats.assets += total;
            stats
                .asset_counts_by_category
                .insert(category.name.clone(), total);
            stats
                .active_asset_counts_by_category
                .insert(category.name.clone(), active);
        }

        Ok(stats)
    }

    async fn count_assets(&self, table: &str) -> anyhow::Result<(u64, u64)> {
        let total = self.assets.count(table, None).await?;

        let has_status = self
            .catalog
            .columns(table)
            .await?
            .is_some_and(|cols| cols.iter().any(|c| c.name == "asset_status"));

        let active = if has_status {
            self.assets
                .count(
                    table,
                    Some(("asset_status", CellValue::Text("Active".to_string()))),
                )
                .await?
        } else {
            0
        };

        Ok((total, active))
    }
}
