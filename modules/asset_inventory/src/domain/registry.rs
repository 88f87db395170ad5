//! Schema registry operations
//!
//! One persisted record per category: canonical name plus the ordered field
//! list. Every mutation here is a single-row write inside the caller's
//! [`CatalogTx`], so it commits or rolls back together with the DDL that
//! accompanies it.

use crate::contract::{Category, FieldDef, InventoryError};

use super::repository::{CatalogRepository, CatalogTx};
use super::storage_error;
use super::validation::validate_category;

/// Validate and store a new category definition
pub async fn register(
    tx: &mut dyn CatalogTx,
    name: &str,
    fields: &[FieldDef],
) -> Result<Category, InventoryError> {
    let category = validate_category(name, fields)?;

    if tx
        .find(&category.name)
        .await
        .map_err(storage_error("registry lookup failed"))?
        .is_some()
    {
        return Err(InventoryError::conflict(format!(
            "Category '{}' already exists",
            category.name
        )));
    }

    tx.insert(&category)
        .await
        .map_err(storage_error("registry insert failed"))?;

    Ok(category)
}

/// Registry record for `name`, read inside a transaction
pub async fn lookup_in(tx: &mut dyn CatalogTx, name: &str) -> Result<Category, InventoryError> {
    tx.find(name)
        .await
        .map_err(storage_error("registry lookup failed"))?
        .ok_or_else(|| InventoryError::not_found("category", name))
}

/// Registry record for `name`
pub async fn lookup(repo: &dyn CatalogRepository, name: &str) -> Result<Category, InventoryError> {
    repo.find(name)
        .await
        .map_err(storage_error("registry lookup failed"))?
        .ok_or_else(|| InventoryError::not_found("category", name))
}

/// Every category with its field list
pub async fn list_all(repo: &dyn CatalogRepository) -> Result<Vec<Category>, InventoryError> {
    repo.list_all()
        .await
        .map_err(storage_error("registry listing failed"))
}

/// Extend the stored field list, preserving order.
///
/// Fails with a conflict if any new name is already registered.
pub async fn append_fields(
    tx: &mut dyn CatalogTx,
    name: &str,
    new_fields: &[FieldDef],
) -> Result<Vec<FieldDef>, InventoryError> {
    let category = lookup_in(tx, name).await?;

    if let Some(dup) = new_fields.iter().find(|f| category.field(&f.name).is_some()) {
        return Err(InventoryError::conflict(format!(
            "Field '{}' already exists in category '{}'",
            dup.name, name
        )));
    }

    let mut fields = category.fields;
    fields.extend(new_fields.iter().cloned());

    tx.update_fields(name, &fields)
        .await
        .map_err(storage_error("registry update failed"))?;

    Ok(fields)
}

/// Remove a field from the stored list; no-op if it is not there
pub async fn remove_field(
    tx: &mut dyn CatalogTx,
    name: &str,
    field_name: &str,
) -> Result<Vec<FieldDef>, InventoryError> {
    let category = lookup_in(tx, name).await?;
    if category.field(field_name).is_none() {
        return Ok(category.fields);
    }

    let fields: Vec<FieldDef> = category
        .fields
        .into_iter()
        .filter(|f| f.name != field_name)
        .collect();

    tx.update_fields(name, &fields)
        .await
        .map_err(storage_error("registry update failed"))?;

    Ok(fields)
}

/// Remove the registry record entirely
pub async fn delete(tx: &mut dyn CatalogTx, name: &str) -> Result<bool, InventoryError> {
    tx.delete(name)
        .await
        .map_err(storage_error("registry delete failed"))
}
