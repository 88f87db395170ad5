//! Validation of category definitions

use crate::contract::{Category, FieldDef, InventoryError, RESERVED_TABLES};
use std::collections::HashSet;

use super::naming::{canonical_identifier, is_asset_key};

/// Reject names that collide with internal tables
pub fn check_not_reserved(name: &str) -> Result<(), InventoryError> {
    if RESERVED_TABLES.contains(&name) {
        return Err(InventoryError::validation(format!(
            "'{}' is a reserved table name",
            name
        )));
    }
    Ok(())
}

/// Canonicalize field names and reject duplicates within the list
pub fn normalize_fields(fields: &[FieldDef]) -> Result<Vec<FieldDef>, InventoryError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(fields.len());

    for field in fields {
        let name = canonical_identifier(&field.name)?;
        if !seen.insert(name.clone()) {
            return Err(InventoryError::validation(format!(
                "Field '{}' is declared more than once",
                name
            )));
        }
        normalized.push(FieldDef::new(name, field.field_type));
    }

    Ok(normalized)
}

/// Validate a full category definition and return its canonical form.
///
/// Requires at least one field and exactly one `asset_tag`/`asset_code` field.
pub fn validate_category(name: &str, fields: &[FieldDef]) -> Result<Category, InventoryError> {
    let name = canonical_identifier(name)?;
    check_not_reserved(&name)?;

    if fields.is_empty() {
        return Err(InventoryError::validation("At least one field is required"));
    }

    let fields = normalize_fields(fields)?;

    match fields.iter().filter(|f| is_asset_key(&f.name)).count() {
        0 => Err(InventoryError::validation(
            "One of 'asset tag' or 'asset code' is required",
        )),
        1 => Ok(Category { name, fields }),
        _ => Err(InventoryError::validation(
            "Only one of 'asset tag' or 'asset code' may be declared",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FieldType;

    fn field(name: &str) -> FieldDef {
        FieldDef::new(name, FieldType::String)
    }

    #[test]
    fn test_validate_category_normalizes() {
        let category =
            validate_category(" Mobile Phone ", &[field("Asset Code"), field("Model Name")])
                .unwrap();
        assert_eq!(category.name, "mobile_phone");
        assert_eq!(
            category.field_names().collect::<Vec<_>>(),
            vec!["asset_code", "model_name"]
        );
    }

    #[test]
    fn test_validate_category_requires_fields() {
        let err = validate_category("laptop", &[]).unwrap_err();
        assert_eq!(
            err,
            InventoryError::validation("At least one field is required")
        );
    }

    #[test]
    fn test_validate_category_requires_asset_key() {
        let err = validate_category("laptop", &[field("serial"), field("owner")]).unwrap_err();
        assert!(matches!(err, InventoryError::Validation { .. }));
    }

    #[test]
    fn test_validate_category_rejects_two_keys() {
        let err =
            validate_category("laptop", &[field("asset_tag"), field("Asset Code")]).unwrap_err();
        assert!(matches!(err, InventoryError::Validation { .. }));
    }

    #[test]
    fn test_validate_category_rejects_duplicates_by_normalized_name() {
        let err = validate_category("laptop", &[field("asset_tag"), field("Owner"), field("owner")])
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation { .. }));
    }

    #[test]
    fn test_reserved_names() {
        assert!(validate_category("users", &[field("asset_tag")]).is_err());
        assert!(validate_category("Category Info", &[field("asset_tag")]).is_err());
    }
}
