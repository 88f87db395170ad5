//! Identifier normalization
//!
//! Every category, table and column name goes through [`normalize_identifier`]
//! before it is stored or reaches SQL. The result must also pass
//! [`validate_identifier`]; nothing else is ever interpolated as an identifier.

use crate::contract::{InventoryError, ASSET_KEY_FIELDS};

/// Trim, lowercase and replace internal spaces with underscores
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Accepts `^[a-z][a-z0-9_]*$`
pub fn validate_identifier(ident: &str) -> Result<(), InventoryError> {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return Err(InventoryError::validation("identifier cannot be empty"));
    };

    if !first.is_ascii_lowercase() {
        return Err(InventoryError::validation(format!(
            "identifier '{}' must start with a letter",
            ident
        )));
    }

    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(InventoryError::validation(format!(
            "identifier '{}' may only contain lowercase letters, digits and '_'",
            ident
        )));
    }

    Ok(())
}

/// Normalize and validate in one step
pub fn canonical_identifier(raw: &str) -> Result<String, InventoryError> {
    let ident = normalize_identifier(raw);
    validate_identifier(&ident)?;
    Ok(ident)
}

/// Looser key used to match update input against stored field names:
/// the canonical form with underscores removed.
pub fn loose_key(raw: &str) -> String {
    normalize_identifier(raw).replace('_', "")
}

/// Whether a name normalizes to `asset_tag` or `asset_code`
pub fn is_asset_key(raw: &str) -> bool {
    let ident = normalize_identifier(raw);
    ASSET_KEY_FIELDS.contains(&ident.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("  Asset Tag "), "asset_tag");
        assert_eq!(normalize_identifier("Laptop"), "laptop");
        assert_eq!(normalize_identifier("date of return"), "date_of_return");
        assert_eq!(normalize_identifier("already_ok"), "already_ok");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("laptop").is_ok());
        assert!(validate_identifier("asset_tag2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("_hidden").is_err());
        assert!(validate_identifier("drop\"table").is_err());
        assert!(validate_identifier("serial_no.").is_err());
    }

    #[test]
    fn test_canonical_identifier_rejects_injection() {
        let err = canonical_identifier("laptop\"; DROP TABLE users; --").unwrap_err();
        assert!(matches!(err, InventoryError::Validation { .. }));
    }

    #[test]
    fn test_loose_key() {
        assert_eq!(loose_key("user_name"), "username");
        assert_eq!(loose_key("User Name"), "username");
        assert_eq!(loose_key("date_of_return"), "dateofreturn");
    }

    #[test]
    fn test_is_asset_key() {
        assert!(is_asset_key("Asset Tag"));
        assert!(is_asset_key("asset_code"));
        assert!(is_asset_key(" ASSET CODE "));
        assert!(!is_asset_key("assettag"));
        assert!(!is_asset_key("serial"));
    }
}
