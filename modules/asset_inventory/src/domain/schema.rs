//! Physical schema vocabulary shared by the domain and storage layers

use crate::contract::{Category, FieldType, InventoryError};
use chrono::NaiveDate;

use super::naming::is_asset_key;

/// Physical column type, as declared or as introspected from the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    /// Anything the introspection could not classify
    Other,
}

impl ColumnKind {
    /// string→text, integer→int, float→double, boolean→bool, date→date
    pub fn for_field(field_type: FieldType) -> Self {
        match field_type {
            FieldType::String => Self::Text,
            FieldType::Integer => Self::Integer,
            FieldType::Float => Self::Float,
            FieldType::Boolean => Self::Boolean,
            FieldType::Date => Self::Date,
        }
    }

    /// Declared type that best describes a live column
    pub fn field_type(self) -> FieldType {
        match self {
            Self::Integer => FieldType::Integer,
            Self::Float => FieldType::Float,
            Self::Boolean => FieldType::Boolean,
            Self::Date => FieldType::Date,
            Self::Text | Self::Other => FieldType::String,
        }
    }

    /// Classify a database type name (`information_schema` or `pragma_table_info`)
    pub fn from_sql_type(sql_type: &str) -> Self {
        let t = sql_type.to_lowercase();
        if t.contains("bool") {
            Self::Boolean
        } else if t.contains("date") {
            Self::Date
        } else if t.contains("int") {
            Self::Integer
        } else if ["doub", "real", "floa", "numeric", "decimal"]
            .iter()
            .any(|p| t.contains(p))
        {
            Self::Float
        } else if ["char", "text", "clob", "string"].iter().any(|p| t.contains(p)) {
            Self::Text
        } else {
            Self::Other
        }
    }

    /// Best-effort conversion of a textual value into this column's type.
    /// Values that do not parse are kept as text.
    pub fn coerce_text(self, raw: &str) -> CellValue {
        let trimmed = raw.trim();
        match self {
            Self::Integer => trimmed
                .parse::<i64>()
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            Self::Float => trimmed
                .parse::<f64>()
                .map(CellValue::Float)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            Self::Boolean => match trimmed.to_lowercase().as_str() {
                "true" | "1" => CellValue::Boolean(true),
                "false" | "0" => CellValue::Boolean(false),
                _ => CellValue::Text(raw.to_string()),
            },
            Self::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(CellValue::Date)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
            Self::Text | Self::Other => CellValue::Text(raw.to_string()),
        }
    }
}

/// A typed value bound into a dynamic statement
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Reshape a value so it binds cleanly against a column of `kind`
    pub fn conform(self, kind: ColumnKind) -> Self {
        match (kind, self) {
            (_, Self::Null) => Self::Null,
            (ColumnKind::Text, Self::Integer(i)) => Self::Text(i.to_string()),
            (ColumnKind::Text, Self::Float(f)) => Self::Text(f.to_string()),
            (ColumnKind::Text, Self::Boolean(b)) => Self::Text(b.to_string()),
            (ColumnKind::Text, Self::Date(d)) => Self::Text(d.format("%Y-%m-%d").to_string()),
            (ColumnKind::Float, Self::Integer(i)) => Self::Float(i as f64),
            (ColumnKind::Integer, Self::Float(f)) if f.fract() == 0.0 => Self::Integer(f as i64),
            (ColumnKind::Other, value) => value,
            (kind, Self::Text(s)) => kind.coerce_text(&s),
            (_, value) => value,
        }
    }
}

impl From<&serde_json::Value> for CellValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Strict `YYYY-MM-DD` coercion for values bound into date columns
pub fn parse_date_value(column: &str, value: &serde_json::Value) -> Result<CellValue, InventoryError> {
    match value {
        serde_json::Value::Null => Ok(CellValue::Null),
        serde_json::Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(CellValue::Date)
            .map_err(|_| {
                InventoryError::validation(format!(
                    "Invalid date format for '{}' (expected YYYY-MM-DD)",
                    column
                ))
            }),
        _ => Err(InventoryError::validation(format!(
            "Invalid date format for '{}' (expected YYYY-MM-DD)",
            column
        ))),
    }
}

/// Column definition used for CREATE TABLE / ADD COLUMN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub primary_key: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    /// Physical projection of a category; the asset key field becomes the primary key
    pub fn for_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            columns: category
                .fields
                .iter()
                .map(|f| ColumnSpec {
                    name: f.name.clone(),
                    kind: ColumnKind::for_field(f.field_type),
                    primary_key: is_asset_key(&f.name),
                })
                .collect(),
        }
    }
}

/// A live column as reported by the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
    pub kind: ColumnKind,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        let sql_type = sql_type.into();
        Self {
            name: name.into(),
            kind: ColumnKind::from_sql_type(&sql_type),
            sql_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FieldDef;
    use serde_json::json;

    #[test]
    fn test_from_sql_type() {
        assert_eq!(ColumnKind::from_sql_type("TEXT"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_sql_type("character varying"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_sql_type("integer"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_sql_type("bigint"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_sql_type("double precision"), ColumnKind::Float);
        assert_eq!(ColumnKind::from_sql_type("REAL"), ColumnKind::Float);
        assert_eq!(ColumnKind::from_sql_type("boolean"), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_sql_type("date"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_sql_type("blob"), ColumnKind::Other);
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(ColumnKind::Integer.coerce_text("42"), CellValue::Integer(42));
        assert_eq!(
            ColumnKind::Integer.coerce_text("LT-1"),
            CellValue::Text("LT-1".to_string())
        );
        assert_eq!(ColumnKind::Boolean.coerce_text("TRUE"), CellValue::Boolean(true));
        assert_eq!(
            ColumnKind::Date.coerce_text("2024-03-01"),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_conform_to_column_kind() {
        assert_eq!(
            CellValue::Integer(7).conform(ColumnKind::Text),
            CellValue::Text("7".to_string())
        );
        assert_eq!(
            CellValue::Text("7".to_string()).conform(ColumnKind::Integer),
            CellValue::Integer(7)
        );
        assert_eq!(CellValue::Integer(2).conform(ColumnKind::Float), CellValue::Float(2.0));
        assert_eq!(CellValue::Null.conform(ColumnKind::Date), CellValue::Null);
    }

    #[test]
    fn test_parse_date_value_is_strict() {
        assert!(parse_date_value("purchased", &json!("2024-02-29")).is_ok());
        assert!(parse_date_value("purchased", &json!("29/02/2024")).is_err());
        assert!(parse_date_value("purchased", &json!(20240229)).is_err());
        assert_eq!(parse_date_value("purchased", &json!(null)).unwrap(), CellValue::Null);
    }

    #[test]
    fn test_table_spec_marks_asset_key() {
        let category = Category {
            name: "laptop".to_string(),
            fields: vec![
                FieldDef::new("asset_tag", FieldType::String),
                FieldDef::new("ram_gb", FieldType::Integer),
            ],
        };
        let spec = TableSpec::for_category(&category);
        assert!(spec.columns[0].primary_key);
        assert!(!spec.columns[1].primary_key);
        assert_eq!(spec.columns[1].kind, ColumnKind::Integer);
    }
}
