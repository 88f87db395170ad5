//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use crate::contract::{Category, FieldDef, FieldType, User};
use super::entity;

// ===== Category Conversions =====

/// JSON representation of one registry field
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct FieldJson {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

impl From<&FieldDef> for FieldJson {
    fn from(field: &FieldDef) -> Self {
        Self {
            name: field.name.clone(),
            field_type: field.field_type.as_str().to_string(),
        }
    }
}

impl From<FieldJson> for FieldDef {
    fn from(json: FieldJson) -> Self {
        // Older records may carry free-form type names
        Self::new(json.name, FieldType::parse_or_string(&json.field_type))
    }
}

/// Serialize a field list for the `tablefields` column
pub fn fields_to_json(fields: &[FieldDef]) -> anyhow::Result<serde_json::Value> {
    let fields: Vec<FieldJson> = fields.iter().map(FieldJson::from).collect();
    Ok(serde_json::to_value(fields)?)
}

impl TryFrom<entity::Model> for Category {
    type Error = anyhow::Error;

    fn try_from(entity: entity::Model) -> Result<Self, Self::Error> {
        let fields: Vec<FieldJson> = serde_json::from_value(entity.tablefields)?;

        Ok(Self {
            name: entity.tablename,
            fields: fields.into_iter().map(FieldDef::from).collect(),
        })
    }
}

impl TryFrom<&Category> for entity::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &Category) -> Result<Self, Self::Error> {
        use sea_orm::ActiveValue::*;

        Ok(Self {
            tablename: Set(model.name.clone()),
            tablefields: Set(fields_to_json(&model.fields)?),
        })
    }
}

// ===== User Conversions =====

impl From<entity::user::Model> for User {
    fn from(entity: entity::user::Model) -> Self {
        Self {
            username: entity.username,
            mail: entity.mail,
            role: entity.role,
            hashed_password: entity.hashed_password,
        }
    }
}

impl From<&User> for entity::user::ActiveModel {
    fn from(model: &User) -> Self {
        use sea_orm::ActiveValue::*;

        Self {
            username: Set(model.username.clone()),
            mail: Set(model.mail.clone()),
            role: Set(model.role.clone()),
            hashed_password: Set(model.hashed_password.clone()),
        }
    }
}
