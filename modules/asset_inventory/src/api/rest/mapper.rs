//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains all From/Into implementations for bidirectional
//! conversion between REST DTOs and transport-agnostic contract models.

use super::dto::*;
use crate::contract;
use crate::domain::assets::Reassignment;

// ===== Category conversions =====

impl From<&FieldDefinition> for contract::FieldDef {
    fn from(dto: &FieldDefinition) -> Self {
        // Unrecognized types fall back to string
        Self::new(
            dto.name.clone(),
            contract::FieldType::parse_or_string(&dto.field_type),
        )
    }
}

impl From<contract::FieldDef> for FieldDefinition {
    fn from(field: contract::FieldDef) -> Self {
        Self {
            name: field.name,
            field_type: field.field_type.as_str().to_string(),
        }
    }
}

impl From<contract::Category> for CategoryDto {
    fn from(category: contract::Category) -> Self {
        Self {
            table: category.name,
            fields: category.fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<contract::FieldFailure> for FieldFailureDto {
    fn from(failure: contract::FieldFailure) -> Self {
        Self {
            name: failure.name,
            reason: failure.reason,
        }
    }
}

impl From<contract::AddFieldsOutcome> for AddFieldsResponse {
    fn from(outcome: contract::AddFieldsOutcome) -> Self {
        let message = if outcome.failed.is_empty() {
            format!("Fields added to category '{}'", outcome.category)
        } else {
            format!(
                "Added {} field(s) to category '{}' before a failure",
                outcome.added.len(),
                outcome.category
            )
        };

        Self {
            message,
            added: outcome.added,
            failed: outcome.failed.into_iter().map(Into::into).collect(),
            updated_fields: outcome.fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<contract::DriftReport> for DriftReportDto {
    fn from(report: contract::DriftReport) -> Self {
        Self {
            clean: report.is_clean(),
            category_name: report.category,
            table_exists: report.table_exists,
            registry_only: report.registry_only,
            table_only: report.table_only,
        }
    }
}

// ===== Asset conversions =====

impl From<&ReassignAssetInput> for Reassignment {
    fn from(input: &ReassignAssetInput) -> Self {
        Self {
            user_name: input.user_name.clone(),
            user_id: input.user_id.clone(),
            email: input.email.clone(),
            department: input.department.clone(),
            location: input.location.clone(),
            section: input.section.clone(),
            date_of_return: input.date_of_return,
            date_of_reassign: input.date_of_reassign,
            date_of_update: input.date_of_update,
            remarks: input.remarks.clone(),
        }
    }
}

impl From<contract::ImportedSheet> for ImportedSheetDto {
    fn from(sheet: contract::ImportedSheet) -> Self {
        Self {
            table: sheet.table,
            created: sheet.created,
            rows: sheet.rows,
            primary_key: sheet.primary_key,
        }
    }
}

impl From<contract::ImportSummary> for ImportResponse {
    fn from(summary: contract::ImportSummary) -> Self {
        Self {
            message: "Excel uploaded successfully, and tables created with data.".to_string(),
            imported: summary.imported.into_iter().map(Into::into).collect(),
            skipped: summary.skipped,
        }
    }
}

impl From<contract::DashboardStats> for DashboardStatsDto {
    fn from(stats: contract::DashboardStats) -> Self {
        Self {
            total_categories: stats.categories,
            total_users: stats.users,
            total_assets: stats.assets,
            asset_counts_by_category: stats.asset_counts_by_category,
            active_asset_counts_by_category: stats.active_asset_counts_by_category,
        }
    }
}

// ===== Auth conversions =====

impl From<UserCreate> for contract::NewUser {
    fn from(dto: UserCreate) -> Self {
        Self {
            username: dto.username,
            mail: dto.mail,
            password: dto.password,
            role: dto.role,
        }
    }
}

impl From<contract::User> for UserDto {
    fn from(user: contract::User) -> Self {
        Self {
            username: user.username,
            mail: user.mail,
            role: user.role,
        }
    }
}

impl From<contract::AccessToken> for TokenResponse {
    fn from(token: contract::AccessToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            role: token.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_type_becomes_string() {
        let field: contract::FieldDef = (&FieldDefinition {
            name: "Notes".to_string(),
            field_type: "varchar".to_string(),
        })
            .into();
        assert_eq!(field.field_type, contract::FieldType::String);
    }

    #[test]
    fn test_reassignment_from_input() {
        let input = ReassignAssetInput {
            table_name: "laptop".to_string(),
            identifier: "LT-001".to_string(),
            department: Some("Ops".to_string()),
            ..Default::default()
        };
        let reassignment = Reassignment::from(&input);
        assert_eq!(reassignment.changes().len(), 1);
    }
}
