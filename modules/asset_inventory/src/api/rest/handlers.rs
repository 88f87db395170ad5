//! HTTP request handlers - thin layer that delegates to domain service

use crate::contract::FieldDef;
use crate::domain::assets::Reassignment;
use crate::domain::naming::normalize_identifier;
use crate::domain::Service;
use crate::infra::auth::AuthGate;
use super::{
    dto::*,
    error::{map_domain_error, Problem},
};
use axum::{
    extract::{Multipart, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// ===== Category Handlers =====

/// Create a category and its table
pub async fn create_category(
    service: Arc<Service>,
    Json(req): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryCreatedResponse>), Problem> {
    let fields: Vec<FieldDef> = req.fields.iter().map(Into::into).collect();
    let category = service
        .create_category(&req.category_name, &fields)
        .await
        .map_err(map_domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryCreatedResponse {
            message: format!("Category '{}' created successfully", category.name),
            category: category.into(),
        }),
    ))
}

/// List every category with its fields
pub async fn list_categories(service: Arc<Service>) -> Result<Json<Vec<CategoryDto>>, Problem> {
    let categories = service.list_categories().await.map_err(map_domain_error)?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Add fields; 207 when only some of them could be added
pub async fn add_fields(
    service: Arc<Service>,
    Json(req): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<AddFieldsResponse>), Problem> {
    let fields: Vec<FieldDef> = req.fields.iter().map(Into::into).collect();
    let outcome = service
        .add_fields(&req.category_name, &fields)
        .await
        .map_err(map_domain_error)?;

    let status = if outcome.failed.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(outcome.into())))
}

pub async fn delete_field(
    service: Arc<Service>,
    Json(req): Json<FieldDeleteRequest>,
) -> Result<Json<MessageResponse>, Problem> {
    service
        .delete_field(&req.category_name, &req.field_name)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(MessageResponse::new(format!(
        "Field '{}' deleted successfully from category '{}'",
        req.field_name, req.category_name
    ))))
}

pub async fn delete_category(
    service: Arc<Service>,
    Json(req): Json<CategoryDelete>,
) -> Result<Json<MessageResponse>, Problem> {
    service
        .delete_category(&req.category_name)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(MessageResponse::new(format!(
        "Category '{}' deleted successfully",
        req.category_name
    ))))
}

/// Add the reassignment columns a category is missing
pub async fn update_category_fields(
    service: Arc<Service>,
    Query(query): Query<TableQuery>,
) -> Result<Json<BackfillResponse>, Problem> {
    let added = service
        .backfill_reassignment_fields(&query.table_name)
        .await
        .map_err(map_domain_error)?;

    let message = if added.is_empty() {
        "All reassign fields already exist in this category.".to_string()
    } else {
        format!("Added missing fields to category '{}'", query.table_name)
    };
    Ok(Json(BackfillResponse { message, added }))
}

pub async fn check_drift(
    service: Arc<Service>,
    name: String,
) -> Result<Json<DriftReportDto>, Problem> {
    let report = service.check_drift(&name).await.map_err(map_domain_error)?;
    Ok(Json(report.into()))
}

pub async fn reconcile(
    service: Arc<Service>,
    name: String,
) -> Result<Json<DriftReportDto>, Problem> {
    let report = service.reconcile(&name).await.map_err(map_domain_error)?;
    Ok(Json(report.into()))
}

// ===== Asset Handlers =====

pub async fn add_asset(
    service: Arc<Service>,
    Json(req): Json<AssetInput>,
) -> Result<(StatusCode, Json<MessageResponse>), Problem> {
    if req.table_name.trim().is_empty() {
        return Err(Problem::bad_request("Table name and data required"));
    }
    service
        .insert_asset(&req.table_name, &req.data)
        .await
        .map_err(map_domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Asset added to {}",
            req.table_name
        ))),
    ))
}

pub async fn search_asset(
    service: Arc<Service>,
    Query(query): Query<AssetQuery>,
) -> Result<Json<SearchResponse>, Problem> {
    let results = service
        .search_asset(&query.table_name, &query.identifier)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(SearchResponse {
        table_name: query.table_name,
        results,
    }))
}

pub async fn delete_asset(
    service: Arc<Service>,
    Query(query): Query<AssetQuery>,
) -> Result<Json<MessageResponse>, Problem> {
    service
        .delete_asset(&query.table_name, &query.identifier)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(MessageResponse::new(format!(
        "Asset with identifier '{}' deleted successfully",
        query.identifier
    ))))
}

pub async fn reassign_asset(
    service: Arc<Service>,
    Json(req): Json<ReassignAssetInput>,
) -> Result<Json<ReassignResponse>, Problem> {
    let reassignment = Reassignment::from(&req);
    let updated = service
        .reassign_asset(&req.table_name, &req.identifier, &reassignment)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(ReassignResponse {
        message: format!(
            "Asset reassigned in {} for {}",
            req.table_name, req.identifier
        ),
        updated,
    }))
}

pub async fn dashboard_stats(service: Arc<Service>) -> Result<Json<DashboardStatsDto>, Problem> {
    let stats = service.dashboard_stats().await.map_err(map_domain_error)?;
    Ok(Json(stats.into()))
}

// ===== Spreadsheet Handlers =====

/// Import the multipart `file` field
pub async fn upload_excel(
    service: Arc<Service>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, Problem> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Problem::bad_request(e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Problem::bad_request(e.body_text()))?;
            upload = Some(bytes);
            break;
        }
    }

    let Some(bytes) = upload else {
        return Err(Problem::bad_request("Multipart field 'file' is required"));
    };

    let summary = service
        .import_workbook(bytes.to_vec())
        .await
        .map_err(map_domain_error)?;
    Ok(Json(summary.into()))
}

pub async fn download_table(
    service: Arc<Service>,
    Query(query): Query<TableQuery>,
) -> Result<Response, Problem> {
    let bytes = service
        .export_table(&query.table_name)
        .await
        .map_err(map_domain_error)?;

    let name = normalize_identifier(&query.table_name);
    Ok(xlsx_attachment(&format!("{}.xlsx", name), bytes))
}

pub async fn download_all_tables(service: Arc<Service>) -> Result<Response, Problem> {
    let bytes = service.export_all().await.map_err(map_domain_error)?;
    Ok(xlsx_attachment("all_assets.xlsx", bytes))
}

fn xlsx_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

// ===== Auth Handlers =====

pub async fn register(
    gate: Arc<AuthGate>,
    Json(req): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserDto>), Problem> {
    let user = gate.register(req.into()).await.map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    gate: Arc<AuthGate>,
    Json(req): Json<UserLogin>,
) -> Result<Json<TokenResponse>, Problem> {
    let token = gate
        .login(&req.mail, &req.password)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(token.into()))
}

pub fn admin_only(username: &str) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!("Welcome, admin {}", username)))
}
