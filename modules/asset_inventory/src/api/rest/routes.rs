//! Route registration and OpenAPI document

use crate::domain::Service;
use crate::infra::auth::AuthGate;
use super::{auth::AdminUser, dto::*, error::Problem, handlers};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

/// Schemas of every REST DTO
#[derive(OpenApi)]
#[openapi(
    info(title = "Asset Inventory API"),
    components(schemas(
        FieldDefinition,
        CategoryCreate,
        FieldDeleteRequest,
        CategoryDelete,
        CategoryDto,
        CategoryCreatedResponse,
        FieldFailureDto,
        AddFieldsResponse,
        BackfillResponse,
        DriftReportDto,
        AssetInput,
        SearchResponse,
        ReassignAssetInput,
        ReassignResponse,
        ImportedSheetDto,
        ImportResponse,
        DashboardStatsDto,
        UserCreate,
        UserLogin,
        TokenResponse,
        UserDto,
        MessageResponse,
    ))
)]
pub struct ApiDoc;

/// Register all REST routes
pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    gate: Arc<AuthGate>,
    max_upload_bytes: usize,
) -> Router {
    router
        // Category endpoints
        .route("/create-category", post(create_category_handler))
        .route("/get-categories", get(list_categories_handler))
        .route("/add-fields", post(add_fields_handler))
        .route("/delete-field", delete(delete_field_handler))
        .route("/delete-category", delete(delete_category_handler))
        .route("/update-category-fields", post(update_category_fields_handler))
        .route("/categories/{name}/drift", get(check_drift_handler))
        .route("/categories/{name}/reconcile", post(reconcile_handler))
        // Asset endpoints
        .route("/add-asset", post(add_asset_handler))
        .route("/search-asset", get(search_asset_handler))
        .route("/delete-asset", delete(delete_asset_handler))
        .route("/reassign-asset", put(reassign_asset_handler))
        .route("/dashboard-stats", get(dashboard_stats_handler))
        // Spreadsheet endpoints
        .route(
            "/upload-excel",
            post(upload_excel_handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download-table", get(download_table_handler))
        .route("/download-all-tables", get(download_all_tables_handler))
        // Auth endpoints
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/admin-only", get(admin_only_handler))
        .route("/openapi.json", get(openapi_handler))
        // Service and auth gate as extensions for handlers and extractors
        .layer(Extension(service))
        .layer(Extension(gate))
}

// ===== Handler wrappers that extract service from Extension =====

async fn create_category_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    json: Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryCreatedResponse>), Problem> {
    handlers::create_category(service, json).await
}

async fn list_categories_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<Vec<CategoryDto>>, Problem> {
    handlers::list_categories(service).await
}

async fn add_fields_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    json: Json<CategoryCreate>,
) -> Result<(StatusCode, Json<AddFieldsResponse>), Problem> {
    handlers::add_fields(service, json).await
}

async fn delete_field_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    json: Json<FieldDeleteRequest>,
) -> Result<Json<MessageResponse>, Problem> {
    handlers::delete_field(service, json).await
}

async fn delete_category_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    json: Json<CategoryDelete>,
) -> Result<Json<MessageResponse>, Problem> {
    handlers::delete_category(service, json).await
}

async fn update_category_fields_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    query: Query<TableQuery>,
) -> Result<Json<BackfillResponse>, Problem> {
    handlers::update_category_fields(service, query).await
}

async fn check_drift_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    Path(name): Path<String>,
) -> Result<Json<DriftReportDto>, Problem> {
    handlers::check_drift(service, name).await
}

async fn reconcile_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    Path(name): Path<String>,
) -> Result<Json<DriftReportDto>, Problem> {
    handlers::reconcile(service, name).await
}

async fn add_asset_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    json: Json<AssetInput>,
) -> Result<(StatusCode, Json<MessageResponse>), Problem> {
    handlers::add_asset(service, json).await
}

async fn search_asset_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    query: Query<AssetQuery>,
) -> Result<Json<SearchResponse>, Problem> {
    handlers::search_asset(service, query).await
}

async fn delete_asset_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    query: Query<AssetQuery>,
) -> Result<Json<MessageResponse>, Problem> {
    handlers::delete_asset(service, query).await
}

async fn reassign_asset_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    json: Json<ReassignAssetInput>,
) -> Result<Json<ReassignResponse>, Problem> {
    handlers::reassign_asset(service, json).await
}

async fn dashboard_stats_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
) -> Result<Json<DashboardStatsDto>, Problem> {
    handlers::dashboard_stats(service).await
}

async fn upload_excel_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    multipart: Multipart,
) -> Result<Json<ImportResponse>, Problem> {
    handlers::upload_excel(service, multipart).await
}

async fn download_table_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
    query: Query<TableQuery>,
) -> Result<Response, Problem> {
    handlers::download_table(service, query).await
}

async fn download_all_tables_handler(
    _admin: AdminUser,
    Extension(service): Extension<Arc<Service>>,
) -> Result<Response, Problem> {
    handlers::download_all_tables(service).await
}

async fn register_handler(
    Extension(gate): Extension<Arc<AuthGate>>,
    json: Json<UserCreate>,
) -> Result<(StatusCode, Json<UserDto>), Problem> {
    handlers::register(gate, json).await
}

async fn login_handler(
    Extension(gate): Extension<Arc<AuthGate>>,
    json: Json<UserLogin>,
) -> Result<Json<TokenResponse>, Problem> {
    handlers::login(gate, json).await
}

async fn admin_only_handler(AdminUser(principal): AdminUser) -> Json<MessageResponse> {
    handlers::admin_only(&principal.username)
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
