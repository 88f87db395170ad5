//! Module assembly: migrations, repositories, service and router

use crate::config::Config;
use crate::domain::Service;
use crate::infra::auth::AuthGate;
use crate::infra::storage::repositories::{
    SeaOrmAssetRepository, SeaOrmCatalogRepository, SeaOrmUserRepository,
};
use anyhow::Result;
use axum::http::HeaderValue;
use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Asset inventory module
pub struct InventoryModule {
    config: Config,
    service: Arc<Service>,
    gate: Arc<AuthGate>,
}

impl InventoryModule {
    /// Run migrations and build the service graph on top of `db`
    pub async fn init(config: Config, db: DatabaseConnection) -> Result<Self> {
        Self::migrate(&db).await?;

        let conn = Arc::new(db);

        // Build repositories
        let catalog = Arc::new(SeaOrmCatalogRepository::new(conn.clone()));
        let assets = Arc::new(SeaOrmAssetRepository::new(conn.clone()));
        let users = Arc::new(SeaOrmUserRepository::new(conn));

        // Build domain service and auth gate
        let service = Arc::new(Service::new(catalog, assets, users.clone()));
        let gate = Arc::new(AuthGate::new(users, &config.auth));

        tracing::info!("Asset inventory initialized");
        Ok(Self {
            config,
            service,
            gate,
        })
    }

    async fn migrate(db: &DatabaseConnection) -> Result<()> {
        use crate::infra::storage::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        Migrator::up(db, None).await?;
        tracing::info!("Asset inventory migrations completed");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn auth_gate(&self) -> Arc<AuthGate> {
        self.gate.clone()
    }

    /// REST router with CORS and request tracing applied
    pub fn router(&self) -> Result<Router> {
        tracing::info!("Registering asset inventory REST routes");
        let router = crate::api::rest::routes::register_routes(
            Router::new(),
            self.service.clone(),
            self.gate.clone(),
            self.config.import.max_upload_bytes,
        );

        Ok(router
            .layer(self.cors_layer()?)
            .layer(TraceLayer::new_for_http()))
    }

    fn cors_layer(&self) -> Result<CorsLayer> {
        let origins = &self.config.cors.allowed_origins;
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if origins.is_empty() {
            return Ok(layer.allow_origin(Any));
        }

        let origins = origins
            .iter()
            .map(|origin| HeaderValue::from_str(origin))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(layer.allow_origin(origins))
    }
}
