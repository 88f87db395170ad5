//! Common test utilities: a migrated SQLite database per test

#![allow(dead_code)]

use asset_inventory::contract::{FieldDef, FieldType, NewUser};
use asset_inventory::domain::Service;
use asset_inventory::infra::auth::AuthGate;
use asset_inventory::{Config, InventoryModule};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use tempfile::TempDir;

/// A fully assembled module on top of a throwaway database file
pub struct TestContext {
    pub module: InventoryModule,
    /// Raw connection for simulating out-of-band schema changes
    pub db: DatabaseConnection,
    _dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("inventory.db").display()
        );
        let db = Database::connect(&url).await.unwrap();

        let mut config = Config::default();
        config.auth.jwt_secret = "test-secret".to_string();

        let module = InventoryModule::init(config, db.clone()).await.unwrap();
        Self {
            module,
            db,
            _dir: dir,
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.module.service()
    }

    pub fn gate(&self) -> Arc<AuthGate> {
        self.module.auth_gate()
    }

    /// Run raw SQL behind the service's back
    pub async fn execute(&self, sql: &str) {
        self.db.execute_unprepared(sql).await.unwrap();
    }

    /// Register a user and return a bearer token for it
    pub async fn token_for(&self, username: &str, role: &str) -> String {
        let mail = format!("{}@example.com", username);
        self.gate()
            .register(NewUser {
                username: username.to_string(),
                mail: mail.clone(),
                password: "s3cret-pass".to_string(),
                role: role.to_string(),
            })
            .await
            .unwrap();
        self.gate()
            .login(&mail, "s3cret-pass")
            .await
            .unwrap()
            .access_token
    }
}

pub fn field(name: &str, field_type: FieldType) -> FieldDef {
    FieldDef::new(name, field_type)
}

/// Laptop category used across tests
pub fn laptop_fields() -> Vec<FieldDef> {
    vec![
        field("Asset Tag", FieldType::String),
        field("RAM GB", FieldType::Integer),
        field("Purchase Date", FieldType::Date),
        field("Asset Status", FieldType::String),
    ]
}

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}
