//! Configuration for the asset inventory
//!
//! Layered with figment: built-in defaults, then an optional YAML file,
//! then `INVENTORY_` environment variables (`__` separates sections, e.g.
//! `INVENTORY_AUTH__JWT_SECRET`).

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Asset inventory configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

impl Config {
    /// Load configuration from defaults, `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            // INVENTORY_CONFIG names the file itself, not a setting
            .merge(Env::prefixed("INVENTORY_").ignore(&["config"]).split("__"))
            .extract()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Postgres or SQLite connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HS256 signing secret
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Access token lifetime (minutes)
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_minutes: default_token_ttl_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; an explicit empty list allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Maximum accepted spreadsheet upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_database_url() -> String {
    "sqlite://inventory.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_jwt_secret() -> String {
    "change-me".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    120
}

fn default_log_filter() -> String {
    "info,asset_inventory=debug".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024 // 20MB
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    // Config::load reads the process environment; Jail serializes tests that touch it.

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_| {
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.auth.token_ttl_minutes, 120);
            assert_eq!(config.server.bind_addr, "127.0.0.1:8000");
            assert_eq!(config.cors.allowed_origins, vec!["http://localhost:5173"]);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_and_config_path_variable() {
        Jail::expect_with(|jail| {
            jail.set_env("INVENTORY_CONFIG", "inventory.yaml");
            jail.set_env("INVENTORY_AUTH__TOKEN_TTL_MINUTES", "30");

            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.auth.token_ttl_minutes, 30);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "inventory.yaml",
                "database:\n  url: postgres://localhost/assets\nauth:\n  token_ttl_minutes: 15\n",
            )?;
            let path = jail.directory().join("inventory.yaml");

            let config = Config::load(Some(&path)).map_err(|e| e.to_string())?;
            assert_eq!(config.database.url, "postgres://localhost/assets");
            assert_eq!(config.database.max_connections, 10);
            assert_eq!(config.auth.token_ttl_minutes, 15);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_keys_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("inventory.yaml", "server:\n  port: 80\n")?;
            let path = jail.directory().join("inventory.yaml");

            assert!(Config::load(Some(&path)).is_err());
            Ok(())
        });
    }
}
