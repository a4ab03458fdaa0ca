use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use boxoffice_domain::{DbConfig, RuntimeConfig, StorageBackend};

use crate::config::validate_database_url;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub log_format: String,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            storage: StorageBackend::Postgres,
            database_url: "postgres://localhost:5432/boxoffice".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 5,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            default_page_limit: 50,
            max_page_limit: 200,
            log_format: "text".to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("BOXOFFICE_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml_str(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.bind_addr = self.bind_addr.trim().to_string();
        self.database_url = self.database_url.trim().to_string();
        self.log_format = self.log_format.trim().to_lowercase();
        if let Some(dir) = &self.log_dir {
            if dir.trim().is_empty() {
                self.log_dir = None;
            }
        }
        if self.max_page_limit == 0 {
            self.max_page_limit = 1;
        }
        self.default_page_limit = self.default_page_limit.clamp(1, self.max_page_limit);
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.storage == StorageBackend::Postgres {
            validate_database_url(&self.database_url)?;
            if self.max_connections == 0 {
                return Err(anyhow!("max_connections must be greater than 0"));
            }
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if self.log_format != "text" && self.log_format != "json" {
            return Err(anyhow!("log_format must be text or json"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            default_page_limit: self.default_page_limit,
            max_page_limit: self.max_page_limit,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            storage: self.storage,
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
            acquire_timeout_seconds: self.acquire_timeout_seconds,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("BOXOFFICE_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("BOXOFFICE_STORAGE") {
            self.storage = parse_storage(&value).unwrap_or(self.storage);
        }
        if let Ok(value) = env::var("BOXOFFICE_DATABASE_URL") {
            self.database_url = value;
        }
        if let Ok(value) = env::var("BOXOFFICE_MAX_CONNECTIONS") {
            self.max_connections = value.parse().unwrap_or(self.max_connections);
        }
        if let Ok(value) = env::var("BOXOFFICE_ACQUIRE_TIMEOUT_SECONDS") {
            self.acquire_timeout_seconds = value.parse().unwrap_or(self.acquire_timeout_seconds);
        }
        if let Ok(value) = env::var("BOXOFFICE_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("BOXOFFICE_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("BOXOFFICE_DEFAULT_PAGE_LIMIT") {
            self.default_page_limit = value.parse().unwrap_or(self.default_page_limit);
        }
        if let Ok(value) = env::var("BOXOFFICE_MAX_PAGE_LIMIT") {
            self.max_page_limit = value.parse().unwrap_or(self.max_page_limit);
        }
        if let Ok(value) = env::var("BOXOFFICE_LOG_FORMAT") {
            self.log_format = value;
        }
        if let Ok(value) = env::var("BOXOFFICE_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn parse_storage(value: &str) -> Option<StorageBackend> {
    match value.trim().to_lowercase().as_str() {
        "postgres" | "postgresql" => Some(StorageBackend::Postgres),
        "memory" => Some(StorageBackend::Memory),
        _ => None,
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
