// Runtime configuration shared across layers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            default_page_limit: 50,
            max_page_limit: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Test backend; starts with an empty catalog and nothing loads one.
    Memory,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}
