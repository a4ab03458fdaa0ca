use std::sync::Arc;

use async_trait::async_trait;
use boxoffice_domain::ports::{HealthCheckService, InventoryStore};

pub struct DefaultHealthService {
    store: Arc<dyn InventoryStore>,
}

impl DefaultHealthService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_database(&self) -> anyhow::Result<bool> {
        self.store.ping().await.map(|_| true)
    }
}
