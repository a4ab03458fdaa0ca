use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use boxoffice_application::{AppState, Metrics};
use boxoffice_domain::ports::{InventoryStore, LedgerReader};
use boxoffice_domain::{RuntimeConfig, StorageBackend};
use boxoffice_infrastructure::{AppConfig, DefaultHealthService, MemoryStore, PgInventoryStore};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let state = match db_config.storage {
            StorageBackend::Postgres => {
                let store = Arc::new(PgInventoryStore::connect(&db_config).await?);
                store.ensure_schema().await?;
                info!(
                    "postgres store ready (max {} connections)",
                    db_config.max_connections
                );
                assemble(runtime_config, store)
            }
            StorageBackend::Memory => {
                warn!(
                    "using in-memory store: it starts with an empty catalog and is meant for tests; \
                     inventory and ledger are lost on shutdown"
                );
                assemble(runtime_config, Arc::new(MemoryStore::new()))
            }
        };

        Ok(Self { state })
    }
}

fn assemble<S>(config: RuntimeConfig, store: Arc<S>) -> AppState
where
    S: InventoryStore + LedgerReader + 'static,
{
    AppState {
        config,
        store: store.clone(),
        ledger: store.clone(),
        health: Arc::new(DefaultHealthService::new(store)),
        metrics: Arc::new(Metrics::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_application::commands::create_transaction;
    use boxoffice_application::AppError;
    use boxoffice_domain::{CategoryId, EventId, EventKind, LineItemInput, PurchaseRequest};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn memory_backend_starts_with_an_empty_catalog() {
        let config = AppConfig {
            storage: StorageBackend::Memory,
            ..AppConfig::default()
        };
        let context = AppContext::new(&config).await.expect("memory context");

        let request = PurchaseRequest {
            event_id: Some(EventId(1)),
            line_items: Some(vec![LineItemInput {
                category_id: Some(CategoryId(1)),
                quantity: Some(1),
                unit_price: Some(Decimal::new(10, 0)),
                subtotal: Some(Decimal::new(10, 0)),
            }]),
            event_kind: Some(EventKind::Museum),
            ..PurchaseRequest::default()
        };
        let err = create_transaction(&context.state, request)
            .await
            .expect_err("nothing seeded");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
