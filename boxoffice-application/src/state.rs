use std::sync::Arc;

use boxoffice_domain::ports::{HealthCheckService, InventoryStore, LedgerReader};
use boxoffice_domain::RuntimeConfig;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub store: Arc<dyn InventoryStore>,
    pub ledger: Arc<dyn LedgerReader>,
    pub health: Arc<dyn HealthCheckService>,
    pub metrics: Arc<Metrics>,
}
