// Port traits implemented by infrastructure:
// the transactional inventory store, ledger projections and health checks

pub mod repositories;
pub mod services;

pub use repositories::*;
pub use services::*;
