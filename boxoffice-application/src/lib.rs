// Boxoffice Application Layer

pub mod allocation;
pub mod commands;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod queries;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AppError, ReasonCode};
pub use ledger::LedgerWriter;
pub use metrics::Metrics;
pub use state::AppState;
