pub mod memory_store;
pub mod postgres_ledger;
pub mod postgres_store;

pub use memory_store::*;
pub use postgres_ledger::*;
pub use postgres_store::*;
