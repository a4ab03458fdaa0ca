// Read-side use cases over the ledger

pub mod transaction_queries;

pub use transaction_queries::*;
