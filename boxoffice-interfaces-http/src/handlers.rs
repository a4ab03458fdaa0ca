pub mod ops_handlers;
pub mod transaction_handlers;

pub use ops_handlers::*;
pub use transaction_handlers::*;
