// Domain entities

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod purchase;
pub mod reporting;
pub mod section;

pub use catalog::*;
pub use config::*;
pub use ledger::*;
pub use purchase::*;
pub use reporting::*;
pub use section::*;
