// Pure domain services

pub mod section_keys;
pub mod ticket_summary;

pub use section_keys::*;
pub use ticket_summary::*;
