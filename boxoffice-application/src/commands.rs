// Write-side use cases

pub mod purchase_commands;

pub use purchase_commands::*;
