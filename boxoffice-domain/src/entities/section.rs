// Section entity
// A named subdivision of an event's sellable inventory

use serde::{Deserialize, Serialize};

use crate::value_objects::{CategoryId, EventId, SectionId};

/// Name of the single aggregate section backing a capacity-only event.
pub const GENERAL_ADMISSION_SECTION: &str = "Entrada General";

/// Largest ticket quantity, row or column a store can hold (signed 32-bit
/// columns).
pub const MAX_INVENTORY_COUNT: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SectionLayout {
    Grid { rows: u32, columns: u32 },
    Aggregate { capacity_total: u32 },
}

impl SectionLayout {
    pub fn capacity_total(&self) -> u32 {
        match self {
            SectionLayout::Grid { rows, columns } => rows.saturating_mul(*columns),
            SectionLayout::Aggregate { capacity_total } => *capacity_total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub event_id: EventId,
    pub name: String,
    pub subsection: Option<String>,
    pub layout: SectionLayout,
    pub occupied_count: u32,
    pub category_id: CategoryId,
}

impl Section {
    pub fn available(&self) -> u32 {
        self.layout.capacity_total().saturating_sub(self.occupied_count)
    }
}

/// Counter state of a capacity-only section as seen inside a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub section_id: SectionId,
    pub capacity_total: u32,
    pub occupied_count: u32,
}

impl CapacitySnapshot {
    pub fn available(&self) -> u32 {
        self.capacity_total.saturating_sub(self.occupied_count)
    }
}
