// Inventory allocation inside a purchase scope

pub mod capacity_allocator;
pub mod seat_allocator;
pub mod section_resolver;
pub mod strategy;

pub use capacity_allocator::CapacityAllocator;
pub use seat_allocator::{SeatAllocator, SectionClaim};
pub use section_resolver::SectionResolver;
pub use strategy::{
    strategy_for, AllocationContext, AllocationOutcome, AllocationStrategy, CapacityAllocation,
    SeatedAllocation,
};
