use async_trait::async_trait;
use boxoffice_domain::ports::StoreScope;
use boxoffice_domain::{AllocationMode, EventId, SectionSelection, TransactionId};
use tracing::warn;

use crate::allocation::{CapacityAllocator, SeatAllocator, SectionResolver};
use crate::AppError;

/// What a purchase asks the allocator to reserve.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    pub event_id: EventId,
    pub transaction_id: TransactionId,
    pub selections: &'a [SectionSelection],
    /// Sum of line item quantities.
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationOutcome {
    pub seats_claimed: usize,
    pub admitted: u32,
}

#[async_trait]
pub trait AllocationStrategy: Send + Sync {
    async fn allocate(
        &self,
        scope: &mut dyn StoreScope,
        ctx: &AllocationContext<'_>,
    ) -> Result<AllocationOutcome, AppError>;
}

/// Named seats in resolved sections.
pub struct SeatedAllocation;

/// One aggregate counter per event.
pub struct CapacityAllocation;

static SEATED: SeatedAllocation = SeatedAllocation;
static CAPACITY: CapacityAllocation = CapacityAllocation;

pub fn strategy_for(mode: AllocationMode) -> &'static dyn AllocationStrategy {
    match mode {
        AllocationMode::Seated => &SEATED,
        AllocationMode::CapacityOnly => &CAPACITY,
    }
}

#[async_trait]
impl AllocationStrategy for SeatedAllocation {
    async fn allocate(
        &self,
        scope: &mut dyn StoreScope,
        ctx: &AllocationContext<'_>,
    ) -> Result<AllocationOutcome, AppError> {
        // resolve everything before the first row lock is taken
        let mut requests = Vec::with_capacity(ctx.selections.len());
        for selection in ctx.selections {
            let section_id =
                SectionResolver::resolve(scope, ctx.event_id, &selection.section_key).await?;
            requests.push((section_id, selection.seats.as_slice()));
        }

        let claims =
            SeatAllocator::occupy_sections(scope, ctx.transaction_id, &requests).await?;
        if let Some(claim) = claims.iter().find(|claim| !claim.is_complete()) {
            let section = ctx
                .selections
                .iter()
                .zip(&requests)
                .find(|(_, (section_id, _))| *section_id == claim.section_id)
                .map(|(selection, _)| selection.section_key.clone())
                .unwrap_or_else(|| claim.section_id.to_string());
            warn!(
                "{} of {} seats unavailable in section {}",
                claim.conflicts.len(),
                claim.requested,
                section
            );
            return Err(AppError::SeatConflict {
                section,
                seats: claim.conflicts.clone(),
            });
        }

        Ok(AllocationOutcome {
            seats_claimed: claims.iter().map(|claim| claim.claimed.len()).sum(),
            admitted: ctx.quantity,
        })
    }
}

#[async_trait]
impl AllocationStrategy for CapacityAllocation {
    async fn allocate(
        &self,
        scope: &mut dyn StoreScope,
        ctx: &AllocationContext<'_>,
    ) -> Result<AllocationOutcome, AppError> {
        CapacityAllocator::increment(scope, ctx.event_id, ctx.quantity).await?;
        Ok(AllocationOutcome {
            seats_claimed: 0,
            admitted: ctx.quantity,
        })
    }
}
