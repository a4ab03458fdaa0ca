use std::fmt;

use async_trait::async_trait;

use crate::entities::{
    CapacitySnapshot, Event, LineItem, NewTransaction, PurchaserTransaction, TransactionFilter,
    TransactionListing, TransactionRecord,
};
use crate::value_objects::{EventId, PurchaserId, SeatCoordinate, SectionId, TransactionId};

/// A store aborted the scope because it collided with a concurrent scope
/// (lock cycle or serialization failure). Nothing from the scope persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreContention(pub String);

impl fmt::Display for StoreContention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "concurrent purchase collision: {}", self.0)
    }
}

impl std::error::Error for StoreContention {}

/// Transactional store holding seats, section counters and the ledger.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;

    /// Opens an atomic scope. Dropping the scope without committing
    /// discards every write made through it.
    async fn begin(&self) -> anyhow::Result<Box<dyn StoreScope>>;

    async fn ping(&self) -> anyhow::Result<()>;
}

/// One atomic unit of work. Calls are issued sequentially by a single
/// purchase; nothing written here is visible to other scopes before commit.
#[async_trait]
pub trait StoreScope: Send {
    async fn load_event(&mut self, event_id: EventId) -> anyhow::Result<Option<Event>>;

    async fn insert_transaction(&mut self, header: &NewTransaction) -> anyhow::Result<TransactionId>;

    async fn insert_transaction_details(
        &mut self,
        transaction_id: TransactionId,
        items: &[LineItem],
    ) -> anyhow::Result<()>;

    async fn find_section(
        &mut self,
        event_id: EventId,
        name: &str,
        subsection: Option<&str>,
    ) -> anyhow::Result<Option<SectionId>>;

    /// Conditional update `available -> occupied`. Returns rows affected.
    async fn claim_seat(
        &mut self,
        transaction_id: TransactionId,
        section_id: SectionId,
        seat: SeatCoordinate,
    ) -> anyhow::Result<u64>;

    async fn add_section_occupancy(&mut self, section_id: SectionId, count: u32) -> anyhow::Result<u64>;

    /// Increments the general-admission counter of `event_id` by `quantity`
    /// only if the result stays within capacity. Returns rows affected.
    async fn add_capacity_occupancy(&mut self, event_id: EventId, quantity: u32) -> anyhow::Result<u64>;

    async fn capacity_snapshot(&mut self, event_id: EventId) -> anyhow::Result<Option<CapacitySnapshot>>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;

    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}

/// Read projections over committed transactions.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn fetch_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> anyhow::Result<Option<TransactionRecord>>;

    async fn fetch_by_purchaser(
        &self,
        purchaser_id: PurchaserId,
    ) -> anyhow::Result<Vec<PurchaserTransaction>>;

    /// All matching rows, newest first. Pagination is applied by the caller.
    async fn fetch_all(&self, filter: &TransactionFilter) -> anyhow::Result<Vec<TransactionListing>>;
}
