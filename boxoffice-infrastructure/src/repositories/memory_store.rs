use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use boxoffice_domain::ports::{InventoryStore, LedgerReader, StoreScope};
use boxoffice_domain::{
    summarize_tickets, CapacitySnapshot, CategoryId, Event, EventId, EventSummary, LineItem,
    NewTransaction, Purchaser, PurchaserId, PurchaserSummary, PurchaserTransaction,
    SeatCoordinate, SeatState, Section, SectionId, SectionLayout, TicketCategory, TicketDetail,
    TransactionFilter, TransactionHeader, TransactionId, TransactionListing, TransactionRecord,
    Venue, VenueId, VenueSummary, GENERAL_ADMISSION_SECTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatRecord {
    pub state: SeatState,
    pub transaction_id: Option<TransactionId>,
}

#[derive(Debug, Clone, PartialEq)]
struct DetailRow {
    transaction_id: TransactionId,
    item: LineItem,
}

#[derive(Debug, Clone, Default)]
struct Inventory {
    venues: HashMap<VenueId, Venue>,
    purchasers: HashMap<PurchaserId, Purchaser>,
    categories: HashMap<CategoryId, TicketCategory>,
    events: HashMap<EventId, Event>,
    sections: BTreeMap<SectionId, Section>,
    seats: HashMap<(SectionId, SeatCoordinate), SeatRecord>,
    transactions: BTreeMap<TransactionId, TransactionHeader>,
    details: Vec<DetailRow>,
    last_transaction_id: i64,
}

impl Inventory {
    fn general_admission(&mut self, event_id: EventId) -> Option<&mut Section> {
        self.sections.values_mut().find(|section| {
            section.event_id == event_id
                && section.name == GENERAL_ADMISSION_SECTION
                && matches!(section.layout, SectionLayout::Aggregate { .. })
        })
    }

    fn details_of(&self, transaction_id: TransactionId) -> Result<Vec<TicketDetail>> {
        self.details
            .iter()
            .filter(|row| row.transaction_id == transaction_id)
            .map(|row| {
                let category = self
                    .categories
                    .get(&row.item.category_id)
                    .ok_or_else(|| anyhow!("unknown ticket category {}", row.item.category_id))?;
                Ok(TicketDetail {
                    category_id: row.item.category_id,
                    category_name: category.name.clone(),
                    quantity: row.item.quantity,
                    unit_price: row.item.unit_price,
                    subtotal: row.item.subtotal,
                })
            })
            .collect()
    }

    fn catalog_of(&self, header: &TransactionHeader) -> Result<(&Event, &Venue)> {
        let event = self
            .events
            .get(&header.event_id)
            .ok_or_else(|| anyhow!("transaction {} references unknown event", header.id))?;
        let venue = self
            .venues
            .get(&event.venue_id)
            .ok_or_else(|| anyhow!("event {} references unknown venue", event.id))?;
        Ok((event, venue))
    }

    fn purchaser_of(&self, header: &TransactionHeader) -> Option<&Purchaser> {
        header
            .purchaser_id
            .and_then(|id| self.purchasers.get(&id))
    }

    /// Headers ordered newest first.
    fn headers_newest_first(&self) -> Vec<&TransactionHeader> {
        let mut headers = self.transactions.values().collect::<Vec<_>>();
        headers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        headers
    }
}

/// Process-local store. A scope holds the only lock on the inventory and
/// edits a private copy that replaces the shared state on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Inventory>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_venue(&self, venue: Venue) {
        self.state.lock().await.venues.insert(venue.id, venue);
    }

    pub async fn add_purchaser(&self, purchaser: Purchaser) {
        self.state
            .lock()
            .await
            .purchasers
            .insert(purchaser.id, purchaser);
    }

    pub async fn add_category(&self, category: TicketCategory) {
        self.state
            .lock()
            .await
            .categories
            .insert(category.id, category);
    }

    pub async fn add_event(&self, event: Event) {
        self.state.lock().await.events.insert(event.id, event);
    }

    /// Registers a section; grid sections get every seat created available.
    pub async fn add_section(&self, section: Section) {
        let mut inventory = self.state.lock().await;
        if let SectionLayout::Grid { rows, columns } = section.layout {
            for row in 1..=rows {
                for column in 1..=columns {
                    inventory.seats.insert(
                        (section.id, SeatCoordinate::new(row, column)),
                        SeatRecord {
                            state: SeatState::Available,
                            transaction_id: None,
                        },
                    );
                }
            }
        }
        inventory.sections.insert(section.id, section);
    }

    pub async fn section(&self, section_id: SectionId) -> Option<Section> {
        self.state.lock().await.sections.get(&section_id).cloned()
    }

    pub async fn seat(&self, section_id: SectionId, seat: SeatCoordinate) -> Option<SeatRecord> {
        self.state
            .lock()
            .await
            .seats
            .get(&(section_id, seat))
            .copied()
    }

    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }

    pub async fn detail_count(&self) -> usize {
        self.state.lock().await.details.len()
    }
}

pub struct MemoryScope {
    shared: OwnedMutexGuard<Inventory>,
    working: Inventory,
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreScope>> {
        let shared = self.state.clone().lock_owned().await;
        let working = shared.clone();
        Ok(Box::new(MemoryScope { shared, working }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl StoreScope for MemoryScope {
    async fn load_event(&mut self, event_id: EventId) -> Result<Option<Event>> {
        Ok(self.working.events.get(&event_id).cloned())
    }

    async fn insert_transaction(&mut self, header: &NewTransaction) -> Result<TransactionId> {
        if !self.working.events.contains_key(&header.event_id) {
            return Err(anyhow!("unknown event {}", header.event_id));
        }
        if let Some(purchaser_id) = header.purchaser_id {
            if !self.working.purchasers.contains_key(&purchaser_id) {
                return Err(anyhow!("unknown purchaser {}", purchaser_id));
            }
        }
        self.working.last_transaction_id += 1;
        let id = TransactionId(self.working.last_transaction_id);
        self.working.transactions.insert(
            id,
            TransactionHeader {
                id,
                purchaser_id: header.purchaser_id,
                event_id: header.event_id,
                payment_method: header.payment_method.clone(),
                total_paid: header.total_paid,
                status: header.status,
                created_at: Utc::now(),
                payment_reference: header.payment_reference.clone(),
                selected_seats: header.selected_seats.clone(),
                visit_date: header.visit_date,
            },
        );
        Ok(id)
    }

    async fn insert_transaction_details(
        &mut self,
        transaction_id: TransactionId,
        items: &[LineItem],
    ) -> Result<()> {
        if !self.working.transactions.contains_key(&transaction_id) {
            return Err(anyhow!("unknown transaction {}", transaction_id));
        }
        for item in items {
            if !self.working.categories.contains_key(&item.category_id) {
                return Err(anyhow!("unknown ticket category {}", item.category_id));
            }
            self.working.details.push(DetailRow {
                transaction_id,
                item: item.clone(),
            });
        }
        Ok(())
    }

    async fn find_section(
        &mut self,
        event_id: EventId,
        name: &str,
        subsection: Option<&str>,
    ) -> Result<Option<SectionId>> {
        Ok(self
            .working
            .sections
            .values()
            .find(|section| {
                section.event_id == event_id
                    && section.name.eq_ignore_ascii_case(name)
                    && subsection.map_or(true, |wanted| {
                        section
                            .subsection
                            .as_deref()
                            .is_some_and(|stored| stored.eq_ignore_ascii_case(wanted))
                    })
            })
            .map(|section| section.id))
    }

    async fn claim_seat(
        &mut self,
        transaction_id: TransactionId,
        section_id: SectionId,
        seat: SeatCoordinate,
    ) -> Result<u64> {
        match self.working.seats.get_mut(&(section_id, seat)) {
            Some(record) if record.state == SeatState::Available => {
                record.state = SeatState::Occupied;
                record.transaction_id = Some(transaction_id);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn add_section_occupancy(&mut self, section_id: SectionId, count: u32) -> Result<u64> {
        match self.working.sections.get_mut(&section_id) {
            Some(section) => {
                section.occupied_count = section.occupied_count.saturating_add(count);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn add_capacity_occupancy(&mut self, event_id: EventId, quantity: u32) -> Result<u64> {
        let Some(section) = self.working.general_admission(event_id) else {
            return Ok(0);
        };
        let total = section.layout.capacity_total();
        match section.occupied_count.checked_add(quantity) {
            Some(next) if next <= total => {
                section.occupied_count = next;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn capacity_snapshot(&mut self, event_id: EventId) -> Result<Option<CapacitySnapshot>> {
        Ok(self
            .working
            .general_admission(event_id)
            .map(|section| CapacitySnapshot {
                section_id: section.id,
                capacity_total: section.layout.capacity_total(),
                occupied_count: section.occupied_count,
            }))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryScope {
            mut shared,
            working,
        } = *self;
        *shared = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl LedgerReader for MemoryStore {
    async fn fetch_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<TransactionRecord>> {
        let inventory = self.state.lock().await;
        let Some(header) = inventory.transactions.get(&transaction_id) else {
            return Ok(None);
        };
        let (event, venue) = inventory.catalog_of(header)?;
        Ok(Some(TransactionRecord {
            header: header.clone(),
            event: EventSummary {
                name: event.name.clone(),
                starts_at: event.starts_at,
            },
            venue: VenueSummary {
                name: venue.name.clone(),
                location: venue.location.clone(),
            },
            purchaser: inventory.purchaser_of(header).map(|purchaser| PurchaserSummary {
                name: purchaser.name.clone(),
                email: purchaser.email.clone(),
            }),
            details: inventory.details_of(transaction_id)?,
        }))
    }

    async fn fetch_by_purchaser(&self, purchaser_id: PurchaserId) -> Result<Vec<PurchaserTransaction>> {
        let inventory = self.state.lock().await;
        inventory
            .headers_newest_first()
            .into_iter()
            .filter(|header| header.purchaser_id == Some(purchaser_id))
            .map(|header| {
                let (event, venue) = inventory.catalog_of(header)?;
                let details = inventory.details_of(header.id)?;
                let summary = summarize_tickets(&details);
                Ok(PurchaserTransaction {
                    header: header.clone(),
                    event_name: event.name.clone(),
                    event_starts_at: event.starts_at,
                    venue_name: venue.name.clone(),
                    venue_location: venue.location.clone(),
                    purchaser_name: inventory
                        .purchaser_of(header)
                        .map(|purchaser| purchaser.name.clone()),
                    details,
                    total_tickets: summary.total_tickets,
                    total_categories: summary.total_categories,
                })
            })
            .collect()
    }

    async fn fetch_all(&self, filter: &TransactionFilter) -> Result<Vec<TransactionListing>> {
        let inventory = self.state.lock().await;
        inventory
            .headers_newest_first()
            .into_iter()
            .filter(|header| filter.matches(header))
            .map(|header| {
                let (event, venue) = inventory.catalog_of(header)?;
                let details = inventory.details_of(header.id)?;
                let summary = summarize_tickets(&details);
                Ok(TransactionListing {
                    header: header.clone(),
                    event_name: event.name.clone(),
                    event_starts_at: event.starts_at,
                    venue_name: venue.name.clone(),
                    purchaser_name: inventory
                        .purchaser_of(header)
                        .map(|purchaser| purchaser.name.clone()),
                    total_categories: summary.total_categories,
                    total_tickets: summary.total_tickets,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use boxoffice_domain::{EventKind, TransactionStatus};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_venue(Venue {
                id: VenueId(1),
                name: "Museo Nacional".to_string(),
                location: "Centro".to_string(),
            })
            .await;
        let starts_at = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("timestamp");
        store
            .add_event(Event {
                id: EventId(1),
                venue_id: VenueId(1),
                kind: EventKind::Museum,
                name: "Exposicion".to_string(),
                starts_at,
                ends_at: starts_at,
                capacity: 100,
                active: true,
            })
            .await;
        store
            .add_section(Section {
                id: SectionId(1),
                event_id: EventId(1),
                name: GENERAL_ADMISSION_SECTION.to_string(),
                subsection: None,
                layout: SectionLayout::Aggregate { capacity_total: 100 },
                occupied_count: 0,
                category_id: CategoryId(1),
            })
            .await;
        store
    }

    fn header() -> NewTransaction {
        NewTransaction {
            purchaser_id: None,
            event_id: EventId(1),
            payment_method: None,
            total_paid: Decimal::new(10, 0),
            status: TransactionStatus::Completed,
            payment_reference: None,
            selected_seats: Vec::new(),
            visit_date: None,
        }
    }

    #[tokio::test]
    async fn dropped_scope_discards_writes() {
        let store = seeded().await;
        {
            let mut scope = store.begin().await.expect("begin");
            scope.insert_transaction(&header()).await.expect("insert");
            scope
                .add_capacity_occupancy(EventId(1), 5)
                .await
                .expect("increment");
        }
        assert_eq!(store.transaction_count().await, 0);
        let section = store.section(SectionId(1)).await.expect("section");
        assert_eq!(section.occupied_count, 0);
    }

    #[tokio::test]
    async fn committed_scope_publishes_writes() {
        let store = seeded().await;
        let mut scope = store.begin().await.expect("begin");
        let id = scope.insert_transaction(&header()).await.expect("insert");
        assert_eq!(
            scope
                .add_capacity_occupancy(EventId(1), 5)
                .await
                .expect("increment"),
            1
        );
        scope.commit().await.expect("commit");

        assert_eq!(id, TransactionId(1));
        assert_eq!(store.transaction_count().await, 1);
        let section = store.section(SectionId(1)).await.expect("section");
        assert_eq!(section.occupied_count, 5);
    }

    #[tokio::test]
    async fn bounded_increment_refuses_overflow() {
        let store = seeded().await;
        let mut scope = store.begin().await.expect("begin");
        assert_eq!(
            scope
                .add_capacity_occupancy(EventId(1), 101)
                .await
                .expect("increment"),
            0
        );
        let snapshot = scope
            .capacity_snapshot(EventId(1))
            .await
            .expect("snapshot")
            .expect("section exists");
        assert_eq!(snapshot.available(), 100);
    }

    #[tokio::test]
    async fn details_require_known_categories() {
        let store = seeded().await;
        let mut scope = store.begin().await.expect("begin");
        let id = scope.insert_transaction(&header()).await.expect("insert");
        let result = scope
            .insert_transaction_details(
                id,
                &[LineItem {
                    category_id: CategoryId(42),
                    quantity: 1,
                    unit_price: Decimal::new(10, 0),
                    subtotal: Decimal::new(10, 0),
                }],
            )
            .await;
        assert!(result.is_err());
    }
}
