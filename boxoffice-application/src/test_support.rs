// In-process scope used by the allocation unit tests

use std::collections::HashMap;

use async_trait::async_trait;
use boxoffice_domain::ports::StoreScope;
use boxoffice_domain::{
    CapacitySnapshot, Event, EventId, LineItem, NewTransaction, SeatCoordinate, SectionId,
    TransactionId,
};

/// Row-locking statements in the order they were issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Write {
    Seat(SectionId, SeatCoordinate),
    Counter(SectionId, u32),
}

#[derive(Default)]
pub(crate) struct FakeScope {
    sections: Vec<(SectionId, EventId, String, Option<String>)>,
    seats: HashMap<(SectionId, SeatCoordinate), Option<TransactionId>>,
    occupancy: HashMap<SectionId, u32>,
    capacity: HashMap<EventId, (SectionId, u32)>,
    pub transactions: Vec<NewTransaction>,
    pub details: Vec<(TransactionId, LineItem)>,
    pub occupancy_updates: usize,
    pub writes: Vec<Write>,
}

impl FakeScope {
    pub fn add_section(
        &mut self,
        id: SectionId,
        event_id: EventId,
        name: &str,
        subsection: Option<&str>,
    ) {
        self.sections.push((
            id,
            event_id,
            name.to_string(),
            subsection.map(str::to_string),
        ));
        self.occupancy.entry(id).or_insert(0);
    }

    pub fn add_grid(&mut self, section_id: SectionId, rows: u32, columns: u32) {
        for row in 1..=rows {
            for column in 1..=columns {
                self.seats
                    .insert((section_id, SeatCoordinate::new(row, column)), None);
            }
        }
    }

    pub fn occupy_seat(&mut self, section_id: SectionId, seat: SeatCoordinate, holder: TransactionId) {
        self.seats.insert((section_id, seat), Some(holder));
        *self.occupancy.entry(section_id).or_insert(0) += 1;
    }

    pub fn add_capacity(&mut self, event_id: EventId, section_id: SectionId, total: u32, occupied: u32) {
        self.capacity.insert(event_id, (section_id, total));
        self.occupancy.insert(section_id, occupied);
    }

    pub fn occupancy_of(&self, section_id: SectionId) -> u32 {
        self.occupancy.get(&section_id).copied().unwrap_or(0)
    }

    pub fn holder_of(&self, section_id: SectionId, seat: SeatCoordinate) -> Option<TransactionId> {
        self.seats.get(&(section_id, seat)).copied().flatten()
    }
}

#[async_trait]
impl StoreScope for FakeScope {
    async fn load_event(&mut self, _event_id: EventId) -> anyhow::Result<Option<Event>> {
        Ok(None)
    }

    async fn insert_transaction(&mut self, header: &NewTransaction) -> anyhow::Result<TransactionId> {
        self.transactions.push(header.clone());
        Ok(TransactionId(self.transactions.len() as i64))
    }

    async fn insert_transaction_details(
        &mut self,
        transaction_id: TransactionId,
        items: &[LineItem],
    ) -> anyhow::Result<()> {
        self.details
            .extend(items.iter().cloned().map(|item| (transaction_id, item)));
        Ok(())
    }

    async fn find_section(
        &mut self,
        event_id: EventId,
        name: &str,
        subsection: Option<&str>,
    ) -> anyhow::Result<Option<SectionId>> {
        Ok(self
            .sections
            .iter()
            .find(|(_, event, section_name, sub)| {
                *event == event_id
                    && section_name.eq_ignore_ascii_case(name)
                    && (subsection.is_none() || sub.as_deref() == subsection)
            })
            .map(|(id, ..)| *id))
    }

    async fn claim_seat(
        &mut self,
        transaction_id: TransactionId,
        section_id: SectionId,
        seat: SeatCoordinate,
    ) -> anyhow::Result<u64> {
        self.writes.push(Write::Seat(section_id, seat));
        match self.seats.get_mut(&(section_id, seat)) {
            Some(holder) if holder.is_none() => {
                *holder = Some(transaction_id);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn add_section_occupancy(&mut self, section_id: SectionId, count: u32) -> anyhow::Result<u64> {
        self.occupancy_updates += 1;
        self.writes.push(Write::Counter(section_id, count));
        match self.occupancy.get_mut(&section_id) {
            Some(occupied) => {
                *occupied += count;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn add_capacity_occupancy(&mut self, event_id: EventId, quantity: u32) -> anyhow::Result<u64> {
        let Some((section_id, total)) = self.capacity.get(&event_id).copied() else {
            return Ok(0);
        };
        let occupied = self.occupancy.entry(section_id).or_insert(0);
        if *occupied + quantity > total {
            return Ok(0);
        }
        *occupied += quantity;
        Ok(1)
    }

    async fn capacity_snapshot(&mut self, event_id: EventId) -> anyhow::Result<Option<CapacitySnapshot>> {
        Ok(self
            .capacity
            .get(&event_id)
            .map(|(section_id, total)| CapacitySnapshot {
                section_id: *section_id,
                capacity_total: *total,
                occupied_count: self.occupancy.get(section_id).copied().unwrap_or(0),
            }))
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}
