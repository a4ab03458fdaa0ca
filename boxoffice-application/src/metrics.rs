use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    purchases_committed: AtomicU64,
    purchases_aborted: AtomicU64,
    seats_claimed: AtomicU64,
    seat_conflicts: AtomicU64,
    capacity_rejections: AtomicU64,
    tickets_sold: AtomicU64,
}

impl Metrics {
    pub fn record_commit(&self, tickets: u32, seats: usize) {
        self.purchases_committed.fetch_add(1, Ordering::Relaxed);
        self.tickets_sold
            .fetch_add(u64::from(tickets), Ordering::Relaxed);
        self.seats_claimed.fetch_add(seats as u64, Ordering::Relaxed);
    }

    pub fn record_abort(&self) {
        self.purchases_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_seat_conflict(&self) {
        self.seat_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capacity_rejection(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn purchases_committed(&self) -> u64 {
        self.purchases_committed.load(Ordering::Relaxed)
    }

    pub fn purchases_aborted(&self) -> u64 {
        self.purchases_aborted.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let committed = self.purchases_committed.load(Ordering::Relaxed);
        let aborted = self.purchases_aborted.load(Ordering::Relaxed);
        let seats = self.seats_claimed.load(Ordering::Relaxed);
        let conflicts = self.seat_conflicts.load(Ordering::Relaxed);
        let rejections = self.capacity_rejections.load(Ordering::Relaxed);
        let tickets = self.tickets_sold.load(Ordering::Relaxed);

        format!(
            "# TYPE boxoffice_purchases_committed_total counter\n\
boxoffice_purchases_committed_total {}\n\
# TYPE boxoffice_purchases_aborted_total counter\n\
boxoffice_purchases_aborted_total {}\n\
# TYPE boxoffice_seats_claimed_total counter\n\
boxoffice_seats_claimed_total {}\n\
# TYPE boxoffice_seat_conflicts_total counter\n\
boxoffice_seat_conflicts_total {}\n\
# TYPE boxoffice_capacity_rejections_total counter\n\
boxoffice_capacity_rejections_total {}\n\
# TYPE boxoffice_tickets_sold_total counter\n\
boxoffice_tickets_sold_total {}\n",
            committed, aborted, seats, conflicts, rejections, tickets
        )
    }
}
