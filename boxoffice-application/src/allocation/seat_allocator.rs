use std::collections::BTreeMap;

use boxoffice_domain::ports::StoreScope;
use boxoffice_domain::{SeatCoordinate, SectionId, TransactionId};
use tracing::debug;

/// Result of claiming the seats requested in one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionClaim {
    pub section_id: SectionId,
    pub requested: usize,
    pub claimed: Vec<SeatCoordinate>,
    /// Seats that were missing or already occupied.
    pub conflicts: Vec<SeatCoordinate>,
}

impl SectionClaim {
    pub fn is_complete(&self) -> bool {
        self.claimed.len() == self.requested
    }
}

pub struct SeatAllocator;

impl SeatAllocator {
    /// Claims one seat for `transaction_id`. `false` when the seat does not
    /// exist or is no longer available.
    pub async fn claim(
        scope: &mut dyn StoreScope,
        transaction_id: TransactionId,
        section_id: SectionId,
        seat: SeatCoordinate,
    ) -> anyhow::Result<bool> {
        let affected = scope.claim_seat(transaction_id, section_id, seat).await?;
        Ok(affected > 0)
    }

    /// Claims every requested seat, then raises the section counter by the
    /// number actually claimed. Conflicting seats are reported, not raised.
    pub async fn occupy(
        scope: &mut dyn StoreScope,
        transaction_id: TransactionId,
        section_id: SectionId,
        seats: &[SeatCoordinate],
    ) -> anyhow::Result<SectionClaim> {
        Self::occupy_sections(scope, transaction_id, &[(section_id, seats)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no claim produced for section {}", section_id))
    }

    /// Multi-section form of [`SeatAllocator::occupy`]. Row locks are always
    /// taken in one global order: seats by (section, row, column), then the
    /// section counters by ascending section id. Two purchases therefore
    /// only ever wait on each other over a seat they both want.
    ///
    /// Requests naming the same section are merged; claims come back one per
    /// section, sorted by section id.
    pub async fn occupy_sections(
        scope: &mut dyn StoreScope,
        transaction_id: TransactionId,
        requests: &[(SectionId, &[SeatCoordinate])],
    ) -> anyhow::Result<Vec<SectionClaim>> {
        let mut ordered: BTreeMap<SectionId, Vec<SeatCoordinate>> = BTreeMap::new();
        for (section_id, seats) in requests {
            ordered.entry(*section_id).or_default().extend_from_slice(seats);
        }

        let mut claims = Vec::with_capacity(ordered.len());
        for (section_id, mut seats) in ordered {
            seats.sort();
            let mut claim = SectionClaim {
                section_id,
                requested: seats.len(),
                claimed: Vec::with_capacity(seats.len()),
                conflicts: Vec::new(),
            };
            for seat in seats {
                if Self::claim(scope, transaction_id, section_id, seat).await? {
                    claim.claimed.push(seat);
                } else {
                    debug!("seat {} in section {} not available", seat, section_id);
                    claim.conflicts.push(seat);
                }
            }
            claims.push(claim);
        }

        for claim in &claims {
            let count = u32::try_from(claim.claimed.len())?;
            if count > 0 {
                scope.add_section_occupancy(claim.section_id, count).await?;
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeScope, Write};
    use boxoffice_domain::EventId;

    #[tokio::test]
    async fn claims_free_seats_and_bumps_counter() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(1), EventId(1), "General", None);
        scope.add_grid(SectionId(1), 2, 2);

        let seats = vec![SeatCoordinate::new(1, 1), SeatCoordinate::new(1, 2)];
        let claim = SeatAllocator::occupy(&mut scope, TransactionId(10), SectionId(1), &seats)
            .await
            .expect("occupy");

        assert!(claim.is_complete());
        assert_eq!(claim.claimed, seats);
        assert_eq!(scope.occupancy_of(SectionId(1)), 2);
        assert_eq!(
            scope.holder_of(SectionId(1), SeatCoordinate::new(1, 2)),
            Some(TransactionId(10))
        );
    }

    #[tokio::test]
    async fn occupied_and_missing_seats_are_conflicts() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(1), EventId(1), "Platea", None);
        scope.add_grid(SectionId(1), 3, 5);
        scope.occupy_seat(SectionId(1), SeatCoordinate::new(3, 5), TransactionId(1));

        let seats = vec![
            SeatCoordinate::new(3, 4),
            SeatCoordinate::new(3, 5),
            SeatCoordinate::new(9, 9),
        ];
        let claim = SeatAllocator::occupy(&mut scope, TransactionId(2), SectionId(1), &seats)
            .await
            .expect("occupy");

        assert!(!claim.is_complete());
        assert_eq!(claim.claimed, vec![SeatCoordinate::new(3, 4)]);
        assert_eq!(
            claim.conflicts,
            vec![SeatCoordinate::new(3, 5), SeatCoordinate::new(9, 9)]
        );
        assert_eq!(scope.occupancy_of(SectionId(1)), 2);
    }

    #[tokio::test]
    async fn locks_follow_section_then_seat_order() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(1), EventId(1), "Platea", None);
        scope.add_grid(SectionId(1), 3, 3);
        scope.add_section(SectionId(2), EventId(1), "Palco", None);
        scope.add_grid(SectionId(2), 3, 3);

        let palco = [SeatCoordinate::new(2, 2), SeatCoordinate::new(1, 3)];
        let platea = [SeatCoordinate::new(3, 1), SeatCoordinate::new(1, 2)];
        let claims = SeatAllocator::occupy_sections(
            &mut scope,
            TransactionId(7),
            &[(SectionId(2), &palco[..]), (SectionId(1), &platea[..])],
        )
        .await
        .expect("occupy");

        assert_eq!(
            claims.iter().map(|claim| claim.section_id).collect::<Vec<_>>(),
            vec![SectionId(1), SectionId(2)]
        );
        assert_eq!(
            scope.writes,
            vec![
                Write::Seat(SectionId(1), SeatCoordinate::new(1, 2)),
                Write::Seat(SectionId(1), SeatCoordinate::new(3, 1)),
                Write::Seat(SectionId(2), SeatCoordinate::new(1, 3)),
                Write::Seat(SectionId(2), SeatCoordinate::new(2, 2)),
                Write::Counter(SectionId(1), 2),
                Write::Counter(SectionId(2), 2),
            ]
        );
    }

    #[tokio::test]
    async fn requests_for_one_section_merge_into_one_claim() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(1), EventId(1), "Platea", None);
        scope.add_grid(SectionId(1), 3, 3);

        let back = [SeatCoordinate::new(3, 3)];
        let front = [SeatCoordinate::new(1, 1)];
        let claims = SeatAllocator::occupy_sections(
            &mut scope,
            TransactionId(8),
            &[(SectionId(1), &back[..]), (SectionId(1), &front[..])],
        )
        .await
        .expect("occupy");

        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].requested, 2);
        assert_eq!(
            scope.writes,
            vec![
                Write::Seat(SectionId(1), SeatCoordinate::new(1, 1)),
                Write::Seat(SectionId(1), SeatCoordinate::new(3, 3)),
                Write::Counter(SectionId(1), 2),
            ]
        );
    }

    #[tokio::test]
    async fn empty_request_leaves_counter_untouched() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(1), EventId(1), "Palco", None);

        let claim = SeatAllocator::occupy(&mut scope, TransactionId(1), SectionId(1), &[])
            .await
            .expect("occupy");
        assert!(claim.is_complete());
        assert_eq!(scope.occupancy_of(SectionId(1)), 0);
        assert_eq!(scope.occupancy_updates, 0);
    }
}
