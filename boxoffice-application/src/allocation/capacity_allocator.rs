use boxoffice_domain::ports::StoreScope;
use boxoffice_domain::{EventId, GENERAL_ADMISSION_SECTION};
use tracing::warn;

use crate::AppError;

pub struct CapacityAllocator;

impl CapacityAllocator {
    /// Raises the general-admission counter of `event_id` by `quantity` if
    /// the bound still holds. `false` when nothing was updated.
    pub async fn try_increment(
        scope: &mut dyn StoreScope,
        event_id: EventId,
        quantity: u32,
    ) -> anyhow::Result<bool> {
        let affected = scope.add_capacity_occupancy(event_id, quantity).await?;
        Ok(affected > 0)
    }

    /// Like [`CapacityAllocator::try_increment`], but classifies a refused
    /// increment as a missing section or an exhausted capacity.
    pub async fn increment(
        scope: &mut dyn StoreScope,
        event_id: EventId,
        quantity: u32,
    ) -> Result<(), AppError> {
        if Self::try_increment(scope, event_id, quantity).await? {
            return Ok(());
        }

        match scope.capacity_snapshot(event_id).await? {
            None => Err(AppError::SectionNotFound(
                GENERAL_ADMISSION_SECTION.to_string(),
            )),
            Some(snapshot) => {
                warn!(
                    "capacity exceeded for event {}: requested {}, available {}",
                    event_id,
                    quantity,
                    snapshot.available()
                );
                Err(AppError::CapacityExceeded {
                    requested: quantity,
                    available: snapshot.available(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeScope;
    use boxoffice_domain::SectionId;

    #[tokio::test]
    async fn increments_within_capacity() {
        let mut scope = FakeScope::default();
        scope.add_capacity(EventId(3), SectionId(30), 100, 90);

        CapacityAllocator::increment(&mut scope, EventId(3), 10)
            .await
            .expect("exactly fills capacity");
        assert_eq!(scope.occupancy_of(SectionId(30)), 100);
    }

    #[tokio::test]
    async fn refuses_to_exceed_capacity() {
        let mut scope = FakeScope::default();
        scope.add_capacity(EventId(3), SectionId(30), 100, 95);

        let err = CapacityAllocator::increment(&mut scope, EventId(3), 10)
            .await
            .expect_err("over capacity");
        assert!(matches!(
            err,
            AppError::CapacityExceeded {
                requested: 10,
                available: 5
            }
        ));
        assert_eq!(scope.occupancy_of(SectionId(30)), 95);
    }

    #[tokio::test]
    async fn missing_general_admission_section() {
        let mut scope = FakeScope::default();

        let err = CapacityAllocator::increment(&mut scope, EventId(3), 1)
            .await
            .expect_err("no section");
        assert!(matches!(err, AppError::SectionNotFound(name) if name == GENERAL_ADMISSION_SECTION));
    }
}
