use boxoffice_domain::ports::StoreScope;
use boxoffice_domain::services::SectionLookup;
use boxoffice_domain::{EventId, SectionId};
use tracing::debug;

use crate::AppError;

pub struct SectionResolver;

impl SectionResolver {
    /// Maps a logical section key of `event_id` to its stored section.
    pub async fn resolve(
        scope: &mut dyn StoreScope,
        event_id: EventId,
        section_key: &str,
    ) -> Result<SectionId, AppError> {
        let lookup = SectionLookup::parse(section_key);
        let found = scope
            .find_section(event_id, &lookup.name, lookup.subsection.as_deref())
            .await?;
        match found {
            Some(section_id) => {
                debug!(
                    "section key {:?} resolved to {} ({})",
                    section_key, lookup.name, section_id
                );
                Ok(section_id)
            }
            None => Err(AppError::SectionNotFound(section_key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeScope;

    #[tokio::test]
    async fn resolves_balcony_side_keys() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(7), EventId(1), "Balcon", Some("Izquierdo"));
        scope.add_section(SectionId(8), EventId(1), "Balcon", Some("Derecho"));

        let left = SectionResolver::resolve(&mut scope, EventId(1), "balconIzquierdo")
            .await
            .expect("left balcony");
        let right = SectionResolver::resolve(&mut scope, EventId(1), "balcony-right")
            .await
            .expect("right balcony");

        assert_eq!(left, SectionId(7));
        assert_eq!(right, SectionId(8));
    }

    #[tokio::test]
    async fn unknown_key_is_section_not_found() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(1), EventId(1), "General", None);

        let err = SectionResolver::resolve(&mut scope, EventId(1), "gallinero")
            .await
            .expect_err("missing section");
        assert!(matches!(err, AppError::SectionNotFound(key) if key == "gallinero"));
    }

    #[tokio::test]
    async fn sections_of_other_events_are_not_visible() {
        let mut scope = FakeScope::default();
        scope.add_section(SectionId(1), EventId(2), "Platea", None);

        let err = SectionResolver::resolve(&mut scope, EventId(1), "platea")
            .await
            .expect_err("section belongs to another event");
        assert!(matches!(err, AppError::SectionNotFound(_)));
    }
}
