// Event kind value object

use serde::{Deserialize, Serialize};

/// Kind of sellable occurrence. Theaters and cinemas sell addressable seats,
/// museums sell aggregate entry slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "Teatro", alias = "theater", alias = "Theater")]
    Theater,
    #[serde(rename = "Cine", alias = "cinema", alias = "Cinema")]
    Cinema,
    #[serde(rename = "Museo", alias = "museum", alias = "Museum")]
    Museum,
}

/// How inventory for an event is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMode {
    Seated,
    CapacityOnly,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Theater => "Teatro",
            EventKind::Cinema => "Cine",
            EventKind::Museum => "Museo",
        }
    }

    pub fn allocation_mode(&self) -> AllocationMode {
        match self {
            EventKind::Theater | EventKind::Cinema => AllocationMode::Seated,
            EventKind::Museum => AllocationMode::CapacityOnly,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "teatro" | "theater" | "theatre" => Some(EventKind::Theater),
            "cine" | "cinema" => Some(EventKind::Cinema),
            "museo" | "museum" => Some(EventKind::Museum),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn museum_is_the_only_capacity_only_kind() {
        assert_eq!(EventKind::Museum.allocation_mode(), AllocationMode::CapacityOnly);
        assert_eq!(EventKind::Theater.allocation_mode(), AllocationMode::Seated);
        assert_eq!(EventKind::Cinema.allocation_mode(), AllocationMode::Seated);
    }

    #[test]
    fn parse_accepts_stored_and_english_names() {
        assert_eq!(EventKind::parse("Museo"), Some(EventKind::Museum));
        assert_eq!(EventKind::parse(" cinema "), Some(EventKind::Cinema));
        assert_eq!(EventKind::parse("Teatro"), Some(EventKind::Theater));
        assert_eq!(EventKind::parse("concierto"), None);
    }

    #[test]
    fn wire_name_round_trips_through_serde() {
        let json = serde_json::to_string(&EventKind::Museum).expect("serialize");
        assert_eq!(json, "\"Museo\"");
        let kind: EventKind = serde_json::from_str("\"cinema\"").expect("alias");
        assert_eq!(kind, EventKind::Cinema);
    }
}
