use boxoffice_domain::ports::StoreContention;
use boxoffice_domain::SeatCoordinate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("section not found: {0}")]
    SectionNotFound(String),
    #[error("seats no longer available in section {section}: {}", format_seats(.seats))]
    SeatConflict {
        section: String,
        seats: Vec<SeatCoordinate>,
    },
    #[error("not enough capacity: requested {requested}, available {available}")]
    CapacityExceeded { requested: u32, available: u32 },
    /// The store aborted the purchase to resolve a collision with a
    /// concurrent one; retrying may succeed.
    #[error("{0}")]
    Contention(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<StoreContention>() {
            Some(contention) => AppError::Contention(contention.to_string()),
            None => AppError::Internal(err),
        }
    }
}

/// Stable, machine-readable failure reason carried to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    ValidationMissingFields,
    NotFound,
    SectionNotFound,
    SeatConflict,
    CapacityExceeded,
    InternalError,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::ValidationMissingFields => "validation-missing-fields",
            ReasonCode::NotFound => "not-found",
            ReasonCode::SectionNotFound => "section-not-found",
            ReasonCode::SeatConflict => "seat-conflict",
            ReasonCode::CapacityExceeded => "capacity-exceeded",
            ReasonCode::InternalError => "internal-error",
        }
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        AppError::Validation {
            message: format!("incomplete transaction data, missing: {}", fields.join(", ")),
            fields,
        }
    }

    pub fn reason_code(&self) -> ReasonCode {
        match self {
            AppError::Validation { .. } => ReasonCode::ValidationMissingFields,
            AppError::NotFound(_) => ReasonCode::NotFound,
            AppError::SectionNotFound(_) => ReasonCode::SectionNotFound,
            AppError::SeatConflict { .. } | AppError::Contention(_) => ReasonCode::SeatConflict,
            AppError::CapacityExceeded { .. } => ReasonCode::CapacityExceeded,
            AppError::Internal(_) => ReasonCode::InternalError,
        }
    }
}

fn format_seats(seats: &[SeatCoordinate]) -> String {
    seats
        .iter()
        .map(|seat| seat.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_conflict_message_lists_every_seat() {
        let err = AppError::SeatConflict {
            section: "Platea".to_string(),
            seats: vec![SeatCoordinate::new(3, 5), SeatCoordinate::new(3, 6)],
        };
        let message = err.to_string();
        assert!(message.contains("Platea"));
        assert!(message.contains(&SeatCoordinate::new(3, 5).to_string()));
        assert!(message.contains(&SeatCoordinate::new(3, 6).to_string()));
        assert_eq!(err.reason_code().as_str(), "seat-conflict");
    }

    #[test]
    fn store_contention_is_a_conflict_not_internal() {
        let err = AppError::from(anyhow::Error::new(StoreContention(
            "deadlock detected".to_string(),
        )));
        assert!(matches!(err, AppError::Contention(_)));
        assert_eq!(err.reason_code(), ReasonCode::SeatConflict);

        let wrapped = anyhow::Error::new(StoreContention("could not serialize".to_string()))
            .context("claiming seat");
        assert!(matches!(AppError::from(wrapped), AppError::Contention(_)));
    }

    #[test]
    fn internal_errors_map_to_internal_reason() {
        let err = AppError::from(anyhow::anyhow!("connection reset"));
        assert_eq!(err.reason_code(), ReasonCode::InternalError);
    }
}
