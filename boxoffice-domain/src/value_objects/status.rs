// Seat and transaction status value objects

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatState {
    Available,
    Occupied,
}

impl SeatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatState::Available => "available",
            SeatState::Occupied => "occupied",
        }
    }
}

/// Lifecycle of a transaction. The purchase flow only ever writes
/// `Completed`; the other states belong to refund/cancellation flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[serde(rename = "completada")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
    #[serde(rename = "reembolsada")]
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completada",
            TransactionStatus::Cancelled => "cancelada",
            TransactionStatus::Refunded => "reembolsada",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "completada" | "completed" => Some(TransactionStatus::Completed),
            "cancelada" | "cancelled" | "canceled" => Some(TransactionStatus::Cancelled),
            "reembolsada" | "refunded" => Some(TransactionStatus::Refunded),
            _ => None,
        }
    }
}
