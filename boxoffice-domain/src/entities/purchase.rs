// Purchase entities
// Incoming purchase request and the validated shapes written to the ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::{
    CategoryId, EventId, EventKind, PurchaserId, SeatCoordinate, TransactionStatus,
};

/// Purchase request as submitted by a caller. Every field is optional at this
/// stage; presence rules depend on the event kind and are enforced by the
/// purchase command before any write.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default, alias = "usuario_id")]
    pub purchaser_id: Option<PurchaserId>,
    #[serde(default, alias = "evento_id")]
    pub event_id: Option<EventId>,
    #[serde(default, alias = "metodo_pago")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "total_pagado")]
    pub total_paid: Option<Decimal>,
    #[serde(default, alias = "referencia_pago")]
    pub payment_reference: Option<String>,
    #[serde(default, alias = "ticket_details")]
    pub line_items: Option<Vec<LineItemInput>>,
    #[serde(default, alias = "secciones_info")]
    pub sections: Vec<SectionSelection>,
    #[serde(default, alias = "tipo_evento")]
    pub event_kind: Option<EventKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default, alias = "categoria_boleto_id")]
    pub category_id: Option<CategoryId>,
    #[serde(default, alias = "cantidad")]
    pub quantity: Option<u32>,
    #[serde(default, alias = "precio_unitario")]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
}

/// Seats requested within one logical section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSelection {
    #[serde(rename = "seccion_key", alias = "section_key")]
    pub section_key: String,
    #[serde(rename = "asientos", alias = "seats", default)]
    pub seats: Vec<SeatCoordinate>,
}

impl SectionSelection {
    pub fn new(section_key: impl Into<String>, seats: Vec<SeatCoordinate>) -> Self {
        Self {
            section_key: section_key.into(),
            seats,
        }
    }
}

/// A complete line item, ready to be persisted as a transaction detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "categoria_boleto_id")]
    pub category_id: CategoryId,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio_unitario")]
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Transaction header as inserted inside the purchase scope.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub purchaser_id: Option<PurchaserId>,
    pub event_id: EventId,
    pub payment_method: Option<String>,
    pub total_paid: Decimal,
    pub status: TransactionStatus,
    pub payment_reference: Option<String>,
    /// Structured seat snapshot; empty for capacity-only events.
    pub selected_seats: Vec<SectionSelection>,
    /// Only set for capacity-only events.
    pub visit_date: Option<NaiveDate>,
}
