// Ledger views
// Denormalized read shapes of committed transactions

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::SectionSelection;
use crate::value_objects::{CategoryId, EventId, PurchaserId, TransactionId, TransactionStatus};

/// Transaction header row joined with the catalog display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub id: TransactionId,
    #[serde(rename = "usuario_id")]
    pub purchaser_id: Option<PurchaserId>,
    #[serde(rename = "evento_id")]
    pub event_id: EventId,
    #[serde(rename = "metodo_pago")]
    pub payment_method: Option<String>,
    #[serde(rename = "total_pagado")]
    pub total_paid: Decimal,
    #[serde(rename = "estado")]
    pub status: TransactionStatus,
    #[serde(rename = "fecha_transaccion")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "referencia_pago")]
    pub payment_reference: Option<String>,
    #[serde(rename = "asientos_seleccionados")]
    pub selected_seats: Vec<SectionSelection>,
    #[serde(rename = "fecha_visita")]
    pub visit_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDetail {
    #[serde(rename = "categoria_boleto_id")]
    pub category_id: CategoryId,
    #[serde(rename = "nombre_categoria")]
    pub category_name: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio_unitario")]
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio_unitario")]
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    #[serde(rename = "total_boletos")]
    pub total_tickets: u32,
    #[serde(rename = "total_categorias")]
    pub total_categories: u32,
    #[serde(rename = "desglose")]
    pub breakdown: BTreeMap<String, CategoryTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketBreakdown {
    #[serde(rename = "detalles")]
    pub details: Vec<TicketDetail>,
    #[serde(rename = "resumen")]
    pub summary: TicketSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "horario_inicio")]
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueSummary {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ubicacion")]
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaserSummary {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
}

/// Complete view of one committed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub header: TransactionHeader,
    #[serde(rename = "evento")]
    pub event: EventSummary,
    #[serde(rename = "lugar")]
    pub venue: VenueSummary,
    #[serde(rename = "usuario")]
    pub purchaser: Option<PurchaserSummary>,
    #[serde(rename = "boletos")]
    pub tickets: TicketBreakdown,
}

/// Raw material a store hands back for reconstruction; the summary is
/// computed once in the domain so every store reports identical totals.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub header: TransactionHeader,
    pub event: EventSummary,
    pub venue: VenueSummary,
    pub purchaser: Option<PurchaserSummary>,
    pub details: Vec<TicketDetail>,
}

/// Response of a successful purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseReceipt {
    pub transaction_id: TransactionId,
    pub transaction: TransactionView,
}
