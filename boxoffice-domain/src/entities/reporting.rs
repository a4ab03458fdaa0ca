// Reporting entities
// Read-only projections over the ledger; not part of the purchase scope

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{TicketDetail, TransactionHeader};
use crate::value_objects::{EventId, PurchaserId, TransactionStatus};

/// One transaction of a purchaser, with its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaserTransaction {
    #[serde(flatten)]
    pub header: TransactionHeader,
    #[serde(rename = "nombre_evento")]
    pub event_name: String,
    #[serde(rename = "horario_inicio")]
    pub event_starts_at: DateTime<Utc>,
    #[serde(rename = "lugar_nombre")]
    pub venue_name: String,
    #[serde(rename = "ubicacion")]
    pub venue_location: String,
    #[serde(rename = "usuario_nombre")]
    pub purchaser_name: Option<String>,
    #[serde(rename = "detalles_boletos")]
    pub details: Vec<TicketDetail>,
    #[serde(rename = "total_boletos")]
    pub total_tickets: u32,
    #[serde(rename = "total_tipos_boletos")]
    pub total_categories: u32,
}

/// Flat row used by the administrative listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionListing {
    #[serde(flatten)]
    pub header: TransactionHeader,
    #[serde(rename = "nombre_evento")]
    pub event_name: String,
    #[serde(rename = "horario_inicio")]
    pub event_starts_at: DateTime<Utc>,
    #[serde(rename = "lugar_nombre")]
    pub venue_name: String,
    #[serde(rename = "usuario_nombre")]
    pub purchaser_name: Option<String>,
    #[serde(rename = "total_tipos_boletos")]
    pub total_categories: u32,
    #[serde(rename = "total_boletos")]
    pub total_tickets: u32,
}

/// Raw listing query as received from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(alias = "status")]
    pub estado: Option<String>,
    #[serde(alias = "payment_method")]
    pub metodo_pago: Option<String>,
    #[serde(alias = "purchaser_id")]
    pub usuario_id: Option<i64>,
    #[serde(alias = "event_id")]
    pub evento_id: Option<i64>,
    #[serde(alias = "date_from")]
    pub fecha_desde: Option<String>,
    #[serde(alias = "date_to")]
    pub fecha_hasta: Option<String>,
}

/// Parsed listing filter. Date bounds are inclusive calendar days (UTC).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub payment_method: Option<String>,
    pub purchaser_id: Option<PurchaserId>,
    pub event_id: Option<EventId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn matches(&self, header: &TransactionHeader) -> bool {
        if let Some(status) = self.status {
            if header.status != status {
                return false;
            }
        }
        if let Some(method) = &self.payment_method {
            if header.payment_method.as_deref() != Some(method.as_str()) {
                return false;
            }
        }
        if let Some(purchaser) = self.purchaser_id {
            if header.purchaser_id != Some(purchaser) {
                return false;
            }
        }
        if let Some(event) = self.event_id {
            if header.event_id != event {
                return false;
            }
        }
        let day = header.created_at.date_naive();
        if let Some(from) = self.date_from {
            if day < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if day > to {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionStatistics {
    #[serde(rename = "total_transacciones")]
    pub total_transactions: u64,
    #[serde(rename = "total_filtradas")]
    pub total_in_page: u64,
    #[serde(rename = "total_ingresos")]
    pub total_revenue: Decimal,
    #[serde(rename = "total_boletos_vendidos")]
    pub tickets_sold: u64,
    #[serde(rename = "transacciones_por_estado")]
    pub by_status: BTreeMap<String, u64>,
    #[serde(rename = "transacciones_por_metodo_pago")]
    pub by_payment_method: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "hasPrev")]
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    #[serde(rename = "transacciones")]
    pub transactions: Vec<TransactionListing>,
    #[serde(rename = "estadisticas")]
    pub statistics: TransactionStatistics,
    pub pagination: Pagination,
    pub filters: TransactionQuery,
}
