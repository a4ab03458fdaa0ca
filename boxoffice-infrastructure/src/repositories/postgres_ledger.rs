use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

use boxoffice_domain::ports::LedgerReader;
use boxoffice_domain::{
    summarize_tickets, CategoryId, EventId, EventSummary, PurchaserId, PurchaserSummary,
    PurchaserTransaction, SectionSelection, TicketDetail, TransactionFilter, TransactionHeader,
    TransactionId, TransactionListing, TransactionRecord, TransactionStatus, VenueSummary,
};

use crate::repositories::PgInventoryStore;
use crate::utils::db_count;

const HEADER_SELECT: &str = "SELECT t.id, t.usuario_id, t.evento_id, t.metodo_pago, t.total_pagado,
        t.estado, t.fecha_transaccion, t.referencia_pago, t.asientos_seleccionados, t.fecha_visita,
        e.nombre AS evento_nombre, e.horario_inicio,
        l.nombre AS lugar_nombre, l.ubicacion,
        u.nombre AS usuario_nombre, u.email AS usuario_email
    FROM transacciones t
    JOIN eventos e ON e.id = t.evento_id
    JOIN lugares l ON l.id = e.lugar_id
    LEFT JOIN users u ON u.id = t.usuario_id";

const NEWEST_FIRST: &str = " ORDER BY t.fecha_transaccion DESC, t.id DESC";

fn header_from_row(row: &PgRow) -> Result<TransactionHeader> {
    let status: String = row.try_get("estado")?;
    let seats: Option<Json<Vec<SectionSelection>>> = row.try_get("asientos_seleccionados")?;
    Ok(TransactionHeader {
        id: TransactionId(row.try_get("id")?),
        purchaser_id: row.try_get::<Option<i64>, _>("usuario_id")?.map(PurchaserId),
        event_id: EventId(row.try_get("evento_id")?),
        payment_method: row.try_get("metodo_pago")?,
        total_paid: row.try_get("total_pagado")?,
        status: TransactionStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown transaction status {}", status))?,
        created_at: row.try_get("fecha_transaccion")?,
        payment_reference: row.try_get("referencia_pago")?,
        selected_seats: seats.map(|Json(seats)| seats).unwrap_or_default(),
        visit_date: row.try_get("fecha_visita")?,
    })
}

impl PgInventoryStore {
    /// Line items of the given transactions keyed by transaction id, in
    /// insertion order.
    async fn details_for(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<TicketDetail>>> {
        let mut grouped: HashMap<i64, Vec<TicketDetail>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }
        let rows = sqlx::query(
            "SELECT d.transaccion_id, d.categoria_boleto_id, c.nombre AS categoria_nombre,
                    d.cantidad, d.precio_unitario, d.subtotal
             FROM detalles_transaccion d
             JOIN categorias_boletos c ON c.id = d.categoria_boleto_id
             WHERE d.transaccion_id = ANY($1)
             ORDER BY d.id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let transaction_id: i64 = row.try_get("transaccion_id")?;
            let detail = TicketDetail {
                category_id: CategoryId(row.try_get("categoria_boleto_id")?),
                category_name: row.try_get("categoria_nombre")?,
                quantity: db_count(i64::from(row.try_get::<i32, _>("cantidad")?), "cantidad")?,
                unit_price: row.try_get("precio_unitario")?,
                subtotal: row.try_get("subtotal")?,
            };
            grouped.entry(transaction_id).or_default().push(detail);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl LedgerReader for PgInventoryStore {
    async fn fetch_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<TransactionRecord>> {
        let row = sqlx::query(&format!("{} WHERE t.id = $1", HEADER_SELECT))
            .bind(transaction_id.0)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let header = header_from_row(&row)?;
        let mut details = self.details_for(&[header.id.0]).await?;
        let purchaser_name: Option<String> = row.try_get("usuario_nombre")?;
        let purchaser_email: Option<String> = row.try_get("usuario_email")?;

        Ok(Some(TransactionRecord {
            event: EventSummary {
                name: row.try_get("evento_nombre")?,
                starts_at: row.try_get("horario_inicio")?,
            },
            venue: VenueSummary {
                name: row.try_get("lugar_nombre")?,
                location: row.try_get("ubicacion")?,
            },
            purchaser: purchaser_name.map(|name| PurchaserSummary {
                name,
                email: purchaser_email.unwrap_or_default(),
            }),
            details: details.remove(&header.id.0).unwrap_or_default(),
            header,
        }))
    }

    async fn fetch_by_purchaser(&self, purchaser_id: PurchaserId) -> Result<Vec<PurchaserTransaction>> {
        let rows = sqlx::query(&format!(
            "{} WHERE t.usuario_id = $1{}",
            HEADER_SELECT, NEWEST_FIRST
        ))
        .bind(purchaser_id.0)
        .fetch_all(&self.pool)
        .await?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut details = self.details_for(&ids).await?;

        rows.iter()
            .map(|row| {
                let header = header_from_row(row)?;
                let details = details.remove(&header.id.0).unwrap_or_default();
                let summary = summarize_tickets(&details);
                Ok(PurchaserTransaction {
                    event_name: row.try_get("evento_nombre")?,
                    event_starts_at: row.try_get("horario_inicio")?,
                    venue_name: row.try_get("lugar_nombre")?,
                    venue_location: row.try_get("ubicacion")?,
                    purchaser_name: row.try_get("usuario_nombre")?,
                    details,
                    total_tickets: summary.total_tickets,
                    total_categories: summary.total_categories,
                    header,
                })
            })
            .collect()
    }

    async fn fetch_all(&self, filter: &TransactionFilter) -> Result<Vec<TransactionListing>> {
        let mut builder = QueryBuilder::<Postgres>::new(HEADER_SELECT);
        builder.push(" WHERE TRUE");
        if let Some(status) = filter.status {
            builder.push(" AND t.estado = ").push_bind(status.as_str());
        }
        if let Some(method) = &filter.payment_method {
            builder.push(" AND t.metodo_pago = ").push_bind(method.clone());
        }
        if let Some(purchaser_id) = filter.purchaser_id {
            builder.push(" AND t.usuario_id = ").push_bind(purchaser_id.0);
        }
        if let Some(event_id) = filter.event_id {
            builder.push(" AND t.evento_id = ").push_bind(event_id.0);
        }
        if let Some(from) = filter.date_from {
            builder
                .push(" AND (t.fecha_transaccion AT TIME ZONE 'UTC')::date >= ")
                .push_bind(from);
        }
        if let Some(to) = filter.date_to {
            builder
                .push(" AND (t.fecha_transaccion AT TIME ZONE 'UTC')::date <= ")
                .push_bind(to);
        }
        builder.push(NEWEST_FIRST);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let details = self.details_for(&ids).await?;

        rows.iter()
            .map(|row| {
                let header = header_from_row(row)?;
                let summary = summarize_tickets(
                    details.get(&header.id.0).map(Vec::as_slice).unwrap_or_default(),
                );
                Ok(TransactionListing {
                    event_name: row.try_get("evento_nombre")?,
                    event_starts_at: row.try_get("horario_inicio")?,
                    venue_name: row.try_get("lugar_nombre")?,
                    purchaser_name: row.try_get("usuario_nombre")?,
                    total_categories: summary.total_categories,
                    total_tickets: summary.total_tickets,
                    header,
                })
            })
            .collect()
    }
}
