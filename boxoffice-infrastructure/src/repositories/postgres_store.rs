use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::{debug, info};

use boxoffice_domain::ports::{InventoryStore, StoreContention, StoreScope};
use boxoffice_domain::{
    CapacitySnapshot, DbConfig, Event, EventId, EventKind, LineItem, NewTransaction,
    SeatCoordinate, SeatState, SectionId, TransactionId, VenueId, GENERAL_ADMISSION_SECTION,
};

use crate::utils::{db_count, to_db_count};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS lugares (
        id BIGSERIAL PRIMARY KEY,
        nombre TEXT NOT NULL,
        ubicacion TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        nombre TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS categorias_boletos (
        id BIGSERIAL PRIMARY KEY,
        nombre TEXT NOT NULL,
        tipo_evento TEXT NOT NULL,
        precio_base NUMERIC(12, 2) NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS eventos (
        id BIGSERIAL PRIMARY KEY,
        lugar_id BIGINT NOT NULL REFERENCES lugares (id),
        tipo_evento TEXT NOT NULL,
        nombre TEXT NOT NULL,
        horario_inicio TIMESTAMPTZ NOT NULL,
        horario_fin TIMESTAMPTZ NOT NULL,
        capacidad INTEGER NOT NULL DEFAULT 0,
        activo BOOLEAN NOT NULL DEFAULT TRUE
    )",
    "CREATE TABLE IF NOT EXISTS secciones_eventos (
        id BIGSERIAL PRIMARY KEY,
        evento_id BIGINT NOT NULL REFERENCES eventos (id),
        nombre_seccion TEXT NOT NULL,
        subseccion TEXT,
        filas INTEGER,
        columnas INTEGER,
        capacidad_total INTEGER NOT NULL,
        asientos_ocupados INTEGER NOT NULL DEFAULT 0,
        categoria_boleto_id BIGINT REFERENCES categorias_boletos (id),
        CHECK (asientos_ocupados >= 0 AND asientos_ocupados <= capacidad_total)
    )",
    "CREATE TABLE IF NOT EXISTS transacciones (
        id BIGSERIAL PRIMARY KEY,
        usuario_id BIGINT REFERENCES users (id),
        evento_id BIGINT NOT NULL REFERENCES eventos (id),
        metodo_pago TEXT,
        total_pagado NUMERIC(12, 2) NOT NULL,
        estado TEXT NOT NULL,
        fecha_transaccion TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        referencia_pago TEXT,
        asientos_seleccionados JSONB NOT NULL DEFAULT '[]'::jsonb,
        fecha_visita DATE
    )",
    "CREATE TABLE IF NOT EXISTS asientos (
        id BIGSERIAL PRIMARY KEY,
        seccion_evento_id BIGINT NOT NULL REFERENCES secciones_eventos (id),
        fila INTEGER NOT NULL,
        columna INTEGER NOT NULL,
        estado TEXT NOT NULL DEFAULT 'available',
        transaccion_id BIGINT REFERENCES transacciones (id),
        UNIQUE (seccion_evento_id, fila, columna)
    )",
    "CREATE TABLE IF NOT EXISTS detalles_transaccion (
        id BIGSERIAL PRIMARY KEY,
        transaccion_id BIGINT NOT NULL REFERENCES transacciones (id),
        categoria_boleto_id BIGINT NOT NULL REFERENCES categorias_boletos (id),
        cantidad INTEGER NOT NULL CHECK (cantidad > 0),
        precio_unitario NUMERIC(12, 2) NOT NULL,
        subtotal NUMERIC(12, 2) NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_transacciones_usuario ON transacciones (usuario_id)",
    "CREATE INDEX IF NOT EXISTS idx_transacciones_fecha ON transacciones (fecha_transaccion DESC)",
    "CREATE INDEX IF NOT EXISTS idx_detalles_transaccion ON detalles_transaccion (transaccion_id)",
    "CREATE INDEX IF NOT EXISTS idx_secciones_evento ON secciones_eventos (evento_id, nombre_seccion)",
];

#[derive(Clone)]
pub struct PgInventoryStore {
    pub(crate) pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.database_url)
            .await?;
        info!(
            "connected to postgres (max_connections={})",
            config.max_connections
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("schema ensured ({} statements)", SCHEMA.len());
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreScope>> {
        let tx = self.pool.begin().await.map_err(classify)?;
        Ok(Box::new(PgScope { tx }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// SQLSTATE codes PostgreSQL uses when it aborts one side of a collision
/// between concurrent transactions.
const DEADLOCK_DETECTED: &str = "40P01";
const SERIALIZATION_FAILURE: &str = "40001";

/// Tags lock cycles and serialization failures as [`StoreContention`] so the
/// caller reports a conflict instead of an internal error.
fn classify(err: sqlx::Error) -> anyhow::Error {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());
    match code.as_deref() {
        Some(DEADLOCK_DETECTED) | Some(SERIALIZATION_FAILURE) => {
            anyhow::Error::new(StoreContention(err.to_string()))
        }
        _ => err.into(),
    }
}

/// One database transaction. Dropping it without `commit` rolls back.
pub struct PgScope {
    tx: Transaction<'static, Postgres>,
}

fn event_from_row(row: &PgRow) -> Result<Event> {
    let kind: String = row.try_get("tipo_evento")?;
    Ok(Event {
        id: EventId(row.try_get("id")?),
        venue_id: VenueId(row.try_get("lugar_id")?),
        kind: EventKind::parse(&kind).ok_or_else(|| anyhow!("unknown event kind {}", kind))?,
        name: row.try_get("nombre")?,
        starts_at: row.try_get("horario_inicio")?,
        ends_at: row.try_get("horario_fin")?,
        capacity: db_count(i64::from(row.try_get::<i32, _>("capacidad")?), "capacidad")?,
        active: row.try_get("activo")?,
    })
}

#[async_trait]
impl StoreScope for PgScope {
    async fn load_event(&mut self, event_id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query(
            "SELECT id, lugar_id, tipo_evento, nombre, horario_inicio, horario_fin, capacidad, activo
             FROM eventos
             WHERE id = $1",
        )
        .bind(event_id.0)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn insert_transaction(&mut self, header: &NewTransaction) -> Result<TransactionId> {
        let row = sqlx::query(
            "INSERT INTO transacciones
                (usuario_id, evento_id, metodo_pago, total_pagado, estado,
                 referencia_pago, asientos_seleccionados, fecha_visita)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(header.purchaser_id.map(|id| id.0))
        .bind(header.event_id.0)
        .bind(header.payment_method.as_deref())
        .bind(header.total_paid)
        .bind(header.status.as_str())
        .bind(header.payment_reference.as_deref())
        .bind(Json(&header.selected_seats))
        .bind(header.visit_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(TransactionId(row.try_get("id")?))
    }

    async fn insert_transaction_details(
        &mut self,
        transaction_id: TransactionId,
        items: &[LineItem],
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let quantities = items
            .iter()
            .map(|item| to_db_count(item.quantity, "cantidad"))
            .collect::<Result<Vec<_>>>()?;
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO detalles_transaccion
                (transaccion_id, categoria_boleto_id, cantidad, precio_unitario, subtotal) ",
        );
        builder.push_values(items.iter().zip(quantities), |mut row, (item, quantity)| {
            row.push_bind(transaction_id.0)
                .push_bind(item.category_id.0)
                .push_bind(quantity)
                .push_bind(item.unit_price)
                .push_bind(item.subtotal);
        });
        builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn find_section(
        &mut self,
        event_id: EventId,
        name: &str,
        subsection: Option<&str>,
    ) -> Result<Option<SectionId>> {
        let row = sqlx::query(
            "SELECT id FROM secciones_eventos
             WHERE evento_id = $1
               AND LOWER(nombre_seccion) = LOWER($2)
               AND ($3::TEXT IS NULL OR LOWER(subseccion) = LOWER($3))
             ORDER BY id
             LIMIT 1",
        )
        .bind(event_id.0)
        .bind(name)
        .bind(subsection)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(|row| row.try_get("id").map(SectionId))
            .transpose()
            .map_err(Into::into)
    }

    async fn claim_seat(
        &mut self,
        transaction_id: TransactionId,
        section_id: SectionId,
        seat: SeatCoordinate,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE asientos
             SET estado = $1, transaccion_id = $2
             WHERE seccion_evento_id = $3 AND fila = $4 AND columna = $5 AND estado = $6",
        )
        .bind(SeatState::Occupied.as_str())
        .bind(transaction_id.0)
        .bind(section_id.0)
        .bind(to_db_count(seat.row, "fila")?)
        .bind(to_db_count(seat.column, "columna")?)
        .bind(SeatState::Available.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn add_section_occupancy(&mut self, section_id: SectionId, count: u32) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE secciones_eventos
             SET asientos_ocupados = asientos_ocupados + $1
             WHERE id = $2",
        )
        .bind(to_db_count(count, "asientos_ocupados")?)
        .bind(section_id.0)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn add_capacity_occupancy(&mut self, event_id: EventId, quantity: u32) -> Result<u64> {
        // the bound is checked in BIGINT so a large request fails the
        // predicate instead of overflowing INTEGER arithmetic
        let result = sqlx::query(
            "UPDATE secciones_eventos
             SET asientos_ocupados = asientos_ocupados + $1
             WHERE evento_id = $2
               AND nombre_seccion = $3
               AND filas IS NULL
               AND asientos_ocupados::BIGINT + $4 <= capacidad_total",
        )
        .bind(to_db_count(quantity, "asientos_ocupados")?)
        .bind(event_id.0)
        .bind(GENERAL_ADMISSION_SECTION)
        .bind(i64::from(quantity))
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn capacity_snapshot(&mut self, event_id: EventId) -> Result<Option<CapacitySnapshot>> {
        let row = sqlx::query(
            "SELECT id, capacidad_total, asientos_ocupados
             FROM secciones_eventos
             WHERE evento_id = $1 AND nombre_seccion = $2 AND filas IS NULL
             ORDER BY id
             LIMIT 1",
        )
        .bind(event_id.0)
        .bind(GENERAL_ADMISSION_SECTION)
        .fetch_optional(&mut *self.tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(CapacitySnapshot {
            section_id: SectionId(row.try_get("id")?),
            capacity_total: db_count(
                i64::from(row.try_get::<i32, _>("capacidad_total")?),
                "capacidad_total",
            )?,
            occupied_count: db_count(
                i64::from(row.try_get::<i32, _>("asientos_ocupados")?),
                "asientos_ocupados",
            )?,
        }))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(classify)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_without_a_collision_code_stay_internal() {
        for err in [sqlx::Error::RowNotFound, sqlx::Error::PoolTimedOut] {
            assert!(classify(err).downcast_ref::<StoreContention>().is_none());
        }
    }
}
