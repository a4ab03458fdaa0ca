use std::collections::BTreeMap;

use boxoffice_domain::{
    normalize_optional_text, parse_date, EventId, Pagination, PurchaserId, PurchaserTransaction,
    RuntimeConfig, TransactionFilter, TransactionId, TransactionListing, TransactionPage, TransactionQuery,
    TransactionStatistics, TransactionStatus, TransactionView,
};
use rust_decimal::Decimal;

use crate::{AppError, AppState, LedgerWriter};

pub async fn get_transaction(
    state: &AppState,
    transaction_id: TransactionId,
) -> Result<TransactionView, AppError> {
    LedgerWriter::reconstruct(state.ledger.as_ref(), transaction_id).await
}

pub async fn list_by_purchaser(
    state: &AppState,
    purchaser_id: PurchaserId,
) -> Result<Vec<PurchaserTransaction>, AppError> {
    LedgerWriter::list_by_purchaser(state.ledger.as_ref(), purchaser_id).await
}

pub async fn list_transactions(
    state: &AppState,
    query: TransactionQuery,
) -> Result<TransactionPage, AppError> {
    let filter = parse_filter(&query)?;
    let (page, limit) = page_window(&query, &state.config);

    let rows = LedgerWriter::list_all(state.ledger.as_ref(), &filter).await?;
    Ok(paginate(rows, page, limit, query))
}

pub fn parse_filter(query: &TransactionQuery) -> Result<TransactionFilter, AppError> {
    let status = match normalize_optional_text(query.estado.clone()) {
        Some(raw) => Some(
            TransactionStatus::parse(&raw)
                .ok_or_else(|| AppError::validation(format!("invalid status: {}", raw)))?,
        ),
        None => None,
    };
    let date_from = parse_optional_date(query.fecha_desde.as_deref(), "fecha_desde")?;
    let date_to = parse_optional_date(query.fecha_hasta.as_deref(), "fecha_hasta")?;
    if let (Some(from), Some(to)) = (date_from, date_to) {
        if from > to {
            return Err(AppError::validation(
                "fecha_desde must not be after fecha_hasta",
            ));
        }
    }

    Ok(TransactionFilter {
        status,
        payment_method: normalize_optional_text(query.metodo_pago.clone()),
        purchaser_id: query.usuario_id.map(PurchaserId),
        event_id: query.evento_id.map(EventId),
        date_from,
        date_to,
    })
}

fn parse_optional_date(
    value: Option<&str>,
    field: &str,
) -> Result<Option<chrono::NaiveDate>, AppError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => parse_date(raw)
            .map(Some)
            .map_err(|err| AppError::validation(format!("invalid {}: {}", field, err))),
        None => Ok(None),
    }
}

fn page_window(query: &TransactionQuery, config: &RuntimeConfig) -> (u32, u32) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(config.default_page_limit)
        .clamp(1, config.max_page_limit.max(1));
    (page, limit)
}

/// Statistics cover the whole filtered set; only the rows are paged.
pub fn paginate(
    rows: Vec<TransactionListing>,
    page: u32,
    limit: u32,
    filters: TransactionQuery,
) -> TransactionPage {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = rows.len() as u64;
    let mut statistics = summarize(&rows);

    let offset = u64::from(page - 1).saturating_mul(u64::from(limit));
    let transactions = rows
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(limit as usize)
        .collect::<Vec<_>>();
    statistics.total_in_page = transactions.len() as u64;

    let pages = total.div_ceil(u64::from(limit));
    TransactionPage {
        transactions,
        statistics,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
            has_next: u64::from(page) < pages,
            has_prev: page > 1,
        },
        filters,
    }
}

fn summarize(rows: &[TransactionListing]) -> TransactionStatistics {
    let mut by_status = BTreeMap::new();
    let mut by_payment_method = BTreeMap::new();
    let mut total_revenue = Decimal::ZERO;
    let mut tickets_sold = 0u64;

    for row in rows {
        total_revenue += row.header.total_paid;
        tickets_sold += u64::from(row.total_tickets);
        *by_status
            .entry(row.header.status.as_str().to_string())
            .or_insert(0) += 1;
        let method = row
            .header
            .payment_method
            .clone()
            .unwrap_or_else(|| "sin_metodo".to_string());
        *by_payment_method.entry(method).or_insert(0) += 1;
    }

    TransactionStatistics {
        total_transactions: rows.len() as u64,
        total_in_page: 0,
        total_revenue,
        tickets_sold,
        by_status,
        by_payment_method,
    }
}
