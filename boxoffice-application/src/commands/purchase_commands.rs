use std::collections::HashSet;

use anyhow::anyhow;
use boxoffice_domain::ports::StoreScope;
use boxoffice_domain::{
    normalize_optional_text, AllocationMode, Event, EventId, EventKind, LineItem, LineItemInput,
    NewTransaction, MAX_INVENTORY_COUNT, PurchaseReceipt, PurchaseRequest, PurchaserId, SectionSelection,
    TransactionId, TransactionStatus,
};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::allocation::{strategy_for, AllocationContext, AllocationOutcome};
use crate::{AppError, AppState, LedgerWriter, Metrics};

/// Purchase request that passed shape validation; nothing has been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPurchase {
    pub kind: EventKind,
    pub event_id: Option<EventId>,
    pub purchaser_id: Option<PurchaserId>,
    pub payment_method: Option<String>,
    pub total_paid: Decimal,
    pub payment_reference: Option<String>,
    pub line_items: Vec<LineItem>,
    /// Empty for capacity-only events.
    pub sections: Vec<SectionSelection>,
    pub quantity: u32,
}

impl ValidatedPurchase {
    pub fn allocation_mode(&self) -> AllocationMode {
        self.kind.allocation_mode()
    }
}

/// Checks presence rules for the request's event kind. Runs before any
/// storage access.
pub fn validate_purchase(request: PurchaseRequest) -> Result<ValidatedPurchase, AppError> {
    let Some(kind) = request.event_kind else {
        return Err(AppError::missing_fields(vec!["tipo_evento".to_string()]));
    };
    let mode = kind.allocation_mode();
    let payment_method = normalize_optional_text(request.payment_method);
    let inputs = request.line_items.unwrap_or_default();

    let mut missing = Vec::new();
    if mode == AllocationMode::Seated {
        if request.purchaser_id.is_none() {
            missing.push("usuario_id".to_string());
        }
        if request.event_id.is_none() {
            missing.push("evento_id".to_string());
        }
        if payment_method.is_none() {
            missing.push("metodo_pago".to_string());
        }
        if !request.total_paid.is_some_and(|total| total > Decimal::ZERO) {
            missing.push("total_pagado".to_string());
        }
    }
    if inputs.is_empty() {
        missing.push("ticket_details".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::missing_fields(missing));
    }

    let line_items = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| validate_line_item(index, input))
        .collect::<Result<Vec<_>, _>>()?;
    let quantity = line_items
        .iter()
        .try_fold(0u32, |acc, item| acc.checked_add(item.quantity))
        .filter(|total| *total <= MAX_INVENTORY_COUNT)
        .ok_or_else(|| out_of_range("ticket_details", "total quantity"))?;

    let total_paid = match request.total_paid {
        Some(total) if total > Decimal::ZERO => total,
        _ => line_items.iter().map(|item| item.subtotal).sum(),
    };

    let sections = match mode {
        AllocationMode::Seated => validate_selections(request.sections)?,
        AllocationMode::CapacityOnly => Vec::new(),
    };

    Ok(ValidatedPurchase {
        kind,
        event_id: request.event_id,
        purchaser_id: request.purchaser_id,
        payment_method,
        total_paid,
        payment_reference: normalize_optional_text(request.payment_reference),
        line_items,
        sections,
        quantity,
    })
}

fn out_of_range(field: impl Into<String>, what: &str) -> AppError {
    AppError::Validation {
        message: format!("{} exceeds {}", what, MAX_INVENTORY_COUNT),
        fields: vec![field.into()],
    }
}

fn validate_line_item(index: usize, input: LineItemInput) -> Result<LineItem, AppError> {
    if input.quantity.is_some_and(|quantity| quantity > MAX_INVENTORY_COUNT) {
        return Err(out_of_range(
            format!("ticket_details[{}].cantidad", index),
            "quantity",
        ));
    }
    let quantity = input.quantity.filter(|quantity| *quantity > 0);
    let unit_price = input.unit_price.filter(|price| *price > Decimal::ZERO);
    let subtotal = input.subtotal.filter(|subtotal| *subtotal > Decimal::ZERO);

    match (input.category_id, quantity, unit_price, subtotal) {
        (Some(category_id), Some(quantity), Some(unit_price), Some(subtotal)) => Ok(LineItem {
            category_id,
            quantity,
            unit_price,
            subtotal,
        }),
        _ => {
            let mut missing = Vec::new();
            if input.category_id.is_none() {
                missing.push(format!("ticket_details[{}].categoria_boleto_id", index));
            }
            if quantity.is_none() {
                missing.push(format!("ticket_details[{}].cantidad", index));
            }
            if unit_price.is_none() {
                missing.push(format!("ticket_details[{}].precio_unitario", index));
            }
            if subtotal.is_none() {
                missing.push(format!("ticket_details[{}].subtotal", index));
            }
            Err(AppError::missing_fields(missing))
        }
    }
}

fn validate_selections(
    selections: Vec<SectionSelection>,
) -> Result<Vec<SectionSelection>, AppError> {
    for selection in &selections {
        if selection.section_key.trim().is_empty() {
            return Err(AppError::missing_fields(vec![
                "secciones_info.seccion_key".to_string(),
            ]));
        }
        if let Some(seat) = selection
            .seats
            .iter()
            .find(|seat| seat.row > MAX_INVENTORY_COUNT || seat.column > MAX_INVENTORY_COUNT)
        {
            return Err(out_of_range(
                "secciones_info.asientos",
                &format!("seat {}", seat),
            ));
        }
        let mut seen = HashSet::with_capacity(selection.seats.len());
        if let Some(seat) = selection.seats.iter().find(|seat| !seen.insert(**seat)) {
            return Err(AppError::validation(format!(
                "seat {} requested twice in section {}",
                seat, selection.section_key
            )));
        }
    }
    Ok(selections)
}

/// Books a purchase as one atomic unit: header, line items and inventory
/// changes either all commit or none do.
pub async fn create_transaction(
    state: &AppState,
    request: PurchaseRequest,
) -> Result<PurchaseReceipt, AppError> {
    let request_id = Uuid::new_v4();
    process_purchase(state, request)
        .instrument(info_span!("purchase", %request_id))
        .await
}

async fn process_purchase(
    state: &AppState,
    request: PurchaseRequest,
) -> Result<PurchaseReceipt, AppError> {
    let purchase = validate_purchase(request).map_err(|err| {
        warn!("purchase rejected: {}", err);
        err
    })?;

    let (transaction_id, outcome) = match run_in_scope(state, &purchase).await {
        Ok(done) => done,
        Err(err) => {
            record_failure(&state.metrics, &err);
            return Err(err);
        }
    };
    state
        .metrics
        .record_commit(outcome.admitted, outcome.seats_claimed);
    info!(
        "transaction {} committed: {} tickets, {} seats",
        transaction_id, outcome.admitted, outcome.seats_claimed
    );

    let transaction = LedgerWriter::reconstruct(state.ledger.as_ref(), transaction_id)
        .await
        .map_err(|err| {
            error!(
                "committed transaction {} could not be reconstructed: {}",
                transaction_id, err
            );
            match err {
                AppError::Internal(inner) => AppError::Internal(inner),
                other => AppError::Internal(anyhow!(
                    "committed transaction {} could not be reconstructed: {}",
                    transaction_id,
                    other
                )),
            }
        })?;

    Ok(PurchaseReceipt {
        transaction_id,
        transaction,
    })
}

async fn run_in_scope(
    state: &AppState,
    purchase: &ValidatedPurchase,
) -> Result<(TransactionId, AllocationOutcome), AppError> {
    let mut scope = state.store.begin().await.map_err(|err| {
        error!("failed to open purchase scope: {}", err);
        AppError::from(err)
    })?;

    match book(scope.as_mut(), purchase).await {
        Ok(done) => {
            scope.commit().await.map_err(|err| {
                error!("failed to commit purchase: {}", err);
                AppError::from(err)
            })?;
            Ok(done)
        }
        Err(err) => {
            if let Err(rollback_err) = scope.rollback().await {
                error!("failed to roll back purchase: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn book(
    scope: &mut dyn StoreScope,
    purchase: &ValidatedPurchase,
) -> Result<(TransactionId, AllocationOutcome), AppError> {
    let event = load_target_event(scope, purchase).await?;
    let mode = purchase.allocation_mode();

    let header = NewTransaction {
        purchaser_id: purchase.purchaser_id,
        event_id: event.id,
        payment_method: purchase.payment_method.clone(),
        total_paid: purchase.total_paid,
        status: TransactionStatus::Completed,
        payment_reference: purchase.payment_reference.clone(),
        selected_seats: purchase.sections.clone(),
        visit_date: match mode {
            AllocationMode::CapacityOnly => Some(Utc::now().date_naive()),
            AllocationMode::Seated => None,
        },
    };
    let transaction_id = LedgerWriter::create_header(scope, &header).await?;
    LedgerWriter::create_details(scope, transaction_id, &purchase.line_items).await?;

    let ctx = AllocationContext {
        event_id: event.id,
        transaction_id,
        selections: &purchase.sections,
        quantity: purchase.quantity,
    };
    let outcome = strategy_for(mode).allocate(scope, &ctx).await?;
    Ok((transaction_id, outcome))
}

async fn load_target_event(
    scope: &mut dyn StoreScope,
    purchase: &ValidatedPurchase,
) -> Result<Event, AppError> {
    let event_id = purchase
        .event_id
        .ok_or_else(|| AppError::NotFound("event".to_string()))?;
    let Some(event) = scope.load_event(event_id).await? else {
        warn!("event {} not found", event_id);
        return Err(AppError::NotFound(format!("event {}", event_id)));
    };
    if !event.active {
        warn!("event {} is not active", event_id);
        return Err(AppError::NotFound(format!("active event {}", event_id)));
    }
    if event.kind != purchase.kind {
        return Err(AppError::validation(format!(
            "event {} is of kind {}, request declares {}",
            event_id,
            event.kind.as_str(),
            purchase.kind.as_str()
        )));
    }
    Ok(event)
}

fn record_failure(metrics: &Metrics, err: &AppError) {
    metrics.record_abort();
    match err {
        AppError::SeatConflict { .. } | AppError::Contention(_) => metrics.record_seat_conflict(),
        AppError::CapacityExceeded { .. } => metrics.record_capacity_rejection(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_domain::{CategoryId, SeatCoordinate};

    fn line(category: i64, quantity: u32, unit: i64) -> LineItemInput {
        LineItemInput {
            category_id: Some(CategoryId(category)),
            quantity: Some(quantity),
            unit_price: Some(Decimal::new(unit, 0)),
            subtotal: Some(Decimal::new(unit * i64::from(quantity), 0)),
        }
    }

    fn seated_request() -> PurchaseRequest {
        PurchaseRequest {
            purchaser_id: Some(PurchaserId(1)),
            event_id: Some(EventId(1)),
            payment_method: Some("tarjeta".to_string()),
            total_paid: Some(Decimal::new(80, 0)),
            line_items: Some(vec![line(1, 3, 10), line(2, 1, 50)]),
            sections: vec![SectionSelection::new(
                "general",
                vec![SeatCoordinate::new(1, 1), SeatCoordinate::new(1, 2)],
            )],
            event_kind: Some(EventKind::Theater),
            ..PurchaseRequest::default()
        }
    }

    fn missing_of(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation { fields, .. } => fields,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn seated_request_passes_and_sums_quantities() {
        let purchase = validate_purchase(seated_request()).expect("valid request");
        assert_eq!(purchase.quantity, 4);
        assert_eq!(purchase.line_items.len(), 2);
        assert_eq!(purchase.total_paid, Decimal::new(80, 0));
        assert_eq!(purchase.sections.len(), 1);
    }

    #[test]
    fn seated_request_lists_every_missing_field() {
        let request = PurchaseRequest {
            event_kind: Some(EventKind::Cinema),
            payment_method: Some("   ".to_string()),
            ..PurchaseRequest::default()
        };
        let missing = missing_of(validate_purchase(request).expect_err("incomplete"));
        assert_eq!(
            missing,
            vec![
                "usuario_id",
                "evento_id",
                "metodo_pago",
                "total_pagado",
                "ticket_details"
            ]
        );
    }

    #[test]
    fn missing_event_kind_is_rejected() {
        let request = PurchaseRequest {
            event_kind: None,
            ..seated_request()
        };
        let missing = missing_of(validate_purchase(request).expect_err("no kind"));
        assert_eq!(missing, vec!["tipo_evento"]);
    }

    #[test]
    fn capacity_request_only_needs_line_items() {
        let request = PurchaseRequest {
            event_id: Some(EventId(9)),
            line_items: Some(vec![line(5, 2, 15)]),
            sections: vec![SectionSelection::new("general", vec![SeatCoordinate::new(1, 1)])],
            event_kind: Some(EventKind::Museum),
            ..PurchaseRequest::default()
        };
        let purchase = validate_purchase(request).expect("museum request");
        assert_eq!(purchase.allocation_mode(), AllocationMode::CapacityOnly);
        assert_eq!(purchase.total_paid, Decimal::new(30, 0));
        assert!(purchase.sections.is_empty());
        assert!(purchase.payment_method.is_none());
    }

    #[test]
    fn zero_quantity_line_item_is_incomplete() {
        let mut request = seated_request();
        request.line_items = Some(vec![line(1, 3, 10), LineItemInput {
            quantity: Some(0),
            ..line(2, 1, 50)
        }]);
        let missing = missing_of(validate_purchase(request).expect_err("zero quantity"));
        assert_eq!(missing, vec!["ticket_details[1].cantidad"]);
    }

    #[test]
    fn counts_beyond_storage_range_are_rejected() {
        let mut request = seated_request();
        request.line_items = Some(vec![LineItemInput {
            quantity: Some(3_000_000_000),
            subtotal: Some(Decimal::ONE),
            ..line(1, 1, 10)
        }]);
        let missing = missing_of(validate_purchase(request).expect_err("huge quantity"));
        assert_eq!(missing, vec!["ticket_details[0].cantidad"]);

        let mut request = seated_request();
        request.line_items = Some(vec![
            line(1, MAX_INVENTORY_COUNT, 1),
            line(2, 1, 50),
        ]);
        let missing = missing_of(validate_purchase(request).expect_err("total overflows"));
        assert_eq!(missing, vec!["ticket_details"]);

        let mut request = seated_request();
        request.sections = vec![SectionSelection::new(
            "platea",
            vec![SeatCoordinate::new(u32::MAX, 1)],
        )];
        let missing = missing_of(validate_purchase(request).expect_err("huge row"));
        assert_eq!(missing, vec!["secciones_info.asientos"]);

        let request = PurchaseRequest {
            event_id: Some(EventId(9)),
            line_items: Some(vec![LineItemInput {
                quantity: Some(MAX_INVENTORY_COUNT + 1),
                subtotal: Some(Decimal::ONE),
                ..line(5, 1, 15)
            }]),
            event_kind: Some(EventKind::Museum),
            ..PurchaseRequest::default()
        };
        let missing = missing_of(validate_purchase(request).expect_err("museum overflow"));
        assert_eq!(missing, vec!["ticket_details[0].cantidad"]);
    }

    #[test]
    fn duplicate_seat_in_selection_is_rejected() {
        let mut request = seated_request();
        request.sections = vec![SectionSelection::new(
            "platea",
            vec![SeatCoordinate::new(3, 5), SeatCoordinate::new(3, 5)],
        )];
        let err = validate_purchase(request).expect_err("duplicate seat");
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("platea"));
    }

    #[test]
    fn failures_are_counted_by_reason() {
        let metrics = Metrics::default();
        record_failure(
            &metrics,
            &AppError::CapacityExceeded {
                requested: 10,
                available: 5,
            },
        );
        record_failure(&metrics, &AppError::SectionNotFound("x".to_string()));
        assert_eq!(metrics.purchases_aborted(), 2);
        assert!(metrics
            .render_prometheus()
            .contains("boxoffice_capacity_rejections_total 1"));
    }
}
