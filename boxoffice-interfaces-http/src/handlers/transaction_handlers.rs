use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use boxoffice_application::commands::create_transaction;
use boxoffice_application::queries::{get_transaction, list_by_purchaser, list_transactions};
use boxoffice_application::AppState;
use boxoffice_domain::{
    PurchaseRequest, PurchaserId, PurchaserTransaction, TransactionId, TransactionPage,
    TransactionQuery, TransactionView,
};

use crate::error::HttpError;

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub message: &'static str,
    pub transaction_id: TransactionId,
    pub transaction: TransactionView,
}

/// Envelope shared by the read endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T> DataResponse<T> {
    fn ok(message: &'static str, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            data,
        })
    }
}

pub async fn create_purchase(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseResponse>), HttpError> {
    let Json(request) = payload?;
    let receipt = create_transaction(&state, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            success: true,
            message: "transaction recorded",
            transaction_id: receipt.transaction_id,
            transaction: receipt.transaction,
        }),
    ))
}

pub async fn get_transaction_by_id(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DataResponse<TransactionView>>, HttpError> {
    let Path(id) = id?;
    let transaction = get_transaction(&state, TransactionId(id)).await?;
    Ok(DataResponse::ok("transaction retrieved", transaction))
}

pub async fn list_purchaser_transactions(
    State(state): State<AppState>,
    purchaser: Result<Path<i64>, PathRejection>,
) -> Result<Json<DataResponse<Vec<PurchaserTransaction>>>, HttpError> {
    let Path(purchaser) = purchaser?;
    let transactions = list_by_purchaser(&state, PurchaserId(purchaser)).await?;
    Ok(DataResponse::ok("transactions retrieved", transactions))
}

pub async fn list_all_transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<DataResponse<TransactionPage>>, HttpError> {
    let Query(query) = query?;
    let page = list_transactions(&state, query).await?;
    Ok(DataResponse::ok("transactions retrieved", page))
}
