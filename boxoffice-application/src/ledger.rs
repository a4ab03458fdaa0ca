use boxoffice_domain::ports::{LedgerReader, StoreScope};
use boxoffice_domain::{
    LineItem, NewTransaction, PurchaserId, PurchaserTransaction, TransactionFilter,
    TransactionId, TransactionListing, TransactionView,
};
use tracing::{debug, error};

use crate::AppError;

/// Writes transaction headers and line items inside a purchase scope and
/// rebuilds committed transactions from the ledger projections.
pub struct LedgerWriter;

impl LedgerWriter {
    pub async fn create_header(
        scope: &mut dyn StoreScope,
        header: &NewTransaction,
    ) -> Result<TransactionId, AppError> {
        let transaction_id = scope.insert_transaction(header).await.map_err(|err| {
            error!("failed to insert transaction header: {}", err);
            AppError::Internal(err)
        })?;
        debug!(
            "transaction {} created for event {}",
            transaction_id, header.event_id
        );
        Ok(transaction_id)
    }

    pub async fn create_details(
        scope: &mut dyn StoreScope,
        transaction_id: TransactionId,
        items: &[LineItem],
    ) -> Result<(), AppError> {
        scope
            .insert_transaction_details(transaction_id, items)
            .await
            .map_err(|err| {
                error!(
                    "failed to insert details of transaction {}: {}",
                    transaction_id, err
                );
                AppError::Internal(err)
            })
    }

    pub async fn reconstruct(
        reader: &dyn LedgerReader,
        transaction_id: TransactionId,
    ) -> Result<TransactionView, AppError> {
        let record = reader
            .fetch_transaction(transaction_id)
            .await
            .map_err(|err| {
                error!("failed to fetch transaction {}: {}", transaction_id, err);
                AppError::Internal(err)
            })?
            .ok_or_else(|| AppError::NotFound(format!("transaction {}", transaction_id)))?;
        Ok(TransactionView::from(record))
    }

    pub async fn list_by_purchaser(
        reader: &dyn LedgerReader,
        purchaser_id: PurchaserId,
    ) -> Result<Vec<PurchaserTransaction>, AppError> {
        reader.fetch_by_purchaser(purchaser_id).await.map_err(|err| {
            error!(
                "failed to fetch transactions of purchaser {}: {}",
                purchaser_id, err
            );
            AppError::Internal(err)
        })
    }

    pub async fn list_all(
        reader: &dyn LedgerReader,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionListing>, AppError> {
        reader.fetch_all(filter).await.map_err(|err| {
            error!("failed to fetch transactions: {}", err);
            AppError::Internal(err)
        })
    }
}
