use boxoffice_core::repository::TransactionRepository;
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{PaymentStatus, Transaction, TransactionStatus};
use std::sync::Arc;
use uuid::Uuid;

/// Reads transactions and applies status writes to existing ones.
///
/// Order status and payment status are independent fields. A value is accepted if it
/// belongs to the field's set; there is no check on which value it replaces.
pub struct TransactionStatusManager {
    transactions: Arc<dyn TransactionRepository>,
}

impl TransactionStatusManager {
    pub fn new(transactions: Arc<dyn TransactionRepository>) -> Self {
        Self { transactions }
    }

    pub async fn get_transaction(&self, id: Uuid) -> CoreResult<Transaction> {
        self.transactions
            .get_transaction(id)
            .await?
            .ok_or_else(|| CoreError::not_found("transaction", id))
    }

    pub async fn list_transactions(&self) -> CoreResult<Vec<Transaction>> {
        self.transactions.list_transactions().await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Transaction>> {
        self.transactions.list_transactions_by_user(user_id).await
    }

    pub async fn update_transaction_status(&self, id: Uuid, status: &str) -> CoreResult<()> {
        // TODO: reject regressions such as completed -> pending.
        let status: TransactionStatus = status.parse()?;
        self.get_transaction(id).await?;

        if !self.transactions.update_status(id, status).await? {
            return Err(CoreError::not_found("transaction", id));
        }
        tracing::info!("Transaction {} status set to {}", id, status);
        Ok(())
    }

    pub async fn update_payment_status(&self, id: Uuid, status: &str) -> CoreResult<()> {
        let status: PaymentStatus = status.parse()?;
        self.get_transaction(id).await?;

        if !self.transactions.update_payment_status(id, status).await? {
            return Err(CoreError::not_found("transaction", id));
        }
        tracing::info!("Transaction {} payment status set to {}", id, status);
        Ok(())
    }
}
