use async_trait::async_trait;
use boxoffice_core::repository::{TransactionDetailRepository, TransactionRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{PaymentStatus, RecordState, Transaction, TransactionDetail, TransactionStatus};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory transaction and detail storage.
#[derive(Default)]
pub struct MemoryTransactionRepository {
    transactions: RwLock<HashMap<Uuid, Transaction>>,
    details: RwLock<HashMap<Uuid, Vec<TransactionDetail>>>,
}

impl MemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_details(&self, mut headers: Vec<Transaction>) -> Vec<Transaction> {
        let details = self.details.read().await;
        for tx in headers.iter_mut() {
            tx.details = details
                .get(&tx.id)
                .map(|rows| rows.iter().filter(|d| d.record.is_active()).cloned().collect())
                .unwrap_or_default();
        }
        headers
    }

    async fn set_field<F>(&self, id: Uuid, apply: F) -> bool
    where
        F: FnOnce(&mut Transaction),
    {
        let mut guard = self.transactions.write().await;
        match guard.get_mut(&id) {
            Some(tx) if tx.record.is_active() => {
                apply(tx);
                tx.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactionRepository {
    async fn create_transaction(&self, transaction: &Transaction) -> CoreResult<()> {
        let mut header = transaction.clone();
        header.details.clear();
        self.transactions.write().await.insert(header.id, header);
        Ok(())
    }

    async fn get_transaction(&self, id: Uuid) -> CoreResult<Option<Transaction>> {
        let header = self
            .transactions
            .read()
            .await
            .get(&id)
            .filter(|tx| tx.record.is_active())
            .cloned();
        match header {
            Some(tx) => Ok(self.with_details(vec![tx]).await.pop()),
            None => Ok(None),
        }
    }

    async fn list_transactions(&self) -> CoreResult<Vec<Transaction>> {
        let mut headers: Vec<Transaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.record.is_active())
            .cloned()
            .collect();
        headers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(self.with_details(headers).await)
    }

    async fn list_transactions_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Transaction>> {
        let mut all = self.list_transactions().await?;
        all.retain(|tx| tx.user_id == user_id);
        Ok(all)
    }

    async fn update_status(&self, id: Uuid, status: TransactionStatus) -> CoreResult<bool> {
        Ok(self.set_field(id, |tx| tx.status = status).await)
    }

    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> CoreResult<bool> {
        Ok(self.set_field(id, |tx| tx.payment_status = status).await)
    }

    async fn void_transaction(&self, id: Uuid) -> CoreResult<()> {
        let voided = self
            .set_field(id, |tx| {
                tx.status = TransactionStatus::Cancelled;
                tx.payment_status = PaymentStatus::Failed;
                tx.record = RecordState::deleted_now();
            })
            .await;
        if !voided {
            return Err(CoreError::not_found("transaction", id));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionDetailRepository for MemoryTransactionRepository {
    async fn insert_details(&self, details: &[TransactionDetail]) -> CoreResult<()> {
        let mut guard = self.details.write().await;
        for detail in details {
            guard.entry(detail.transaction_id).or_default().push(detail.clone());
        }
        Ok(())
    }

    async fn list_details(&self, transaction_id: Uuid) -> CoreResult<Vec<TransactionDetail>> {
        let guard = self.details.read().await;
        Ok(guard
            .get(&transaction_id)
            .map(|rows| rows.iter().filter(|d| d.record.is_active()).cloned().collect())
            .unwrap_or_default())
    }
}
