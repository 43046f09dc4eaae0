use boxoffice_catalog::pricing::{LineRequest, PricingEngine};
use boxoffice_core::repository::{InventoryStore, TransactionDetailRepository, TransactionRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{Transaction, TransactionDetail};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub payment_method: String,
    #[serde(default)]
    pub payment_url: String,
    #[serde(default)]
    pub payment_callback: Option<String>,
    pub details: Vec<LineRequest>,
}

/// Drives transaction creation: price, persist, reserve inventory, persist line items.
///
/// Either the whole transaction commits with its inventory reserved, or every applied
/// reservation is released and the transaction is voided before the error is returned.
pub struct TransactionOrchestrator {
    pricing: PricingEngine,
    inventory: Arc<dyn InventoryStore>,
    transactions: Arc<dyn TransactionRepository>,
    details: Arc<dyn TransactionDetailRepository>,
}

impl TransactionOrchestrator {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        transactions: Arc<dyn TransactionRepository>,
        details: Arc<dyn TransactionDetailRepository>,
    ) -> Self {
        Self {
            pricing: PricingEngine::new(inventory.clone()),
            inventory,
            transactions,
            details,
        }
    }

    pub async fn create_transaction(&self, req: CreateTransaction) -> CoreResult<Transaction> {
        // 1. Validate request shape
        validate(&req)?;

        // 2. Resolve prices and check availability
        let quote = self.pricing.quote(req.event_id, &req.details).await?;

        // 3. Build the header and line items, then persist the pending header
        let mut transaction = Transaction::pending(
            req.user_id,
            req.event_id,
            quote.total_amount,
            req.payment_method,
            req.payment_url,
            req.payment_callback,
        );
        let details = quote
            .lines
            .iter()
            .map(|l| {
                TransactionDetail::new(transaction.id, l.ticket_type_id, l.quantity, l.price_per_ticket)
                    .ok_or_else(|| {
                        CoreError::ValidationError(format!("amount for ticket type {} is out of range", l.ticket_type_id))
                    })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        self.transactions.create_transaction(&transaction).await?;

        // 4. Reserve quota line by line
        let mut reserved: Vec<(Uuid, i32)> = Vec::with_capacity(quote.lines.len());
        for line in &quote.lines {
            match self.inventory.reserve_quota(line.ticket_type_id, line.quantity).await {
                Ok(_) => reserved.push((line.ticket_type_id, line.quantity)),
                Err(err) => {
                    tracing::warn!(
                        "Reservation of {} x {} failed for transaction {}: {}",
                        line.quantity, line.ticket_type_id, transaction.id, err
                    );
                    self.compensate(transaction.id, &reserved).await;
                    return Err(match err {
                        CoreError::Storage(_) => err,
                        _ => CoreError::ReservationFailed { ticket_type_id: line.ticket_type_id },
                    });
                }
            }
        }

        // 5. Persist line items with the quoted prices
        if let Err(err) = self.details.insert_details(&details).await {
            tracing::error!("Failed to persist details for transaction {}: {}", transaction.id, err);
            self.compensate(transaction.id, &reserved).await;
            return Err(err);
        }

        transaction.details = details;
        tracing::info!(
            "Created transaction {} for user {}: {} lines, total {}",
            transaction.id, transaction.user_id, transaction.details.len(), transaction.total_amount
        );
        Ok(transaction)
    }

    /// Releases applied reservations newest first, then voids the transaction.
    async fn compensate(&self, transaction_id: Uuid, reserved: &[(Uuid, i32)]) {
        tracing::warn!("Compensating transaction {}: releasing {} reservations", transaction_id, reserved.len());

        for (ticket_type_id, quantity) in reserved.iter().rev() {
            if let Err(e) = self.inventory.release_quota(*ticket_type_id, *quantity).await {
                tracing::error!(
                    "Failed to release {} x {} for transaction {}: {}",
                    quantity, ticket_type_id, transaction_id, e
                );
            }
        }

        if let Err(e) = self.transactions.void_transaction(transaction_id).await {
            tracing::error!("Failed to void transaction {}: {}", transaction_id, e);
        }
    }
}

fn validate(req: &CreateTransaction) -> CoreResult<()> {
    if req.details.is_empty() {
        return Err(CoreError::ValidationError("at least one ticket line is required".to_string()));
    }
    if let Some(line) = req.details.iter().find(|l| l.quantity < 1) {
        return Err(CoreError::ValidationError(format!(
            "quantity for ticket type {} must be at least 1",
            line.ticket_type_id
        )));
    }
    if req.payment_method.trim().is_empty() {
        return Err(CoreError::ValidationError("payment_method is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransactionRepository;
    use async_trait::async_trait;
    use boxoffice_catalog::inventory::InventoryManager;
    use boxoffice_core::repository::TicketTypeRepository;
    use boxoffice_shared::{PaymentStatus, TicketType, TransactionStatus};
    use rust_decimal::Decimal;

    struct Harness {
        inventory: Arc<InventoryManager>,
        repo: Arc<MemoryTransactionRepository>,
        orchestrator: TransactionOrchestrator,
        event_id: Uuid,
    }

    fn harness(ticket_types: Vec<TicketType>, event_id: Uuid) -> Harness {
        let inventory = Arc::new(InventoryManager::with_ticket_types(ticket_types));
        let repo = Arc::new(MemoryTransactionRepository::new());
        let orchestrator = TransactionOrchestrator::new(inventory.clone(), repo.clone(), repo.clone());
        Harness { inventory, repo, orchestrator, event_id }
    }

    fn ticket_type(event_id: Uuid, price: Decimal, quota: i32) -> TicketType {
        TicketType::new(event_id, "GA".into(), String::new(), price, quota)
    }

    fn request(event_id: Uuid, lines: &[(Uuid, i32)]) -> CreateTransaction {
        CreateTransaction {
            user_id: Uuid::new_v4(),
            event_id,
            payment_method: "virtual_account".into(),
            payment_url: "https://pay.example/checkout".into(),
            payment_callback: None,
            details: lines
                .iter()
                .map(|&(ticket_type_id, quantity)| LineRequest { ticket_type_id, quantity })
                .collect(),
        }
    }

    async fn remaining(inventory: &InventoryManager, id: Uuid) -> i32 {
        inventory.fetch_ticket_type(id).await.unwrap().remaining_quota
    }

    #[tokio::test]
    async fn test_single_line_purchase() {
        let event_id = Uuid::new_v4();
        let tt = ticket_type(event_id, Decimal::new(5000, 2), 10);
        let id = tt.id;
        let h = harness(vec![tt], event_id);

        let tx = h.orchestrator.create_transaction(request(h.event_id, &[(id, 3)])).await.unwrap();

        assert_eq!(tx.total_amount, Decimal::new(15000, 2));
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.payment_status, PaymentStatus::Pending);
        assert_eq!(tx.details.len(), 1);
        assert_eq!(tx.details[0].subtotal, Decimal::new(15000, 2));
        assert_eq!(remaining(&h.inventory, id).await, 7);

        let stored = h.repo.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.details, tx.details);
    }

    #[tokio::test]
    async fn test_insufficient_inventory_has_no_effect() {
        let event_id = Uuid::new_v4();
        let mut tt = ticket_type(event_id, Decimal::new(5000, 2), 10);
        tt.remaining_quota = 2;
        let id = tt.id;
        let h = harness(vec![tt], event_id);

        let err = h.orchestrator.create_transaction(request(h.event_id, &[(id, 5)])).await.unwrap_err();

        assert!(matches!(err, CoreError::InsufficientInventory { requested: 5, available: 2, .. }));
        assert_eq!(remaining(&h.inventory, id).await, 2);
        assert!(h.repo.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multi_line_purchase() {
        let event_id = Uuid::new_v4();
        let ga = ticket_type(event_id, Decimal::new(5000, 2), 10);
        let vip = ticket_type(event_id, Decimal::new(20000, 2), 5);
        let (ga_id, vip_id) = (ga.id, vip.id);
        let h = harness(vec![ga, vip], event_id);

        let tx = h
            .orchestrator
            .create_transaction(request(h.event_id, &[(ga_id, 4), (vip_id, 2)]))
            .await
            .unwrap();

        assert_eq!(tx.total_amount, Decimal::new(60000, 2));
        assert_eq!(tx.details_total(), Some(tx.total_amount));
        assert_eq!(remaining(&h.inventory, ga_id).await, 6);
        assert_eq!(remaining(&h.inventory, vip_id).await, 3);
    }

    #[tokio::test]
    async fn test_validation() {
        let event_id = Uuid::new_v4();
        let tt = ticket_type(event_id, Decimal::from(10), 10);
        let id = tt.id;
        let h = harness(vec![tt], event_id);

        let empty = request(h.event_id, &[]);
        assert!(matches!(
            h.orchestrator.create_transaction(empty).await,
            Err(CoreError::ValidationError(_))
        ));

        let zero = request(h.event_id, &[(id, 0)]);
        assert!(matches!(
            h.orchestrator.create_transaction(zero).await,
            Err(CoreError::ValidationError(_))
        ));

        let mut no_method = request(h.event_id, &[(id, 1)]);
        no_method.payment_method = "  ".into();
        assert!(matches!(
            h.orchestrator.create_transaction(no_method).await,
            Err(CoreError::ValidationError(_))
        ));

        assert_eq!(remaining(&h.inventory, id).await, 10);
    }

    #[tokio::test]
    async fn test_amount_overflow_is_rejected_before_any_write() {
        let event_id = Uuid::new_v4();
        let tt = ticket_type(event_id, Decimal::MAX, 10);
        let id = tt.id;
        let h = harness(vec![tt], event_id);

        let err = h.orchestrator.create_transaction(request(h.event_id, &[(id, 2)])).await.unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(remaining(&h.inventory, id).await, 10);
        assert!(h.repo.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_change_does_not_touch_existing_details() {
        let event_id = Uuid::new_v4();
        let tt = ticket_type(event_id, Decimal::new(5000, 2), 10);
        let id = tt.id;
        let h = harness(vec![tt], event_id);

        let tx = h.orchestrator.create_transaction(request(h.event_id, &[(id, 2)])).await.unwrap();
        h.inventory
            .update_ticket_type_details(id, "GA", "", Decimal::new(9900, 2))
            .await
            .unwrap();

        let stored = h.repo.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.total_amount, Decimal::new(10000, 2));
        assert_eq!(stored.details[0].price_per_ticket, Decimal::new(5000, 2));
        assert_eq!(stored.details[0].subtotal, Decimal::new(10000, 2));
    }

    /// Lets a competing buyer take the last units of one ticket type between the
    /// availability check and the reservation.
    struct RacingInventory {
        inner: Arc<InventoryManager>,
        contested: Uuid,
    }

    #[async_trait]
    impl InventoryStore for RacingInventory {
        async fn fetch_ticket_type(&self, id: Uuid) -> CoreResult<TicketType> {
            self.inner.fetch_ticket_type(id).await
        }

        async fn reserve_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
            if id == self.contested {
                let left = self.inner.fetch_ticket_type(id).await?.remaining_quota;
                self.inner.reserve_quota(id, left).await?;
            }
            self.inner.reserve_quota(id, quantity).await
        }

        async fn release_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
            self.inner.release_quota(id, quantity).await
        }

        async fn resize_quota(&self, id: Uuid, new_quota: i32) -> CoreResult<TicketType> {
            self.inner.resize_quota(id, new_quota).await
        }
    }

    #[tokio::test]
    async fn test_failed_reservation_releases_earlier_lines() {
        let event_id = Uuid::new_v4();
        let ga = ticket_type(event_id, Decimal::from(50), 10);
        let vip = ticket_type(event_id, Decimal::from(200), 5);
        let (ga_id, vip_id) = (ga.id, vip.id);
        let inner = Arc::new(InventoryManager::with_ticket_types([ga, vip]));
        let repo = Arc::new(MemoryTransactionRepository::new());
        let racing = Arc::new(RacingInventory { inner: inner.clone(), contested: vip_id });
        let orchestrator = TransactionOrchestrator::new(racing, repo.clone(), repo.clone());

        let err = orchestrator
            .create_transaction(request(event_id, &[(ga_id, 3), (vip_id, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ReservationFailed { ticket_type_id } if ticket_type_id == vip_id));
        assert_eq!(remaining(&inner, ga_id).await, 10);
        // The competitor keeps what it bought
        assert_eq!(remaining(&inner, vip_id).await, 0);
        assert!(repo.list_transactions().await.unwrap().is_empty());
    }

    /// Drops the database connection while reserving one ticket type.
    struct FlakyInventory {
        inner: Arc<InventoryManager>,
        broken: Uuid,
    }

    #[async_trait]
    impl InventoryStore for FlakyInventory {
        async fn fetch_ticket_type(&self, id: Uuid) -> CoreResult<TicketType> {
            self.inner.fetch_ticket_type(id).await
        }

        async fn reserve_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
            if id == self.broken {
                return Err(CoreError::storage(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )));
            }
            self.inner.reserve_quota(id, quantity).await
        }

        async fn release_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
            self.inner.release_quota(id, quantity).await
        }

        async fn resize_quota(&self, id: Uuid, new_quota: i32) -> CoreResult<TicketType> {
            self.inner.resize_quota(id, new_quota).await
        }
    }

    #[tokio::test]
    async fn test_storage_failure_during_reservation_stays_storage() {
        let event_id = Uuid::new_v4();
        let ga = ticket_type(event_id, Decimal::from(50), 10);
        let vip = ticket_type(event_id, Decimal::from(200), 5);
        let (ga_id, vip_id) = (ga.id, vip.id);
        let inner = Arc::new(InventoryManager::with_ticket_types([ga, vip]));
        let repo = Arc::new(MemoryTransactionRepository::new());
        let flaky = Arc::new(FlakyInventory { inner: inner.clone(), broken: vip_id });
        let orchestrator = TransactionOrchestrator::new(flaky, repo.clone(), repo.clone());

        let err = orchestrator
            .create_transaction(request(event_id, &[(ga_id, 3), (vip_id, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(remaining(&inner, ga_id).await, 10);
        assert_eq!(remaining(&inner, vip_id).await, 5);
        assert!(repo.list_transactions().await.unwrap().is_empty());
    }

    struct FailingDetails;

    #[async_trait]
    impl TransactionDetailRepository for FailingDetails {
        async fn insert_details(&self, _details: &[TransactionDetail]) -> CoreResult<()> {
            Err(CoreError::storage(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "connection lost",
            )))
        }

        async fn list_details(&self, _transaction_id: Uuid) -> CoreResult<Vec<TransactionDetail>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_detail_write_failure_rolls_back() {
        let event_id = Uuid::new_v4();
        let tt = ticket_type(event_id, Decimal::from(50), 10);
        let id = tt.id;
        let inventory = Arc::new(InventoryManager::with_ticket_types([tt]));
        let repo = Arc::new(MemoryTransactionRepository::new());
        let orchestrator = TransactionOrchestrator::new(inventory.clone(), repo.clone(), Arc::new(FailingDetails));

        let err = orchestrator.create_transaction(request(event_id, &[(id, 4)])).await.unwrap_err();

        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(remaining(&inventory, id).await, 10);
        assert!(repo.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_never_oversell() {
        let event_id = Uuid::new_v4();
        let tt = ticket_type(event_id, Decimal::from(25), 10);
        let id = tt.id;
        let h = Arc::new(harness(vec![tt], event_id));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let h = h.clone();
            handles.push(tokio::spawn(async move {
                h.orchestrator.create_transaction(request(h.event_id, &[(id, 1)])).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(CoreError::InsufficientInventory { .. }) | Err(CoreError::ReservationFailed { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(remaining(&h.inventory, id).await, 0);
        assert_eq!(h.repo.list_transactions().await.unwrap().len(), 10);
    }
}
