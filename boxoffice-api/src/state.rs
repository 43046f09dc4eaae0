use boxoffice_catalog::{EventService, InMemoryDirectory, InventoryManager, TicketTypeService, UserService};
use boxoffice_order::{MemoryTransactionRepository, TransactionOrchestrator, TransactionStatusManager};
use boxoffice_store::{
    StoreCatalogRepository, StoreTicketTypeRepository, StoreTransactionDetailRepository,
    StoreTransactionRepository, StoreUserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ticket_types: Arc<TicketTypeService>,
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub transactions: Arc<TransactionStatusManager>,
    pub events: Arc<EventService>,
    pub users: Arc<UserService>,
}

impl AppState {
    /// Services backed by Postgres.
    pub fn postgres(pool: PgPool) -> Self {
        let ticket_types = Arc::new(StoreTicketTypeRepository::new(pool.clone()));
        let catalog = Arc::new(StoreCatalogRepository::new(pool.clone()));
        let users = Arc::new(StoreUserRepository::new(pool.clone()));
        let transactions = Arc::new(StoreTransactionRepository::new(pool.clone()));
        let details = Arc::new(StoreTransactionDetailRepository::new(pool));

        Self {
            ticket_types: Arc::new(TicketTypeService::new(ticket_types.clone(), ticket_types.clone(), catalog.clone())),
            orchestrator: Arc::new(TransactionOrchestrator::new(ticket_types, transactions.clone(), details)),
            transactions: Arc::new(TransactionStatusManager::new(transactions)),
            events: Arc::new(EventService::new(catalog.clone(), catalog.clone(), catalog)),
            users: Arc::new(UserService::new(users)),
        }
    }

    /// Services backed by process memory. Nothing survives a restart.
    pub fn in_memory() -> Self {
        let inventory = Arc::new(InventoryManager::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let transactions = Arc::new(MemoryTransactionRepository::new());

        Self {
            ticket_types: Arc::new(TicketTypeService::new(inventory.clone(), inventory.clone(), directory.clone())),
            orchestrator: Arc::new(TransactionOrchestrator::new(inventory, transactions.clone(), transactions.clone())),
            transactions: Arc::new(TransactionStatusManager::new(transactions)),
            events: Arc::new(EventService::new(directory.clone(), directory.clone(), directory.clone())),
            users: Arc::new(UserService::new(directory)),
        }
    }
}
