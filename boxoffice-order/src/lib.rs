pub mod manager;
pub mod memory;
pub mod orchestrator;

pub use manager::TransactionStatusManager;
pub use memory::MemoryTransactionRepository;
pub use orchestrator::{CreateTransaction, TransactionOrchestrator};
