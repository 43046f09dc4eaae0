pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod ticket_type_repo;
pub mod transaction_repo;
pub mod user_repo;

pub use app_config::Config;
pub use catalog_repo::StoreCatalogRepository;
pub use database::DbClient;
pub use ticket_type_repo::StoreTicketTypeRepository;
pub use transaction_repo::{StoreTransactionDetailRepository, StoreTransactionRepository};
pub use user_repo::StoreUserRepository;
