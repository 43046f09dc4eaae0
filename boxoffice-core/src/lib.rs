pub mod repository;

use boxoffice_shared::UnknownStatus;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Insufficient inventory for ticket type {ticket_type_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        ticket_type_id: Uuid,
        requested: i32,
        available: i32,
    },
    #[error("Could not reserve quota for ticket type {ticket_type_id}")]
    ReservationFailed { ticket_type_id: Uuid },
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Invalid quota: {0}")]
    InvalidQuota(String),
    #[error("Ticket type {ticket_type_id} has {sold} sold tickets")]
    HasSoldTickets { ticket_type_id: Uuid, sold: i32 },
    #[error("{0} already registered")]
    AlreadyRegistered(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    pub fn not_found(kind: &str, id: Uuid) -> Self {
        CoreError::NotFound(format!("{} {}", kind, id))
    }

    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CoreError::Storage(Box::new(err))
    }
}

impl From<UnknownStatus> for CoreError {
    fn from(err: UnknownStatus) -> Self {
        CoreError::InvalidStatus(err.0)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
