use async_trait::async_trait;
use boxoffice_shared::{
    Event, Location, PaymentStatus, Schedule, TicketType, Transaction, TransactionDetail,
    TransactionStatus, User,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::CoreResult;

/// Quota bookkeeping for ticket types.
///
/// Every method is a single atomic operation against the backing store. Soft-deleted
/// ticket types are reported as `NotFound`.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn fetch_ticket_type(&self, id: Uuid) -> CoreResult<TicketType>;

    /// Decrements `remaining_quota` by `quantity` only if enough is left at the moment of
    /// the update. Fails with `InsufficientInventory` otherwise.
    async fn reserve_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType>;

    /// Gives back previously reserved quota. Never raises `remaining_quota` above `quota`.
    async fn release_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType>;

    /// Moves `quota` and `remaining_quota` by the same delta so the sold count is kept.
    async fn resize_quota(&self, id: Uuid, new_quota: i32) -> CoreResult<TicketType>;
}

#[async_trait]
pub trait TicketTypeRepository: Send + Sync {
    async fn create_ticket_type(&self, ticket_type: &TicketType) -> CoreResult<()>;

    async fn get_ticket_type(&self, id: Uuid) -> CoreResult<Option<TicketType>>;

    async fn list_ticket_types(&self) -> CoreResult<Vec<TicketType>>;

    async fn list_ticket_types_by_event(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>>;

    /// Ticket types of the event with `remaining_quota > 0`.
    async fn list_available_ticket_types(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>>;

    /// Updates descriptive fields and price. Quota is only changed through `InventoryStore`.
    async fn update_ticket_type_details(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
        price: Decimal,
    ) -> CoreResult<Option<TicketType>>;

    /// Soft-deletes the ticket type if nothing has been sold. Returns `false` when the row
    /// is missing or has sales at the moment of the update.
    async fn delete_unsold_ticket_type(&self, id: Uuid) -> CoreResult<bool>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Persists the transaction header. Details are written separately.
    async fn create_transaction(&self, transaction: &Transaction) -> CoreResult<()>;

    /// Loads the transaction together with its details.
    async fn get_transaction(&self, id: Uuid) -> CoreResult<Option<Transaction>>;

    async fn list_transactions(&self) -> CoreResult<Vec<Transaction>>;

    /// Newest first.
    async fn list_transactions_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Transaction>>;

    async fn update_status(&self, id: Uuid, status: TransactionStatus) -> CoreResult<bool>;

    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> CoreResult<bool>;

    /// Marks a transaction cancelled with a failed payment and soft-deletes it.
    async fn void_transaction(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait TransactionDetailRepository: Send + Sync {
    /// Writes all details in one batch; either all rows land or none do.
    async fn insert_details(&self, details: &[TransactionDetail]) -> CoreResult<()>;

    async fn list_details(&self, transaction_id: Uuid) -> CoreResult<Vec<TransactionDetail>>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create_location(&self, location: &Location) -> CoreResult<()>;
    async fn get_location(&self, id: Uuid) -> CoreResult<Option<Location>>;
    async fn list_locations(&self) -> CoreResult<Vec<Location>>;
    async fn update_location(&self, location: &Location) -> CoreResult<bool>;
    async fn delete_location(&self, id: Uuid) -> CoreResult<bool>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create_schedule(&self, schedule: &Schedule) -> CoreResult<()>;
    async fn get_schedule(&self, id: Uuid) -> CoreResult<Option<Schedule>>;
    async fn list_schedules(&self) -> CoreResult<Vec<Schedule>>;
    async fn update_schedule(&self, schedule: &Schedule) -> CoreResult<bool>;
    async fn delete_schedule(&self, id: Uuid) -> CoreResult<bool>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create_event(&self, event: &Event) -> CoreResult<()>;
    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>>;
    async fn list_events(&self) -> CoreResult<Vec<Event>>;
    async fn update_event(&self, event: &Event) -> CoreResult<bool>;
    async fn delete_event(&self, id: Uuid) -> CoreResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> CoreResult<()>;
    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;
    async fn list_users(&self) -> CoreResult<Vec<User>>;
    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>>;
    async fn find_user_by_phone(&self, phone: &str) -> CoreResult<Option<User>>;
    async fn update_user(&self, user: &User) -> CoreResult<bool>;
    async fn delete_user(&self, id: Uuid) -> CoreResult<bool>;
}
