pub mod record;
pub mod venue;
pub mod ticket_type;
pub mod transaction;
pub mod user;

pub use record::RecordState;
pub use venue::{Event, EventDetails, Location, Schedule};
pub use ticket_type::TicketType;
pub use transaction::{PaymentStatus, Transaction, TransactionDetail, TransactionStatus, UnknownStatus};
pub use user::User;
