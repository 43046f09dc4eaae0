pub mod models;
pub mod pii;

pub use models::{
    Event, EventDetails, Location, PaymentStatus, RecordState, Schedule, TicketType, Transaction,
    TransactionDetail, TransactionStatus, UnknownStatus, User,
};
pub use pii::Masked;
