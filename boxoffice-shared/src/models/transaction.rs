use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::record::RecordState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "confirmed" => Ok(TransactionStatus::Confirmed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            "completed" => Ok(TransactionStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A purchase of one or more ticket types for a single event.
///
/// `total_amount` is fixed when the transaction is created and always equals the sum of
/// the details' subtotals at that time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub total_amount: Decimal,
    pub status: TransactionStatus,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_url: String,
    pub payment_callback: Option<String>,
    #[serde(skip)]
    pub record: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub details: Vec<TransactionDetail>,
}

impl Transaction {
    /// New transaction awaiting payment. Details are attached once inventory is reserved.
    pub fn pending(
        user_id: Uuid,
        event_id: Uuid,
        total_amount: Decimal,
        payment_method: String,
        payment_url: String,
        payment_callback: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            total_amount,
            status: TransactionStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Pending,
            payment_url,
            payment_callback,
            record: RecordState::Active,
            created_at: now,
            updated_at: now,
            details: Vec::new(),
        }
    }

    /// Sum of the line subtotals, or `None` if it does not fit a `Decimal`.
    pub fn details_total(&self) -> Option<Decimal> {
        self.details
            .iter()
            .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(d.subtotal))
    }
}

/// One line of a transaction. The unit price is a snapshot taken at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDetail {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub ticket_type_id: Uuid,
    pub quantity: i32,
    pub price_per_ticket: Decimal,
    pub subtotal: Decimal,
    #[serde(skip)]
    pub record: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionDetail {
    /// Returns `None` when `price_per_ticket * quantity` overflows.
    pub fn new(transaction_id: Uuid, ticket_type_id: Uuid, quantity: i32, price_per_ticket: Decimal) -> Option<Self> {
        let subtotal = price_per_ticket.checked_mul(Decimal::from(quantity))?;
        let now = Utc::now();
        Some(Self {
            id: Uuid::new_v4(),
            transaction_id,
            ticket_type_id,
            quantity,
            price_per_ticket,
            subtotal,
            record: RecordState::Active,
            created_at: now,
            updated_at: now,
        })
    }
}
