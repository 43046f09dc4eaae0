use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::RecordState;

/// A purchasable class of ticket for one event, with finite inventory.
///
/// `remaining_quota` stays within `0..=quota`. The difference between the two is the
/// number of tickets sold and is preserved across resizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketType {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quota: i32,
    pub remaining_quota: i32,
    #[serde(skip)]
    pub record: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketType {
    pub fn new(event_id: Uuid, name: String, description: String, price: Decimal, quota: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            event_id,
            name,
            description,
            price,
            quota,
            remaining_quota: quota,
            record: RecordState::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sold(&self) -> i32 {
        self.quota - self.remaining_quota
    }

    pub fn has_sales(&self) -> bool {
        self.sold() > 0
    }

    pub fn is_active(&self) -> bool {
        self.record.is_active()
    }
}
