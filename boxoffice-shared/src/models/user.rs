use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::RecordState;
use crate::pii::Masked;

/// A ticket buyer. Credentials live with the identity provider, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    #[serde(skip)]
    pub record: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
