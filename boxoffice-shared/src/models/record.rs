use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Soft-delete state of a persisted record.
///
/// Rows are never physically removed; deleting one moves it to `Deleted` and every
/// lookup treats it as missing from then on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordState {
    #[default]
    Active,
    Deleted { at: DateTime<Utc> },
}

impl RecordState {
    pub fn is_active(&self) -> bool {
        matches!(self, RecordState::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordState::Active => None,
            RecordState::Deleted { at } => Some(*at),
        }
    }

    pub fn deleted_now() -> Self {
        RecordState::Deleted { at: Utc::now() }
    }
}

impl From<Option<DateTime<Utc>>> for RecordState {
    fn from(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => RecordState::Deleted { at },
            None => RecordState::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_column_maps_to_state() {
        assert_eq!(RecordState::from(None), RecordState::Active);

        let at = Utc::now();
        let state = RecordState::from(Some(at));
        assert!(!state.is_active());
        assert_eq!(state.deleted_at(), Some(at));
    }
}
