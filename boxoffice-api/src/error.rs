use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boxoffice_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Core(err) => match err {
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::InsufficientInventory { .. }
                | CoreError::ReservationFailed { .. }
                | CoreError::HasSoldTickets { .. }
                | CoreError::AlreadyRegistered(_) => StatusCode::CONFLICT,
                CoreError::InvalidStatus(_)
                | CoreError::InvalidQuota(_)
                | CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
                CoreError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Core(err) => match err {
                CoreError::NotFound(_) => "NOT_FOUND",
                CoreError::InsufficientInventory { .. } => "INSUFFICIENT_INVENTORY",
                CoreError::ReservationFailed { .. } => "RESERVATION_FAILED",
                CoreError::HasSoldTickets { .. } => "HAS_SOLD_TICKETS",
                CoreError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
                CoreError::InvalidStatus(_) => "INVALID_STATUS",
                CoreError::InvalidQuota(_) => "INVALID_QUOTA",
                CoreError::ValidationError(_) => "VALIDATION_ERROR",
                CoreError::Storage(_) => "SERVICE_UNAVAILABLE",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let message = match &self {
            AppError::Core(CoreError::Storage(source)) => {
                tracing::error!("Storage failure: {}", source);
                "Service temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                CoreError::InsufficientInventory { ticket_type_id: Uuid::nil(), requested: 5, available: 2 },
                StatusCode::CONFLICT,
                "INSUFFICIENT_INVENTORY",
            ),
            (
                CoreError::ReservationFailed { ticket_type_id: Uuid::nil() },
                StatusCode::CONFLICT,
                "RESERVATION_FAILED",
            ),
            (
                CoreError::HasSoldTickets { ticket_type_id: Uuid::nil(), sold: 1 },
                StatusCode::CONFLICT,
                "HAS_SOLD_TICKETS",
            ),
            (CoreError::AlreadyRegistered("email".into()), StatusCode::CONFLICT, "ALREADY_REGISTERED"),
            (CoreError::InvalidStatus("bogus".into()), StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            (CoreError::InvalidQuota("-1".into()), StatusCode::BAD_REQUEST, "INVALID_QUOTA"),
            (CoreError::ValidationError("empty".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ];

        for (err, status, code) in cases {
            let app = AppError::from(err);
            assert_eq!(app.status_code(), status);
            assert_eq!(app.code(), code);
        }
    }

    #[test]
    fn test_storage_is_503() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "pool timed out");
        let err = AppError::from(CoreError::storage(io));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
