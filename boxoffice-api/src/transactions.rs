use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use boxoffice_order::CreateTransaction;
use boxoffice_shared::Transaction;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/transactions", get(list_transactions).post(create_transaction))
        .route("/v1/transactions/{id}", get(get_transaction))
        .route("/v1/transactions/user/{user_id}", get(list_user_transactions))
        .route("/v1/transactions/{id}/status", put(update_status))
        .route("/v1/transactions/{id}/payment-status", put(update_payment_status))
}

/// GET /v1/transactions
async fn list_transactions(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>, AppError> {
    Ok(Json(state.transactions.list_transactions().await?))
}

/// POST /v1/transactions
///
/// Prices the requested lines, reserves inventory and records a pending transaction.
async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    tracing::debug!("Create transaction for user {} event {} ({} lines)", req.user_id, req.event_id, req.details.len());
    let transaction = state.orchestrator.create_transaction(req).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET /v1/transactions/{id}
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(state.transactions.get_transaction(id).await?))
}

/// GET /v1/transactions/user/{user_id}
async fn list_user_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    Ok(Json(state.transactions.list_for_user(user_id).await?))
}

/// PUT /v1/transactions/{id}/status
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<StatusCode, AppError> {
    state.transactions.update_transaction_status(id, &req.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/transactions/{id}/payment-status
async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<StatusCode, AppError> {
    state.transactions.update_payment_status(id, &req.status).await?;
    Ok(StatusCode::NO_CONTENT)
}
