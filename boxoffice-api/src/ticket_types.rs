use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use boxoffice_catalog::{CreateTicketType, UpdateTicketType};
use boxoffice_shared::TicketType;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/ticket-types", get(list_ticket_types).post(create_ticket_type))
        .route(
            "/v1/ticket-types/{id}",
            get(get_ticket_type).put(update_ticket_type).delete(delete_ticket_type),
        )
        .route("/v1/ticket-types/event/{event_id}", get(list_by_event))
        .route("/v1/ticket-types/event/{event_id}/available", get(list_available))
}

/// GET /v1/ticket-types
async fn list_ticket_types(State(state): State<AppState>) -> Result<Json<Vec<TicketType>>, AppError> {
    Ok(Json(state.ticket_types.list().await?))
}

/// POST /v1/ticket-types
async fn create_ticket_type(
    State(state): State<AppState>,
    Json(req): Json<CreateTicketType>,
) -> Result<(StatusCode, Json<TicketType>), AppError> {
    let created = state.ticket_types.create(req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/ticket-types/{id}
async fn get_ticket_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketType>, AppError> {
    Ok(Json(state.ticket_types.get(id).await?))
}

/// PUT /v1/ticket-types/{id}
///
/// A `quota` field resizes inventory while keeping the sold count.
async fn update_ticket_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTicketType>,
) -> Result<Json<TicketType>, AppError> {
    Ok(Json(state.ticket_types.update(id, req).await?))
}

/// DELETE /v1/ticket-types/{id}
async fn delete_ticket_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.ticket_types.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/ticket-types/event/{event_id}
async fn list_by_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<TicketType>>, AppError> {
    Ok(Json(state.ticket_types.list_by_event(event_id).await?))
}

/// GET /v1/ticket-types/event/{event_id}/available
async fn list_available(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<TicketType>>, AppError> {
    Ok(Json(state.ticket_types.list_available(event_id).await?))
}
