use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use boxoffice_catalog::{EventInput, LocationInput, ScheduleInput};
use boxoffice_shared::{EventDetails, Location, Schedule};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/locations", get(list_locations).post(create_location))
        .route(
            "/v1/locations/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
        .route("/v1/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/v1/schedules/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/v1/events", get(list_events).post(create_event))
        .route(
            "/v1/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

// ---- locations ----

async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(state.events.list_locations().await?))
}

async fn create_location(
    State(state): State<AppState>,
    Json(input): Json<LocationInput>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    Ok((StatusCode::CREATED, Json(state.events.create_location(input).await?)))
}

async fn get_location(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Location>, AppError> {
    Ok(Json(state.events.get_location(id).await?))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<LocationInput>,
) -> Result<Json<Location>, AppError> {
    Ok(Json(state.events.update_location(id, input).await?))
}

async fn delete_location(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.events.delete_location(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- schedules ----

async fn list_schedules(State(state): State<AppState>) -> Result<Json<Vec<Schedule>>, AppError> {
    Ok(Json(state.events.list_schedules().await?))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(input): Json<ScheduleInput>,
) -> Result<(StatusCode, Json<Schedule>), AppError> {
    Ok((StatusCode::CREATED, Json(state.events.create_schedule(input).await?)))
}

async fn get_schedule(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Schedule>, AppError> {
    Ok(Json(state.events.get_schedule(id).await?))
}

async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ScheduleInput>,
) -> Result<Json<Schedule>, AppError> {
    Ok(Json(state.events.update_schedule(id, input).await?))
}

async fn delete_schedule(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.events.delete_schedule(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- events ----

/// GET /v1/events
async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventDetails>>, AppError> {
    Ok(Json(state.events.list_events().await?))
}

/// POST /v1/events
async fn create_event(
    State(state): State<AppState>,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<EventDetails>), AppError> {
    Ok((StatusCode::CREATED, Json(state.events.create_event(input).await?)))
}

/// GET /v1/events/{id}
async fn get_event(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<EventDetails>, AppError> {
    Ok(Json(state.events.get_event(id).await?))
}

/// PUT /v1/events/{id}
async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<EventInput>,
) -> Result<Json<EventDetails>, AppError> {
    Ok(Json(state.events.update_event(id, input).await?))
}

/// DELETE /v1/events/{id}
async fn delete_event(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.events.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
