use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod events;
pub mod health;
pub mod state;
pub mod ticket_types;
pub mod transactions;
pub mod users;

pub use error::AppError;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(health::routes())
        .merge(events::routes())
        .merge(users::routes())
        .merge(ticket_types::routes())
        .merge(transactions::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
