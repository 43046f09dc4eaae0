use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use boxoffice_api::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Location, schedule, event and a ticket type with the given quota.
async fn seed(app: &Router, quota: i32) -> (String, String) {
    let (status, location) = send(
        app,
        "POST",
        "/v1/locations",
        Some(json!({
            "name": "Istora Senayan",
            "address": "Jl. Pintu Satu",
            "city": "Jakarta",
            "country": "Indonesia"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, schedule) = send(
        app,
        "POST",
        "/v1/schedules",
        Some(json!({
            "title": "Night one",
            "start_date": "2026-12-01T19:00:00Z",
            "end_date": "2026-12-01T23:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, event) = send(
        app,
        "POST",
        "/v1/events",
        Some(json!({
            "name": "Winter Jam",
            "location_id": location["id"],
            "schedule_id": schedule["id"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["location"]["city"], "Jakarta");

    let (status, ticket_type) = send(
        app,
        "POST",
        "/v1/ticket-types",
        Some(json!({
            "event_id": event["id"],
            "name": "Regular",
            "price": "50.00",
            "quota": quota
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket_type["remaining_quota"], quota);

    (
        event["id"].as_str().unwrap().to_string(),
        ticket_type["id"].as_str().unwrap().to_string(),
    )
}

fn purchase(event_id: &str, ticket_type_id: &str, quantity: i32) -> Value {
    json!({
        "user_id": Uuid::new_v4(),
        "event_id": event_id,
        "payment_method": "bank_transfer",
        "details": [{ "ticket_type_id": ticket_type_id, "quantity": quantity }]
    })
}

#[tokio::test]
async fn test_health() {
    let app = app(AppState::in_memory());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_purchase_flow() {
    let app = app(AppState::in_memory());
    let (event_id, ticket_type_id) = seed(&app, 10).await;

    let (status, tx) = send(&app, "POST", "/v1/transactions", Some(purchase(&event_id, &ticket_type_id, 3))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tx["total_amount"], "150.00");
    assert_eq!(tx["status"], "pending");
    assert_eq!(tx["payment_status"], "pending");
    assert_eq!(tx["details"][0]["subtotal"], "150.00");

    let (_, tt) = send(&app, "GET", &format!("/v1/ticket-types/{ticket_type_id}"), None).await;
    assert_eq!(tt["remaining_quota"], 7);

    let (status, err) = send(&app, "POST", "/v1/transactions", Some(purchase(&event_id, &ticket_type_id, 8))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "INSUFFICIENT_INVENTORY");

    let (_, tt) = send(&app, "GET", &format!("/v1/ticket-types/{ticket_type_id}"), None).await;
    assert_eq!(tt["remaining_quota"], 7);

    let (_, available) = send(&app, "GET", &format!("/v1/ticket-types/event/{event_id}/available"), None).await;
    assert_eq!(available.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_status_updates() {
    let app = app(AppState::in_memory());
    let (event_id, ticket_type_id) = seed(&app, 5).await;
    let (_, tx) = send(&app, "POST", "/v1/transactions", Some(purchase(&event_id, &ticket_type_id, 1))).await;
    let tx_id = tx["id"].as_str().unwrap();

    let (status, err) = send(
        &app,
        "PUT",
        &format!("/v1/transactions/{tx_id}/status"),
        Some(json!({ "status": "bogus" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "INVALID_STATUS");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/transactions/{tx_id}/status"),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/transactions/{tx_id}/payment-status"),
        Some(json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tx) = send(&app, "GET", &format!("/v1/transactions/{tx_id}"), None).await;
    assert_eq!(tx["status"], "confirmed");
    assert_eq!(tx["payment_status"], "paid");
}

#[tokio::test]
async fn test_delete_ticket_type_with_sales_is_rejected() {
    let app = app(AppState::in_memory());
    let (event_id, ticket_type_id) = seed(&app, 5).await;
    send(&app, "POST", "/v1/transactions", Some(purchase(&event_id, &ticket_type_id, 2))).await;

    let (status, err) = send(&app, "DELETE", &format!("/v1/ticket-types/{ticket_type_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "HAS_SOLD_TICKETS");

    let (status, err) = send(
        &app,
        "PUT",
        &format!("/v1/ticket-types/{ticket_type_id}"),
        Some(json!({ "quota": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "INVALID_QUOTA");
}

#[tokio::test]
async fn test_unknown_ids_are_404() {
    let app = app(AppState::in_memory());
    let missing = Uuid::new_v4();

    for uri in [
        format!("/v1/ticket-types/{missing}"),
        format!("/v1/transactions/{missing}"),
        format!("/v1/events/{missing}"),
        format!("/v1/users/{missing}"),
    ] {
        let (status, err) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(err["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_user_email_is_returned_in_json() {
    let app = app(AppState::in_memory());
    let (status, user) = send(
        &app,
        "POST",
        "/v1/users",
        Some(json!({ "fullname": "Rina Putri", "email": "rina@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "rina@example.com");
}

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let app = app(AppState::in_memory());
    let body = json!({ "fullname": "Rina Putri", "email": "rina@example.com" });

    let (status, _) = send(&app, "POST", "/v1/users", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = send(&app, "POST", "/v1/users", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "ALREADY_REGISTERED");
}
