use axum::body::Body;
use axum::http::{Request, StatusCode};
use rusty_lending_ddd::api::handlers::AppState;
use rusty_lending_ddd::api::router::create_router;
use rusty_lending_ddd::api::types::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::*;

// ============================================================================
// ヘルパー
// ============================================================================

fn app(ctx: &TestContext) -> axum::Router {
    create_router(Arc::new(AppState {
        service_deps: ctx.deps.clone(),
    }))
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn create_item(app: &axum::Router, requires_approval: bool) -> ItemResponse {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/items",
            Some("owner-1"),
            Some(json!({
                "title": "Camping tent",
                "description": "Sleeps four",
                "category": "outdoor, camping",
                "requires_approval": requires_approval,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_value(body).unwrap()
}

async fn create_reservation(
    app: &axum::Router,
    item: &ItemResponse,
    user: &str,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> (StatusCode, Value) {
    send(
        app,
        request(
            "POST",
            &format!("/items/{}/reservations", item.item_id),
            Some(user),
            Some(json!({
                "reserved_start_date": start,
                "reserved_end_date": end,
                "notes": "Weekend trip",
            })),
        ),
    )
    .await
}

// ============================================================================
// テスト
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let ctx = setup();
    let app = app(&ctx);

    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_item_returns_tags_and_effective_status() {
    let ctx = setup();
    let app = app(&ctx);

    let item = create_item(&app, true).await;

    assert_eq!(item.owner_id, "owner-1");
    assert_eq!(item.tags, vec!["outdoor", "camping"]);
    assert_eq!(item.status, "available");
    assert_eq!(item.effective_status, "available");
    assert!(item.requires_approval);
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let ctx = setup();
    let app = app(&ctx);
    let item = create_item(&app, true).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/items/{}/reservations", item.item_id),
            None,
            Some(json!({
                "reserved_start_date": days_from_today(1),
                "reserved_end_date": days_from_today(2),
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");

    let (status, _) = send(&app, request("GET", "/me/borrowing", Some(""), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reservation_lifecycle_over_http() {
    let ctx = setup();
    let app = app(&ctx);
    let item = create_item(&app, true).await;

    let (status, body) = create_reservation(
        &app,
        &item,
        "borrower-1",
        days_from_today(0),
        days_from_today(4),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let loan: LoanResponse = serde_json::from_value(body).unwrap();
    assert_eq!(loan.status, "pending");
    assert_eq!(loan.notes.as_deref(), Some("Weekend trip"));

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/loans/{}/approve", loan.loan_id),
            Some("owner-1"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/loans/{}/borrow", loan.loan_id),
            Some("borrower-1"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");

    let (_, body) = send(&app, request("GET", &format!("/items/{}", item.item_id), None, None)).await;
    assert_eq!(body["effective_status"], "unavailable");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/loans/{}/return", loan.loan_id),
            Some("borrower-1"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert_eq!(body["reserved_end_date"], json!(today()));

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/loans/{}/history", loan.loan_id),
            Some("owner-1"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["event_type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        types,
        vec![
            "ReservationRequested",
            "ReservationApproved",
            "ItemBorrowed",
            "ItemReturned"
        ]
    );
}

#[tokio::test]
async fn test_error_status_codes() {
    let ctx = setup();
    let app = app(&ctx);
    let item = create_item(&app, false).await;

    // 自己予約
    let (status, body) =
        create_reservation(&app, &item, "owner-1", days_from_today(1), days_from_today(2)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    // 終了日が開始日より前
    let (status, body) =
        create_reservation(&app, &item, "borrower-1", days_from_today(3), days_from_today(2)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_REQUEST");

    // 存在しないアイテム
    let (status, _) = send(
        &app,
        request(
            "GET",
            &format!("/items/{}", uuid::Uuid::new_v4()),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 重複
    let (status, _) =
        create_reservation(&app, &item, "borrower-1", days_from_today(1), days_from_today(5)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        create_reservation(&app, &item, "borrower-2", days_from_today(5), days_from_today(6)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "RESERVATION_CONFLICT");
}

#[tokio::test]
async fn test_future_reservations_are_public() {
    let ctx = setup();
    let app = app(&ctx);
    let item = create_item(&app, false).await;

    create_reservation(&app, &item, "borrower-1", days_from_today(8), days_from_today(9)).await;
    create_reservation(&app, &item, "borrower-2", days_from_today(2), days_from_today(3)).await;

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/items/{}/reservations", item.item_id),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let loans: Vec<LoanResponse> = serde_json::from_value(body).unwrap();
    let borrowers: Vec<_> = loans.iter().map(|l| l.borrower_id.as_str()).collect();
    assert_eq!(borrowers, vec!["borrower-2", "borrower-1"]);
}

#[tokio::test]
async fn test_current_reservation_is_null_without_booking() {
    let ctx = setup();
    let app = app(&ctx);
    let item = create_item(&app, false).await;

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/items/{}/reservations/current", item.item_id),
            Some("borrower-1"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_only_owner_can_update_item() {
    let ctx = setup();
    let app = app(&ctx);
    let item = create_item(&app, true).await;
    let uri = format!("/items/{}", item.item_id);

    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &uri,
            Some("borrower-1"),
            Some(json!({ "title": "Mine now" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &uri,
            Some("owner-1"),
            Some(json!({ "is_listed": false, "category": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_listed"], false);
    assert_eq!(body["category"], Value::Null);

    let (_, body) = send(&app, request("GET", "/items", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (_, body) = send(&app, request("GET", "/me/items", Some("owner-1"), None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
