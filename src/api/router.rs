use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, approve_reservation, cancel_reservation, create_item, create_reservation,
    current_reservation, get_item, get_loan, list_future_reservations, list_items, loan_history,
    mark_as_borrowed, mark_as_returned, my_borrowing, my_items, my_lending, reject_reservation,
    update_item,
};

/// 貸し借りAPIのルーター
///
/// 操作者は`x-user-id`ヘッダーで渡す。
/// 今後の予約一覧とアイテムの閲覧は認証不要。
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // アイテム
        .route("/items", post(create_item).get(list_items))
        .route("/items/:id", get(get_item).patch(update_item))
        // 予約
        .route(
            "/items/:id/reservations",
            get(list_future_reservations).post(create_reservation),
        )
        .route("/items/:id/reservations/current", get(current_reservation))
        .route("/loans/:id", get(get_loan))
        .route("/loans/:id/history", get(loan_history))
        .route("/loans/:id/approve", post(approve_reservation))
        .route("/loans/:id/reject", post(reject_reservation))
        .route("/loans/:id/cancel", post(cancel_reservation))
        .route("/loans/:id/borrow", post(mark_as_borrowed))
        .route("/loans/:id/return", post(mark_as_returned))
        // 操作者自身の一覧
        .route("/me/items", get(my_items))
        .route("/me/borrowing", get(my_borrowing))
        .route("/me/lending", get(my_lending))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
