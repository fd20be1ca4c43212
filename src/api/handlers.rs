use crate::application::lending::{self, ItemWithStatus, ServiceDependencies};
use crate::domain::{
    ItemId, LoanId, NewItem,
    commands::{ListItem, UpdateItem},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    auth::AuthenticatedUser,
    error::ApiError,
    types::{
        CreateReservationRequest, ItemResponse, LoanEventResponse, LoanResponse,
        UpdateItemRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Item handlers
// ============================================================================

/// POST /items - アイテムを出品
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Json(req): Json<NewItem>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let deps = &state.service_deps;

    let item = lending::list_item(deps, ListItem { owner_id, item: req }).await?;
    let effective_status = lending::effective_status(deps, &item).await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse::from(ItemWithStatus {
            item,
            effective_status,
        })),
    ))
}

/// GET /items - 掲載中のアイテム一覧
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = lending::list_listed_items(&state.service_deps).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// GET /items/:id - アイテム詳細（実効ステータス付き）
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = lending::get_item(&state.service_deps, ItemId::from_uuid(item_id)).await?;
    Ok(Json(ItemResponse::from(item)))
}

/// PATCH /items/:id - アイテムを更新（所有者のみ）
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let deps = &state.service_deps;
    let item_id = ItemId::from_uuid(item_id);

    lending::update_item(
        deps,
        UpdateItem {
            item_id,
            actor,
            update: req.into(),
        },
    )
    .await?;

    let item = lending::get_item(deps, item_id).await?;
    Ok(Json(ItemResponse::from(item)))
}

/// GET /me/items - 自分が出品したアイテム一覧（非掲載を含む）
pub async fn my_items(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = lending::list_items_by_owner(&state.service_deps, &owner_id).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

// ============================================================================
// Reservation handlers
// ============================================================================

/// POST /items/:id/reservations - 予約を申請
///
/// 強制されるビジネスルール:
/// - アイテムが存在すること
/// - 所有者自身の予約でないこと
/// - 終了日が開始日以降であること
/// - 終端以外の既存予約と期間が重ならないこと
pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(borrower_id): AuthenticatedUser,
    Path(item_id): Path<Uuid>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = req.to_command(ItemId::from_uuid(item_id), borrower_id);

    let loan = lending::create_reservation(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(loan))))
}

/// GET /items/:id/reservations - 今後の予約一覧（認証不要）
pub async fn list_future_reservations(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans =
        lending::list_future_reservations(&state.service_deps, ItemId::from_uuid(item_id)).await?;
    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// GET /items/:id/reservations/current - 自分の現在の予約
///
/// 該当がなければ`null`を返す。
pub async fn current_reservation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Option<LoanResponse>>, ApiError> {
    let loan =
        lending::current_reservation_for(&state.service_deps, ItemId::from_uuid(item_id), &actor)
            .await?;
    Ok(Json(loan.map(LoanResponse::from)))
}

/// GET /loans/:id - 予約詳細（借り手または所有者）
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = lending::get_loan(&state.service_deps, LoanId::from_uuid(loan_id), &actor).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// GET /loans/:id/history - 予約のイベント履歴
pub async fn loan_history(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<Vec<LoanEventResponse>>, ApiError> {
    let events =
        lending::loan_history(&state.service_deps, LoanId::from_uuid(loan_id), &actor).await?;
    Ok(Json(events.into_iter().map(LoanEventResponse::from).collect()))
}

/// POST /loans/:id/approve - 予約を承認（所有者）
pub async fn approve_reservation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = lending::approve(&state.service_deps, LoanId::from_uuid(loan_id), &actor).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/reject - 予約を却下・取り消し（所有者）
///
/// pending は rejected、approved / reserved は cancelled になる。
pub async fn reject_reservation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = lending::reject(&state.service_deps, LoanId::from_uuid(loan_id), &actor).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/cancel - 予約をキャンセル（借り手）
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = lending::cancel(&state.service_deps, LoanId::from_uuid(loan_id), &actor).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/borrow - 受け渡しを記録（借り手または所有者）
pub async fn mark_as_borrowed(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan =
        lending::mark_as_borrowed(&state.service_deps, LoanId::from_uuid(loan_id), &actor).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// POST /loans/:id/return - 返却を記録（借り手）
///
/// 予約終了日より前の返却では終了日が今日に切り詰められる。
pub async fn mark_as_returned(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan =
        lending::mark_as_returned(&state.service_deps, LoanId::from_uuid(loan_id), &actor).await?;
    Ok(Json(LoanResponse::from(loan)))
}

/// GET /me/borrowing - 借り手としての予約一覧
pub async fn my_borrowing(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans = lending::list_loans_for_borrower(&state.service_deps, &actor).await?;
    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}

/// GET /me/lending - 自分のアイテムに対する予約一覧
pub async fn my_lending(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans = lending::list_loans_for_owner(&state.service_deps, &actor).await?;
    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}
