use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::lending::ItemWithStatus;
use crate::domain::{
    ItemId, ItemStatus, ItemUpdate, Loan, LoanEvent, UserId, commands::RequestReservation,
};

/// 予約申請リクエスト（POST /items/:id/reservations）
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub reserved_start_date: NaiveDate,
    pub reserved_end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateReservationRequest {
    /// リクエストをドメインコマンドに変換
    pub fn to_command(self, item_id: ItemId, borrower_id: UserId) -> RequestReservation {
        RequestReservation {
            item_id,
            borrower_id,
            reserved_start_date: self.reserved_start_date,
            reserved_end_date: self.reserved_end_date,
            notes: self.notes,
        }
    }
}

/// アイテム更新リクエスト（PATCH /items/:id）
///
/// category と image_url は空文字列で消去する。
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub requires_approval: Option<bool>,
    pub status: Option<ItemStatus>,
    pub is_listed: Option<bool>,
}

impl From<UpdateItemRequest> for ItemUpdate {
    fn from(req: UpdateItemRequest) -> Self {
        ItemUpdate {
            title: req.title,
            description: req.description,
            category: req.category.map(Some),
            image_url: req.image_url.map(Some),
            requires_approval: req.requires_approval,
            status: req.status,
            is_listed: req.is_listed,
        }
    }
}

/// 予約レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub item_id: Uuid,
    pub borrower_id: String,
    pub status: String,
    pub reserved_start_date: NaiveDate,
    pub reserved_end_date: NaiveDate,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.loan_id.value(),
            item_id: loan.item_id.value(),
            reserved_start_date: loan.reserved_start_date(),
            reserved_end_date: loan.reserved_end_date(),
            borrower_id: loan.borrower_id.as_str().to_string(),
            status: loan.status.as_str().to_string(),
            requested_at: loan.requested_at,
            approved_at: loan.approved_at,
            borrowed_at: loan.borrowed_at,
            returned_at: loan.returned_at,
            notes: loan.notes,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }
}

/// アイテムレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item_id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub requires_approval: bool,
    /// 所有者が設定したステータス
    pub status: String,
    /// 今日の予約状況を反映したステータス
    pub effective_status: String,
    pub is_listed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemWithStatus> for ItemResponse {
    fn from(view: ItemWithStatus) -> Self {
        let tags = view.item.tags().into_iter().map(String::from).collect();
        let item = view.item;
        Self {
            item_id: item.item_id.value(),
            owner_id: item.owner_id.as_str().to_string(),
            title: item.title,
            description: item.description,
            category: item.category,
            tags,
            image_url: item.image_url,
            requires_approval: item.requires_approval,
            status: item.status.as_str().to_string(),
            effective_status: view.effective_status.as_str().to_string(),
            is_listed: item.is_listed,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// 予約履歴の1件
#[derive(Debug, Serialize)]
pub struct LoanEventResponse {
    pub event_type: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub event: LoanEvent,
}

impl From<LoanEvent> for LoanEventResponse {
    fn from(event: LoanEvent) -> Self {
        Self {
            event_type: event.event_type(),
            occurred_at: event.occurred_at(),
            event,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
