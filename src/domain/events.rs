use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ItemId, LoanId, LoanStatus, UserId};

/// イベント：予約が申請された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequested {
    pub loan_id: LoanId,
    pub item_id: ItemId,
    pub borrower_id: UserId,
    /// 初期ステータス（pending または reserved）
    pub status: LoanStatus,
    pub reserved_start_date: NaiveDate,
    pub reserved_end_date: NaiveDate,
    pub requested_at: DateTime<Utc>,
}

/// イベント：予約が承認された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationApproved {
    pub loan_id: LoanId,
    pub approved_by: UserId,
    pub approved_at: DateTime<Utc>,
}

/// イベント：承認待ちの予約が却下された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRejected {
    pub loan_id: LoanId,
    pub rejected_by: UserId,
    pub rejected_at: DateTime<Utc>,
}

/// イベント：予約がキャンセルされた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCancelled {
    pub loan_id: LoanId,
    pub cancelled_by: UserId,
    /// キャンセル直前のステータス
    pub previous_status: LoanStatus,
    pub cancelled_at: DateTime<Utc>,
}

/// イベント：アイテムが受け渡された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBorrowed {
    pub loan_id: LoanId,
    pub recorded_by: UserId,
    pub borrowed_at: DateTime<Utc>,
}

/// イベント：アイテムが返却された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReturned {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
    /// 早期返却で切り詰められた場合の元の終了日
    pub original_end_date: Option<NaiveDate>,
    pub reserved_end_date: NaiveDate,
}

/// ドメインイベント統合型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanEvent {
    ReservationRequested(ReservationRequested),
    ReservationApproved(ReservationApproved),
    ReservationRejected(ReservationRejected),
    ReservationCancelled(ReservationCancelled),
    ItemBorrowed(ItemBorrowed),
    ItemReturned(ItemReturned),
}

impl LoanEvent {
    /// イベント種別（永続化時の識別子）
    pub fn event_type(&self) -> &'static str {
        match self {
            LoanEvent::ReservationRequested(_) => "ReservationRequested",
            LoanEvent::ReservationApproved(_) => "ReservationApproved",
            LoanEvent::ReservationRejected(_) => "ReservationRejected",
            LoanEvent::ReservationCancelled(_) => "ReservationCancelled",
            LoanEvent::ItemBorrowed(_) => "ItemBorrowed",
            LoanEvent::ItemReturned(_) => "ItemReturned",
        }
    }

    pub fn loan_id(&self) -> LoanId {
        match self {
            LoanEvent::ReservationRequested(e) => e.loan_id,
            LoanEvent::ReservationApproved(e) => e.loan_id,
            LoanEvent::ReservationRejected(e) => e.loan_id,
            LoanEvent::ReservationCancelled(e) => e.loan_id,
            LoanEvent::ItemBorrowed(e) => e.loan_id,
            LoanEvent::ItemReturned(e) => e.loan_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LoanEvent::ReservationRequested(e) => e.requested_at,
            LoanEvent::ReservationApproved(e) => e.approved_at,
            LoanEvent::ReservationRejected(e) => e.rejected_at,
            LoanEvent::ReservationCancelled(e) => e.cancelled_at,
            LoanEvent::ItemBorrowed(e) => e.borrowed_at,
            LoanEvent::ItemReturned(e) => e.returned_at,
        }
    }
}
