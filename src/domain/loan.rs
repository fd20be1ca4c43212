use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Booking, DateRange, Item, ItemBorrowed, ItemId, ItemReturned, LoanAction, LoanError,
    LoanId, LoanParties, LoanStatus, ReservationApproved, ReservationCancelled,
    ReservationRejected, ReservationRequested, TransitionError, UserId, authorize,
};

/// Loan集約 - 1つのアイテムに対する1回の予約
///
/// 物理的な受け渡しの有無にかかわらず、申請時点で作成される。
/// 終端状態になっても削除せず履歴として残す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    // 識別子
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub item_id: ItemId,
    pub borrower_id: UserId,

    // 予約管理の責務
    pub status: LoanStatus,
    pub reserved: DateRange,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,

    // 監査情報
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn reserved_start_date(&self) -> NaiveDate {
        self.reserved.start()
    }

    pub fn reserved_end_date(&self) -> NaiveDate {
        self.reserved.end()
    }

    /// 重複判定・実効ステータス計算用の予約枠
    pub fn booking(&self) -> Booking {
        Booking {
            status: self.status,
            range: self.reserved,
        }
    }

    /// 今日以降に関わる予約か（開始日または終了日が今日以降）
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.reserved.start() >= today || self.reserved.end() >= today
    }

    fn parties<'a>(&'a self, item: &'a Item) -> LoanParties<'a> {
        LoanParties {
            owner_id: &item.owner_id,
            borrower_id: &self.borrower_id,
        }
    }
}

fn invalid_state(action: LoanAction, current: LoanStatus) -> LoanError {
    LoanError::Transition(TransitionError::InvalidState { action, current })
}

/// 純粋関数：予約を申請する
///
/// ビジネスルール：
/// - 所有者は自分のアイテムを予約できない
/// - 承認が必要なアイテムは pending で作成
/// - 承認不要のアイテムは reserved で作成し、approved_at を同時に設定
///
/// 期間の重複確認はリポジトリのトランザクション内で行う。
/// 副作用なし。新しいLoanとイベントを返す。
pub fn request_reservation(
    item: &Item,
    borrower_id: UserId,
    reserved: DateRange,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<(Loan, ReservationRequested), LoanError> {
    authorize(
        &borrower_id,
        LoanParties {
            owner_id: &item.owner_id,
            borrower_id: &borrower_id,
        },
        LoanAction::Create,
    )?;

    let (status, approved_at) = if item.requires_approval {
        (LoanStatus::Pending, None)
    } else {
        (LoanStatus::Reserved, Some(now))
    };

    let loan = Loan {
        loan_id: LoanId::new(),
        item_id: item.item_id,
        borrower_id,
        status,
        reserved,
        requested_at: now,
        approved_at,
        borrowed_at: None,
        returned_at: None,
        notes: notes.filter(|n| !n.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };

    let event = ReservationRequested {
        loan_id: loan.loan_id,
        item_id: loan.item_id,
        borrower_id: loan.borrower_id.clone(),
        status,
        reserved_start_date: reserved.start(),
        reserved_end_date: reserved.end(),
        requested_at: now,
    };

    Ok((loan, event))
}

/// 純粋関数：予約を承認する
///
/// ビジネスルール：
/// - 所有者のみ
/// - pending のみ承認可能
pub fn approve(
    loan: &Loan,
    item: &Item,
    actor: &UserId,
    now: DateTime<Utc>,
) -> Result<(Loan, ReservationApproved), LoanError> {
    authorize(actor, loan.parties(item), LoanAction::Approve)?;

    if loan.status != LoanStatus::Pending {
        return Err(invalid_state(LoanAction::Approve, loan.status));
    }

    let new_loan = Loan {
        status: LoanStatus::Approved,
        approved_at: Some(now),
        updated_at: now,
        ..loan.clone()
    };

    let event = ReservationApproved {
        loan_id: loan.loan_id,
        approved_by: actor.clone(),
        approved_at: now,
    };

    Ok((new_loan, event))
}

/// 純粋関数：承認待ちの予約を却下する
///
/// ビジネスルール：
/// - 所有者のみ
/// - pending のみ（結果は rejected）
pub fn reject_pending(
    loan: &Loan,
    item: &Item,
    actor: &UserId,
    now: DateTime<Utc>,
) -> Result<(Loan, ReservationRejected), LoanError> {
    authorize(actor, loan.parties(item), LoanAction::Reject)?;

    if loan.status != LoanStatus::Pending {
        return Err(invalid_state(LoanAction::Reject, loan.status));
    }

    let new_loan = Loan {
        status: LoanStatus::Rejected,
        updated_at: now,
        ..loan.clone()
    };

    let event = ReservationRejected {
        loan_id: loan.loan_id,
        rejected_by: actor.clone(),
        rejected_at: now,
    };

    Ok((new_loan, event))
}

/// 純粋関数：所有者が確定済みの予約を取り消す
///
/// ビジネスルール：
/// - 所有者のみ
/// - approved または reserved のみ（結果は cancelled）
/// - 受け渡し済みは不可
pub fn cancel_approved(
    loan: &Loan,
    item: &Item,
    actor: &UserId,
    now: DateTime<Utc>,
) -> Result<(Loan, ReservationCancelled), LoanError> {
    authorize(actor, loan.parties(item), LoanAction::Reject)?;

    if !matches!(loan.status, LoanStatus::Approved | LoanStatus::Reserved) {
        return Err(invalid_state(LoanAction::Reject, loan.status));
    }
    if loan.borrowed_at.is_some() {
        return Err(TransitionError::AlreadyBorrowed.into());
    }

    Ok(cancelled(loan, actor, now))
}

/// 純粋関数：借り手が予約をキャンセルする
///
/// ビジネスルール：
/// - 借り手のみ
/// - pending, approved, reserved のみ
/// - 受け渡し済みは不可
pub fn cancel(
    loan: &Loan,
    item: &Item,
    actor: &UserId,
    now: DateTime<Utc>,
) -> Result<(Loan, ReservationCancelled), LoanError> {
    authorize(actor, loan.parties(item), LoanAction::Cancel)?;

    if !matches!(
        loan.status,
        LoanStatus::Pending | LoanStatus::Approved | LoanStatus::Reserved
    ) {
        return Err(invalid_state(LoanAction::Cancel, loan.status));
    }
    if loan.borrowed_at.is_some() {
        return Err(TransitionError::AlreadyBorrowed.into());
    }

    Ok(cancelled(loan, actor, now))
}

fn cancelled(loan: &Loan, actor: &UserId, now: DateTime<Utc>) -> (Loan, ReservationCancelled) {
    let new_loan = Loan {
        status: LoanStatus::Cancelled,
        updated_at: now,
        ..loan.clone()
    };

    let event = ReservationCancelled {
        loan_id: loan.loan_id,
        cancelled_by: actor.clone(),
        previous_status: loan.status,
        cancelled_at: now,
    };

    (new_loan, event)
}

/// 純粋関数：受け渡しを記録する
///
/// ビジネスルール：
/// - 借り手または所有者
/// - approved または reserved のみ
/// - 予約開始日以降のみ
pub fn mark_as_borrowed(
    loan: &Loan,
    item: &Item,
    actor: &UserId,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<(Loan, ItemBorrowed), LoanError> {
    authorize(actor, loan.parties(item), LoanAction::MarkAsBorrowed)?;

    if loan.borrowed_at.is_some() {
        return Err(TransitionError::AlreadyBorrowed.into());
    }
    if !matches!(loan.status, LoanStatus::Approved | LoanStatus::Reserved) {
        return Err(invalid_state(LoanAction::MarkAsBorrowed, loan.status));
    }
    if today < loan.reserved.start() {
        return Err(TransitionError::BeforeReservedStart {
            start: loan.reserved.start(),
            today,
        }
        .into());
    }

    let new_loan = Loan {
        status: LoanStatus::Active,
        borrowed_at: Some(now),
        updated_at: now,
        ..loan.clone()
    };

    let event = ItemBorrowed {
        loan_id: loan.loan_id,
        recorded_by: actor.clone(),
        borrowed_at: now,
    };

    Ok((new_loan, event))
}

/// 純粋関数：返却を記録する
///
/// ビジネスルール：
/// - 借り手のみ
/// - active かつ受け渡し済みのみ
/// - 予約終了日より前に返却した場合、終了日を今日に切り詰めて残りの期間を解放する
pub fn mark_as_returned(
    loan: &Loan,
    item: &Item,
    actor: &UserId,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<(Loan, ItemReturned), LoanError> {
    authorize(actor, loan.parties(item), LoanAction::MarkAsReturned)?;

    if loan.status != LoanStatus::Active {
        return Err(invalid_state(LoanAction::MarkAsReturned, loan.status));
    }
    if loan.borrowed_at.is_none() {
        return Err(TransitionError::NotBorrowed.into());
    }

    let reserved = loan.reserved.truncate_end(today);
    let original_end_date = (reserved != loan.reserved).then(|| loan.reserved.end());

    let new_loan = Loan {
        status: LoanStatus::Returned,
        reserved,
        returned_at: Some(now),
        updated_at: now,
        ..loan.clone()
    };

    let event = ItemReturned {
        loan_id: loan.loan_id,
        returned_at: now,
        original_end_date,
        reserved_end_date: reserved.end(),
    };

    Ok((new_loan, event))
}
