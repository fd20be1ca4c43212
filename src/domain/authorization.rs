use serde::{Deserialize, Serialize};

use super::{AuthorizationError, UserId};

/// 予約に対する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanAction {
    Create,
    Approve,
    Reject,
    Cancel,
    MarkAsBorrowed,
    MarkAsReturned,
}

impl LoanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanAction::Create => "create",
            LoanAction::Approve => "approve",
            LoanAction::Reject => "reject",
            LoanAction::Cancel => "cancel",
            LoanAction::MarkAsBorrowed => "mark as borrowed",
            LoanAction::MarkAsReturned => "mark as returned",
        }
    }
}

impl std::fmt::Display for LoanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 予約の当事者
///
/// 作成前の予約では borrower_id は操作者自身になる。
#[derive(Debug, Clone, Copy)]
pub struct LoanParties<'a> {
    pub owner_id: &'a UserId,
    pub borrower_id: &'a UserId,
}

/// 純粋関数：操作者が予約操作を行えるか判定する
///
/// ビジネスルール：
/// - 作成：所有者以外
/// - 承認・却下：所有者のみ
/// - キャンセル：借り手のみ
/// - 受け渡し：借り手または所有者
/// - 返却：借り手のみ
pub fn authorize(
    actor: &UserId,
    parties: LoanParties<'_>,
    action: LoanAction,
) -> Result<(), AuthorizationError> {
    let is_owner = actor == parties.owner_id;
    let is_borrower = actor == parties.borrower_id;

    let allowed = match action {
        LoanAction::Create => {
            if is_owner {
                return Err(AuthorizationError::SelfBooking);
            }
            true
        }
        LoanAction::Approve | LoanAction::Reject => is_owner,
        LoanAction::Cancel | LoanAction::MarkAsReturned => is_borrower,
        LoanAction::MarkAsBorrowed => is_borrower || is_owner,
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthorizationError::NotPermitted { action })
    }
}
