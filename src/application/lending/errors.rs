use thiserror::Error;

use crate::domain::{DateRangeError, ItemValidationError, LoanError};

/// エラーの分類
///
/// 呼び出し側（API層など）が応答コードを決めるために使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Conflict,
    Unauthorized,
    Internal,
}

/// 貸し借りアプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LendingApplicationError {
    /// アイテムが存在しない
    #[error("Item not found")]
    ItemNotFound,

    /// 予約が存在しない
    #[error("Reservation not found")]
    LoanNotFound,

    /// 認証済みの操作者がいない
    #[error("Authentication required")]
    Unauthenticated,

    /// 操作者に権限がない
    #[error("{0}")]
    Forbidden(String),

    /// 入力値が不正
    #[error("{0}")]
    InvalidRequest(String),

    /// 予約の状態が操作に合わない
    #[error("{0}")]
    InvalidLoanState(String),

    /// 読み込み後に他のリクエストが予約を更新した
    #[error("Reservation was modified by another request")]
    StaleLoanState,

    /// 期間が既存の予約と重なる
    #[error("This item is already reserved for the selected dates")]
    ReservationConflict,

    /// ItemRepositoryのエラー
    #[error("Item repository error")]
    ItemRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ReservationRepositoryのエラー
    #[error("Reservation repository error")]
    ReservationRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LendingApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingApplicationError::ItemNotFound | LendingApplicationError::LoanNotFound => {
                ErrorKind::NotFound
            }
            LendingApplicationError::Unauthenticated => ErrorKind::Unauthorized,
            LendingApplicationError::Forbidden(_) => ErrorKind::Forbidden,
            LendingApplicationError::InvalidRequest(_)
            | LendingApplicationError::InvalidLoanState(_)
            | LendingApplicationError::StaleLoanState => ErrorKind::BadRequest,
            LendingApplicationError::ReservationConflict => ErrorKind::Conflict,
            LendingApplicationError::ItemRepositoryError(_)
            | LendingApplicationError::ReservationRepositoryError(_) => ErrorKind::Internal,
        }
    }
}

impl From<LoanError> for LendingApplicationError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::Forbidden(e) => LendingApplicationError::Forbidden(e.to_string()),
            LoanError::Transition(e) => LendingApplicationError::InvalidLoanState(e.to_string()),
        }
    }
}

impl From<DateRangeError> for LendingApplicationError {
    fn from(err: DateRangeError) -> Self {
        LendingApplicationError::InvalidRequest(err.to_string())
    }
}

impl From<ItemValidationError> for LendingApplicationError {
    fn from(err: ItemValidationError) -> Self {
        LendingApplicationError::InvalidRequest(err.to_string())
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingApplicationError>;
