use chrono::NaiveDate;

use super::{LoanAction, LoanStatus};

/// 日付範囲のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// 終了日が開始日より前
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl std::fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRangeError::EndBeforeStart { start, end } => {
                write!(f, "End date {} must not be before start date {}", end, start)
            }
        }
    }
}

/// 認可エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// 所有者は自分のアイテムを予約できない
    SelfBooking,
    /// 操作者がこの操作を行う権限を持たない
    NotPermitted { action: LoanAction },
}

impl std::fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationError::SelfBooking => f.write_str("You cannot reserve your own item"),
            AuthorizationError::NotPermitted { action } => {
                write!(f, "You are not allowed to {} this reservation", action)
            }
        }
    }
}

/// 状態遷移のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// 現在のステータスからは要求された操作ができない
    InvalidState {
        action: LoanAction,
        current: LoanStatus,
    },
    /// 既に受け渡し済み
    AlreadyBorrowed,
    /// まだ受け渡されていない
    NotBorrowed,
    /// 予約開始日より前に受け渡しはできない
    BeforeReservedStart { start: NaiveDate, today: NaiveDate },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::InvalidState { action, current } => {
                write!(f, "Cannot {} a {} reservation", action, current)
            }
            TransitionError::AlreadyBorrowed => {
                f.write_str("This item has already been marked as borrowed")
            }
            TransitionError::NotBorrowed => {
                f.write_str("Cannot mark as returned if item hasn't been borrowed")
            }
            TransitionError::BeforeReservedStart { start, today } => write!(
                f,
                "Cannot mark as borrowed before the reserved start date ({} < {})",
                today, start
            ),
        }
    }
}

/// アイテム入力値のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// タイトルが空
    EmptyTitle,
    /// タイトルが長すぎる
    TitleTooLong { max: usize },
    /// カテゴリが長すぎる
    CategoryTooLong { max: usize },
    /// 画像URLが不正
    InvalidImageUrl,
}

impl std::fmt::Display for ItemValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemValidationError::EmptyTitle => f.write_str("Title must not be empty"),
            ItemValidationError::TitleTooLong { max } => {
                write!(f, "Title must be at most {} characters", max)
            }
            ItemValidationError::CategoryTooLong { max } => {
                write!(f, "Category must be at most {} characters", max)
            }
            ItemValidationError::InvalidImageUrl => f.write_str("Image URL must be an http(s) URL"),
        }
    }
}

/// 予約操作のエラー（認可または状態遷移）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    /// 認可エラー
    Forbidden(AuthorizationError),
    /// 状態遷移エラー
    Transition(TransitionError),
}

impl From<AuthorizationError> for LoanError {
    fn from(err: AuthorizationError) -> Self {
        LoanError::Forbidden(err)
    }
}

impl From<TransitionError> for LoanError {
    fn from(err: TransitionError) -> Self {
        LoanError::Transition(err)
    }
}

impl std::fmt::Display for LoanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoanError::Forbidden(e) => e.fmt(f),
            LoanError::Transition(e) => e.fmt(f),
        }
    }
}
