use crate::application::lending::{ErrorKind, LendingApplicationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LendingApplicationError);

impl From<LendingApplicationError> for ApiError {
    fn from(err: LendingApplicationError) -> Self {
        ApiError(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_code(err: &LendingApplicationError) -> &'static str {
    match err {
        LendingApplicationError::ItemNotFound => "ITEM_NOT_FOUND",
        LendingApplicationError::LoanNotFound => "RESERVATION_NOT_FOUND",
        LendingApplicationError::Unauthenticated => "UNAUTHENTICATED",
        LendingApplicationError::Forbidden(_) => "FORBIDDEN",
        LendingApplicationError::InvalidRequest(_) => "INVALID_REQUEST",
        LendingApplicationError::InvalidLoanState(_) => "INVALID_RESERVATION_STATE",
        LendingApplicationError::StaleLoanState => "STALE_RESERVATION_STATE",
        LendingApplicationError::ReservationConflict => "RESERVATION_CONFLICT",
        LendingApplicationError::ItemRepositoryError(_)
        | LendingApplicationError::ReservationRepositoryError(_) => "INTERNAL_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind());

        // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
        let message = match err.kind() {
            ErrorKind::Internal => {
                tracing::error!(error = ?err, "Internal error while handling request");
                "An unexpected error occurred".to_string()
            }
            _ => err.to_string(),
        };

        let body = Json(ErrorResponse::new(error_code(&err), message));
        (status, body).into_response()
    }
}
