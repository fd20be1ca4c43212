use crate::application::lending::LendingApplicationError;
use crate::domain::UserId;
use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;

/// 操作者を伝えるヘッダー
///
/// 認証は上流の認証基盤が行い、確認済みのユーザーIDをこのヘッダーで渡す。
pub const USER_ID_HEADER: &str = "x-user-id";

/// 認証済みの操作者
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AuthenticatedUser(UserId::new(id)))
            .ok_or_else(|| ApiError::from(LendingApplicationError::Unauthenticated))
    }
}
