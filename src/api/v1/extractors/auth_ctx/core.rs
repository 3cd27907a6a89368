use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

use super::Principal;

/// Handler で Principal を受け取るための extractor
/// 認証ゲートが Principal を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 (public route で使った・ゲート未設定)
pub struct CurrentUser(pub Principal);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::MissingCredentials)
    }
}
