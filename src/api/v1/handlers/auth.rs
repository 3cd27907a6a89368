/*
 * Responsibility
 * - POST /auth/login, POST /auth/register (public)
 * - DTO validation → IdentityService 呼び出し → AuthResponse
 */
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

use crate::{
    api::v1::dto::auth::{AuthResponse, LoginRequest, SignUpRequest},
    error::AppError,
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::bad_request)?;

    let session = state.identity.sign_in(&req.email, &req.password).await?;
    Ok(Json(session.into()))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::bad_request)?;

    let session = state
        .identity
        .sign_up(&req.email, &req.password, req.fullname)
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}
