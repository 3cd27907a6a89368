/*
 * Responsibility
 * - /users 系 handler
 * - Path/Json を extractor で受け、DTO validation → UserService 呼び出し
 * - 所有者チェックは handler に届く前に ownership ゲートで済んでいる
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    api::v1::dto::users::{
        CreateUserRequest, UpdateEmailRequest, UpdateUserRequest, UserResponse,
    },
    api::v1::extractors::CurrentUser,
    error::AppError,
    services::users::{CreateUser, UpdateUser},
    state::AppState,
};

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("Validation failed (uuid is expected)"))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::bad_request)?;

    info!(
        created_by = %principal.id,
        created_by_email = %principal.email,
        email = %req.email,
        "creating user"
    );
    let row = state
        .users
        .create(CreateUser {
            email: req.email,
            password: req.password,
            fullname: req.fullname.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let row = state.users.find_one(parse_id(&id)?).await?;
    Ok(Json(row.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    req.validate().map_err(AppError::bad_request)?;

    let row = state
        .users
        .update(
            id,
            UpdateUser {
                fullname: req.fullname,
                password: req.password,
            },
        )
        .await?;
    Ok(Json(row.into()))
}

pub async fn update_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEmailRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    req.validate().map_err(AppError::bad_request)?;

    let row = state.users.update_email(id, req.email).await?;
    Ok(Json(row.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.users.remove(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
