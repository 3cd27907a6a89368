/*
 * Responsibility
 * - アプリ共通の AppError 定義 (認証/認可の失敗分類を含む)
 * - IntoResponse 実装 (HTTP status + ErrorReport を response extensions に載せる)
 * - RepoError / JSON rejection を統一的に変換
 *
 * Notes
 * - body の組み立て (statusCode/timestamp/path/message) は middleware::errors が担当する
 */
use axum::{
    extract::rejection::JsonRejection,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::middleware::auth::ownership::{Action, ResourceType};
use crate::repos::error::RepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing authorization header")]
    MissingCredentials,
    #[error("Invalid authorization header format")]
    MalformedCredentials,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access denied: You do not have permission to access {resource_type}")]
    ForbiddenResource { resource_type: ResourceType },
    #[error(
        "Action '{action}' denied: User {user_id} does not have permission to {action} {resource_type} {resource_id}"
    )]
    UnauthorizedAction {
        action: Action,
        resource_type: ResourceType,
        resource_id: String,
        user_id: String,
    },
    #[error("User with email {email} already exists")]
    DuplicateEmail { email: String },
    #[error("Email is already set to {email}")]
    EmailAlreadySet { email: String },
    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: String },
    #[error("{0}")]
    BadRequest(String),
    #[error("Cannot {method} {path}")]
    RouteNotFound { method: Method, path: String },
    #[error("Request timeout")]
    Timeout,
    /// Extractor rejections other than plain bad input (413, 415, ...).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredentials
            | AppError::MalformedCredentials
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenResource { .. } | AppError::UnauthorizedAction { .. } => {
                StatusCode::FORBIDDEN
            }
            AppError::DuplicateEmail { .. } | AppError::EmailAlreadySet { .. } => {
                StatusCode::CONFLICT
            }
            AppError::NotFound { .. } | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Rejected { status, .. } => *status,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What an error leaves behind on the response for the error envelope to render.
///
/// Only the top-level message travels outward; sources stay in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
}

impl ErrorReport {
    /// Report for an error status produced outside `AppError` (framework defaults).
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            status,
            message: status.canonical_reason().unwrap_or("Error").to_string(),
        }
    }

    pub fn is_security_event(&self) -> bool {
        matches!(
            self.status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport {
            status: self.status_code(),
            message: self.to_string(),
        };

        let mut res = report.status.into_response();
        res.extensions_mut().insert(report);
        res
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            // UserService maps Conflict to DuplicateEmail where the email is known
            RepoError::Conflict => {
                tracing::error!("unhandled unique constraint violation");
                AppError::Internal
            }
            RepoError::Db(err) => {
                tracing::error!(error = %err, "credential store failure");
                AppError::Internal
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        match e.status() {
            // malformed JSON and shape mismatches are both plain bad input
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::BadRequest(e.body_text())
            }
            status => AppError::Rejected {
                status,
                message: e.body_text(),
            },
        }
    }
}
