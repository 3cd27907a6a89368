use serde::{Deserialize, Serialize};

use crate::api::v1::dto::users::{UserResponse, validate_email};
use crate::services::auth::AuthSession;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err("password should not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub fullname: Option<String>,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err("password should not be empty");
        }
        Ok(())
    }
}

/// Body of both `/auth/login` and `/auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            user: session.user.into(),
        }
    }
}
