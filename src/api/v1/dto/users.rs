/*
 * Responsibility
 * - Users の request/response DTO
 * - validate() で形式チェック (詳細なルールは持たない)
 * - UserResponse は password hash を含めない
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::repos::user_repo::UserRow;

pub(crate) fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("email must be an email");
    };
    if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
        return Err("email must be an email");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub fullname: Option<String>,
}

impl CreateUserRequest {
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
pub struct UpdateUserRequest {
    pub fullname: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(password) = &self.password
            && password.is_empty()
        {
            return Err("password should not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEmailRequest {
    pub email: String,
}

impl UpdateEmailRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_email(&self.email)
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
    // task persistence lives elsewhere; always empty here
    pub tasks: Vec<Value>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            fullname: row.fullname,
            tasks: Vec::new(),
        }
    }
}
