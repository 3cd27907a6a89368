use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::AppError;
use crate::repos::user_repo::UserRow;
use crate::services::auth::jwt::{IdentityClaims, TokenService};
use crate::services::auth::password::PasswordHasher;
use crate::services::users::{CreateUser, UserService};

/// Result of a successful sign-in / sign-up.
///
/// Handlers map `user` into the response DTO, which drops the password hash.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub user: UserRow,
}

/// Service that orchestrates credential checks, account creation and token issuance.
#[derive(Clone)]
pub struct IdentityService {
    users: UserService,
    tokens: Arc<dyn TokenService>,
    hasher: PasswordHasher,
}

impl IdentityService {
    pub fn new(users: UserService, tokens: Arc<dyn TokenService>, hasher: PasswordHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    /// Unknown email and wrong password fail with the same error.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        info!(email = %email, "signing in");

        let Some(user) = self.users.find_by_email(email).await? else {
            info!(email = %email, "sign-in for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        // never compare against a record that holds something other than a bcrypt hash
        if !PasswordHasher::looks_hashed(&user.password_hash) {
            warn!(user_id = %user.id, "stored credential is not a password hash");
            return Err(AppError::InvalidCredentials);
        }

        if !self.hasher.verify(password, &user.password_hash).await {
            info!(email = %email, "sign-in with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        self.session_for(user)
    }

    /// Creation errors (e.g. `DuplicateEmail`) pass through unchanged.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fullname: Option<String>,
    ) -> Result<AuthSession, AppError> {
        info!(email = %email, "signing up");

        // UserService hashes; the plaintext goes through as-is
        let user = self
            .users
            .create(CreateUser {
                email: email.to_owned(),
                password: password.to_owned(),
                fullname: fullname.unwrap_or_default(),
            })
            .await?;

        self.session_for(user)
    }

    fn session_for(&self, user: UserRow) -> Result<AuthSession, AppError> {
        let claims = IdentityClaims {
            id: user.id.to_string(),
            email: user.email.clone(),
        };
        let access_token = self.tokens.issue(&claims).map_err(|e| {
            error!(user_id = %user.id, error = %e, "failed to issue access token");
            AppError::Internal
        })?;

        Ok(AuthSession { access_token, user })
    }
}
