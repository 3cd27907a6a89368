/*
 * Responsibility
 * - Credential Record の作成/取得/更新/削除 (CredentialStore の上に載る業務ルール)
 * - email の一意性 (DuplicateEmail) と password のハッシュ化を担う
 * - request から来た password は常に平文として扱い、必ずハッシュ化してから保存する
 */
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{CredentialStore, NewUser, UserChanges, UserRow};
use crate::services::auth::password::PasswordHasher;

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub fullname: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub fullname: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn create(&self, input: CreateUser) -> Result<UserRow, AppError> {
        info!(email = %input.email, "creating user");

        if self.store.find_by_email(&input.email).await?.is_some() {
            warn!(email = %input.email, "user already exists");
            return Err(AppError::DuplicateEmail { email: input.email });
        }

        let password_hash = self.hasher.hash(&input.password).await?;
        let new_user = NewUser {
            email: input.email.clone(),
            password_hash,
            fullname: input.fullname,
        };

        // a concurrent create can still win the race; the store's constraint decides
        self.store
            .create_record(new_user)
            .await
            .map_err(|e| match e {
                RepoError::Conflict => AppError::DuplicateEmail { email: input.email },
                other => other.into(),
            })
    }

    pub async fn find_one(&self, id: Uuid) -> Result<UserRow, AppError> {
        info!(user_id = %id, "finding user");
        self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!(user_id = %id, "user not found");
            AppError::not_found("User", id)
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError> {
        info!(email = %email, "finding user by email");
        Ok(self.store.find_by_email(email).await?)
    }

    pub async fn update(&self, id: Uuid, input: UpdateUser) -> Result<UserRow, AppError> {
        info!(user_id = %id, "updating user");

        let password_hash = match input.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password).await?),
            None => None,
        };
        let changes = UserChanges {
            email: None,
            password_hash,
            fullname: input.fullname,
        };

        self.store
            .update_record(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    pub async fn update_email(&self, id: Uuid, email: String) -> Result<UserRow, AppError> {
        info!(user_id = %id, "updating email");

        let current = self.find_one(id).await?;

        if let Some(holder) = self.store.find_by_email(&email).await?
            && holder.id != id
        {
            warn!(user_id = %id, email = %email, "email already taken");
            return Err(AppError::DuplicateEmail { email });
        }

        if current.email == email {
            warn!(user_id = %id, "email unchanged");
            return Err(AppError::EmailAlreadySet { email });
        }

        let changes = UserChanges {
            email: Some(email.clone()),
            ..Default::default()
        };
        let updated = self
            .store
            .update_record(id, changes)
            .await
            .map_err(|e| match e {
                RepoError::Conflict => AppError::DuplicateEmail {
                    email: email.clone(),
                },
                other => other.into(),
            })?
            .ok_or_else(|| AppError::not_found("User", id))?;

        info!(user_id = %id, from = %current.email, to = %updated.email, "email updated");
        Ok(updated)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        info!(user_id = %id, "removing user");

        if !self.store.delete_record(id).await? {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }
}
