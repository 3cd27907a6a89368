//! In-process credential store.
//!
//! Used when `DATABASE_URL` is not configured, and by the tests.
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{CredentialStore, NewUser, UserChanges, UserRow};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<Uuid, UserRow>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRow>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_record(&self, new_user: NewUser) -> RepoResult<UserRow> {
        // check + insert under one write lock
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(RepoError::Conflict);
        }

        let row = UserRow {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            fullname: new_user.fullname,
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_record(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<UserRow>> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email
            && users.values().any(|u| u.id != id && &u.email == email)
        {
            return Err(RepoError::Conflict);
        }

        let Some(row) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            row.password_hash = password_hash;
        }
        if let Some(fullname) = changes.fullname {
            row.fullname = fullname;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_record(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
