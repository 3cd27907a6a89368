/*
 * Responsibility
 * - Credential Record (users テーブル) の読み書き契約 (CredentialStore)
 * - PgPool を受け取る SQLx 実装
 * - DB エラーは RepoError に変換して返す (一意制約違反は Conflict)
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub fullname: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub fullname: String,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub fullname: Option<String>,
}

/// Persistence collaborator for credential records.
///
/// Implementations are authoritative for email uniqueness and must report a
/// clash as `RepoError::Conflict`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRow>>;
    async fn create_record(&self, new_user: NewUser) -> RepoResult<UserRow>;
    async fn update_record(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<UserRow>>;
    async fn delete_record(&self, id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, fullname
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, fullname
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    async fn create_record(&self, new_user: NewUser) -> RepoResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, fullname)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, fullname
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.fullname)
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn update_record(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                fullname = COALESCE($4, fullname)
            WHERE id = $1
            RETURNING id, email, password_hash, fullname
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.fullname)
        .fetch_optional(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn delete_record(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
