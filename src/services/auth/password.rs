//! bcrypt password hashing.
//!
//! Hashing is CPU-bound, so both `hash` and `verify` run on the blocking pool.
//! If the caller's future is dropped the blocking job still finishes, but its
//! result is discarded.

use tracing::{debug, error};

use crate::error::AppError;

/// Work factor used unless configured otherwise.
pub const DEFAULT_COST: u32 = 12;

#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Salted one-way hash. Two calls on the same input give different strings.
    pub async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| {
                error!(error = %e, "password hashing task failed");
                AppError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, "failed to hash password");
                AppError::Internal
            })
    }

    /// `true` iff `hashed` was produced from `plaintext`.
    ///
    /// Malformed hashes and task failures are reported as `false`.
    pub async fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        let plaintext = plaintext.to_owned();
        let hashed = hashed.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hashed)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                debug!(error = %e, "password hash could not be parsed");
                false
            }
            Err(e) => {
                error!(error = %e, "password verification task failed");
                false
            }
        }
    }

    /// Whether `value` already carries a bcrypt prefix (`$2a$` / `$2b$`).
    pub fn looks_hashed(value: &str) -> bool {
        value.starts_with("$2b$") || value.starts_with("$2a$")
    }
}
