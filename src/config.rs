/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, JWT_SECRET, DATABASE_URL, CORS 許可など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::password::DEFAULT_COST;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // None → in-process credential store
    pub database_url: Option<String>,

    pub jwt_secret: String,
    pub jwt_expires_in_seconds: u64,
    pub bcrypt_cost: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the secret or credentials embedded in DATABASE_URL
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("database", &self.database_url.is_some())
            .field("jwt_expires_in_seconds", &self.jwt_expires_in_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expires_in_seconds = match std::env::var("JWT_EXPIRES_IN") {
            Ok(v) => parse_expires_in(&v).ok_or(ConfigError::Invalid("JWT_EXPIRES_IN"))?,
            Err(_) => 3600, // 1h
        };

        let bcrypt_cost = match std::env::var("BCRYPT_COST") {
            Ok(v) => parse_bcrypt_cost(&v).ok_or(ConfigError::Invalid("BCRYPT_COST"))?,
            Err(_) => DEFAULT_COST,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            database_url,
            jwt_secret,
            jwt_expires_in_seconds,
            bcrypt_cost,
        })
    }
}

/// Upper bound for `JWT_EXPIRES_IN` (365 days).
pub const MAX_EXPIRES_IN_SECONDS: u64 = 365 * 24 * 60 * 60;

/// `"3600"`, `"90s"`, `"15m"`, `"1h"`, `"7d"` → seconds.
/// Zero and anything above `MAX_EXPIRES_IN_SECONDS` are rejected.
pub fn parse_expires_in(value: &str) -> Option<u64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: u64 = digits.parse().ok()?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    amount
        .checked_mul(multiplier)
        .filter(|secs| (1..=MAX_EXPIRES_IN_SECONDS).contains(secs))
}

fn parse_bcrypt_cost(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|cost| (4..=31).contains(cost))
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            database_url: None,
            jwt_secret: "test-secret".to_string(),
            jwt_expires_in_seconds: 3600,
            bcrypt_cost: 4,
        }
    }
}
