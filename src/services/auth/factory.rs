/// Factory: build the token service from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{JwtTokenService, TokenService};

pub fn build_token_service(config: &Config) -> Arc<dyn TokenService> {
    // The secret is read once at startup; nothing holds on to the Config afterwards.
    let service = JwtTokenService::new(config.jwt_secret.as_bytes(), config.jwt_expires_in_seconds);
    tracing::info!(ttl_seconds = service.ttl_seconds(), "access tokens: HS256");
    Arc::new(service)
}
