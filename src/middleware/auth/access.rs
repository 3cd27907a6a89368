//! Authentication gate: `Authorization: Bearer <token>` → Principal.
//!
//! Unchecked → Authenticated | Rejected, once per request.
//! - public route: accepted without reading the header
//! - no header: `MissingCredentials`
//! - not `Bearer <non-empty>` (scheme case-insensitive, outer whitespace ignored): `MalformedCredentials`
//! - token verification failure of any kind: `InvalidCredentials`
//!
//! The resolved Principal is handed to later layers through request extensions.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Principal;
use crate::error::AppError;
use crate::middleware::auth::{route_flags, route_meta::RouteFlags};
use crate::services::auth::TokenService;
use crate::state::AppState;

/// Returns the token part of a bearer header value.
pub fn extract_bearer(header: &str) -> Result<&str, AppError> {
    let trimmed = header.trim();
    let (scheme, token) = match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest.trim()),
        None => (trimmed, ""),
    };

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::MalformedCredentials);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct AuthenticationGate {
    tokens: Arc<dyn TokenService>,
}

impl AuthenticationGate {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }

    /// `Ok(None)` for public routes, `Ok(Some(_))` once the token checks out.
    pub fn authenticate(
        &self,
        flags: RouteFlags,
        authorization: Option<&HeaderValue>,
    ) -> Result<Option<Principal>, AppError> {
        if flags.public {
            return Ok(None);
        }

        let value = authorization.ok_or(AppError::MissingCredentials)?;
        let value = value.to_str().map_err(|_| AppError::MalformedCredentials)?;
        let token = extract_bearer(value)?;

        // the verifier's error type stays here
        let claims = self.tokens.verify(token).map_err(|err| {
            tracing::warn!(error = %err, "access token verification failed");
            AppError::InvalidCredentials
        })?;

        Ok(Some(Principal::from(claims)))
    }
}

/// Install the authentication gate on every route of `router`.
///
/// `route_layer` so the matched route template is known when flags are resolved.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, authenticate_request))
}

async fn authenticate_request(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let flags = route_flags(&state, &req);
    let principal = state
        .auth_gate
        .authenticate(flags, req.headers().get(header::AUTHORIZATION))?;

    let Some(principal) = principal else {
        return Ok(next.run(req).await);
    };

    // middleware → 後段 (認可ゲート / extractor) への受け渡し
    req.extensions_mut().insert(principal.clone());
    let mut res = next.run(req).await;

    // the error envelope reads it back for the audit log
    res.extensions_mut().insert(principal);
    Ok(res)
}
