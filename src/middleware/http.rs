//! HTTP-level middleware (cross-cutting concerns).
//!
//! Applied to the whole router, regardless of API version.
//!
//! Responsibility:
//! - Request-Id generation + propagation (`x-request-id`), carried on the trace span
//! - Access logging (TraceLayer)
//! - Body size limit / global timeout
//! - Security response headers
//! - CORS

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{HeaderName, HeaderValue, Method, Request, header};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppError;

const REQUEST_ID: &str = "x-request-id";
const BODY_LIMIT_BYTES: usize = 1024 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Apply transport layers. Order (outermost first): request id, trace, body
/// limit, timeout, security headers, CORS.
pub fn apply(router: Router, config: &Config) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    let router = router
        .layer(cors(config))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ));

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }),
        )
        // timeouts surface as errors; the envelope renders them like any AppError
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                AppError::Timeout
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                AppError::Internal
            }
        }))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    router.layer(layers)
}

/// Development: any origin. Production: exact-match allowlist (empty → none).
/// Credentials are never allowed; the bearer token travels in a header.
fn cors(config: &Config) -> CorsLayer {
    let base = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        CorsLayer::new().allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            allowed.iter().any(|v| v == origin)
        }))
    } else {
        CorsLayer::new().allow_origin(Any)
    };

    base.allow_methods([
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        HeaderName::from_static(REQUEST_ID),
    ])
    .max_age(Duration::from_secs(600))
}
