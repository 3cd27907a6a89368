//! Error envelope: the outermost layer.
//!
//! Any response carrying an `ErrorReport`, or a bare 4xx/5xx from the framework
//! (method not allowed, body limit), is rewritten to
//! `{ statusCode, timestamp, path, message }` and logged once here:
//! 401/403 as security events (with user, client address, user agent),
//! everything else as a plain error.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, Request},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::api::v1::extractors::Principal;
use crate::error::ErrorReport;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub message: String,
}

pub fn apply(router: Router) -> Router {
    router.layer(middleware::from_fn(error_envelope))
}

async fn error_envelope(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    let res = next.run(req).await;

    let status = res.status();
    let report = match res.extensions().get::<ErrorReport>().cloned() {
        Some(report) => report,
        None if status.is_client_error() || status.is_server_error() => {
            ErrorReport::from_status(status)
        }
        None => return res,
    };

    if report.is_security_event() {
        let user_id = res
            .extensions()
            .get::<Principal>()
            .map(|p| p.id.clone())
            .unwrap_or_else(|| "unknown".to_string());

        tracing::warn!(
            status = report.status.as_u16(),
            message = %report.message,
            user_id = %user_id,
            ip = %ip,
            user_agent = %user_agent,
            method = %method,
            path = %path,
            "security event"
        );
    } else {
        tracing::error!(
            status = report.status.as_u16(),
            message = %report.message,
            method = %method,
            path = %path,
            "request failed"
        );
    }

    let body = ErrorEnvelope {
        status_code: report.status.as_u16(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        path,
        message: report.message,
    };

    // keep headers set by inner layers (request id, security headers, CORS)
    let (parts, _) = res.into_parts();
    let mut out = (report.status, Json(body)).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            out.headers_mut().append(name.clone(), value.clone());
        }
    }
    out
}
