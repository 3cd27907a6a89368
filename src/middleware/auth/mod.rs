/*
 * Responsibility
 * - 認証ゲート (access) と認可ゲート (ownership) の公開
 * - route_meta による public / skip_authorization の解決
 *
 * 実行順: access → ownership → handler
 */
pub mod access;
pub mod ownership;
pub mod route_meta;

use axum::{extract::MatchedPath, extract::Request};

use crate::state::AppState;
use route_meta::RouteFlags;

/// Flags for the matched route; falls back to the raw path when no template is known.
fn route_flags(state: &AppState, req: &Request) -> RouteFlags {
    let template = req
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or_else(|| req.uri().path());

    state.routes.resolve(req.method(), template)
}
