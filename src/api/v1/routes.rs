/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - route ごとの public / skip_authorization を RouteRegistry として宣言
 * - 認証 → 認可ゲートを route_layer で全 route に適用
 */
use axum::{
    Router,
    http::Method,
    routing::{get, patch, post},
};

use crate::api::v1::handlers::{
    auth::{login, register},
    health::health,
    users::{create_user, delete_user, get_user, update_email, update_user},
};
use crate::middleware::auth::{
    access,
    ownership,
    route_meta::{RouteMeta, RouteRegistry},
};
use crate::state::AppState;

/// Gate configuration for the routes below.
pub fn route_registry() -> RouteRegistry {
    RouteRegistry::new()
        .controller("/health", RouteMeta::new().public().skip_authorization())
        .controller("/auth", RouteMeta::new().public())
        .controller("/users", RouteMeta::new())
        .handler(Method::POST, "/users", RouteMeta::new().skip_authorization())
}

pub fn routes(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/users", post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{id}/email", patch(update_email));

    // last applied runs first: authentication, then ownership
    let router = ownership::apply(router, state.clone());
    access::apply(router, state)
}
