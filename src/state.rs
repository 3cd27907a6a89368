/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - identity / users service, 認証ゲート, route metadata
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - 起動後に変化する共有状態は持たない (署名 secret も読み取り専用)
 */
use std::sync::Arc;

use crate::middleware::auth::{access::AuthenticationGate, route_meta::RouteRegistry};
use crate::services::{auth::IdentityService, users::UserService};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityService>,
    pub users: UserService,
    pub auth_gate: AuthenticationGate,
    pub routes: Arc<RouteRegistry>,
}

impl AppState {
    pub fn new(
        identity: Arc<IdentityService>,
        users: UserService,
        auth_gate: AuthenticationGate,
        routes: Arc<RouteRegistry>,
    ) -> Self {
        Self {
            identity,
            users,
            auth_gate,
            routes,
        }
    }
}
