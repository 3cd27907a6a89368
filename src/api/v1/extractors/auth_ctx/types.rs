/*
 * Responsibility
 * - Handler / 認可ゲートから見える「認証済み主体」の型
 * - 認証ゲートが token を検証して生成し、request extensions 経由で後段に渡す
 *
 * Notes
 * - token の検証ロジックは middleware/services 側の責務
 * - 寿命は 1 リクエスト。永続化しない
 */

use crate::services::auth::IdentityClaims;

/// 認証済みのリクエストに付与される主体
///
/// - `id` は不透明な文字列 (所有者比較はこの値と path の `id` の文字列一致)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
}

impl From<IdentityClaims> for Principal {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
        }
    }
}
