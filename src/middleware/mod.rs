/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認証/認可ゲート, http: 横断的な HTTP layer, errors: エラーレスポンスの整形
 */
pub mod auth;
pub mod errors;
pub mod http;
