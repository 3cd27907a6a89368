/*
 * Responsibility
 * - v1 の公開ポイント (routes() / route_registry() の re-export)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::{route_registry, routes};
