/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (HTTP layer / error envelope)
 * - axum::serve() で起動
 */
use std::{net::SocketAddr, panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, extract::OriginalUri, http::Method};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, API_PREFIX};
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, auth::access::AuthenticationGate};
use crate::repos::{
    memory::MemoryCredentialStore,
    user_repo::{CredentialStore, PgCredentialStore},
};
use crate::services::auth::{IdentityService, PasswordHasher, build_token_service};
use crate::services::users::UserService;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,tasks_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let store = build_store(&config).await?;
    let state = build_state(&config, store);
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
        return Ok(Arc::new(MemoryCredentialStore::new()));
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(Arc::new(PgCredentialStore::new(pool)))
}

/// Build process-level services and inject them into the shared application state.
pub(crate) fn build_state(config: &Config, store: Arc<dyn CredentialStore>) -> AppState {
    let hasher = PasswordHasher::new(config.bcrypt_cost);
    tracing::debug!(bcrypt_cost = hasher.cost(), "password hasher ready");
    let tokens = build_token_service(config);

    let users = UserService::new(store, hasher);
    let identity = Arc::new(IdentityService::new(users.clone(), tokens.clone(), hasher));
    let auth_gate = AuthenticationGate::new(tokens);

    AppState::new(
        identity,
        users,
        auth_gate,
        Arc::new(api::v1::route_registry()),
    )
}

pub(crate) fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest(API_PREFIX, api::v1::routes(state.clone()))
        .fallback(route_not_found)
        .with_state(state);

    let router = middleware::http::apply(router, config);
    middleware::errors::apply(router)
}

/// Unmatched paths (outside the gates: unknown routes are 404, not 401).
async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound {
        method,
        path: uri.path().to_owned(),
    }
}
