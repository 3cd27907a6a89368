//! Router-level tests: the full middleware stack driven in-process.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
    routing::get,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::app::{build_router, build_state};
use crate::config::Config;
use crate::middleware::{
    self,
    auth::{
        access, ownership,
        route_meta::{RouteMeta, RouteRegistry},
    },
};
use crate::repos::memory::MemoryCredentialStore;
use crate::services::auth::{JwtTokenService, TokenService};
use crate::state::AppState;

fn test_state() -> AppState {
    build_state(&Config::for_tests(), Arc::new(MemoryCredentialStore::new()))
}

fn test_app() -> Router {
    build_router(test_state(), &Config::for_tests())
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Registers an account and returns (token, user id).
async fn register(app: &Router, email: &str, password: &str) -> (String, String) {
    let res = send(
        app,
        request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": email, "password": password, "fullname": "Test User" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = json_body(res).await;
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let res = send(&app, request(Method::GET, "/api/v1/health", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_route_ignores_garbage_credentials() {
    let app = test_app();
    let res = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/register",
            Some("definitely-not-a-jwt"),
            Some(json!({ "email": "jane@example.com", "password": "securePassword123" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn register_then_login_yields_verifiable_token() {
    let app = test_app();
    let (_, user_id) = register(&app, "jane@example.com", "securePassword123").await;

    let res = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": "securePassword123" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert_eq!(body["user"]["email"], "jane@example.com");
    assert_eq!(body["user"]["fullname"], "Test User");
    assert_eq!(body["user"]["tasks"], json!([]));
    assert!(body["user"].get("password_hash").is_none());

    let token = body["accessToken"].as_str().unwrap();
    let claims = JwtTokenService::new(b"test-secret", 3600)
        .verify(token)
        .unwrap();
    assert_eq!(claims.id, user_id);
    assert_eq!(claims.email, "jane@example.com");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = test_app();
    register(&app, "jane@example.com", "securePassword123").await;

    let unknown = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "securePassword123" })),
        ),
    )
    .await;
    let wrong = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": "wrong" })),
        ),
    )
    .await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = json_body(unknown).await;
    let wrong = json_body(wrong).await;
    assert_eq!(unknown["message"], "Invalid credentials");
    assert_eq!(unknown["message"], wrong["message"]);
    assert_eq!(unknown["statusCode"], wrong["statusCode"]);
}

#[tokio::test]
async fn duplicate_registration_is_conflict() {
    let app = test_app();
    register(&app, "jane@example.com", "pw").await;

    let res = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "jane@example.com", "password": "other" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(res).await["message"],
        "User with email jane@example.com already exists"
    );
}

#[tokio::test]
async fn invalid_body_is_bad_request() {
    let app = test_app();
    let res = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "not-an-email", "password": "pw" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["statusCode"], 400);
}

#[tokio::test]
async fn protected_route_without_header() {
    let app = test_app();
    let (_, user_id) = register(&app, "jane@example.com", "pw").await;

    let res = send(
        &app,
        request(Method::GET, &format!("/api/v1/users/{user_id}"), None, None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(res).await;
    assert_eq!(body["message"], "Missing authorization header");
    assert_eq!(body["path"], format!("/api/v1/users/{user_id}"));
}

#[tokio::test]
async fn empty_bearer_is_malformed() {
    let app = test_app();
    let (_, user_id) = register(&app, "jane@example.com", "pw").await;

    let req = Request::get(format!("/api/v1/users/{user_id}"))
        .header(header::AUTHORIZATION, "Bearer ")
        .body(Body::empty())
        .unwrap();
    let res = send(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(res).await["message"],
        "Invalid authorization header format"
    );
}

#[tokio::test]
async fn tampered_token_is_invalid_credentials() {
    let app = test_app();
    let (token, user_id) = register(&app, "jane@example.com", "pw").await;

    let res = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/users/{user_id}"),
            Some(&format!("{token}x")),
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["message"], "Invalid credentials");
}

#[tokio::test]
async fn lenient_bearer_header_is_accepted() {
    let app = test_app();
    let (token, user_id) = register(&app, "jane@example.com", "pw").await;

    let req = Request::get(format!("/api/v1/users/{user_id}"))
        .header(header::AUTHORIZATION, format!("  bearer   {token}   "))
        .body(Body::empty())
        .unwrap();
    let res = send(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["id"], user_id.as_str());
}

#[tokio::test]
async fn owner_can_read_update_and_delete_self() {
    let app = test_app();
    let (token, user_id) = register(&app, "jane@example.com", "pw").await;
    let uri = format!("/api/v1/users/{user_id}");

    let res = send(&app, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "fullname": "Jane Smith" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["fullname"], "Jane Smith");

    let res = send(&app, request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn reading_another_user_is_forbidden() {
    let app = test_app();
    let (token, _) = register(&app, "jane@example.com", "pw").await;
    let (_, other_id) = register(&app, "john@example.com", "pw").await;

    let res = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/users/{other_id}"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(res).await["message"],
        "Access denied: You do not have permission to access user"
    );
}

#[tokio::test]
async fn mutating_another_user_is_unauthorized_action() {
    let app = test_app();
    let (token, user_id) = register(&app, "jane@example.com", "pw").await;
    let (_, other_id) = register(&app, "john@example.com", "pw").await;

    let res = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/users/{other_id}"),
            Some(&token),
            Some(json!({ "fullname": "Hacked" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(res).await["message"],
        format!(
            "Action 'update' denied: User {user_id} does not have permission to update user {other_id}"
        )
    );

    let res = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/users/{other_id}/email"),
            Some(&token),
            Some(json!({ "email": "mine@example.com" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/v1/users/{other_id}"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_user_skips_authorization_but_not_authentication() {
    let app = test_app();
    let body = json!({ "email": "new@example.com", "password": "pw" });

    let res = send(
        &app,
        request(Method::POST, "/api/v1/users", None, Some(body.clone())),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (token, _) = register(&app, "jane@example.com", "pw").await;
    let res = send(
        &app,
        request(Method::POST, "/api/v1/users", Some(&token), Some(body)),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(json_body(res).await["email"], "new@example.com");
}

#[tokio::test]
async fn email_change_rules() {
    let app = test_app();
    let (token, user_id) = register(&app, "jane@example.com", "pw").await;
    register(&app, "john@example.com", "pw").await;
    let uri = format!("/api/v1/users/{user_id}/email");

    let taken = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "email": "john@example.com" })),
        ),
    )
    .await;
    assert_eq!(taken.status(), StatusCode::CONFLICT);

    let same = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "email": "jane@example.com" })),
        ),
    )
    .await;
    assert_eq!(same.status(), StatusCode::CONFLICT);

    let changed = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "email": "jane.doe@example.com" })),
        ),
    )
    .await;
    assert_eq!(changed.status(), StatusCode::OK);
    assert_eq!(json_body(changed).await["email"], "jane.doe@example.com");
}

#[tokio::test]
async fn password_change_takes_effect_on_login() {
    let app = test_app();
    let (token, user_id) = register(&app, "jane@example.com", "old-password").await;

    let res = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/users/{user_id}"),
            Some(&token),
            Some(json!({ "password": "new-password" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let login = |password: &'static str| {
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": password })),
        )
    };
    assert_eq!(
        send(&app, login("old-password")).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        send(&app, login("new-password")).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn deleted_user_is_not_found() {
    let app = test_app();
    let (token, user_id) = register(&app, "jane@example.com", "pw").await;
    let uri = format!("/api/v1/users/{user_id}");

    send(&app, request(Method::DELETE, &uri, Some(&token), None)).await;

    // the token outlives the account
    let res = send(&app, request(Method::GET, &uri, Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(res).await["message"],
        format!("User with id {user_id} not found")
    );
}

#[tokio::test]
async fn error_responses_keep_request_id() {
    let app = test_app();
    let res = send(&app, request(Method::GET, "/api/v1/users/abc", None, None)).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn bcrypt_looking_password_signs_in() {
    let app = test_app();
    register(&app, "dollar@example.com", "$2b$mySecretPass").await;

    let res = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "dollar@example.com", "password": "$2b$mySecretPass" })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_enveloped_not_found() {
    let app = test_app();
    let res = send(&app, request(Method::GET, "/api/v1/nope", None, None)).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().contains_key("x-request-id"));

    let body = json_body(res).await;
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["message"], "Cannot GET /api/v1/nope");
    assert_eq!(body["path"], "/api/v1/nope");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unsupported_method_is_enveloped() {
    let app = test_app();
    let res = send(&app, request(Method::PUT, "/api/v1/health", None, None)).await;

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(res).await["statusCode"], 405);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let app = test_app();
    let password = "x".repeat(2 * 1024 * 1024);

    let res = send(
        &app,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": password })),
        ),
    )
    .await;

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(res).await["statusCode"], 413);
}

#[tokio::test]
async fn missing_content_type_keeps_rejection_status() {
    let app = test_app();
    let req = Request::post("/api/v1/auth/login")
        .body(Body::from(r#"{"email":"jane@example.com","password":"pw"}"#))
        .unwrap();
    let res = send(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(json_body(res).await["statusCode"], 415);
}

// Gates mounted on routes the service does not ship, to pin down the
// task deferral and handler-level skip flags end to end.
mod gate_chain {
    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    fn app_with(registry: RouteRegistry) -> Router {
        let mut state = test_state();
        state.routes = Arc::new(registry);

        let v1 = Router::new()
            .route("/tasks/{id}", get(ok).patch(ok).delete(ok))
            .route("/users/{id}", get(ok).delete(ok));
        let v1 = ownership::apply(v1, state.clone());
        let v1 = access::apply(v1, state.clone());

        let router = Router::new().nest("/api/v1", v1).with_state(state);
        middleware::errors::apply(router)
    }

    fn token_for(id: &str) -> String {
        JwtTokenService::new(b"test-secret", 3600)
            .issue(&crate::services::auth::IdentityClaims {
                id: id.to_string(),
                email: format!("{id}@example.com"),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn tasks_are_not_owner_checked() {
        let app = app_with(RouteRegistry::new());
        let token = token_for("U1");

        for method in [Method::GET, Method::PATCH, Method::DELETE] {
            let res = send(
                &app,
                request(method, "/api/v1/tasks/T9", Some(&token), None),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn tasks_still_require_authentication() {
        let app = app_with(RouteRegistry::new());
        let res = send(&app, request(Method::GET, "/api/v1/tasks/T9", None, None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn string_ids_are_compared_verbatim() {
        let app = app_with(RouteRegistry::new());
        let token = token_for("U1");

        let own = send(&app, request(Method::GET, "/api/v1/users/U1", Some(&token), None)).await;
        assert_eq!(own.status(), StatusCode::OK);

        let other = send(&app, request(Method::GET, "/api/v1/users/U2", Some(&token), None)).await;
        assert_eq!(other.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn handler_skip_flag_allows_mismatch() {
        let registry = RouteRegistry::new().handler(
            Method::DELETE,
            "/users/{id}",
            RouteMeta::new().skip_authorization(),
        );
        let app = app_with(registry);
        let token = token_for("U1");

        let res = send(
            &app,
            request(Method::DELETE, "/api/v1/users/U2", Some(&token), None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        // GET on the same template is still owner-checked
        let res = send(&app, request(Method::GET, "/api/v1/users/U2", Some(&token), None)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn public_controller_without_principal_skips_ownership() {
        let registry = RouteRegistry::new().controller("/users", RouteMeta::new().public());
        let app = app_with(registry);

        let res = send(&app, request(Method::DELETE, "/api/v1/users/U2", None, None)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
