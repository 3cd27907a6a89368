//! Authorization gate: ownership check between the Principal and the `id`
//! path parameter.
//!
//! Decision order (first match wins, anything else is allowed):
//! 1. route has `skip_authorization` → allow
//! 2. no Principal on the request → allow (authentication is not decided here)
//! 3. task resources → allow (the task service checks ownership)
//! 4. no `id` parameter → allow (collection route)
//! 5. `principal.id == id` → allow, otherwise deny
//!    (GET → `ForbiddenResource`, other methods → `UnauthorizedAction`)

use std::fmt;

use axum::{
    Router,
    extract::{OriginalUri, RawPathParams, Request, State, rejection::RawPathParamsRejection},
    http::Method,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Principal;
use crate::error::AppError;
use crate::middleware::auth::{route_flags, route_meta::RouteFlags};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    User,
    Task,
    Resource,
}

impl ResourceType {
    pub fn from_path(path: &str) -> Self {
        if path.contains("/users") {
            Self::User
        } else if path.contains("/tasks") {
            Self::Task
        } else {
            Self::Resource
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Task => "task",
            Self::Resource => "resource",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Access,
    Create,
    Update,
    Delete,
    Unknown,
}

impl Action {
    pub fn from_method(method: &Method) -> Self {
        match *method {
            Method::GET => Self::Access,
            Method::POST => Self::Create,
            Method::PATCH | Method::PUT => Self::Update,
            Method::DELETE => Self::Delete,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Unknown => "perform action on",
        })
    }
}

/// (type, id, action) derived from one request. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub action: Action,
}

impl ResourceRef {
    pub fn from_request(path: &str, method: &Method, resource_id: Option<&str>) -> Self {
        Self {
            resource_type: ResourceType::from_path(path),
            resource_id: resource_id.map(str::to_owned),
            action: Action::from_method(method),
        }
    }
}

pub fn authorize(
    flags: RouteFlags,
    principal: Option<&Principal>,
    resource: &ResourceRef,
) -> Result<(), AppError> {
    if flags.skip_authorization {
        return Ok(());
    }

    let Some(principal) = principal else {
        return Ok(());
    };

    if resource.resource_type == ResourceType::Task {
        return Ok(());
    }

    let Some(resource_id) = resource.resource_id.as_deref() else {
        return Ok(());
    };

    if principal.id == resource_id {
        return Ok(());
    }

    tracing::warn!(
        user_id = %principal.id,
        action = %resource.action,
        resource_type = %resource.resource_type,
        resource_id = %resource_id,
        "unauthorized access attempt"
    );

    Err(match resource.action {
        Action::Access => AppError::ForbiddenResource {
            resource_type: resource.resource_type,
        },
        action => AppError::UnauthorizedAction {
            action,
            resource_type: resource.resource_type,
            resource_id: resource_id.to_owned(),
            user_id: principal.id.clone(),
        },
    })
}

/// Install the ownership gate. Apply before `access::apply` so it runs after it.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, authorize_request))
}

async fn authorize_request(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    params: Result<RawPathParams, RawPathParamsRejection>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let flags = route_flags(&state, &req);

    let resource_id = params
        .ok()
        .and_then(|p| p.iter().find(|(k, _)| *k == "id").map(|(_, v)| v.to_owned()));
    let resource = ResourceRef::from_request(
        original_uri.path(),
        req.method(),
        resource_id.as_deref(),
    );

    authorize(flags, req.extensions().get::<Principal>(), &resource)?;

    Ok(next.run(req).await)
}
