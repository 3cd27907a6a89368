//! Per-route gate configuration.
//!
//! Routes declare two independent flags:
//! - `public`: skip the authentication gate
//! - `skip_authorization`: skip the ownership gate
//!
//! Flags are registered per controller (path prefix) and per handler
//! (method + route template). For each flag the handler entry wins when it
//! sets the flag, then the longest matching controller prefix, then `false`.

use std::collections::HashMap;

use axum::http::Method;

use crate::api::API_PREFIX;

/// Effective flags for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteFlags {
    pub public: bool,
    pub skip_authorization: bool,
}

/// Declared metadata. `None` means "not set at this level".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    public: Option<bool>,
    skip_authorization: Option<bool>,
}

impl RouteMeta {
    pub const fn new() -> Self {
        Self {
            public: None,
            skip_authorization: None,
        }
    }

    pub const fn public(self) -> Self {
        self.with_public(true)
    }

    pub const fn skip_authorization(self) -> Self {
        self.with_skip_authorization(true)
    }

    pub const fn with_public(mut self, value: bool) -> Self {
        self.public = Some(value);
        self
    }

    pub const fn with_skip_authorization(mut self, value: bool) -> Self {
        self.skip_authorization = Some(value);
        self
    }

    fn or(self, fallback: RouteMeta) -> RouteMeta {
        RouteMeta {
            public: self.public.or(fallback.public),
            skip_authorization: self.skip_authorization.or(fallback.skip_authorization),
        }
    }

    fn flags(self) -> RouteFlags {
        RouteFlags {
            public: self.public.unwrap_or(false),
            skip_authorization: self.skip_authorization.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    controllers: Vec<(String, RouteMeta)>,
    handlers: HashMap<(Method, String), RouteMeta>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for every route under `prefix` (e.g. `/users`).
    pub fn controller(mut self, prefix: impl Into<String>, meta: RouteMeta) -> Self {
        self.controllers.push((prefix.into(), meta));
        self
    }

    /// Metadata for one handler, keyed by the route template (e.g. `/users/{id}`).
    pub fn handler(mut self, method: Method, template: impl Into<String>, meta: RouteMeta) -> Self {
        self.handlers.insert((method, template.into()), meta);
        self
    }

    /// `template` is the matched route template, with or without the API prefix.
    pub fn resolve(&self, method: &Method, template: &str) -> RouteFlags {
        let template = template.strip_prefix(API_PREFIX).unwrap_or(template);

        let handler = self
            .handlers
            .get(&(method.clone(), template.to_string()))
            .copied()
            .unwrap_or_default();

        let controller = self
            .controllers
            .iter()
            .filter(|(prefix, _)| prefix_matches(prefix, template))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, meta)| *meta)
            .unwrap_or_default();

        handler.or(controller).flags()
    }
}

fn prefix_matches(prefix: &str, template: &str) -> bool {
    match template.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
