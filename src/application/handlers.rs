//! Page handlers and the registries that name them.
//!
//! A page's `view` field holds a handler identifier such as `site.landing`.
//! Identifiers are resolved against a [`HandlerRegistry`] filled at startup;
//! nothing is loaded dynamically.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, Request};

use crate::application::error::HttpError;
use crate::application::render::PageResponse;
use crate::domain::entities::PageRecord;

/// The parts of an incoming request a page handler may inspect.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl PageRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn from_http<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            headers: request.headers().clone(),
        }
    }
}

#[async_trait]
pub trait PageHandler: Send + Sync {
    async fn handle(
        &self,
        request: &PageRequest,
        page: &PageRecord,
    ) -> Result<PageResponse, HttpError>;
}

/// Identifier → handler map.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn PageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `id`, replacing any previous registration.
    pub fn register(&mut self, id: impl Into<String>, handler: Arc<dyn PageHandler>) {
        self.handlers.insert(id.into(), handler);
    }

    pub fn load(&self, id: &str) -> Option<Arc<dyn PageHandler>> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_struct("HandlerRegistry").field("ids", &ids).finish()
    }
}

/// Paths owned by the application's own routes, each naming its handler.
///
/// Matching is exact. The HTTP layer mounts one route per entry, so a path
/// that matches here is always served by the router when the interceptor
/// declines.
#[derive(Debug, Clone, Default)]
pub struct StaticRouteTable {
    routes: Vec<(String, String)>,
}

impl StaticRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, handler_id: impl Into<String>) {
        let path = path.into();
        let handler_id = handler_id.into();
        match self.routes.iter_mut().find(|(existing, _)| *existing == path) {
            Some(route) => route.1 = handler_id,
            None => self.routes.push((path, handler_id)),
        }
    }

    /// The handler identifier for `path`, if a static route owns it.
    pub fn match_path(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(route, _)| route == path)
            .map(|(_, handler_id)| handler_id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|(path, handler_id)| (path.as_str(), handler_id.as_str()))
    }
}
