//! Handler selection for resolved pages.

use std::sync::Arc;

use tracing::debug;

use crate::application::handlers::{HandlerRegistry, PageHandler, StaticRouteTable};
use crate::application::render::DefaultPageHandler;
use crate::domain::entities::PageRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedHandler {
    /// The page's own `view` identifier, loaded from the registry.
    Custom(String),
    /// A static route owns the page's path.
    StaticRoute(String),
    Default,
}

/// Picks who renders a page: custom handler, then static route, then default.
#[derive(Debug, Clone)]
pub struct ViewResolver {
    handlers: Arc<HandlerRegistry>,
    routes: Arc<StaticRouteTable>,
}

impl ViewResolver {
    pub fn new(handlers: Arc<HandlerRegistry>, routes: Arc<StaticRouteTable>) -> Self {
        Self { handlers, routes }
    }

    pub fn routes(&self) -> &StaticRouteTable {
        &self.routes
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn select(&self, page: &PageRecord) -> ResolvedHandler {
        if let Some(id) = page.custom_view() {
            if self.handlers.contains(id) {
                return ResolvedHandler::Custom(id.to_string());
            }
            debug!(page_url = %page.url, view = id, "custom view could not be loaded");
        }

        match self.static_route(page) {
            Some(id) => ResolvedHandler::StaticRoute(id),
            None => ResolvedHandler::Default,
        }
    }

    /// The page's custom handler, when its identifier is registered.
    pub fn custom_handler(&self, page: &PageRecord) -> Option<Arc<dyn PageHandler>> {
        page.custom_view().and_then(|id| self.handlers.load(id))
    }

    /// The handler identifier of the static route owning the page's path.
    pub fn static_route(&self, page: &PageRecord) -> Option<String> {
        self.routes.match_path(&page.url).map(str::to_string)
    }

    /// The handler to invoke for a selection.
    ///
    /// An identifier missing from the registry, which only happens when a
    /// static route names an unregistered handler, renders with the default.
    pub fn handler_for(&self, selection: &ResolvedHandler) -> Arc<dyn PageHandler> {
        let id = match selection {
            ResolvedHandler::Custom(id) | ResolvedHandler::StaticRoute(id) => id,
            ResolvedHandler::Default => return Arc::new(DefaultPageHandler),
        };

        match self.handlers.load(id) {
            Some(handler) => handler,
            None => {
                debug!(handler = %id, "handler not registered; using default");
                Arc::new(DefaultPageHandler)
            }
        }
    }
}
