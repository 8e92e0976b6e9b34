//! Handlers shipped with the server.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::error::HttpError;
use crate::application::handlers::{HandlerRegistry, PageHandler, PageRequest, StaticRouteTable};
use crate::application::render::{PageResponse, template_names};
use crate::domain::entities::PageRecord;
use crate::presentation::views::{HOME_TEMPLATE, LANDING_TEMPLATE, PAGE_DETAIL_TEMPLATE, PageView};

pub const HOMEPAGE_HANDLER: &str = "site.homepage";
pub const LANDING_HANDLER: &str = "site.landing";

/// Owns `/` as a static route.
#[derive(Debug, Default)]
pub struct HomepageHandler;

#[async_trait]
impl PageHandler for HomepageHandler {
    async fn handle(
        &self,
        _request: &PageRequest,
        page: &PageRecord,
    ) -> Result<PageResponse, HttpError> {
        let mut view = PageView::from_page(page);
        if !page.summary.is_empty() {
            view = view.with_lead(page.summary.clone());
        }
        Ok(PageResponse::deferred(
            template_names(page, &[HOME_TEMPLATE, PAGE_DETAIL_TEMPLATE]),
            view,
        ))
    }
}

/// Custom view for campaign-style pages; ignores the page's custom template.
#[derive(Debug, Default)]
pub struct LandingHandler;

#[async_trait]
impl PageHandler for LandingHandler {
    async fn handle(
        &self,
        request: &PageRequest,
        page: &PageRecord,
    ) -> Result<PageResponse, HttpError> {
        let mut view = PageView::from_page(page);
        if let Some(campaign) = campaign(request) {
            view = view.with_lead(format!("You arrived via {campaign}."));
        }
        Ok(PageResponse::deferred(
            vec![LANDING_TEMPLATE.to_string()],
            view,
        ))
    }
}

fn campaign(request: &PageRequest) -> Option<&str> {
    request
        .query
        .as_deref()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("utm_campaign="))
        .filter(|value| !value.is_empty())
}

/// Registers the built-in handlers and the static routes they own.
pub fn register_site_handlers(handlers: &mut HandlerRegistry, routes: &mut StaticRouteTable) {
    handlers.register(HOMEPAGE_HANDLER, Arc::new(HomepageHandler));
    handlers.register(LANDING_HANDLER, Arc::new(LandingHandler));
    routes.add("/", HOMEPAGE_HANDLER);
}
