//! Deferred page rendering.
//!
//! Handlers usually return a [`PageResponse::Deferred`] naming candidate
//! templates and a view model; the caller finalizes it against the
//! [`TemplateRegistry`]. Handlers that build their own response return
//! [`PageResponse::Rendered`] and are passed through untouched.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::{IntoResponse, Response};

use crate::application::error::HttpError;
use crate::application::handlers::{PageHandler, PageRequest};
use crate::application::repos::RepoError;
use crate::cache::ResolutionCache;
use crate::domain::entities::PageRecord;
use crate::presentation::views::{PAGE_DETAIL_TEMPLATE, PageView, TemplateRegistry};

/// Templates tried by the default handler when a page names none.
pub const DEFAULT_TEMPLATE_NAMES: &[&str] = &[PAGE_DETAIL_TEMPLATE];

/// Candidate templates for `page`: its custom template first, then `base`.
pub fn template_names(page: &PageRecord, base: &[&str]) -> Vec<String> {
    page.custom_template()
        .into_iter()
        .chain(base.iter().copied())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct DeferredRender {
    template_names: Vec<String>,
    view: PageView,
}

impl DeferredRender {
    pub fn new(template_names: Vec<String>, view: PageView) -> Self {
        Self {
            template_names,
            view,
        }
    }

    pub fn template_names(&self) -> &[String] {
        &self.template_names
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }
}

pub enum PageResponse {
    Deferred(DeferredRender),
    Rendered(Response),
}

impl PageResponse {
    pub fn deferred(template_names: Vec<String>, view: PageView) -> Self {
        Self::Deferred(DeferredRender::new(template_names, view))
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    /// Finalizes the response; already-rendered responses are returned as-is.
    pub fn render(self, templates: &TemplateRegistry) -> Result<Response, HttpError> {
        match self {
            Self::Rendered(response) => Ok(response),
            Self::Deferred(deferred) => {
                let html = templates.render(&deferred.template_names, &deferred.view)?;
                Ok(html.into_response())
            }
        }
    }
}

impl From<Response> for PageResponse {
    fn from(response: Response) -> Self {
        Self::Rendered(response)
    }
}

/// Renders a page with its custom template or `pages/page_detail.html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPageHandler;

#[async_trait]
impl PageHandler for DefaultPageHandler {
    async fn handle(
        &self,
        _request: &PageRequest,
        page: &PageRecord,
    ) -> Result<PageResponse, HttpError> {
        Ok(PageResponse::deferred(
            template_names(page, DEFAULT_TEMPLATE_NAMES),
            PageView::from_page(page),
        ))
    }
}

/// Gives route handlers access to the page configured for their own path.
///
/// Lookups go through the resolution cache, so a static route that renders
/// database content costs no extra queries once warm.
#[derive(Clone)]
pub struct PageContextLoader {
    cache: Arc<ResolutionCache>,
}

impl PageContextLoader {
    pub fn new(cache: Arc<ResolutionCache>) -> Self {
        Self { cache }
    }

    pub async fn page_for_request(&self, path: &str) -> Result<Option<PageRecord>, RepoError> {
        self.cache.resolve(path).await
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::*;
    use crate::cache::{CacheConfig, MemoryBackend};
    use crate::domain::entities::fixtures::page;
    use crate::infra::memory::InMemoryPages;
    use crate::presentation::views::HOME_TEMPLATE;

    #[test]
    fn custom_template_is_prepended() {
        let mut record = page("/");
        record.template = Some("pages/plain.html".to_string());

        assert_eq!(
            template_names(&record, &[HOME_TEMPLATE, PAGE_DETAIL_TEMPLATE]),
            vec!["pages/plain.html", HOME_TEMPLATE, PAGE_DETAIL_TEMPLATE]
        );
    }

    #[test]
    fn blank_template_leaves_base_untouched() {
        let mut record = page("/");
        record.template = Some("  ".to_string());

        assert_eq!(
            template_names(&record, DEFAULT_TEMPLATE_NAMES),
            vec![PAGE_DETAIL_TEMPLATE]
        );
    }

    #[tokio::test]
    async fn default_handler_defers_rendering() {
        let record = page("/about/");
        let response = DefaultPageHandler
            .handle(&PageRequest::new(Method::GET, "/about/"), &record)
            .await
            .expect("handle");

        assert!(!response.is_rendered());
        match &response {
            PageResponse::Deferred(deferred) => {
                assert_eq!(deferred.template_names(), [PAGE_DETAIL_TEMPLATE]);
                assert_eq!(deferred.view().title, record.title);
            }
            PageResponse::Rendered(_) => panic!("expected deferred response"),
        }

        let rendered = response
            .render(&TemplateRegistry::builtin())
            .expect("render");
        assert_eq!(rendered.status(), StatusCode::OK);
    }

    #[test]
    fn rendered_responses_pass_through() {
        let response = PageResponse::from(StatusCode::NO_CONTENT.into_response());
        assert!(response.is_rendered());

        let finalized = response
            .render(&TemplateRegistry::new())
            .expect("pass through");
        assert_eq!(finalized.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn context_loader_reads_through_the_cache() {
        let store = Arc::new(InMemoryPages::with_pages(vec![page("/blog/")]));
        let config = CacheConfig::default();
        let cache = Arc::new(ResolutionCache::new(
            config.clone(),
            Arc::new(MemoryBackend::new(&config)),
            store.clone(),
        ));
        let loader = PageContextLoader::new(cache);

        assert!(loader.page_for_request("/blog/").await.expect("load").is_some());
        assert!(loader.page_for_request("/blog/").await.expect("load").is_some());
        assert_eq!(store.query_count(), 1);
    }
}
