//! Request-time page dispatch ahead of the static router.

use std::sync::Arc;

use axum::response::Response;
use metrics::counter;
use tracing::{debug, instrument};

use crate::application::error::HttpError;
use crate::application::handlers::PageRequest;
use crate::application::views::{ResolvedHandler, ViewResolver};
use crate::cache::ResolutionCache;
use crate::presentation::views::TemplateRegistry;

pub enum Interception {
    /// A page handler produced the final response.
    Handled(Response),
    /// No page applies, or a static route owns it; the router should run.
    Decline,
}

impl Interception {
    pub fn is_decline(&self) -> bool {
        matches!(self, Self::Decline)
    }
}

#[derive(Clone)]
pub struct PageInterceptor {
    cache: Arc<ResolutionCache>,
    resolver: ViewResolver,
    templates: Arc<TemplateRegistry>,
}

impl PageInterceptor {
    pub fn new(
        cache: Arc<ResolutionCache>,
        resolver: ViewResolver,
        templates: Arc<TemplateRegistry>,
    ) -> Self {
        Self {
            cache,
            resolver,
            templates,
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &ViewResolver {
        &self.resolver
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Serves the request from its page, or declines.
    ///
    /// Store failures surface as a 503; nothing about them is cached.
    #[instrument(skip_all, fields(path = %request.path))]
    pub async fn handle(&self, request: &PageRequest) -> Result<Interception, HttpError> {
        let Some(page) = self.cache.resolve(&request.path).await? else {
            return Ok(Interception::Decline);
        };

        let selection = self.resolver.select(&page);
        let kind = match &selection {
            ResolvedHandler::StaticRoute(id) => {
                debug!(handler = %id, "static route owns page; declining");
                return Ok(Interception::Decline);
            }
            ResolvedHandler::Custom(_) => "custom",
            ResolvedHandler::Default => "default",
        };

        let handler = self.resolver.handler_for(&selection);
        let response = handler.handle(request, &page).await?;
        let response = response.render(&self.templates)?;

        counter!("flexpage_intercept_total", "handler" => kind).increment(1);
        debug!(handler = kind, status = %response.status(), "page served");

        Ok(Interception::Handled(response))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use axum::response::IntoResponse;

    use super::*;
    use crate::application::handlers::{HandlerRegistry, PageHandler, StaticRouteTable};
    use crate::application::render::PageResponse;
    use crate::cache::{CacheConfig, MemoryBackend};
    use crate::domain::entities::{PageRecord, fixtures::page};
    use crate::infra::memory::InMemoryPages;

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageHandler for CountingHandler {
        async fn handle(
            &self,
            _request: &PageRequest,
            page: &PageRecord,
        ) -> Result<PageResponse, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PageResponse::from(
                (StatusCode::ACCEPTED, page.url.clone()).into_response(),
            ))
        }
    }

    fn interceptor(
        pages: Vec<PageRecord>,
        custom: Arc<CountingHandler>,
    ) -> (PageInterceptor, Arc<InMemoryPages>) {
        let store = Arc::new(InMemoryPages::with_pages(pages));
        let config = CacheConfig::default();
        let cache = Arc::new(ResolutionCache::new(
            config.clone(),
            Arc::new(MemoryBackend::new(&config)),
            store.clone(),
        ));

        let mut handlers = HandlerRegistry::new();
        handlers.register("test.counting", custom);
        let mut routes = StaticRouteTable::new();
        routes.add("/", "test.homepage");

        let resolver = ViewResolver::new(Arc::new(handlers), Arc::new(routes));
        (
            PageInterceptor::new(cache, resolver, Arc::new(TemplateRegistry::builtin())),
            store,
        )
    }

    fn get(path: &str) -> PageRequest {
        PageRequest::new(Method::GET, path)
    }

    #[tokio::test]
    async fn declines_when_no_page_exists() {
        let (interceptor, _) = interceptor(Vec::new(), Arc::default());
        let outcome = interceptor.handle(&get("/nothing/")).await.expect("handle");
        assert!(outcome.is_decline());
    }

    #[tokio::test]
    async fn declines_invalid_paths_without_queries() {
        let (interceptor, store) = interceptor(Vec::new(), Arc::default());
        let outcome = interceptor.handle(&get("/asdf.jpg")).await.expect("handle");
        assert!(outcome.is_decline());
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn declines_to_static_route_without_custom_view() {
        let (interceptor, _) = interceptor(vec![page("/")], Arc::default());
        let outcome = interceptor.handle(&get("/")).await.expect("handle");
        assert!(outcome.is_decline());
    }

    #[tokio::test]
    async fn custom_view_overrides_static_route() {
        let mut home = page("/");
        home.view = Some("test.counting".to_string());
        let custom = Arc::new(CountingHandler::default());
        let (interceptor, _) = interceptor(vec![home], custom.clone());

        match interceptor.handle(&get("/")).await.expect("handle") {
            Interception::Handled(response) => {
                assert_eq!(response.status(), StatusCode::ACCEPTED)
            }
            Interception::Decline => panic!("expected custom handler to run"),
        }
        assert_eq!(custom.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn default_handler_renders_deferred_response() {
        let (interceptor, _) = interceptor(vec![page("/about/")], Arc::default());

        match interceptor.handle(&get("/about/")).await.expect("handle") {
            Interception::Handled(response) => assert_eq!(response.status(), StatusCode::OK),
            Interception::Decline => panic!("expected default handler to run"),
        }
    }

    #[tokio::test]
    async fn store_failure_is_service_unavailable() {
        let (interceptor, store) = interceptor(vec![page("/about/")], Arc::default());
        store.fail_next_lookup("connection reset");

        let err = match interceptor.handle(&get("/about/")).await {
            Err(err) => err,
            Ok(_) => panic!("expected store failure"),
        };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
