#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response},
};
use flexpage::{
    application::{
        admin::pages::AdminPageService,
        handlers::{HandlerRegistry, StaticRouteTable},
        interceptor::PageInterceptor,
        site::register_site_handlers,
        views::ViewResolver,
    },
    cache::{CacheConfig, MemoryBackend, ResolutionCache},
    domain::entities::PageRecord,
    infra::{
        http::{AdminState, HttpState, build_admin_router, build_router},
        memory::InMemoryPages,
    },
    presentation::views::TemplateRegistry,
};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub public: Router,
    pub admin: Router,
    pub store: Arc<InMemoryPages>,
    pub cache: Arc<ResolutionCache>,
    pub interceptor: PageInterceptor,
}

pub fn page(url: &str, title: &str) -> PageRecord {
    let now = OffsetDateTime::now_utc();
    PageRecord {
        id: Uuid::new_v4(),
        url: url.to_string(),
        title: title.to_string(),
        summary: String::new(),
        view: None,
        template: None,
        content_html: format!("<p>{title} body</p>"),
        created_at: now,
        updated_at: now,
    }
}

pub fn build_app(pages: Vec<PageRecord>) -> TestApp {
    let store = Arc::new(InMemoryPages::with_pages(pages));
    let config = CacheConfig::default();
    let backend = Arc::new(MemoryBackend::new(&config));
    let cache = Arc::new(ResolutionCache::new(config, backend, store.clone()));

    let mut handlers = HandlerRegistry::new();
    let mut routes = StaticRouteTable::new();
    register_site_handlers(&mut handlers, &mut routes);
    let handlers = Arc::new(handlers);

    let interceptor = PageInterceptor::new(
        cache.clone(),
        ViewResolver::new(handlers.clone(), Arc::new(routes)),
        Arc::new(TemplateRegistry::builtin()),
    );

    let public = build_router(HttpState {
        interceptor: interceptor.clone(),
        db: None,
    });
    let admin = build_admin_router(AdminState {
        pages: Arc::new(AdminPageService::new(
            store.clone(),
            store.clone(),
            cache.clone(),
            handlers,
        )),
    });

    TestApp {
        public,
        admin,
        store,
        cache,
        interceptor,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (Response<Body>, String) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .expect("body should be readable");
    let text = String::from_utf8(bytes.to_vec()).expect("body should be utf-8");
    (Response::from_parts(parts, Body::empty()), text)
}

pub async fn get(router: &Router, uri: &str) -> (Response<Body>, String) {
    send(router, request(Method::GET, uri, Body::empty())).await
}

pub fn request(method: Method, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .expect("request should build")
}

pub fn json_request(method: Method, uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("request should build")
}
