mod support;

use axum::{
    body::Body,
    http::{Method, StatusCode},
};
use flexpage::application::site::LANDING_HANDLER;
use support::{build_app, get, page, request, send};

#[tokio::test]
async fn flat_page_is_served_with_the_default_view() {
    let mut about = page("/about/", "About us");
    about.summary = "Who we are".to_string();
    let app = build_app(vec![about]);

    let (response, body) = get(&app.public, "/about/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body.contains("<article class=\"page\">"));
    assert!(body.contains("<title>About us</title>"));
    assert!(body.contains("<p class=\"page__summary\">Who we are</p>"));
    assert!(body.contains("<p>About us body</p>"));
}

#[tokio::test]
async fn unknown_paths_fall_through_to_not_found() {
    let app = build_app(vec![page("/about/", "About")]);

    let (response, body) = get(&app.public, "/not-a-real-page/").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body.contains("No page lives at <code>/not-a-real-page/</code>"));
}

#[tokio::test]
async fn paths_that_cannot_be_pages_skip_the_store() {
    let app = build_app(vec![page("/about/", "About")]);

    for uri in ["/about", "/asdf.jpg", "/About/"] {
        let (response, _) = get(&app.public, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    assert_eq!(app.store.query_count(), 0);
}

#[tokio::test]
async fn repeated_requests_hit_the_store_once() {
    let app = build_app(vec![page("/about/", "About")]);

    for _ in 0..3 {
        let (response, _) = get(&app.public, "/about/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    for _ in 0..3 {
        let (response, _) = get(&app.public, "/missing/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    assert_eq!(app.store.query_count(), 2);
}

#[tokio::test]
async fn custom_view_replaces_the_default_view() {
    let mut spring = page("/spring/", "Spring sale");
    spring.view = Some(LANDING_HANDLER.to_string());
    let app = build_app(vec![spring]);

    let (response, body) = get(&app.public, "/spring/?utm_campaign=newsletter").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body.contains("<main class=\"landing\">"));
    assert!(body.contains("You arrived via newsletter."));
}

#[tokio::test]
async fn custom_template_is_tried_first() {
    let mut plain = page("/plain/", "Plain");
    plain.template = Some("pages/plain.html".to_string());
    let app = build_app(vec![plain]);

    let (response, body) = get(&app.public, "/plain/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body.contains("<p>Plain body</p>"));
    assert!(!body.contains("<article class=\"page\">"));
}

#[tokio::test]
async fn unregistered_custom_template_falls_back_to_defaults() {
    let mut about = page("/about/", "About");
    about.template = Some("pages/missing.html".to_string());
    let app = build_app(vec![about]);

    let (response, body) = get(&app.public, "/about/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body.contains("<article class=\"page\">"));
}

#[tokio::test]
async fn static_route_renders_through_its_own_handler() {
    let mut home = page("/", "Welcome");
    home.summary = "Start here".to_string();
    let app = build_app(vec![home]);

    let (response, body) = get(&app.public, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body.contains("<main class=\"home\">"));
    assert!(body.contains("<p class=\"home__lead\">Start here</p>"));
    // The interceptor declines and the route loads the page from the cache.
    assert_eq!(app.store.query_count(), 1);
}

#[tokio::test]
async fn static_route_without_a_page_is_not_found() {
    let app = build_app(Vec::new());

    let (response, _) = get(&app.public, "/").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn head_requests_are_intercepted() {
    let app = build_app(vec![page("/about/", "About")]);

    let (response, _) = send(&app.public, request(Method::HEAD, "/about/", Body::empty())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.query_count(), 1);
}

#[tokio::test]
async fn other_methods_reach_the_router() {
    let app = build_app(vec![page("/about/", "About")]);

    let (response, _) = send(&app.public, request(Method::POST, "/about/", Body::empty())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.query_count(), 0);
}

#[tokio::test]
async fn store_failures_surface_as_service_unavailable() {
    let app = build_app(vec![page("/about/", "About")]);
    app.store.fail_next_lookup("connection reset");

    let (response, _) = get(&app.public, "/about/").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let (response, _) = get(&app.public, "/about/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_probe_without_a_database_reports_ok() {
    let app = build_app(Vec::new());

    let (response, _) = get(&app.public, "/_health/db").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
