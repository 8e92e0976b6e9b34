use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    application::{
        error::HttpError,
        handlers::PageRequest,
        interceptor::PageInterceptor,
        render::PageContextLoader,
        views::ResolvedHandler,
    },
    infra::db::PostgresRepositories,
    presentation::views::render_not_found_response,
};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
    pages::page_interceptor_layer,
};

#[derive(Clone)]
pub struct HttpState {
    pub interceptor: PageInterceptor,
    /// Absent when pages live in memory.
    pub db: Option<Arc<PostgresRepositories>>,
}

/// Public router: static routes from the route table, the health probe and a
/// not-found fallback, all behind the page interceptor.
pub fn build_router(state: HttpState) -> Router {
    let mut router = Router::new().route("/_health/db", get(public_health));

    for (path, handler_id) in state.interceptor.resolver().routes().iter() {
        let handler_id = handler_id.to_string();
        router = router.route(
            path,
            get(
                move |State(state): State<HttpState>, request: Request<Body>| {
                    let handler_id = handler_id.clone();
                    async move { static_page(state, handler_id, request).await }
                },
            ),
        );
    }

    router
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(
            state.interceptor.clone(),
            page_interceptor_layer,
        ))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Serves a static route with the page stored for its path.
async fn static_page(state: HttpState, handler_id: String, request: Request<Body>) -> Response {
    let page_request = PageRequest::from_http(&request);
    let interceptor = &state.interceptor;
    let loader = PageContextLoader::new(interceptor.cache().clone());

    let page = match loader.page_for_request(&page_request.path).await {
        Ok(Some(page)) => page,
        Ok(None) => return render_not_found_response(&page_request.path),
        Err(err) => return HttpError::from(err).into_response(),
    };

    let handler = interceptor
        .resolver()
        .handler_for(&ResolvedHandler::StaticRoute(handler_id));

    let rendered = match handler.handle(&page_request, &page).await {
        Ok(response) => response.render(interceptor.templates()),
        Err(err) => Err(err),
    };

    match rendered {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => db_health_response(Ok(())),
    }
}

async fn fallback(uri: Uri) -> Response {
    render_not_found_response(uri.path())
}
