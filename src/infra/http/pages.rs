//! Page interception as axum middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::handlers::PageRequest;
use crate::application::interceptor::{Interception, PageInterceptor};

/// Serves database pages ahead of the wrapped router.
///
/// Only `GET` and `HEAD` are intercepted; other methods always reach the
/// router. On decline the original request is forwarded untouched.
pub async fn page_interceptor_layer(
    State(interceptor): State<PageInterceptor>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return next.run(request).await;
    }

    let page_request = PageRequest::from_http(&request);
    match interceptor.handle(&page_request).await {
        Ok(Interception::Handled(response)) => response,
        Ok(Interception::Decline) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
