mod admin;
mod middleware;
mod pages;
mod public;

pub use admin::{AdminState, ApiError, build_admin_router};
pub use middleware::RequestContext;
pub use pages::page_interceptor_layer;
pub use public::{HttpState, build_router};

use crate::application::error::ErrorReport;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
