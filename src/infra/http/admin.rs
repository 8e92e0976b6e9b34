//! JSON admin API over the page write service.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    admin::pages::{AdminPageService, PageFields, PageWriteError},
    error::ErrorReport,
    repos::RepoError,
};

use super::middleware::{log_responses, set_request_context};

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

#[derive(Clone)]
pub struct AdminState {
    pub pages: Arc<AdminPageService>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/api/pages", get(list_pages).post(create_page))
        .route(
            "/api/pages/{id}",
            get(get_page).put(update_page).delete(delete_page),
        )
        .route("/api/cache/clear", post(clear_cache))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    field: Option<&'static str>,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            field: None,
            hint,
        }
    }

    pub fn invalid_field(field: &'static str, hint: String) -> Self {
        Self {
            field: Some(field),
            ..Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid page",
                Some(hint),
            )
        }
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = format!(
            "{}: {}",
            self.code,
            self.hint.as_deref().unwrap_or(self.message)
        );
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                field: self.field,
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::admin", self.status, detail).attach(&mut response);
        response
    }
}

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::invalid_field("url", constraint),
        RepoError::NotFound => ApiError::not_found("page not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

fn page_to_api(err: PageWriteError) -> ApiError {
    match err {
        PageWriteError::Validation { field, message } => ApiError::invalid_field(field, message),
        PageWriteError::NotFound => ApiError::not_found("page not found"),
        PageWriteError::Repo(repo) => repo_to_api(repo),
    }
}

#[derive(Debug, Deserialize)]
pub struct PagePayload {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub content_html: String,
}

impl From<PagePayload> for PageFields {
    fn from(payload: PagePayload) -> Self {
        Self {
            url: payload.url,
            title: payload.title,
            summary: payload.summary,
            view: payload.view,
            template: payload.template,
            content_html: payload.content_html,
        }
    }
}

async fn list_pages(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let pages = state.pages.list().await.map_err(page_to_api)?;
    Ok(Json(pages))
}

async fn get_page(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.pages.find_by_id(id).await.map_err(page_to_api)?;
    Ok(Json(page))
}

async fn create_page(
    State(state): State<AdminState>,
    Json(payload): Json<PagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .pages
        .create_page(payload.into())
        .await
        .map_err(page_to_api)?;

    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .pages
        .update_page(id, payload.into())
        .await
        .map_err(page_to_api)?;

    Ok(Json(page))
}

async fn delete_page(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.pages.delete_page(id).await.map_err(page_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cache(State(state): State<AdminState>) -> StatusCode {
    state.pages.clear_cache().await;
    StatusCode::NO_CONTENT
}
