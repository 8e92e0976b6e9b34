//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::PageRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Exact-path lookup of a page record.
///
/// `Ok(None)` means no page is configured for the path. It is a regular
/// outcome and callers cache it; only `Err` signals a broken store.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Issues at most one backend query.
    async fn lookup(&self, path: &str) -> Result<Option<PageRecord>, RepoError>;
}

#[async_trait]
pub trait PagesRepo: PageStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError>;

    /// All pages ordered by URL.
    async fn list_pages(&self) -> Result<Vec<PageRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePageParams {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub view: Option<String>,
    pub template: Option<String>,
    pub content_html: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePageParams {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub view: Option<String>,
    pub template: Option<String>,
    pub content_html: String,
}

#[async_trait]
pub trait PagesWriteRepo: Send + Sync {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError>;

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError>;

    /// Removes the page and returns the record as it was before deletion.
    async fn delete_page(&self, id: Uuid) -> Result<PageRecord, RepoError>;
}
