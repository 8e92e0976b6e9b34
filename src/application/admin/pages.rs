use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::handlers::HandlerRegistry;
use crate::application::repos::{
    CreatePageParams, PagesRepo, PagesWriteRepo, RepoError, UpdatePageParams,
};
use crate::cache::ResolutionCache;
use crate::domain::entities::{
    PageRecord, SUMMARY_MAX_LEN, TEMPLATE_MAX_LEN, TITLE_MAX_LEN, URL_MAX_LEN, VIEW_MAX_LEN,
};
use crate::domain::error::DomainError;
use crate::domain::path::validate_root_relative_path;

#[derive(Debug, Error)]
pub enum PageWriteError {
    #[error("invalid `{field}`: {message}")]
    Validation { field: &'static str, message: String },
    #[error("page not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
}

impl PageWriteError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    fn duplicate_url() -> Self {
        Self::validation("url", "a page with this URL already exists")
    }
}

impl From<RepoError> for PageWriteError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound,
            RepoError::Duplicate { .. } => Self::duplicate_url(),
            other => Self::Repo(other),
        }
    }
}

impl From<DomainError> for PageWriteError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { field, message } => Self::Validation { field, message },
        }
    }
}

/// Editable page fields as submitted by an editor.
#[derive(Debug, Clone, Default)]
pub struct PageFields {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub view: Option<String>,
    pub template: Option<String>,
    pub content_html: String,
}

/// Fields after validation; blank optional values collapse to `None`.
struct CleanFields {
    url: String,
    title: String,
    summary: String,
    view: Option<String>,
    template: Option<String>,
    content_html: String,
}

/// Validated page writes that keep the resolution cache coherent.
///
/// Every successful write invalidates the affected paths before returning.
#[derive(Clone)]
pub struct AdminPageService {
    reader: Arc<dyn PagesRepo>,
    writer: Arc<dyn PagesWriteRepo>,
    cache: Arc<ResolutionCache>,
    handlers: Arc<HandlerRegistry>,
}

impl AdminPageService {
    pub fn new(
        reader: Arc<dyn PagesRepo>,
        writer: Arc<dyn PagesWriteRepo>,
        cache: Arc<ResolutionCache>,
        handlers: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            handlers,
        }
    }

    pub async fn list(&self) -> Result<Vec<PageRecord>, PageWriteError> {
        self.reader.list_pages().await.map_err(PageWriteError::Repo)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<PageRecord, PageWriteError> {
        self.reader
            .find_by_id(id)
            .await
            .map_err(PageWriteError::Repo)?
            .ok_or(PageWriteError::NotFound)
    }

    pub async fn create_page(&self, fields: PageFields) -> Result<PageRecord, PageWriteError> {
        let clean = self.clean(fields)?;
        self.ensure_url_available(&clean.url, None).await?;

        let page = self
            .writer
            .create_page(CreatePageParams {
                url: clean.url,
                title: clean.title,
                summary: clean.summary,
                view: clean.view,
                template: clean.template,
                content_html: clean.content_html,
            })
            .await?;

        // Drops the negative entry left by requests made before the page existed.
        self.cache.invalidate(&page.url).await;
        info!(page_id = %page.id, url = %page.url, "page created");

        Ok(page)
    }

    pub async fn update_page(
        &self,
        id: Uuid,
        fields: PageFields,
    ) -> Result<PageRecord, PageWriteError> {
        let clean = self.clean(fields)?;
        let previous = self.find_by_id(id).await?;
        self.ensure_url_available(&clean.url, Some(id)).await?;

        let page = self
            .writer
            .update_page(UpdatePageParams {
                id,
                url: clean.url,
                title: clean.title,
                summary: clean.summary,
                view: clean.view,
                template: clean.template,
                content_html: clean.content_html,
            })
            .await?;

        self.cache.invalidate(&page.url).await;
        if previous.url != page.url {
            self.cache.invalidate(&previous.url).await;
        }
        info!(
            page_id = %page.id,
            url = %page.url,
            previous_url = %previous.url,
            "page updated"
        );

        Ok(page)
    }

    pub async fn delete_page(&self, id: Uuid) -> Result<PageRecord, PageWriteError> {
        let page = self.writer.delete_page(id).await?;

        self.cache.invalidate(&page.url).await;
        info!(page_id = %page.id, url = %page.url, "page deleted");

        Ok(page)
    }

    /// Drops every cached resolution, for pages changed outside this service.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("page cache cleared");
    }

    fn clean(&self, fields: PageFields) -> Result<CleanFields, PageWriteError> {
        let title = fields.title.trim().to_string();
        if title.is_empty() {
            return Err(PageWriteError::validation("title", "must not be empty"));
        }
        ensure_max_len("title", &title, TITLE_MAX_LEN)?;

        ensure_max_len("url", &fields.url, URL_MAX_LEN)?;
        validate_root_relative_path(&fields.url)?;

        ensure_max_len("summary", &fields.summary, SUMMARY_MAX_LEN)?;

        let view = non_blank(fields.view);
        if let Some(view) = view.as_deref() {
            ensure_max_len("view", view, VIEW_MAX_LEN)?;
            if !self.handlers.contains(view) {
                return Err(PageWriteError::validation(
                    "view",
                    format!("custom view couldn't be loaded: {view}"),
                ));
            }
        }

        let template = non_blank(fields.template);
        if let Some(template) = template.as_deref() {
            ensure_max_len("template", template, TEMPLATE_MAX_LEN)?;
        }

        Ok(CleanFields {
            url: fields.url,
            title,
            summary: fields.summary,
            view,
            template,
            content_html: fields.content_html,
        })
    }

    async fn ensure_url_available(
        &self,
        url: &str,
        except: Option<Uuid>,
    ) -> Result<(), PageWriteError> {
        let existing = self.reader.lookup(url).await.map_err(PageWriteError::Repo)?;
        match existing {
            Some(page) if Some(page.id) != except => Err(PageWriteError::duplicate_url()),
            _ => Ok(()),
        }
    }
}

fn ensure_max_len(field: &'static str, value: &str, max: usize) -> Result<(), PageWriteError> {
    let len = value.chars().count();
    if len > max {
        return Err(PageWriteError::validation(
            field,
            format!("must be at most {max} characters (got {len})"),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
