//! In-process page store.
//!
//! Serves deployments without a database URL and doubles as the store behind
//! the resolution tests, which is why lookups are counted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePageParams, PageStore, PagesRepo, PagesWriteRepo, RepoError, UpdatePageParams,
};
use crate::domain::entities::PageRecord;

/// Constraint name reported for duplicate URLs, matching the Postgres schema.
pub const URL_UNIQUE_CONSTRAINT: &str = "pages_url_key";

/// Pages keyed by id; URL lookups scan, which is fine at this scale.
#[derive(Default)]
pub struct InMemoryPages {
    pages: RwLock<BTreeMap<Uuid, PageRecord>>,
    lookups: AtomicUsize,
    injected_failure: Mutex<Option<String>>,
}

impl InMemoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: impl IntoIterator<Item = PageRecord>) -> Self {
        let store = Self::new();
        for page in pages {
            store.insert(page);
        }
        store
    }

    /// Stores `page` as-is, replacing any record with the same id.
    pub fn insert(&self, page: PageRecord) {
        self.write().insert(page.id, page);
    }

    /// Number of `lookup` calls served so far, failed ones included.
    pub fn query_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.lookups.store(0, Ordering::SeqCst);
    }

    /// Makes the next `lookup` fail with a persistence error.
    pub fn fail_next_lookup(&self, message: impl Into<String>) {
        *self
            .injected_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(message.into());
    }

    fn take_injected_failure(&self) -> Option<String> {
        self.injected_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<Uuid, PageRecord>> {
        self.pages
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<Uuid, PageRecord>> {
        self.pages
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_url_free(
        pages: &BTreeMap<Uuid, PageRecord>,
        url: &str,
        except: Option<Uuid>,
    ) -> Result<(), RepoError> {
        let taken = pages
            .values()
            .any(|page| page.url == url && Some(page.id) != except);
        if taken {
            return Err(RepoError::Duplicate {
                constraint: URL_UNIQUE_CONSTRAINT.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PageStore for InMemoryPages {
    async fn lookup(&self, path: &str) -> Result<Option<PageRecord>, RepoError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.take_injected_failure() {
            return Err(RepoError::from_persistence(message));
        }

        Ok(self.read().values().find(|page| page.url == path).cloned())
    }
}

#[async_trait]
impl PagesRepo for InMemoryPages {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError> {
        Ok(self.read().get(&id).cloned())
    }

    async fn list_pages(&self) -> Result<Vec<PageRecord>, RepoError> {
        let mut pages: Vec<PageRecord> = self.read().values().cloned().collect();
        pages.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(pages)
    }
}

#[async_trait]
impl PagesWriteRepo for InMemoryPages {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        let mut pages = self.write();
        Self::ensure_url_free(&pages, &params.url, None)?;

        let now = OffsetDateTime::now_utc();
        let page = PageRecord {
            id: Uuid::new_v4(),
            url: params.url,
            title: params.title,
            summary: params.summary,
            view: params.view,
            template: params.template,
            content_html: params.content_html,
            created_at: now,
            updated_at: now,
        };
        pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError> {
        let mut pages = self.write();
        Self::ensure_url_free(&pages, &params.url, Some(params.id))?;

        let page = pages.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        page.url = params.url;
        page.title = params.title;
        page.summary = params.summary;
        page.view = params.view;
        page.template = params.template;
        page.content_html = params.content_html;
        page.updated_at = OffsetDateTime::now_utc();
        Ok(page.clone())
    }

    async fn delete_page(&self, id: Uuid) -> Result<PageRecord, RepoError> {
        self.write().remove(&id).ok_or(RepoError::NotFound)
    }
}
