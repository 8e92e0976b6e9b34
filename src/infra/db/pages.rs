use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreatePageParams, PageStore, PagesRepo, PagesWriteRepo, RepoError, UpdatePageParams,
    },
    domain::entities::PageRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const PAGE_COLUMNS: &str =
    "id, url, title, summary, view, template, content_html, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PageRow {
    id: Uuid,
    url: String,
    title: String,
    summary: String,
    view: Option<String>,
    template: Option<String>,
    content_html: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PageRow> for PageRecord {
    fn from(row: PageRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            title: row.title,
            summary: row.summary,
            view: row.view,
            template: row.template,
            content_html: row.content_html,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PageStore for PostgresRepositories {
    async fn lookup(&self, path: &str) -> Result<Option<PageRecord>, RepoError> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE url = $1");
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(path)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PageRecord::from))
    }
}

#[async_trait]
impl PagesRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PageRecord>, RepoError> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = $1");
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PageRecord::from))
    }

    async fn list_pages(&self) -> Result<Vec<PageRecord>, RepoError> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY url");
        let rows = sqlx::query_as::<_, PageRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PageRecord::from).collect())
    }
}

#[async_trait]
impl PagesWriteRepo for PostgresRepositories {
    async fn create_page(&self, params: CreatePageParams) -> Result<PageRecord, RepoError> {
        let CreatePageParams {
            url,
            title,
            summary,
            view,
            template,
            content_html,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let sql = format!(
            "INSERT INTO pages (id, url, title, summary, view, template, content_html, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING {PAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(id)
            .bind(url)
            .bind(title)
            .bind(summary)
            .bind(view)
            .bind(template)
            .bind(content_html)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PageRecord::from(row))
    }

    async fn update_page(&self, params: UpdatePageParams) -> Result<PageRecord, RepoError> {
        let UpdatePageParams {
            id,
            url,
            title,
            summary,
            view,
            template,
            content_html,
        } = params;

        let now = OffsetDateTime::now_utc();

        let sql = format!(
            "UPDATE pages \
             SET url = $2, title = $3, summary = $4, view = $5, template = $6, \
                 content_html = $7, updated_at = $8 \
             WHERE id = $1 \
             RETURNING {PAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(id)
            .bind(url)
            .bind(title)
            .bind(summary)
            .bind(view)
            .bind(template)
            .bind(content_html)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PageRecord::from(row))
    }

    async fn delete_page(&self, id: Uuid) -> Result<PageRecord, RepoError> {
        let sql = format!("DELETE FROM pages WHERE id = $1 RETURNING {PAGE_COLUMNS}");
        let row = sqlx::query_as::<_, PageRow>(&sql)
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PageRecord::from(row))
    }
}
