use std::sync::Arc;

use flexpage::{
    application::repos::{
        CreatePageParams, PageStore, PagesRepo, PagesWriteRepo, RepoError, UpdatePageParams,
    },
    cache::{CacheConfig, MemoryBackend, ResolutionCache},
    infra::db::PostgresRepositories,
};
use sqlx::PgPool;
use uuid::Uuid;

fn params(url: &str, title: &str) -> CreatePageParams {
    CreatePageParams {
        url: url.to_string(),
        title: title.to_string(),
        summary: String::new(),
        view: None,
        template: None,
        content_html: format!("<p>{title}</p>"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn lookup_matches_the_exact_url(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let created = repos
        .create_page(params("/about/", "About"))
        .await
        .expect("create");

    let found = repos.lookup("/about/").await.expect("lookup");
    assert_eq!(found.as_ref().map(|page| page.id), Some(created.id));

    assert!(repos.lookup("/about").await.expect("lookup").is_none());
    assert!(repos.lookup("/ABOUT/").await.expect("lookup").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_urls_violate_the_unique_constraint(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    repos
        .create_page(params("/about/", "About"))
        .await
        .expect("create");

    let err = repos
        .create_page(params("/about/", "Again"))
        .await
        .expect_err("duplicate should fail");

    match err {
        RepoError::Duplicate { constraint } => assert_eq!(constraint, "pages_url_key"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn pages_list_in_url_order(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    for url in ["/zebra/", "/", "/about/"] {
        repos.create_page(params(url, "Page")).await.expect("create");
    }

    let urls: Vec<String> = repos
        .list_pages()
        .await
        .expect("list")
        .into_iter()
        .map(|page| page.url)
        .collect();

    assert_eq!(urls, ["/", "/about/", "/zebra/"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn writes_to_missing_pages_report_not_found(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let id = Uuid::new_v4();

    let update = repos
        .update_page(UpdatePageParams {
            id,
            url: "/gone/".to_string(),
            title: "Gone".to_string(),
            summary: String::new(),
            view: None,
            template: None,
            content_html: String::new(),
        })
        .await;
    assert!(matches!(update, Err(RepoError::NotFound)));

    assert!(matches!(
        repos.delete_page(id).await,
        Err(RepoError::NotFound)
    ));
    assert!(repos.find_by_id(id).await.expect("find").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn cache_in_front_of_postgres_sees_writes_after_invalidation(pool: PgPool) {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let config = CacheConfig::default();
    let cache = ResolutionCache::new(
        config.clone(),
        Arc::new(MemoryBackend::new(&config)),
        repos.clone(),
    );

    assert!(cache.resolve("/later/").await.expect("resolve").is_none());

    repos
        .create_page(params("/later/", "Later"))
        .await
        .expect("create");
    // Still answered by the negative entry.
    assert!(cache.resolve("/later/").await.expect("resolve").is_none());

    cache.invalidate("/later/").await;
    let page = cache.resolve("/later/").await.expect("resolve");
    assert_eq!(page.map(|page| page.title), Some("Later".to_string()));
}
