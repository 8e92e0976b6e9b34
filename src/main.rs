use std::{process, sync::Arc, time::Duration};

use flexpage::{
    application::{
        admin::pages::AdminPageService,
        error::AppError,
        handlers::{HandlerRegistry, StaticRouteTable},
        interceptor::PageInterceptor,
        repos::{PageStore, PagesRepo, PagesWriteRepo},
        site::register_site_handlers,
        views::ViewResolver,
    },
    cache::{CacheConfig, MemoryBackend, ResolutionCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState},
        memory::InMemoryPages,
        telemetry,
    },
    presentation::views::TemplateRegistry,
};
use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "flexpage::migrate", "Migrations applied");
    Ok(())
}

/// Store handles shared by the resolution cache and the admin service.
struct Stores {
    lookup: Arc<dyn PageStore>,
    reader: Arc<dyn PagesRepo>,
    writer: Arc<dyn PagesWriteRepo>,
    db: Option<Arc<PostgresRepositories>>,
}

async fn init_stores(settings: &config::Settings) -> Result<Stores, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "flexpage::startup",
            "database url is not configured; pages are kept in memory"
        );
        let pages = Arc::new(InMemoryPages::new());
        return Ok(Stores {
            lookup: pages.clone(),
            reader: pages.clone(),
            writer: pages,
            db: None,
        });
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    Ok(Stores {
        lookup: repositories.clone(),
        reader: repositories.clone(),
        writer: repositories.clone(),
        db: Some(repositories),
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let stores = init_stores(&settings).await?;

    let cache_config = CacheConfig::from(&settings.cache);
    let backend = Arc::new(MemoryBackend::new(&cache_config));
    let cache = Arc::new(ResolutionCache::new(cache_config, backend, stores.lookup));

    let mut handlers = HandlerRegistry::new();
    let mut routes = StaticRouteTable::new();
    register_site_handlers(&mut handlers, &mut routes);
    let handlers = Arc::new(handlers);
    let routes = Arc::new(routes);

    let resolver = ViewResolver::new(handlers.clone(), routes);
    let interceptor = PageInterceptor::new(
        cache.clone(),
        resolver,
        Arc::new(TemplateRegistry::builtin()),
    );

    let http_state = HttpState {
        interceptor,
        db: stores.db,
    };
    let admin_state = AdminState {
        pages: Arc::new(AdminPageService::new(
            stores.reader,
            stores.writer,
            cache,
            handlers,
        )),
    };

    serve_http(&settings, http_state, admin_state).await
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "flexpage::startup",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "Listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx));

    let servers = async {
        try_join!(public_server, admin_server)
            .map(|_| ())
            .map_err(|err| AppError::unexpected(format!("server error: {err}")))
    };
    tokio::pin!(servers);

    tokio::select! {
        result = &mut servers => return result,
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(error = %err, "failed to listen for shutdown signal");
            }
            info!(target = "flexpage::shutdown", "Shutdown requested; draining connections");
            let _ = shutdown_tx.send(true);
        }
    }

    drain(servers, settings.server.graceful_shutdown).await
}

async fn drain(
    servers: impl Future<Output = Result<(), AppError>>,
    grace: Duration,
) -> Result<(), AppError> {
    match tokio::time::timeout(grace, servers).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                target = "flexpage::shutdown",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
