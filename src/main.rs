use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use top10_api::{
    db::{create_pool, create_redis_client, run_migrations, Cache, CacheWriterHandle},
    repository::PgListRepository,
    services::{CatalogClient, CatalogProxies, ListService, SessionTokens},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("top10_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    run_migrations(&pool).await?;

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url).context("Invalid REDIS_URL")?;
            let (cache, handle) = Cache::new(client).await;
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, catalog responses will not be cached");
            (None, None)
        }
    };

    let catalog = catalog_proxies(&config, cache)?;
    let repository = Arc::new(PgListRepository::new(pool));
    let state = AppState {
        lists: ListService::new(repository),
        identity: Arc::new(SessionTokens::new(
            &config.session_secret,
            config.session_ttl_secs,
        )),
        catalog,
    };

    let app = top10_api::create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    flush_cache(cache_writer).await;
    Ok(())
}

fn catalog_proxies(config: &Config, cache: Option<Cache>) -> anyhow::Result<CatalogProxies> {
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let build = |name: &'static str, url: &Option<String>, key: &Option<String>| {
        url.as_ref().map(|url| {
            let client = CatalogClient::new(name, http_client.clone(), url, key.clone());
            match &cache {
                Some(cache) => client.with_cache(cache.clone(), config.catalog_cache_ttl_secs),
                None => client,
            }
        })
    };

    let proxies = CatalogProxies {
        movies: build("movies", &config.movie_api_url, &config.movie_api_key),
        tv_shows: build("tv-shows", &config.tv_show_api_url, &config.tv_show_api_key),
    };

    for (name, client) in [("movies", &proxies.movies), ("tv-shows", &proxies.tv_shows)] {
        if client.is_none() {
            tracing::warn!(catalog = name, "Catalog API URL not set, proxy disabled");
        }
    }

    Ok(proxies)
}

async fn flush_cache(handle: Option<CacheWriterHandle>) {
    if let Some(handle) = handle {
        handle.shutdown().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
