mod cli;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use linkhop_allocator::{CodeAllocator, RandomGenerator};
use linkhop_cache::MokaLinkCache;
use linkhop_gateway::{App, AppState};
use linkhop_redirector::RedirectorService;
use linkhop_shortener::LinkService;
use linkhop_storage::{InMemoryLinkStore, LinkStore, MySqlLinkStore, TimeoutStore};
use linkhop_telemetry::TelemetryConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    let telemetry = TelemetryConfig::builder()
        .service_name("linkhop")
        .format(config.log_format)
        .filter(config.log_filter.clone())
        .otlp_endpoint(config.otlp_endpoint.clone())
        .build();
    let _telemetry = linkhop_telemetry::init(telemetry).context("initialize telemetry")?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        "starting linkhop HTTP server"
    );

    match config.storage {
        StorageBackendArg::InMemory => run_server(&config, InMemoryLinkStore::new()).await,
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlLinkStore::connect(mysql_dsn)
                .await
                .context("connect to mysql")?;
            store.ensure_schema().await.context("create links table")?;
            run_server(&config, store).await
        }
    }
}

async fn run_server<S: LinkStore>(config: &CLI, store: S) -> anyhow::Result<()> {
    let store = Arc::new(TimeoutStore::new(
        store,
        Duration::from_millis(config.store_timeout_ms),
    ));
    let cache: MokaLinkCache = MokaLinkCache::builder()
        .max_capacity(config.cache_capacity)
        .ttl(Duration::from_secs(config.cache_ttl_secs))
        .build()
        .into();
    let generator = RandomGenerator::with_length(config.code_length)?;

    let links = LinkService::new(
        Arc::clone(&store),
        CodeAllocator::with_max_attempts(generator, config.max_attempts),
        cache.clone(),
    );
    let redirector = RedirectorService::new(store, cache);
    let state = AppState::new(
        Arc::new(links),
        Arc::new(redirector),
        config.base_url.clone(),
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
