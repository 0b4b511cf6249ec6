use std::{sync::Arc, time::Duration};

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinematch_api::{
    auth::JwtKeys,
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, PgHistoryRepository, PgUserRepository,
        RedisResetCodeStore,
    },
    routes::{create_router, AppState},
    services::{CatalogSource, DisabledMailer, Mailer, SmtpMailer, TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        search_target = config.search_target,
        "Configuration loaded"
    );

    let pool = create_pool(&config.database_url).await?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client.clone());

    let catalog = TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    tracing::info!(provider = catalog.name(), url = %config.tmdb_api_url, "Catalog configured");

    let mailer: Arc<dyn Mailer> = match SmtpMailer::from_config(&config)? {
        Some(mailer) => Arc::new(mailer),
        None => {
            tracing::warn!("SMTP_HOST not set; password reset emails are disabled");
            Arc::new(DisabledMailer)
        }
    };

    let state = AppState {
        catalog: Arc::new(catalog),
        users: Arc::new(PgUserRepository::new(pool.clone())),
        history: Arc::new(PgHistoryRepository::new(pool)),
        reset_codes: Arc::new(RedisResetCodeStore::new(redis_client)),
        mailer,
        cache,
        jwt: JwtKeys::new(&config.jwt_secret, config.jwt_ttl_minutes),
        search_target: config.search_target,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cinematch_api=debug,tower_http=info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
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
