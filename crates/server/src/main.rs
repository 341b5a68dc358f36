use std::sync::Arc;

use anyhow::Context;
use cliparr_catalog::{CatalogProvider, SonarrClient};
use cliparr_importer::{Importer, PollingTask, Settings};
use cliparr_server::config::Config;
use cliparr_server::state::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    cliparr_server::logging::init(config.log_format);

    info!(db_path = %config.db_path, "connecting to database");
    let pool = cliparr_db::connect(&config.db_path)
        .await
        .context("failed to connect to database")?;

    cliparr_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations complete");

    let settings = Settings::new(pool.clone(), config.settings_defaults());
    settings
        .seed_defaults()
        .await
        .context("failed to seed default settings")?;

    let sonarr = SonarrClient::new(
        &config.sonarr_url,
        config.sonarr_api_key.clone(),
        config.catalog_timeout,
    )
    .context("failed to build catalog client")?;
    info!(url = %sonarr.base_url(), "catalog configured");

    match sonarr.system_status().await {
        Ok(status) => info!(
            app = status.app_name.as_deref().unwrap_or("unknown"),
            version = status.version.as_deref().unwrap_or("unknown"),
            "catalog reachable"
        ),
        Err(e) if config.require_catalog => {
            return Err(e).context("catalog probe failed (set CLIPARR_REQUIRE_CATALOG=false to start anyway)");
        }
        Err(e) => warn!(error = %e, "catalog probe failed, starting anyway"),
    }

    let catalog: Arc<dyn CatalogProvider> = Arc::new(sonarr);
    let importer = Importer::new(pool.clone(), catalog);

    let (events_tx, _) = tokio::sync::broadcast::channel(256);
    let poller = PollingTask::new(
        importer.clone(),
        settings.clone(),
        events_tx.clone(),
        config.stop_timeout,
    );
    poller
        .start()
        .await
        .context("failed to start polling task")?;

    let shutdown = CancellationToken::new();
    let app_state = AppState {
        db: pool.clone(),
        importer,
        settings,
        poller: poller.clone(),
        events: events_tx,
        shutdown: shutdown.clone(),
    };

    let mut app = cliparr_server::routes::build_router(app_state);
    if let Some(dir) = &config.static_dir {
        info!(dir = %dir.display(), "serving frontend");
        app = cliparr_server::routes::with_frontend(app, dir);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %config.bind_addr, "server listening");

    tokio::spawn(cliparr_server::shutdown::cancel_on_signal(shutdown.clone()));
    cliparr_server::shutdown::serve(listener, app, shutdown, config.stop_timeout)
        .await
        .context("server error")?;

    info!("shutting down");
    poller.stop().await;
    pool.close().await;
    Ok(())
}
