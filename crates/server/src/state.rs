use cliparr_core::events::ImportEvent;
use cliparr_importer::{Importer, PollingTask, Settings};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub importer: Importer,
    pub settings: Settings,
    pub poller: PollingTask,
    pub events: tokio::sync::broadcast::Sender<ImportEvent>,
    /// Cancelled when the server begins shutting down; ends push streams.
    pub shutdown: CancellationToken,
}
