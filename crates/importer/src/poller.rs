//! Background polling task that periodically reconciles the catalog into the
//! store according to the stored import mode.
//!
//! At most one run is in flight at a time. The slot is a single-permit
//! semaphore; a request that finds it taken is dropped, never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cliparr_core::events::{ImportEvent, ImportStatus};
use cliparr_core::types::{ImportMode, PollerState};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::service::{Importer, ReconcileScope};
use crate::settings::{Settings, SettingsError};

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct PollingTask {
    inner: Arc<Inner>,
}

struct Inner {
    importer: Importer,
    settings: Settings,
    events: broadcast::Sender<ImportEvent>,
    stop_timeout: Duration,
    run_slot: Arc<Semaphore>,
    /// Next `import`-mode run reconciles the whole catalog.
    full_pending: AtomicBool,
    timer: Mutex<Option<Timer>>,
}

struct Timer {
    cancel: CancellationToken,
    interval_tx: watch::Sender<Duration>,
    handle: JoinHandle<()>,
}

impl PollingTask {
    pub fn new(
        importer: Importer,
        settings: Settings,
        events: broadcast::Sender<ImportEvent>,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                importer,
                settings,
                events,
                stop_timeout,
                run_slot: Arc::new(Semaphore::new(1)),
                full_pending: AtomicBool::new(true),
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ImportEvent> {
        self.inner.events.subscribe()
    }

    pub async fn state(&self) -> PollerState {
        if self.inner.timer.lock().await.is_none() {
            PollerState::Stopped
        } else if self.inner.run_slot.available_permits() == 0 {
            PollerState::Running
        } else {
            PollerState::Idle
        }
    }

    /// Arm the timer with the stored interval and request an immediate run.
    /// No-op when already started.
    pub async fn start(&self) -> Result<(), SettingsError> {
        let interval = self.inner.settings.get_polling_interval().await?;

        {
            let mut timer = self.inner.timer.lock().await;
            if timer.is_some() {
                return Ok(());
            }

            let cancel = CancellationToken::new();
            let (interval_tx, interval_rx) = watch::channel(interval);
            let handle = tokio::spawn(run_timer(self.clone(), cancel.clone(), interval_rx));
            *timer = Some(Timer {
                cancel,
                interval_tx,
                handle,
            });
        }

        self.inner.full_pending.store(true, Ordering::SeqCst);
        info!(interval_secs = interval.as_secs(), "polling task started");
        self.trigger().await;
        Ok(())
    }

    /// Re-arm the timer with a new period. The elapsed part of the current
    /// period is discarded; no run is started and a run in flight continues.
    pub async fn update_interval(&self, interval: Duration) {
        if let Some(timer) = self.inner.timer.lock().await.as_ref() {
            timer.interval_tx.send_replace(interval);
            info!(interval_secs = interval.as_secs(), "polling interval updated");
        }
    }

    /// The next `import`-mode run reconciles the full catalog again.
    pub fn mode_changed(&self) {
        self.inner.full_pending.store(true, Ordering::SeqCst);
    }

    /// Request a run now. Returns `false` if the task is stopped, the import
    /// mode is `none`, or a run is already in flight.
    pub async fn trigger(&self) -> bool {
        if self.inner.timer.lock().await.is_none() {
            debug!("polling task stopped, ignoring trigger");
            return false;
        }

        // A failed read falls through; the run reports it as an error event.
        if let Ok(ImportMode::None) = self.inner.settings.get_import_mode().await {
            debug!("import mode is none, ignoring trigger");
            return false;
        }

        let permit = match self.inner.run_slot.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("import run already in progress, skipping");
                return false;
            }
        };

        let task = self.clone();
        tokio::spawn(async move {
            task.run_once(permit).await;
        });
        true
    }

    /// Stop the timer and wait, up to the stop timeout, for a run in flight.
    pub async fn stop(&self) {
        let Some(timer) = self.inner.timer.lock().await.take() else {
            return;
        };
        timer.cancel.cancel();
        if let Err(e) = timer.handle.await {
            warn!(error = %e, "polling timer ended abnormally");
        }

        match tokio::time::timeout(self.inner.stop_timeout, self.inner.run_slot.acquire()).await {
            Ok(Ok(_permit)) => info!("polling task stopped"),
            Ok(Err(e)) => warn!(error = %e, "run slot closed while stopping"),
            Err(_) => warn!(
                timeout_secs = self.inner.stop_timeout.as_secs_f64(),
                "import run still in flight after stop timeout, continuing shutdown"
            ),
        }
    }

    async fn run_once(&self, _permit: OwnedSemaphorePermit) {
        let mode = match self.inner.settings.get_import_mode().await {
            Ok(mode) => mode,
            Err(e) => {
                error!(error = %e, "could not read import mode");
                self.emit(ImportEvent::status(ImportStatus::Error, Some(e.to_string())));
                return;
            }
        };

        let scope = match mode {
            // Mode switched to none after the trigger was accepted.
            ImportMode::None => {
                debug!(mode = %mode, "import mode is none, skipping run");
                self.emit(ImportEvent::status(
                    ImportStatus::Completed,
                    Some("import mode is none, nothing to do".to_string()),
                ));
                return;
            }
            ImportMode::Auto => ReconcileScope::Full,
            ImportMode::Import => {
                if self.inner.full_pending.swap(false, Ordering::SeqCst) {
                    ReconcileScope::Full
                } else {
                    ReconcileScope::ExistingOnly
                }
            }
        };

        info!(mode = %mode, scope = ?scope, "import run started");
        self.emit(ImportEvent::status(ImportStatus::Started, None));

        match self.inner.importer.reconcile(scope, &self.inner.events).await {
            Ok(summary) => {
                info!(
                    mode = %mode,
                    shows = summary.shows_attempted,
                    failed = summary.shows_failed,
                    episodes_added = summary.episodes_added,
                    "import run completed"
                );
                self.emit(ImportEvent::status(
                    ImportStatus::Completed,
                    Some(format!(
                        "{} shows processed, {} failed, {} new episodes",
                        summary.shows_attempted, summary.shows_failed, summary.episodes_added
                    )),
                ));
            }
            Err(e) => {
                if mode == ImportMode::Import && scope == ReconcileScope::Full {
                    self.inner.full_pending.store(true, Ordering::SeqCst);
                }
                warn!(mode = %mode, error = %e, "import run failed");
                self.emit(ImportEvent::status(ImportStatus::Error, Some(e.to_string())));
            }
        }
    }

    fn emit(&self, event: ImportEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

async fn run_timer(
    task: PollingTask,
    cancel: CancellationToken,
    mut interval_rx: watch::Receiver<Duration>,
) {
    loop {
        let period = *interval_rx.borrow_and_update();
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {
                task.trigger().await;
            }
            changed = interval_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                debug!(interval_secs = interval_rx.borrow().as_secs(), "timer re-armed");
            }
        }
    }
}
