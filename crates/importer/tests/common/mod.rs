#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cliparr_catalog::{
    CatalogError, CatalogProvider, EpisodeFileResource, EpisodeResource, SeasonResource,
    SeriesResource, SystemStatus,
};
use cliparr_core::types::ImportMode;
use cliparr_importer::settings::SettingsDefaults;
use cliparr_importer::{Importer, Settings};
use sqlx::SqlitePool;

#[derive(Default)]
struct CatalogData {
    series: Vec<SeriesResource>,
    episodes: HashMap<i64, Vec<EpisodeResource>>,
    files: HashMap<i64, Vec<EpisodeFileResource>>,
    failing: HashSet<i64>,
}

/// Scripted in-memory catalog.
#[derive(Default)]
pub struct FakeCatalog {
    data: Mutex<CatalogData>,
    list_delay: Mutex<Option<Duration>>,
    pub list_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add a series with `episodes` episodes in season 1; odd episodes have files.
    pub fn add_series(&self, id: i64, title: &str, path: &str, episodes: i64) {
        let mut data = self.data.lock().unwrap();
        data.series.push(SeriesResource {
            id,
            title: title.to_string(),
            path: Some(path.to_string()),
            seasons: vec![SeasonResource {
                season_number: 1,
                monitored: true,
            }],
            ..Default::default()
        });

        let mut eps = Vec::new();
        let mut files = Vec::new();
        for n in 1..=episodes {
            let file_id = (n % 2 == 1).then(|| id * 1000 + n);
            eps.push(EpisodeResource {
                id: id * 100 + n,
                series_id: id,
                season_number: 1,
                episode_number: n,
                title: Some(format!("Episode {n}")),
                has_file: file_id.is_some(),
                episode_file_id: file_id,
                monitored: true,
                ..Default::default()
            });
            if let Some(fid) = file_id {
                files.push(EpisodeFileResource {
                    id: fid,
                    series_id: id,
                    season_number: 1,
                    path: Some(format!("{path}/S01E{n:02}.mkv")),
                    size: 1024 * n,
                    ..Default::default()
                });
            }
        }
        data.episodes.insert(id, eps);
        data.files.insert(id, files);
    }

    pub fn rename_episode(&self, series_id: i64, episode_number: i64, title: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(eps) = data.episodes.get_mut(&series_id) {
            for ep in eps.iter_mut().filter(|e| e.episode_number == episode_number) {
                ep.title = Some(title.to_string());
            }
        }
    }

    /// Requests for this series fail with an HTTP 500.
    pub fn fail_series(&self, id: i64) {
        self.data.lock().unwrap().failing.insert(id);
    }

    /// Delay every `list_series` call.
    pub fn slow_listing(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self, id: i64) -> Result<(), CatalogError> {
        if self.data.lock().unwrap().failing.contains(&id) {
            return Err(CatalogError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for FakeCatalog {
    fn name(&self) -> &str {
        "fake"
    }

    async fn list_series(&self) -> Result<Vec<SeriesResource>, CatalogError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.data.lock().unwrap().series.clone())
    }

    async fn get_series(&self, series_id: i64) -> Result<SeriesResource, CatalogError> {
        self.check(series_id)?;
        self.data
            .lock()
            .unwrap()
            .series
            .iter()
            .find(|s| s.id == series_id)
            .cloned()
            .ok_or(CatalogError::NotFound)
    }

    async fn list_episodes(&self, series_id: i64) -> Result<Vec<EpisodeResource>, CatalogError> {
        self.check(series_id)?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .episodes
            .get(&series_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_episode_files(
        &self,
        series_id: i64,
    ) -> Result<Vec<EpisodeFileResource>, CatalogError> {
        self.check(series_id)?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .files
            .get(&series_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn system_status(&self) -> Result<SystemStatus, CatalogError> {
        Ok(SystemStatus {
            app_name: Some("Fake".into()),
            version: Some("0".into()),
        })
    }
}

pub async fn test_pool() -> SqlitePool {
    let pool = cliparr_db::connect(":memory:").await.unwrap();
    cliparr_db::migrate::run(&pool).await.unwrap();
    pool
}

pub async fn importer_with(catalog: Arc<FakeCatalog>) -> Importer {
    Importer::new(test_pool().await, catalog)
}

pub async fn settings_for(pool: &SqlitePool, mode: ImportMode, interval_secs: u64) -> Settings {
    let settings = Settings::new(
        pool.clone(),
        SettingsDefaults {
            import_mode: mode,
            polling_interval_secs: interval_secs,
        },
    );
    settings.seed_defaults().await.unwrap();
    settings
}
