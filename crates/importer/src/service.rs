//! Import service: reconciles catalog series into the local store and serves
//! the read model for imported shows.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use cliparr_catalog::{CatalogProvider, EpisodeFileResource, EpisodeResource, SeriesResource};
use cliparr_core::events::{ImportEvent, ImportStatus};
use cliparr_db::repo::import::{
    EpisodeFileImport, EpisodeImport, SeasonImport, ShowImport, WriteSummary, write_show,
};
use cliparr_db::repo::{episodes, seasons, shows};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::ImportError;

pub const MAX_PAGE_SIZE: i64 = 500;

/// Which shows a reconciliation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileScope {
    /// Every series in the catalog.
    Full,
    /// Only shows already in the store.
    ExistingOnly,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub episodes_imported: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported_count: usize,
    pub results: Vec<ImportResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub id: i64,
    pub success: bool,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    /// Every id was processed without error.
    pub success: bool,
    pub deleted_count: usize,
    pub results: Vec<DeleteResult>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub shows_attempted: usize,
    pub shows_succeeded: usize,
    pub shows_failed: usize,
    pub episodes_added: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSummary {
    pub id: i64,
    pub sonarr_id: Option<i64>,
    pub title: String,
    pub path: String,
    pub status: Option<String>,
    pub network: Option<String>,
    pub year: Option<i64>,
    pub season_count: i64,
    pub episode_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowPage {
    pub shows: Vec<ShowSummary>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDetail {
    pub id: i64,
    pub sonarr_id: Option<i64>,
    pub title: String,
    pub sort_title: Option<String>,
    pub path: String,
    pub status: Option<String>,
    pub overview: Option<String>,
    pub network: Option<String>,
    pub year: Option<i64>,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub seasons: Vec<SeasonDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDetail {
    pub id: i64,
    pub season_number: i64,
    pub monitored: bool,
    pub episodes: Vec<EpisodeDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeDetail {
    pub id: i64,
    pub episode_number: i64,
    pub title: Option<String>,
    pub sonarr_episode_id: Option<i64>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub has_file: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetail {
    pub id: i64,
    pub path: String,
    pub size: i64,
    pub quality: Option<String>,
}

#[derive(Clone)]
pub struct Importer {
    pool: SqlitePool,
    catalog: Arc<dyn CatalogProvider>,
}

impl Importer {
    pub fn new(pool: SqlitePool, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { pool, catalog }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogProvider> {
        &self.catalog
    }

    /// Catalog series that are not in the store yet, in catalog order.
    pub async fn list_unimported(&self) -> Result<Vec<SeriesResource>, ImportError> {
        let series = self.catalog.list_series().await?;
        let keys = shows::list_import_keys(&self.pool).await?;

        let known_ids: HashSet<i64> = keys.iter().filter_map(|k| k.sonarr_id).collect();
        let known_paths: HashSet<(String, String)> = keys
            .into_iter()
            .map(|k| (k.title, k.path))
            .collect();

        Ok(series
            .into_iter()
            .filter(|s| {
                !known_ids.contains(&s.id)
                    && !known_paths
                        .contains(&(s.title.clone(), s.path.clone().unwrap_or_default()))
            })
            .collect())
    }

    /// Import the given catalog series ids. Each show is committed on its own;
    /// one failing show does not affect the others.
    pub async fn import_shows(&self, ids: &[i64]) -> Result<ImportReport, ImportError> {
        if ids.is_empty() {
            return Err(ImportError::Validation("showIds must not be empty".into()));
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        let mut imported_count = 0;

        for &id in ids.iter().filter(|id| seen.insert(**id)) {
            let (title, outcome) = self.import_one(id).await;
            match outcome {
                Ok(summary) => {
                    imported_count += 1;
                    info!(
                        catalog_id = id,
                        show_id = summary.show_id,
                        episodes = summary.episodes,
                        files = summary.files,
                        "show imported"
                    );
                    results.push(ImportResult {
                        id,
                        success: true,
                        error: None,
                        title,
                        episodes_imported: summary.episodes,
                    });
                }
                Err(e) => {
                    warn!(catalog_id = id, error = %e, "show import failed");
                    results.push(ImportResult {
                        id,
                        success: false,
                        error: Some(e.to_string()),
                        title,
                        episodes_imported: 0,
                    });
                }
            }
        }

        Ok(ImportReport {
            imported_count,
            results,
        })
    }

    /// Delete local shows by id. Missing ids succeed with `deleted: false`.
    pub async fn delete_shows(&self, ids: &[i64]) -> Result<DeleteReport, ImportError> {
        if ids.is_empty() {
            return Err(ImportError::Validation("showIds must not be empty".into()));
        }

        let mut results = Vec::with_capacity(ids.len());
        let mut deleted_count = 0;

        for &id in ids {
            match shows::delete_show(&self.pool, id).await {
                Ok(deleted) => {
                    if deleted {
                        deleted_count += 1;
                        info!(show_id = id, "show deleted");
                    } else {
                        debug!(show_id = id, "show already absent");
                    }
                    results.push(DeleteResult {
                        id,
                        success: true,
                        deleted,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(show_id = id, error = %e, "show delete failed");
                    results.push(DeleteResult {
                        id,
                        success: false,
                        deleted: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(DeleteReport {
            success: results.iter().all(|r| r.success),
            deleted_count,
            results,
        })
    }

    /// Bring the store in line with the catalog for the given scope, reporting
    /// per-show progress on `events`. Fails only when the scope itself cannot
    /// be resolved.
    pub async fn reconcile(
        &self,
        scope: ReconcileScope,
        events: &broadcast::Sender<ImportEvent>,
    ) -> Result<ReconcileSummary, ImportError> {
        let ids = match scope {
            ReconcileScope::Full => self
                .catalog
                .list_series()
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect(),
            ReconcileScope::ExistingOnly => shows::list_catalog_ids(&self.pool).await?,
        };

        let mut summary = ReconcileSummary::default();
        for id in ids {
            summary.shows_attempted += 1;
            let _ = events.send(ImportEvent::progress(id, ImportStatus::Running, None));

            let (title, outcome) = self.import_one(id).await;
            match outcome {
                Ok(written) => {
                    summary.shows_succeeded += 1;
                    summary.episodes_added += written.episodes_added;
                    let _ = events.send(ImportEvent::progress(
                        id,
                        ImportStatus::Completed,
                        Some(format!(
                            "{}: {} episodes ({} new)",
                            title.unwrap_or_default(),
                            written.episodes,
                            written.episodes_added
                        )),
                    ));
                }
                Err(e) => {
                    summary.shows_failed += 1;
                    warn!(catalog_id = id, error = %e, "reconcile failed for show");
                    let _ = events.send(ImportEvent::progress(
                        id,
                        ImportStatus::Error,
                        Some(e.to_string()),
                    ));
                }
            }
        }

        Ok(summary)
    }

    pub async fn list_shows(&self, page: i64, page_size: i64) -> Result<ShowPage, ImportError> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let total = shows::count_shows(&self.pool).await?;
        let total_pages = ((total + page_size - 1) / page_size).max(1);
        let page = page.clamp(1, total_pages);

        let rows = shows::list_shows_page(&self.pool, page_size, (page - 1) * page_size).await?;
        Ok(ShowPage {
            shows: rows
                .into_iter()
                .map(|r| ShowSummary {
                    id: r.id,
                    sonarr_id: r.sonarr_id,
                    title: r.title,
                    path: r.path,
                    status: r.status,
                    network: r.network,
                    year: r.year,
                    season_count: r.seasons_count,
                    episode_count: r.episodes_count,
                })
                .collect(),
            total,
            page,
            page_size,
            total_pages,
        })
    }

    /// One show with its seasons, episodes and files, or `None` if absent.
    pub async fn show_detail(&self, show_id: i64) -> Result<Option<ShowDetail>, ImportError> {
        let Some(show) = shows::get_show(&self.pool, show_id).await? else {
            return Ok(None);
        };
        let season_rows = seasons::list_for_show(&self.pool, show_id).await?;
        let episode_rows = episodes::list_for_show(&self.pool, show_id).await?;

        let mut by_season: HashMap<i64, Vec<EpisodeDetail>> = HashMap::new();
        for ep in episode_rows {
            by_season.entry(ep.season_id).or_default().push(EpisodeDetail {
                id: ep.id,
                episode_number: ep.episode_number,
                title: ep.title,
                sonarr_episode_id: ep.sonarr_episode_id,
                overview: ep.overview,
                air_date: ep.air_date,
                has_file: ep.has_file,
                file: ep.file.map(|f| FileDetail {
                    id: f.id,
                    path: f.file_path,
                    size: f.size,
                    quality: f.quality,
                }),
            });
        }

        Ok(Some(ShowDetail {
            id: show.id,
            sonarr_id: show.sonarr_id,
            title: show.title,
            sort_title: show.sort_title,
            path: show.path,
            status: show.status,
            overview: show.overview,
            network: show.network,
            year: show.year,
            created_ts: show.created_ts,
            updated_ts: show.updated_ts,
            seasons: season_rows
                .into_iter()
                .map(|s| SeasonDetail {
                    episodes: by_season.remove(&s.id).unwrap_or_default(),
                    id: s.id,
                    season_number: s.season_number,
                    monitored: s.monitored,
                })
                .collect(),
        }))
    }

    /// Fetch one series from the catalog and write it. The title is returned
    /// whenever the series detail could be fetched, even if the write failed.
    async fn import_one(&self, catalog_id: i64) -> (Option<String>, Result<WriteSummary, ImportError>) {
        let series = match self.catalog.get_series(catalog_id).await {
            Ok(s) => s,
            Err(e) => return (None, Err(e.into())),
        };
        let title = Some(series.title.clone());

        let fetched = async {
            let episodes = self.catalog.list_episodes(catalog_id).await?;
            let files = self.catalog.list_episode_files(catalog_id).await?;
            Ok::<_, ImportError>((episodes, files))
        }
        .await;
        let (episodes, files) = match fetched {
            Ok(v) => v,
            Err(e) => return (title, Err(e)),
        };

        let show = build_show_import(series, episodes, files);
        debug!(
            catalog_id,
            seasons = show.seasons.len(),
            "writing show tree"
        );
        (title, write_show(&self.pool, &show).await.map_err(ImportError::from))
    }
}

/// Shape catalog resources into the store's show tree. Seasons come from the
/// series (for the monitored flag) and from the episodes themselves.
fn build_show_import(
    series: SeriesResource,
    episodes: Vec<EpisodeResource>,
    files: Vec<EpisodeFileResource>,
) -> ShowImport {
    let files: HashMap<i64, EpisodeFileResource> = files.into_iter().map(|f| (f.id, f)).collect();

    let mut seasons: BTreeMap<i64, SeasonImport> = series
        .seasons
        .iter()
        .map(|s| {
            (
                s.season_number,
                SeasonImport {
                    season_number: s.season_number,
                    monitored: s.monitored,
                    episodes: Vec::new(),
                },
            )
        })
        .collect();

    for ep in episodes {
        let file = ep
            .file_id()
            .and_then(|id| files.get(&id))
            .and_then(|f| {
                let path = f.path.clone().or_else(|| f.relative_path.clone())?;
                Some(EpisodeFileImport {
                    sonarr_file_id: Some(f.id),
                    path,
                    size: f.size,
                    quality: f.quality_name().map(str::to_string),
                })
            });

        seasons
            .entry(ep.season_number)
            .or_insert_with(|| SeasonImport {
                season_number: ep.season_number,
                monitored: true,
                episodes: Vec::new(),
            })
            .episodes
            .push(EpisodeImport {
                sonarr_episode_id: ep.id,
                episode_number: ep.episode_number,
                title: ep.title,
                overview: ep.overview,
                air_date: ep.air_date,
                file,
            });
    }

    for season in seasons.values_mut() {
        season.episodes.sort_by_key(|e| e.episode_number);
    }

    ShowImport {
        sonarr_id: series.id,
        title: series.title,
        sort_title: series.sort_title,
        path: series.path.unwrap_or_default(),
        status: series.status,
        overview: series.overview,
        network: series.network,
        year: series.year,
        seasons: seasons.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliparr_catalog::{QualityModel, Quality, SeasonResource};

    #[test]
    fn episodes_are_grouped_by_season_and_linked_to_files() {
        let series = SeriesResource {
            id: 7,
            title: "Show A".into(),
            path: Some("/tv/showA".into()),
            seasons: vec![
                SeasonResource { season_number: 0, monitored: false },
                SeasonResource { season_number: 1, monitored: true },
            ],
            ..Default::default()
        };
        let episodes = vec![
            EpisodeResource {
                id: 702,
                series_id: 7,
                season_number: 1,
                episode_number: 2,
                episode_file_id: Some(0),
                ..Default::default()
            },
            EpisodeResource {
                id: 701,
                series_id: 7,
                season_number: 1,
                episode_number: 1,
                has_file: true,
                episode_file_id: Some(55),
                ..Default::default()
            },
            EpisodeResource {
                id: 801,
                series_id: 7,
                season_number: 2,
                episode_number: 1,
                ..Default::default()
            },
        ];
        let files = vec![EpisodeFileResource {
            id: 55,
            series_id: 7,
            season_number: 1,
            path: Some("/tv/showA/S01E01.mkv".into()),
            size: 10,
            quality: Some(QualityModel {
                quality: Some(Quality { name: "WEBDL-1080p".into() }),
            }),
            ..Default::default()
        }];

        let show = build_show_import(series, episodes, files);
        let numbers: Vec<_> = show.seasons.iter().map(|s| s.season_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert!(!show.seasons[0].monitored);
        assert!(show.seasons[0].episodes.is_empty());

        let s1 = &show.seasons[1];
        assert_eq!(s1.episodes[0].episode_number, 1);
        let file = s1.episodes[0].file.as_ref().unwrap();
        assert_eq!(file.path, "/tv/showA/S01E01.mkv");
        assert_eq!(file.quality.as_deref(), Some("WEBDL-1080p"));
        assert!(s1.episodes[1].file.is_none());

        assert!(show.seasons[2].monitored);
    }
}
