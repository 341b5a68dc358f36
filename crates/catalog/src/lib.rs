pub mod provider;
pub mod sonarr;

pub use provider::CatalogProvider;
pub use sonarr::SonarrClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog unreachable: {0}")]
    Unreachable(String),
    #[error("catalog request timed out")]
    Timeout,
    #[error("catalog rejected the API key (HTTP {0})")]
    Unauthorized(u16),
    #[error("not found in catalog")]
    NotFound,
    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected catalog response: {0}")]
    Decode(String),
    #[error("invalid catalog base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// A series as the catalog reports it (`/api/v3/series`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResource {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub sort_title: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub statistics: Option<SeriesStatistics>,
    #[serde(default)]
    pub seasons: Vec<SeasonResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStatistics {
    #[serde(default)]
    pub season_count: i64,
    #[serde(default)]
    pub episode_count: i64,
    #[serde(default)]
    pub episode_file_count: i64,
    #[serde(default)]
    pub size_on_disk: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonResource {
    pub season_number: i64,
    #[serde(default)]
    pub monitored: bool,
}

/// One episode (`/api/v3/episode?seriesId=`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeResource {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i64,
    pub episode_number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub has_file: bool,
    /// `0` or absent when the episode has no file.
    #[serde(default)]
    pub episode_file_id: Option<i64>,
    #[serde(default)]
    pub monitored: bool,
}

impl EpisodeResource {
    /// The linked file id, treating the catalog's `0` placeholder as none.
    pub fn file_id(&self) -> Option<i64> {
        self.episode_file_id.filter(|id| *id > 0)
    }
}

/// One file on disk (`/api/v3/episodefile?seriesId=`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeFileResource {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i64,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub relative_path: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub quality: Option<QualityModel>,
}

impl EpisodeFileResource {
    /// Name of the quality profile, e.g. `HDTV-720p`.
    pub fn quality_name(&self) -> Option<&str> {
        self.quality
            .as_ref()
            .and_then(|q| q.quality.as_ref())
            .map(|q| q.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityModel {
    #[serde(default)]
    pub quality: Option<Quality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}
