//! Sonarr v3 catalog client.
//!
//! API reference: https://sonarr.tv/docs/api/

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::provider::CatalogProvider;
use crate::{CatalogError, EpisodeFileResource, EpisodeResource, SeriesResource, SystemStatus};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const API_KEY_HEADER: &str = "X-Api-Key";

pub struct SonarrClient {
    base_url: Url,
    api_key: String,
    client: reqwest::Client,
}

impl SonarrClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, CatalogError> {
        let base_url = normalize_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        self.base_url
            .join(path)
            .map_err(|_| CatalogError::InvalidBaseUrl(self.base_url.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = self.endpoint(path)?;
        debug!(url = %url, "catalog request");

        let resp = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CatalogError::Unauthorized(status.as_u16()));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: truncate(body, 512),
            });
        }

        let bytes = resp.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl CatalogProvider for SonarrClient {
    fn name(&self) -> &str {
        "sonarr"
    }

    async fn list_series(&self) -> Result<Vec<SeriesResource>, CatalogError> {
        self.get_json("api/v3/series", &[]).await
    }

    async fn get_series(&self, series_id: i64) -> Result<SeriesResource, CatalogError> {
        self.get_json(&format!("api/v3/series/{series_id}"), &[])
            .await
    }

    async fn list_episodes(&self, series_id: i64) -> Result<Vec<EpisodeResource>, CatalogError> {
        self.get_json("api/v3/episode", &[("seriesId", series_id.to_string())])
            .await
    }

    async fn list_episode_files(
        &self,
        series_id: i64,
    ) -> Result<Vec<EpisodeFileResource>, CatalogError> {
        self.get_json("api/v3/episodefile", &[("seriesId", series_id.to_string())])
            .await
    }

    async fn system_status(&self) -> Result<SystemStatus, CatalogError> {
        self.get_json("api/v3/system/status", &[]).await
    }
}

/// Accepts `host:port`, `http://host:port` or `https://host/prefix`, with or
/// without a trailing slash. Bare hosts get `http://`. The result always ends
/// in `/` so relative joins keep any path prefix.
pub fn normalize_base_url(raw: &str) -> Result<Url, CatalogError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidBaseUrl(raw.to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let mut url =
        Url::parse(&with_scheme).map_err(|_| CatalogError::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(CatalogError::InvalidBaseUrl(raw.to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn map_transport_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else if e.is_decode() {
        CatalogError::Decode(e.to_string())
    } else {
        CatalogError::Unreachable(e.to_string())
    }
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
