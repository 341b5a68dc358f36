use crate::{CatalogError, EpisodeFileResource, EpisodeResource, SeriesResource, SystemStatus};

/// Read access to the external catalog that owns the show list.
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Every series the catalog knows about.
    async fn list_series(&self) -> Result<Vec<SeriesResource>, CatalogError>;

    async fn get_series(&self, series_id: i64) -> Result<SeriesResource, CatalogError>;

    /// All episodes of a series, with or without files.
    async fn list_episodes(&self, series_id: i64) -> Result<Vec<EpisodeResource>, CatalogError>;

    async fn list_episode_files(
        &self,
        series_id: i64,
    ) -> Result<Vec<EpisodeFileResource>, CatalogError>;

    /// Cheap liveness/auth probe.
    async fn system_status(&self) -> Result<SystemStatus, CatalogError>;
}
