pub mod poller;
pub mod service;
pub mod settings;

pub use poller::PollingTask;
pub use service::{Importer, ReconcileScope};
pub use settings::{Settings, SettingsError};

use cliparr_catalog::CatalogError;
use cliparr_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for ImportError {
    fn from(e: sqlx::Error) -> Self {
        Self::Db(DbError::Sqlx(e))
    }
}
