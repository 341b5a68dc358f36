use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cliparr_catalog::CatalogError;
use cliparr_core::error::{ApiError, ErrorEnvelope};
use cliparr_db::DbError;
use cliparr_importer::{ImportError, SettingsError};
use tracing::error;

/// Newtype wrapper so we can implement `IntoResponse` in this crate.
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "request failed");
        }
        let envelope = ErrorEnvelope::from(&self.0);
        (status, Json(envelope)).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        let msg = e.to_string();
        Self(match e {
            CatalogError::Unreachable(_) | CatalogError::InvalidBaseUrl(_) => {
                ApiError::CatalogUnreachable(msg)
            }
            CatalogError::Unauthorized(_) => ApiError::CatalogAuth(msg),
            CatalogError::Timeout => ApiError::CatalogTimeout(msg),
            CatalogError::NotFound | CatalogError::Status { .. } | CatalogError::Decode(_) => {
                ApiError::Catalog(msg)
            }
        })
    }
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(msg) => Self(ApiError::Conflict(msg)),
            DbError::Sqlx(e) => e.into(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self(ApiError::Internal(format!("database error: {e}")))
    }
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Validation(msg) => Self(ApiError::BadRequest(msg)),
            ImportError::Catalog(e) => e.into(),
            ImportError::Db(e) => e.into(),
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::InvalidMode(_) | SettingsError::InvalidInterval(_) => {
                Self(ApiError::BadRequest(e.to_string()))
            }
            SettingsError::Db(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: impl Into<AppError>) -> (u16, &'static str) {
        let e = e.into();
        (e.0.status_code(), e.0.code())
    }

    #[test]
    fn catalog_errors_map_to_gateway_codes() {
        assert_eq!(
            status_of(CatalogError::Unreachable("refused".into())),
            (502, "catalog_unreachable")
        );
        assert_eq!(
            status_of(CatalogError::Unauthorized(401)),
            (502, "catalog_auth_failed")
        );
        assert_eq!(status_of(CatalogError::Timeout), (504, "catalog_timeout"));
        assert_eq!(
            status_of(CatalogError::Status {
                status: 500,
                body: String::new()
            }),
            (502, "catalog_error")
        );
    }

    #[test]
    fn validation_and_conflicts() {
        assert_eq!(
            status_of(ImportError::Validation("empty".into())),
            (400, "bad_request")
        );
        assert_eq!(
            status_of(SettingsError::InvalidMode("bogus".into())),
            (400, "bad_request")
        );
        assert_eq!(
            status_of(DbError::Conflict("taken".into())),
            (409, "conflict")
        );
        assert_eq!(
            status_of(sqlx::Error::RowNotFound),
            (500, "internal_error")
        );
    }
}
