use serde::Serialize;
use thiserror::Error;

/// Unified API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The catalog could not be reached at all (DNS, connect, IO).
    #[error("catalog unreachable: {0}")]
    CatalogUnreachable(String),

    /// The catalog answered but rejected our API key.
    #[error("catalog rejected credentials: {0}")]
    CatalogAuth(String),

    #[error("catalog timed out: {0}")]
    CatalogTimeout(String),

    /// Any other catalog failure: unexpected status or undecodable body.
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::CatalogUnreachable(_) => "catalog_unreachable",
            Self::CatalogAuth(_) => "catalog_auth_failed",
            Self::CatalogTimeout(_) => "catalog_timeout",
            Self::Catalog(_) => "catalog_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::CatalogUnreachable(_) | Self::CatalogAuth(_) | Self::Catalog(_) => 502,
            Self::CatalogTimeout(_) => 504,
            Self::Internal(_) => 500,
        }
    }
}

/// JSON error envelope: `{ "error": { "code": "…", "message": "…", "details": {} } }`
#[derive(Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(e: &ApiError) -> Self {
        Self {
            error: ErrorBody {
                code: e.code().to_string(),
                message: e.to_string(),
                details: serde_json::Value::Object(serde_json::Map::new()),
            },
        }
    }
}
