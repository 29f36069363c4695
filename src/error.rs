//! Error handling for the catalog.
//!
//! One `thiserror` taxonomy shared by the API, the importer, and the MCP
//! adapter, with an axum response mapping so API callers always receive a
//! structured body with a stable status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for the catalog system
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The import payload itself could not be fetched or parsed.
    /// Aborts the whole import before any write.
    #[error("fatal fetch error: {0}")]
    FatalFetch(String),

    /// A single import record failed validation or mapping.
    /// Logged and counted; the batch continues.
    #[error("record skipped: {0}")]
    RecordSkip(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upstream API unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        CatalogError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable HTTP status per error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::BadRequest(_) | CatalogError::RecordSkip(_) => StatusCode::BAD_REQUEST,
            CatalogError::UpstreamUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::BadRequest(_) | CatalogError::RecordSkip(_) => "bad_request",
            CatalogError::UpstreamUnreachable(_) => "upstream_unreachable",
            _ => "internal_error",
        };

        // Internal details stay in the logs, not in the response body.
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": error, "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable_per_kind() {
        assert_eq!(
            CatalogError::not_found("land", "abc").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CatalogError::BadRequest("bad page".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CatalogError::UpstreamUnreachable("refused".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            CatalogError::FatalFetch("404".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = CatalogError::not_found("community", "xyz");
        assert_eq!(err.to_string(), "community not found: xyz");
    }
}
