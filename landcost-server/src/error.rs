use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use landcost_core::{ErrorKind, RecalculationError, RepositoryError};
use landcost_data::ExportError;
use serde_json::Value;

use crate::routes::Envelope;

/// Envelope status for any failed request.
pub const FAILURE_STATUS: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid request body: {0}")]
    BadBody(#[from] JsonRejection),

    #[error("Invalid query string: {0}")]
    BadQuery(#[from] QueryRejection),

    #[error(transparent)]
    Recalculation(#[from] RecalculationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::BadBody(_) | ApiError::BadQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Recalculation(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Lookup => StatusCode::NOT_FOUND,
                ErrorKind::Aggregation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Store | ErrorKind::PartialApplication | ErrorKind::Pipeline => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Repository(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(%status, "Request failed: {message}");
        } else {
            tracing::warn!(%status, "Request rejected: {message}");
        }

        let body = Json(Envelope {
            status: FAILURE_STATUS,
            msg: message,
            data: Value::Null,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use landcost_core::{ApplyError, Category, IndicatorKey};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn recalculation_errors_map_by_kind() {
        let cases = [
            (RecalculationError::InvalidCategory(9), StatusCode::BAD_REQUEST),
            (
                RecalculationError::Overflow("line 2/1".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RecalculationError::MissingIndicator(IndicatorKey::new(Category::Demolition, "3")),
                StatusCode::NOT_FOUND,
            ),
            (
                RecalculationError::EmptyAggregate("lines".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RecalculationError::PartiallyApplied(ApplyError {
                    applied: 1,
                    total: 2,
                    source: RepositoryError::Database("locked".to_string()),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status_code(), expected);
        }
    }

    #[test]
    fn repository_not_found_is_404() {
        assert_eq!(
            ApiError::from(RepositoryError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RepositoryError::Connection("refused".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
