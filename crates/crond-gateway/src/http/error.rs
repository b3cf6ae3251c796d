use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crond_beat::SinkError;
use crond_core::api::ErrorBody;
use crond_manager::JobError;

/// Error response of every handler: `{"error": ..., "code": ...}`.
///
/// Requests the daemon could not understand get 400; anything that fails
/// while carrying them out gets 500.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    code: &'static str,
}

impl ApiError {
    pub fn bad_request(code: &'static str, error: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.to_string(),
            code,
        }
    }

    pub fn internal(code: &'static str, error: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.to_string(),
            code,
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::Invalid(_) | JobError::InvalidArgument(_) => {
                ApiError::bad_request(e.code(), &e)
            }
            _ => {
                warn!(error = %e, code = e.code(), "job operation failed");
                ApiError::internal(e.code(), &e)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::bad_request("INVALID_BODY", e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::bad_request("INVALID_QUERY", e.body_text())
    }
}

impl From<SinkError> for ApiError {
    fn from(e: SinkError) -> Self {
        warn!(error = %e, "beat forwarding failed");
        ApiError::internal("SINK_ERROR", e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
