use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use boxoffice_application::{AppError, ReasonCode};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{message}")]
    BadRequest {
        message: String,
        reason: ReasonCode,
        fields: Vec<String>,
    },
    #[error("{message}")]
    NotFound { message: String, reason: ReasonCode },
    #[error("{message}")]
    Conflict { message: String, reason: ReasonCode },
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl HttpError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::BadRequest {
            message: message.into(),
            reason: ReasonCode::ValidationMissingFields,
            fields: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::NotFound { .. } => StatusCode::NOT_FOUND,
            HttpError::Conflict { .. } => StatusCode::CONFLICT,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reason(&self) -> ReasonCode {
        match self {
            HttpError::BadRequest { reason, .. }
            | HttpError::NotFound { reason, .. }
            | HttpError::Conflict { reason, .. } => *reason,
            HttpError::Internal(_) => ReasonCode::InternalError,
        }
    }
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        let reason = value.reason_code();
        match value {
            AppError::Validation { message, fields } => HttpError::BadRequest {
                message,
                reason,
                fields,
            },
            AppError::NotFound(_) | AppError::SectionNotFound(_) => HttpError::NotFound {
                message: value.to_string(),
                reason,
            },
            AppError::SeatConflict { .. }
            | AppError::CapacityExceeded { .. }
            | AppError::Contention(_) => {
                HttpError::Conflict {
                    message: value.to_string(),
                    reason,
                }
            }
            AppError::Internal(err) => HttpError::Internal(err),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(value: JsonRejection) -> Self {
        HttpError::bad_request(format!("invalid request body: {}", value.body_text()))
    }
}

impl From<PathRejection> for HttpError {
    fn from(value: PathRejection) -> Self {
        HttpError::bad_request(format!("invalid path parameter: {}", value.body_text()))
    }
}

impl From<QueryRejection> for HttpError {
    fn from(value: QueryRejection) -> Self {
        HttpError::bad_request(format!("invalid query string: {}", value.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    reason: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = self.reason().as_str();
        let (message, fields) = match self {
            HttpError::BadRequest {
                message, fields, ..
            } => (message, fields),
            HttpError::NotFound { message, .. } | HttpError::Conflict { message, .. } => {
                warn!("request rejected ({}): {}", reason, message);
                (message, Vec::new())
            }
            HttpError::Internal(err) => {
                // storage detail stays in the log
                error!("internal error: {:#}", err);
                ("internal server error".to_string(), Vec::new())
            }
        };
        let body = ErrorBody {
            success: false,
            error: message,
            reason,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_domain::SeatCoordinate;

    #[test]
    fn maps_application_errors_to_status_and_reason() {
        let cases = [
            (
                AppError::missing_fields(vec!["evento_id".to_string()]),
                StatusCode::BAD_REQUEST,
                "validation-missing-fields",
            ),
            (
                AppError::NotFound("event 9".to_string()),
                StatusCode::NOT_FOUND,
                "not-found",
            ),
            (
                AppError::SectionNotFound("palco".to_string()),
                StatusCode::NOT_FOUND,
                "section-not-found",
            ),
            (
                AppError::SeatConflict {
                    section: "general".to_string(),
                    seats: vec![SeatCoordinate::new(3, 5)],
                },
                StatusCode::CONFLICT,
                "seat-conflict",
            ),
            (
                AppError::CapacityExceeded {
                    requested: 10,
                    available: 5,
                },
                StatusCode::CONFLICT,
                "capacity-exceeded",
            ),
            (
                AppError::Contention("deadlock detected".to_string()),
                StatusCode::CONFLICT,
                "seat-conflict",
            ),
            (
                AppError::Internal(anyhow::anyhow!("connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal-error",
            ),
        ];
        for (err, status, reason) in cases {
            let http: HttpError = err.into();
            assert_eq!(http.status(), status);
            assert_eq!(http.reason().as_str(), reason);
        }
    }

    #[test]
    fn internal_errors_hide_storage_detail() {
        let http: HttpError = AppError::Internal(anyhow::anyhow!("relation asientos missing")).into();
        assert_eq!(http.to_string(), "internal server error");
    }
}
