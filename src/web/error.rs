use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::Value;

use crate::Error;

/// Error returned by the JSON API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Scheduling(#[from] Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    details: Value,
}

impl ApiError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Scheduling(Error::Validation(_)) => "validation",
            Self::Scheduling(Error::TimeOutOfRange(_)) => "out_of_range",
            Self::Scheduling(Error::Infeasible) => "infeasible",
            Self::Scheduling(Error::SolverUnsuccessful(_)) => "solver_unsuccessful",
            Self::Scheduling(_) | Self::Internal(_) => "internal",
        }
    }

    fn details(&self) -> Value {
        let details = match self {
            Self::Scheduling(Error::Validation(errors)) => serde_json::to_value(errors),
            Self::Scheduling(Error::InvalidSchedule(violations)) => {
                serde_json::to_value(violations)
            }
            Self::Scheduling(Error::SolverUnsuccessful(status)) => serde_json::to_value([status]),
            _ => Ok(Value::Array(Vec::new())),
        };
        details.unwrap_or(Value::Null)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Scheduling(Error::Validation(_) | Error::TimeOutOfRange(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Scheduling(Error::Infeasible) => StatusCode::CONFLICT,
            Self::Scheduling(Error::SolverUnsuccessful(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Scheduling(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{self}");
        } else {
            tracing::warn!(kind = self.kind(), "{self}");
        }
        HttpResponse::build(status).json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            details: self.details(),
        })
    }
}

/// Turns JSON extractor failures into `400 bad_request` bodies.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}
