use axum::{http::StatusCode, Json};
use clinic_core::ClinicError;
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
    /// Individual validation messages, when the request failed validation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

pub type ApiError = (StatusCode, Json<ErrorRes>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn status_for(err: &ClinicError) -> StatusCode {
    match err {
        e if e.is_local_validation() => StatusCode::BAD_REQUEST,
        ClinicError::NotFound { .. } => StatusCode::NOT_FOUND,
        ClinicError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        ClinicError::Forbidden(_) => StatusCode::FORBIDDEN,
        e if e.is_remote() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Logs `err` under `operation` and maps it to a status and body.
///
/// Server-side failures hide their details; client errors echo them.
pub fn api_error(operation: &str, err: ClinicError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("{operation} error: {err}");
    } else {
        tracing::warn!("{operation} rejected: {err}");
    }

    let body = match err {
        ClinicError::Validation(report) => ErrorRes {
            message: "Validation failed".into(),
            errors: report.errors,
        },
        _ if status == StatusCode::BAD_GATEWAY => ErrorRes {
            message: "Backend error".into(),
            errors: Vec::new(),
        },
        _ if status.is_server_error() => ErrorRes {
            message: "Internal error".into(),
            errors: Vec::new(),
        },
        other => ErrorRes {
            message: other.to_string(),
            errors: Vec::new(),
        },
    };
    (status, Json(body))
}

pub fn error_message(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorRes {
            message: message.to_string(),
            errors: Vec::new(),
        }),
    )
}
