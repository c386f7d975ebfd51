use crate::validation::ValidationReport;
use clinic_types::TextError;
use clinic_wire::WireError;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("validation failed: {}", .0.errors.join("; "))]
    Validation(ValidationReport),
    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: String },
    #[error("backend returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode backend row: {0}")]
    Decode(#[from] WireError),
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
    #[error("not authenticated: {0}")]
    Unauthenticated(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl ClinicError {
    /// Failures caused by the remote backend or the network rather than by local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClinicError::Remote { .. } | ClinicError::Http(_) | ClinicError::Decode(_)
        )
    }

    /// Failures detected locally before anything was sent.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            ClinicError::Validation(_) | ClinicError::InvalidInput(_) | ClinicError::Text(_)
        )
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
