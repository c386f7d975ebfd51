//! Remote row shapes, view models and the typed mappers between them.
//!
//! The hosted backend stores every entity in a snake_case table row. The rest of the
//! workspace works with view models that serialize as camelCase for API consumers. This
//! crate owns both shapes and the translation between them:
//!
//! - `*Row` types: exactly what the backend returns (including embedded resources)
//! - view models (`Appointment`, `Patient`, ...): what services and APIs hand out
//! - `*Input` types: create/edit payloads as submitted by a form
//! - `*Insert` / `*Update` types: what is written back to the backend
//!
//! Rows are parsed with `serde_path_to_error`, so a schema drift on the backend reports the
//! failing field (for example `status` or `services.price`) instead of a generic error.

pub mod appointment;
pub mod clinic;
pub mod closure;
pub mod convenio;
pub mod employee;
pub mod patient;
pub mod service;
pub mod timestamp;

pub use appointment::{
    Appointment, AppointmentInput, AppointmentInsert, AppointmentRow, AppointmentStatus,
    StatusPatch,
};
pub use clinic::{
    ClinicAddress, ClinicAddressInput, ClinicAddressInsert, ClinicAddressRow, ClinicHours,
    ClinicHoursInput, ClinicHoursInsert, ClinicHoursRow,
};
pub use closure::{Closure, ClosureInput, ClosureInsert, ClosureRow, ClosureType};
pub use convenio::{Convenio, ConvenioInput, ConvenioInsert, ConvenioRow};
pub use employee::{
    Employee, EmployeeInput, EmployeeInsert, EmployeeRole, EmployeeRow, EmployeeStatus,
    Specialty, Weekday,
};
pub use patient::{Patient, PatientInput, PatientInsert, PatientRow};
pub use service::{
    ClinicService, ServiceCategory, ServiceInput, ServiceInsert, ServiceRow, ServiceUpdate,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Errors returned by the wire boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;

/// Parse one backend row into its typed shape.
///
/// # Errors
///
/// Returns [`WireError::Translation`] naming the failing field path when the row does not
/// match `T`.
pub fn parse_row<T: DeserializeOwned>(value: Value) -> WireResult<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        WireError::Translation(format!("row schema mismatch at {path}: {source}"))
    })
}

/// Parse a list of backend rows, failing on the first row that does not match.
pub fn parse_rows<T: DeserializeOwned>(values: Vec<Value>) -> WireResult<Vec<T>> {
    values.into_iter().map(parse_row).collect()
}

/// Serialize an insert/update payload for the backend.
pub fn to_value<T: Serialize>(payload: &T) -> WireResult<Value> {
    Ok(serde_json::to_value(payload)?)
}

/// Trims optional free text, turning blank strings into `None`.
pub(crate) fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_row_reports_failing_field() {
        let row = json!({
            "id": "6f1f9a52-5c1e-4d0b-8a53-1d2b1f1c2a01",
            "name": "Limpeza",
            "category": "not-a-category",
            "price": 120.0
        });

        let err = parse_row::<ServiceRow>(row).expect_err("unknown category should fail");
        match err {
            WireError::Translation(msg) => assert!(msg.contains("category"), "got: {msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rows_fails_on_first_bad_row() {
        let rows = vec![
            json!({"id": "6f1f9a52-5c1e-4d0b-8a53-1d2b1f1c2a01", "name": "A", "category": "preventivo", "price": 1.0}),
            json!({"id": "6f1f9a52-5c1e-4d0b-8a53-1d2b1f1c2a02", "name": "B", "category": "preventivo"}),
        ];

        let err = parse_rows::<ServiceRow>(rows).expect_err("missing price should fail");
        assert!(err.to_string().contains("price"), "got: {err}");
    }

    #[test]
    fn clean_optional_drops_blank_text() {
        assert_eq!(clean_optional(&Some("  ".into())), None);
        assert_eq!(clean_optional(&Some(" x ".into())), Some("x".into()));
        assert_eq!(clean_optional(&None), None);
    }
}
