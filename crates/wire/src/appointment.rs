//! Appointment rows, view model and mappers.
//!
//! Appointment rows are read together with embedded display fields from the patient,
//! employee and service tables (`select=*,patients(full_name,phone),...`). The view model
//! flattens those into `patientName`, `employeeName`, `serviceName` and friends.
//!
//! `appointment_end` is derived from the service duration when the backend row has none,
//! falling back to [`DEFAULT_DURATION_MINUTES`].

use crate::{WireError, WireResult};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Duration assumed for a service that does not declare one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

// ============================================================================
// Status
// ============================================================================

/// Appointment lifecycle status.
///
/// Staff may move an appointment from any status to any other; there is no enforced
/// transition graph.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Agendada,
    Confirmada,
    Reagendada,
    Cancelada,
    Realizada,
    NaoCompareceu,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Agendada,
        AppointmentStatus::Confirmada,
        AppointmentStatus::Reagendada,
        AppointmentStatus::Cancelada,
        AppointmentStatus::Realizada,
        AppointmentStatus::NaoCompareceu,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Agendada => "agendada",
            AppointmentStatus::Confirmada => "confirmada",
            AppointmentStatus::Reagendada => "reagendada",
            AppointmentStatus::Cancelada => "cancelada",
            AppointmentStatus::Realizada => "realizada",
            AppointmentStatus::NaoCompareceu => "nao_compareceu",
        }
    }

    /// Statuses that still occupy the slot on the schedule.
    pub fn is_active(self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Cancelada | AppointmentStatus::NaoCompareceu
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| WireError::InvalidInput(format!("unknown appointment status '{s}'")))
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Embedded `patients(full_name, phone)` resource.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PatientRef {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Embedded `employees(name)` resource.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EmployeeRef {
    pub name: String,
}

/// Embedded `services(name, duration_minutes, price)` resource.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ServiceRef {
    pub name: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// An `appointments` row as returned by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AppointmentRow {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub employee_id: Uuid,
    pub service_id: Uuid,
    #[serde(with = "crate::timestamp::naive")]
    pub appointment_at: NaiveDateTime,
    #[serde(default, with = "crate::timestamp::option")]
    pub appointment_end: Option<NaiveDateTime>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patients: Option<PatientRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<EmployeeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceRef>,
}

/// Payload written on insert and on full-form update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppointmentInsert {
    pub patient_id: Uuid,
    pub employee_id: Uuid,
    pub service_id: Uuid,
    #[serde(with = "crate::timestamp::naive")]
    pub appointment_at: NaiveDateTime,
    #[serde(with = "crate::timestamp::naive")]
    pub appointment_end: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

/// Payload for a status-only change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusPatch {
    pub status: AppointmentStatus,
}

// ============================================================================
// Domain types
// ============================================================================

/// Appointment view model with denormalized display fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub employee_id: Uuid,
    pub service_id: Uuid,
    pub appointment_at: NaiveDateTime,
    pub appointment_end: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub employee_name: Option<String>,
    pub service_name: Option<String>,
    pub service_duration: Option<u32>,
    pub service_price: Option<f64>,
}

impl Appointment {
    pub fn duration_minutes(&self) -> i64 {
        (self.appointment_end - self.appointment_at).num_minutes()
    }

    /// True if `[start, end)` intersects this appointment's slot.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.appointment_at < end && start < self.appointment_end
    }
}

/// Create/edit submission. Every field a form may leave blank is optional so validation
/// can report it instead of failing to parse.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
    pub patient_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub appointment_at: Option<NaiveDateTime>,
    pub appointment_end: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// Mappers
// ============================================================================

/// Computes the end of a slot starting at `start` for a service of `duration_minutes`.
pub fn end_for(start: NaiveDateTime, duration_minutes: Option<u32>) -> NaiveDateTime {
    let minutes = duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    start + Duration::minutes(i64::from(minutes))
}

/// Row → view model.
pub fn from_row(row: AppointmentRow) -> Appointment {
    let service_duration = row.services.as_ref().and_then(|s| s.duration_minutes);
    let appointment_end = row
        .appointment_end
        .unwrap_or_else(|| end_for(row.appointment_at, service_duration));

    Appointment {
        id: row.id,
        patient_id: row.patient_id,
        employee_id: row.employee_id,
        service_id: row.service_id,
        appointment_at: row.appointment_at,
        appointment_end,
        status: row.status,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
        patient_name: row.patients.as_ref().map(|p| p.full_name.clone()),
        patient_phone: row.patients.and_then(|p| p.phone),
        employee_name: row.employees.map(|e| e.name),
        service_name: row.services.as_ref().map(|s| s.name.clone()),
        service_duration,
        service_price: row.services.and_then(|s| s.price),
    }
}

/// View model → insert payload.
pub fn to_insert(appointment: &Appointment) -> AppointmentInsert {
    AppointmentInsert {
        patient_id: appointment.patient_id,
        employee_id: appointment.employee_id,
        service_id: appointment.service_id,
        appointment_at: appointment.appointment_at,
        appointment_end: appointment.appointment_end,
        status: appointment.status,
        notes: appointment.notes.clone(),
    }
}

/// Form submission → insert/update payload.
///
/// # Errors
///
/// Returns [`WireError::MissingField`] for the first required field that is absent.
pub fn input_to_insert(input: &AppointmentInput) -> WireResult<AppointmentInsert> {
    let appointment_at = input
        .appointment_at
        .ok_or(WireError::MissingField("appointmentAt"))?;
    Ok(AppointmentInsert {
        patient_id: input.patient_id.ok_or(WireError::MissingField("patientId"))?,
        employee_id: input.employee_id.ok_or(WireError::MissingField("employeeId"))?,
        service_id: input.service_id.ok_or(WireError::MissingField("serviceId"))?,
        appointment_at,
        appointment_end: input
            .appointment_end
            .unwrap_or_else(|| end_for(appointment_at, None)),
        status: input.status,
        notes: crate::clean_optional(&input.notes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_row;
    use serde_json::json;

    fn sample_row() -> serde_json::Value {
        json!({
            "id": "0b6c4d8e-1f2a-4c3b-9d4e-5f6a7b8c9d01",
            "patient_id": "0b6c4d8e-1f2a-4c3b-9d4e-5f6a7b8c9d02",
            "employee_id": "0b6c4d8e-1f2a-4c3b-9d4e-5f6a7b8c9d03",
            "service_id": "0b6c4d8e-1f2a-4c3b-9d4e-5f6a7b8c9d04",
            "appointment_at": "2025-03-10T09:00:00+00:00",
            "appointment_end": "2025-03-10T10:30:00+00:00",
            "status": "confirmada",
            "notes": "Trazer exames",
            "created_at": "2025-03-01T12:00:00.123456+00:00",
            "updated_at": null,
            "patients": {"full_name": "Ana Souza", "phone": "11987654321"},
            "employees": {"name": "Dr. Paulo"},
            "services": {"name": "Canal", "duration_minutes": 90, "price": 850.0}
        })
    }

    #[test]
    fn maps_row_with_embedded_fields() {
        let row: AppointmentRow = parse_row(sample_row()).expect("row should parse");
        let appointment = from_row(row);

        assert_eq!(appointment.status, AppointmentStatus::Confirmada);
        assert_eq!(appointment.patient_name.as_deref(), Some("Ana Souza"));
        assert_eq!(appointment.patient_phone.as_deref(), Some("11987654321"));
        assert_eq!(appointment.employee_name.as_deref(), Some("Dr. Paulo"));
        assert_eq!(appointment.service_name.as_deref(), Some("Canal"));
        assert_eq!(appointment.service_duration, Some(90));
        assert_eq!(appointment.duration_minutes(), 90);
    }

    #[test]
    fn round_trip_preserves_shared_fields() {
        let row: AppointmentRow = parse_row(sample_row()).expect("row should parse");
        let insert = to_insert(&from_row(row.clone()));

        assert_eq!(insert.patient_id, row.patient_id);
        assert_eq!(insert.employee_id, row.employee_id);
        assert_eq!(insert.service_id, row.service_id);
        assert_eq!(insert.appointment_at, row.appointment_at);
        assert_eq!(Some(insert.appointment_end), row.appointment_end);
        assert_eq!(insert.status, row.status);
        assert_eq!(insert.notes, row.notes);
    }

    #[test]
    fn derives_missing_end_from_service_duration() {
        let mut value = sample_row();
        value["appointment_end"] = serde_json::Value::Null;
        let appointment = from_row(parse_row(value).expect("row should parse"));
        assert_eq!(appointment.duration_minutes(), 90);
    }

    #[test]
    fn derives_missing_end_with_default_duration() {
        let mut value = sample_row();
        value["appointment_end"] = serde_json::Value::Null;
        value["services"] = json!({"name": "Avaliação"});
        let appointment = from_row(parse_row(value).expect("row should parse"));
        assert_eq!(
            appointment.duration_minutes(),
            i64::from(DEFAULT_DURATION_MINUTES)
        );
    }

    #[test]
    fn view_model_serializes_camel_case() {
        let appointment = from_row(parse_row(sample_row()).expect("row should parse"));
        let json = serde_json::to_value(&appointment).expect("serialize");
        assert!(json.get("appointmentAt").is_some());
        assert!(json.get("patientName").is_some());
        assert_eq!(json["status"], "confirmada");
    }

    #[test]
    fn status_parses_from_wire_strings() {
        assert_eq!(
            "nao_compareceu".parse::<AppointmentStatus>().expect("known status"),
            AppointmentStatus::NaoCompareceu
        );
        assert!("desmarcada".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn input_requires_ids_and_start() {
        let input = AppointmentInput {
            patient_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let err = input_to_insert(&input).expect_err("missing start should fail");
        assert!(matches!(err, WireError::MissingField("appointmentAt")));
    }
}
