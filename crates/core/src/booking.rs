//! Appointment booking and editing workflow.
//!
//! The dashboard's booking and edit dialogs are modelled as plain state: a form that knows
//! when it may be submitted and how to turn itself into an [`AppointmentInput`], and a
//! dialog that opens, submits through [`AppointmentService`] and closes on success.
//!
//! The end of an appointment is always `start + service duration`, with
//! [`DEFAULT_DURATION_MINUTES`] for services that declare none, both when booking and
//! when editing.

use crate::backend::Backend;
use crate::repositories::AppointmentService;
use crate::validation::ValidationReport;
use crate::{ClinicError, ClinicResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clinic_wire::appointment::end_for;
use clinic_wire::timestamp::parse_time;
use clinic_wire::{Appointment, AppointmentInput, AppointmentStatus, ClinicService};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use clinic_wire::appointment::DEFAULT_DURATION_MINUTES;

/// Bookable start times, every half hour from 08:00 to 18:00.
pub const TIME_SLOTS: [&str; 21] = [
    "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30",
    "13:00", "13:30", "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
    "18:00",
];

pub fn time_slots() -> Vec<NaiveTime> {
    TIME_SLOTS.iter().filter_map(|s| parse_time(s)).collect()
}

pub fn appointment_end(start: NaiveDateTime, duration_minutes: Option<u32>) -> NaiveDateTime {
    end_for(start, duration_minutes)
}

// ============================================================================
// Duration buckets
// ============================================================================

/// Coarse duration choices offered when editing an appointment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DurationBucket {
    #[default]
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1h30min")]
    NinetyMinutes,
    #[serde(rename = "2h")]
    TwoHours,
}

impl DurationBucket {
    pub const ALL: [DurationBucket; 4] = [
        DurationBucket::ThirtyMinutes,
        DurationBucket::OneHour,
        DurationBucket::NinetyMinutes,
        DurationBucket::TwoHours,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            DurationBucket::ThirtyMinutes => 30,
            DurationBucket::OneHour => 60,
            DurationBucket::NinetyMinutes => 90,
            DurationBucket::TwoHours => 120,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationBucket::ThirtyMinutes => "30min",
            DurationBucket::OneHour => "1h",
            DurationBucket::NinetyMinutes => "1h30min",
            DurationBucket::TwoHours => "2h",
        }
    }

    /// Exact for 30/60/90/120; otherwise the nearest bucket, ties going to the shorter one.
    pub fn from_minutes(minutes: u32) -> Self {
        let mut best = DurationBucket::ThirtyMinutes;
        for bucket in DurationBucket::ALL {
            if bucket.minutes().abs_diff(minutes) < best.minutes().abs_diff(minutes) {
                best = bucket;
            }
        }
        best
    }
}

// ============================================================================
// Forms
// ============================================================================

/// Booking form state. Every field starts empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "clinic_wire::timestamp::time_option")]
    #[schema(value_type = Option<String>, example = "09:00")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BookingForm {
    /// Required fields still missing, as user-facing messages.
    pub fn requirements(&self) -> ValidationReport {
        let mut errors = Vec::new();
        if self.patient_id.is_none() {
            errors.push("Paciente é obrigatório".to_string());
        }
        if self.employee_id.is_none() {
            errors.push("Profissional é obrigatório".to_string());
        }
        if self.service_id.is_none() {
            errors.push("Serviço é obrigatório".to_string());
        }
        if self.date.is_none() {
            errors.push("Data é obrigatória".to_string());
        }
        if self.time.is_none() {
            errors.push("Horário é obrigatório".to_string());
        }
        ValidationReport::from_errors(errors)
    }

    /// Submit stays disabled until every required field is filled.
    pub fn can_submit(&self) -> bool {
        self.requirements().is_valid
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        Some(self.date?.and_time(self.time?))
    }

    /// Declared duration of the selected service, if it is in `services`.
    pub fn service_duration(&self, services: &[ClinicService]) -> Option<u32> {
        let id = self.service_id?;
        services
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.duration_minutes)
    }

    /// `(appointmentAt, appointmentEnd)` for the current selection.
    pub fn schedule(&self, services: &[ClinicService]) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.start()?;
        Some((start, appointment_end(start, self.service_duration(services))))
    }

    pub fn to_input(&self, services: &[ClinicService]) -> AppointmentInput {
        let schedule = self.schedule(services);
        AppointmentInput {
            patient_id: self.patient_id,
            employee_id: self.employee_id,
            service_id: self.service_id,
            appointment_at: schedule.map(|(start, _)| start),
            appointment_end: schedule.map(|(_, end)| end),
            status: self.status,
            notes: self.notes.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Edit form prefilled from an existing appointment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditForm {
    pub appointment_id: Uuid,
    pub form: BookingForm,
    pub duration: DurationBucket,
}

impl EditForm {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        let minutes = appointment.service_duration.unwrap_or_else(|| {
            u32::try_from(appointment.duration_minutes()).unwrap_or(DEFAULT_DURATION_MINUTES)
        });
        Self {
            appointment_id: appointment.id,
            form: BookingForm {
                patient_id: Some(appointment.patient_id),
                employee_id: Some(appointment.employee_id),
                service_id: Some(appointment.service_id),
                date: Some(appointment.appointment_at.date()),
                time: Some(appointment.appointment_at.time()),
                status: appointment.status,
                notes: appointment.notes.clone(),
            },
            duration: DurationBucket::from_minutes(minutes),
        }
    }
}

// ============================================================================
// Dialogs
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct BookingDialog {
    open: bool,
    form: BookingForm,
}

impl BookingDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Hides the dialog, keeping whatever was typed.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut BookingForm {
        &mut self.form
    }

    pub fn can_submit(&self) -> bool {
        self.form.can_submit()
    }

    /// Creates the appointment. On success the dialog closes and the form resets; on failure
    /// both stay as they were so the user can correct and resubmit.
    pub async fn submit<B: Backend>(
        &mut self,
        appointments: &AppointmentService<B>,
        services: &[ClinicService],
    ) -> ClinicResult<Appointment> {
        let requirements = self.form.requirements();
        if !requirements.is_valid {
            return Err(ClinicError::Validation(requirements));
        }

        let created = appointments.create(&self.form.to_input(services)).await?;
        self.form.reset();
        self.open = false;
        Ok(created)
    }
}

#[derive(Clone, Debug, Default)]
pub struct EditDialog {
    open: bool,
    edit: Option<EditForm>,
}

impl EditDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_for(&mut self, appointment: &Appointment) {
        self.edit = Some(EditForm::from_appointment(appointment));
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn edit(&self) -> Option<&EditForm> {
        self.edit.as_ref()
    }

    pub fn edit_mut(&mut self) -> Option<&mut EditForm> {
        self.edit.as_mut()
    }

    pub fn can_submit(&self) -> bool {
        self.edit.as_ref().is_some_and(|e| e.form.can_submit())
    }

    pub async fn submit<B: Backend>(
        &mut self,
        appointments: &AppointmentService<B>,
        services: &[ClinicService],
    ) -> ClinicResult<Appointment> {
        let Some(edit) = self.edit.as_ref() else {
            return Err(ClinicError::InvalidInput(
                "no appointment selected for editing".into(),
            ));
        };
        let requirements = edit.form.requirements();
        if !requirements.is_valid {
            return Err(ClinicError::Validation(requirements));
        }

        let updated = appointments
            .update(edit.appointment_id, &edit.form.to_input(services))
            .await?;
        self.edit = None;
        self.open = false;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, fixtures, memory_clinic};
    use clinic_wire::ServiceCategory;

    fn service(id: Uuid, duration: Option<u32>) -> ClinicService {
        ClinicService {
            id,
            name: "Consulta".into(),
            description: None,
            category: ServiceCategory::Diagnostico,
            duration_minutes: duration,
            price: 100.0,
            active: true,
            times_used: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn filled_form(service_id: Uuid) -> BookingForm {
        BookingForm {
            patient_id: Some(Uuid::new_v4()),
            employee_id: Some(Uuid::new_v4()),
            service_id: Some(service_id),
            date: NaiveDate::from_ymd_opt(2025, 3, 10),
            time: NaiveTime::from_hms_opt(9, 0, 0),
            ..BookingForm::default()
        }
    }

    #[test]
    fn slots_cover_eight_to_six_every_half_hour() {
        let slots = time_slots();
        assert_eq!(slots.len(), 21);
        assert_eq!(slots.first(), NaiveTime::from_hms_opt(8, 0, 0).as_ref());
        assert_eq!(slots.last(), NaiveTime::from_hms_opt(18, 0, 0).as_ref());
        assert!(slots.windows(2).all(|w| (w[1] - w[0]).num_minutes() == 30));
    }

    #[test]
    fn thirty_minute_service_at_nine_ends_at_half_past() {
        let service_id = Uuid::new_v4();
        let form = filled_form(service_id);
        let (start, end) = form
            .schedule(&[service(service_id, Some(30))])
            .expect("complete form has a schedule");
        assert_eq!(start, at(2025, 3, 10, 9, 0));
        assert_eq!(end, at(2025, 3, 10, 9, 30));
    }

    #[test]
    fn service_without_duration_defaults_to_thirty_minutes() {
        let service_id = Uuid::new_v4();
        let form = filled_form(service_id);
        let (_, end) = form
            .schedule(&[service(service_id, None)])
            .expect("schedule");
        assert_eq!(end, at(2025, 3, 10, 9, 30));

        let (_, end) = form.schedule(&[]).expect("unknown service still schedules");
        assert_eq!(end, at(2025, 3, 10, 9, 30));
    }

    #[test]
    fn empty_employee_keeps_submit_disabled() {
        let mut form = filled_form(Uuid::new_v4());
        assert!(form.can_submit());
        form.employee_id = None;
        assert!(!form.can_submit());
        assert_eq!(form.requirements().errors, vec!["Profissional é obrigatório"]);
        assert!(!BookingForm::default().can_submit());
    }

    #[test]
    fn duration_buckets_round_trip_and_round_to_nearest() {
        for bucket in DurationBucket::ALL {
            assert_eq!(DurationBucket::from_minutes(bucket.minutes()), bucket);
        }
        assert_eq!(DurationBucket::from_minutes(90).label(), "1h30min");
        assert_eq!(DurationBucket::from_minutes(10), DurationBucket::ThirtyMinutes);
        assert_eq!(DurationBucket::from_minutes(45), DurationBucket::ThirtyMinutes);
        assert_eq!(DurationBucket::from_minutes(50), DurationBucket::OneHour);
        assert_eq!(DurationBucket::from_minutes(240), DurationBucket::TwoHours);
        assert_eq!(
            serde_json::to_value(DurationBucket::NinetyMinutes).expect("serialize"),
            "1h30min"
        );
    }

    #[test]
    fn edit_form_preselects_ninety_minute_bucket() {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            appointment_at: at(2025, 3, 10, 14, 0),
            appointment_end: at(2025, 3, 10, 15, 30),
            status: AppointmentStatus::Confirmada,
            notes: Some("Retorno".into()),
            created_at: None,
            updated_at: None,
            patient_name: None,
            patient_phone: None,
            employee_name: None,
            service_name: None,
            service_duration: Some(90),
            service_price: None,
        };

        let edit = EditForm::from_appointment(&appointment);
        assert_eq!(edit.duration.label(), "1h30min");
        assert_eq!(edit.form.date, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(edit.form.time, NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(edit.form.status, AppointmentStatus::Confirmada);
        assert!(edit.form.can_submit());
    }

    #[tokio::test]
    async fn dialog_closes_and_resets_on_success() {
        let (clinic, _backend) = memory_clinic();
        let f = fixtures(&clinic).await;
        let services = clinic.services().get_all().await.expect("services");
        let mut rx = clinic.events().subscribe();

        let mut dialog = BookingDialog::new();
        dialog.open();
        *dialog.form_mut() = BookingForm {
            patient_id: Some(f.patient.id),
            employee_id: Some(f.employee.id),
            service_id: Some(f.service.id),
            date: NaiveDate::from_ymd_opt(2025, 3, 10),
            time: NaiveTime::from_hms_opt(9, 0, 0),
            ..BookingForm::default()
        };

        let created = dialog
            .submit(&clinic.appointments(), &services)
            .await
            .expect("submit should succeed");

        assert_eq!(created.appointment_end, at(2025, 3, 10, 9, 30));
        assert_eq!(created.patient_name.as_deref(), Some("Maria Silva"));
        assert!(!dialog.is_open());
        assert_eq!(dialog.form(), &BookingForm::default());

        let mut saw_refresh = false;
        while let Ok(event) = rx.try_recv() {
            saw_refresh |= event == crate::events::ClinicEvent::RefreshDialogData;
        }
        assert!(saw_refresh, "booking should ask dialogs to refresh");
    }

    #[tokio::test]
    async fn dialog_stays_open_when_backend_fails() {
        let (clinic, backend) = memory_clinic();
        let f = fixtures(&clinic).await;
        backend.set_unavailable(true);

        let mut dialog = BookingDialog::new();
        dialog.open();
        let form = BookingForm {
            patient_id: Some(f.patient.id),
            employee_id: Some(f.employee.id),
            service_id: Some(f.service.id),
            date: NaiveDate::from_ymd_opt(2025, 3, 10),
            time: NaiveTime::from_hms_opt(9, 0, 0),
            ..BookingForm::default()
        };
        *dialog.form_mut() = form.clone();

        let err = dialog
            .submit(&clinic.appointments(), &[])
            .await
            .expect_err("backend is down");
        assert!(err.is_remote());
        assert!(dialog.is_open());
        assert_eq!(dialog.form(), &form);
    }

    #[tokio::test]
    async fn incomplete_form_is_refused_before_network() {
        let (clinic, backend) = memory_clinic();
        let mut dialog = BookingDialog::new();
        dialog.open();

        let err = dialog
            .submit(&clinic.appointments(), &[])
            .await
            .expect_err("empty form");
        assert!(matches!(err, ClinicError::Validation(_)));
        assert!(dialog.is_open());
        assert!(backend.rows(crate::backend::Table::Appointments).is_empty());
    }

    #[tokio::test]
    async fn edit_dialog_recomputes_end_from_service() {
        let (clinic, _backend) = memory_clinic();
        let f = fixtures(&clinic).await;
        let services = clinic.services().get_all().await.expect("services");
        let appointments = clinic.appointments();

        let mut booking = BookingDialog::new();
        *booking.form_mut() = BookingForm {
            patient_id: Some(f.patient.id),
            employee_id: Some(f.employee.id),
            service_id: Some(f.service.id),
            date: NaiveDate::from_ymd_opt(2025, 3, 10),
            time: NaiveTime::from_hms_opt(9, 0, 0),
            ..BookingForm::default()
        };
        let created = booking.submit(&appointments, &services).await.expect("book");

        let mut edit = EditDialog::new();
        edit.open_for(&created);
        assert_eq!(edit.edit().map(|e| e.duration), Some(DurationBucket::ThirtyMinutes));
        if let Some(e) = edit.edit_mut() {
            e.form.service_id = Some(f.long_service.id);
            e.form.time = NaiveTime::from_hms_opt(10, 0, 0);
        }

        let updated = edit.submit(&appointments, &services).await.expect("edit");
        assert_eq!(updated.appointment_at, at(2025, 3, 10, 10, 0));
        assert_eq!(updated.appointment_end, at(2025, 3, 10, 11, 30));
        assert!(!edit.is_open());
        assert!(edit.edit().is_none());
    }
}
