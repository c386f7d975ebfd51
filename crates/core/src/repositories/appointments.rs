//! Appointments: listing with denormalized display fields, booking, editing and the
//! status lifecycle.

use super::catalog::CatalogService;
use super::clinic_info::ClinicInfoService;
use super::closures::ClosureService;
use super::employees::EmployeeService;
use super::shared::{contains_ci, Repo};
use crate::backend::{Backend, Query, Table};
use crate::booking::BookingForm;
use crate::constants::messages;
use crate::events::ClinicEvent;
use crate::schedule::{self, DayContext};
use crate::validation::{validate_appointment, validate_appointment_edit, ValidationReport};
use crate::ClinicResult;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use clinic_wire::appointment::{self, Appointment, AppointmentInput, AppointmentRow, StatusPatch};
use clinic_wire::timestamp::format_timestamp;
use clinic_wire::{AppointmentStatus, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

fn with_display_fields(query: Query) -> Query {
    query
        .embed(Table::Patients, &["full_name", "phone"])
        .embed(Table::Employees, &["name"])
        .embed(Table::Services, &["name", "duration_minutes", "price"])
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub patient_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    /// First day included.
    pub from: Option<NaiveDate>,
    /// Last day included.
    pub to: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: usize,
    pub today: usize,
    pub upcoming: usize,
    pub by_status: Vec<StatusCount>,
}

pub struct AppointmentService<B> {
    repo: Repo<B>,
}

impl<B: Backend> AppointmentService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    async fn load(&self, query: Query) -> ClinicResult<Vec<Appointment>> {
        let query = with_display_fields(query);
        let rows: Vec<AppointmentRow> = self
            .repo
            .reported(
                messages::LOAD_APPOINTMENTS,
                self.repo.fetch(Table::Appointments, &query),
            )
            .await?;
        Ok(rows.into_iter().map(appointment::from_row).collect())
    }

    async fn load_one(&self, message: &'static str, id: Uuid) -> ClinicResult<Appointment> {
        let row: AppointmentRow = self
            .repo
            .reported(
                message,
                self.repo
                    .fetch_by_id(Table::Appointments, id, with_display_fields(Query::new())),
            )
            .await?;
        Ok(appointment::from_row(row))
    }

    pub async fn get_all(&self) -> ClinicResult<Vec<Appointment>> {
        self.load(Query::new().order_by("appointment_at", true)).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> ClinicResult<Appointment> {
        self.load_one(messages::LOAD_APPOINTMENT, id).await
    }

    pub fn validate(&self, input: &AppointmentInput) -> ValidationReport {
        validate_appointment(input, self.repo.now())
    }

    pub async fn create(&self, input: &AppointmentInput) -> ClinicResult<Appointment> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let insert = appointment::input_to_insert(input)?;
        let row: AppointmentRow = self
            .repo
            .reported(
                messages::CREATE_APPOINTMENT,
                self.repo.insert(Table::Appointments, &insert),
            )
            .await?;
        let created = self.load_one(messages::LOAD_APPOINTMENT, row.id).await?;

        tracing::info!(
            appointment_id = %created.id,
            at = %created.appointment_at,
            "appointment created"
        );
        let events = self.repo.events();
        events.publish(ClinicEvent::AppointmentsChanged);
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::APPOINTMENT_CREATED);
        Ok(created)
    }

    /// Replaces an appointment. A start that is already in the past may be kept, so notes
    /// and status of a running appointment can still be edited; moving it into the past
    /// is refused.
    pub async fn update(&self, id: Uuid, input: &AppointmentInput) -> ClinicResult<Appointment> {
        let current = self.load_one(messages::UPDATE_APPOINTMENT, id).await?;
        let report = validate_appointment_edit(input, self.repo.now(), current.appointment_at);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let insert = appointment::input_to_insert(input)?;
        let _: AppointmentRow = self
            .repo
            .reported(
                messages::UPDATE_APPOINTMENT,
                self.repo.update(Table::Appointments, id, &insert),
            )
            .await?;
        let updated = self.load_one(messages::LOAD_APPOINTMENT, id).await?;

        let events = self.repo.events();
        events.publish(ClinicEvent::AppointmentsChanged);
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::APPOINTMENT_UPDATED);
        Ok(updated)
    }

    /// Moves an appointment to `status`. Any status may follow any other. Entering
    /// `realizada` counts one more use of the appointment's service.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> ClinicResult<Appointment> {
        let current = self.load_one(messages::UPDATE_APPOINTMENT_STATUS, id).await?;
        let _: AppointmentRow = self
            .repo
            .reported(
                messages::UPDATE_APPOINTMENT_STATUS,
                self.repo
                    .update(Table::Appointments, id, &StatusPatch { status }),
            )
            .await?;

        if status == AppointmentStatus::Realizada && current.status != AppointmentStatus::Realizada
        {
            let catalog = CatalogService::new(self.repo.clone());
            // increment_usage publishes the update-service error itself.
            if let Err(e) = catalog.increment_usage(current.service_id).await {
                tracing::error!(service_id = %current.service_id, "usage counter not updated: {e}");
            }
        }

        let updated = self.load_one(messages::LOAD_APPOINTMENT, id).await?;
        tracing::info!(
            appointment_id = %id,
            from = %current.status,
            to = %status,
            "appointment status changed"
        );
        let events = self.repo.events();
        events.publish(ClinicEvent::AppointmentsChanged);
        events.success(messages::APPOINTMENT_STATUS_UPDATED);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> ClinicResult<()> {
        self.repo
            .reported(
                messages::DELETE_APPOINTMENT,
                self.repo.delete(Table::Appointments, id),
            )
            .await?;

        let events = self.repo.events();
        events.publish(ClinicEvent::AppointmentsChanged);
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::APPOINTMENT_DELETED);
        Ok(())
    }

    /// Case-insensitive match over patient, employee and service names, notes and status.
    pub async fn search(&self, term: &str) -> ClinicResult<Vec<Appointment>> {
        let all = self.get_all().await?;
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(all);
        }
        Ok(all
            .into_iter()
            .filter(|a| {
                contains_ci(a.patient_name.as_deref(), &needle)
                    || contains_ci(a.employee_name.as_deref(), &needle)
                    || contains_ci(a.service_name.as_deref(), &needle)
                    || contains_ci(a.notes.as_deref(), &needle)
                    || a.status.as_str().contains(&needle)
            })
            .collect())
    }

    pub async fn filter(&self, filter: &AppointmentFilter) -> ClinicResult<Vec<Appointment>> {
        let mut query = Query::new().order_by("appointment_at", true);
        if let Some(status) = filter.status {
            query = query.eq("status", status.as_str());
        }
        if let Some(id) = filter.patient_id {
            query = query.eq("patient_id", id.to_string());
        }
        if let Some(id) = filter.employee_id {
            query = query.eq("employee_id", id.to_string());
        }
        if let Some(id) = filter.service_id {
            query = query.eq("service_id", id.to_string());
        }
        if let Some(from) = filter.from {
            query = query.gte(
                "appointment_at",
                format_timestamp(&from.and_time(NaiveTime::MIN)),
            );
        }
        if let Some(to) = filter.to {
            let next_day = (to + Duration::days(1)).and_time(NaiveTime::MIN);
            query = query.lt("appointment_at", format_timestamp(&next_day));
        }
        self.load(query).await
    }

    /// Appointments on `date`, optionally for one employee.
    pub async fn for_day(
        &self,
        date: NaiveDate,
        employee_id: Option<Uuid>,
    ) -> ClinicResult<Vec<Appointment>> {
        self.filter(&AppointmentFilter {
            employee_id,
            from: Some(date),
            to: Some(date),
            ..AppointmentFilter::default()
        })
        .await
    }

    pub async fn get_stats(&self) -> ClinicResult<AppointmentStats> {
        let all = self.get_all().await?;
        Ok(appointment_stats(&all, self.repo.now()))
    }

    /// Books from the dialog form, taking the end time from the selected service.
    pub async fn book(&self, form: &BookingForm) -> ClinicResult<Appointment> {
        let input = self.form_input(form).await?;
        self.create(&input).await
    }

    pub async fn edit(&self, id: Uuid, form: &BookingForm) -> ClinicResult<Appointment> {
        let input = self.form_input(form).await?;
        self.update(id, &input).await
    }

    async fn form_input(&self, form: &BookingForm) -> ClinicResult<AppointmentInput> {
        let requirements = form.requirements();
        if !requirements.is_valid {
            return self.repo.rejected(requirements);
        }
        let services = match form.service_id {
            Some(id) => vec![CatalogService::new(self.repo.clone()).get_by_id(id).await?],
            None => Vec::new(),
        };
        Ok(form.to_input(&services))
    }

    /// Start times still open on `date` for `employee_id`, sized for `service_id`.
    pub async fn available_slots(
        &self,
        date: NaiveDate,
        employee_id: Uuid,
        service_id: Option<Uuid>,
    ) -> ClinicResult<Vec<NaiveTime>> {
        let employee = EmployeeService::new(self.repo.clone())
            .get_by_id(employee_id)
            .await?;
        let duration_minutes = match service_id {
            Some(id) => CatalogService::new(self.repo.clone())
                .get_by_id(id)
                .await?
                .duration_minutes,
            None => None,
        };
        let appointments = self.for_day(date, Some(employee_id)).await?;
        let closures = ClosureService::new(self.repo.clone()).get_all().await?;
        let hours = ClinicInfoService::new(self.repo.clone())
            .hours_for(Weekday::from(date.weekday()))
            .await?;

        Ok(schedule::available_slots(&DayContext {
            date,
            duration_minutes,
            employee: Some(&employee),
            appointments: &appointments,
            closures: &closures,
            hours: hours.as_ref(),
        }))
    }
}

pub fn appointment_stats(appointments: &[Appointment], now: NaiveDateTime) -> AppointmentStats {
    let by_status = AppointmentStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: appointments.iter().filter(|a| a.status == *status).count(),
        })
        .collect();

    AppointmentStats {
        total: appointments.len(),
        today: appointments
            .iter()
            .filter(|a| a.appointment_at.date() == now.date())
            .count(),
        upcoming: appointments
            .iter()
            .filter(|a| a.appointment_at > now && a.status.is_active())
            .count(),
        by_status,
    }
}
