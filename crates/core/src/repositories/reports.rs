use super::appointments::{AppointmentFilter, AppointmentService};
use super::patients::PatientService;
use super::shared::Repo;
use crate::backend::Backend;
use crate::constants::messages;
use crate::reports::{build_report, Report};
use crate::{ClinicError, ClinicResult};
use chrono::NaiveDate;

pub struct ReportService<B> {
    repo: Repo<B>,
}

impl<B: Backend> ReportService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    /// Fetches appointments in `[from, to]` and all patients concurrently, then aggregates.
    /// Fetch failures are already reported by the entity services.
    pub async fn report(&self, from: NaiveDate, to: NaiveDate) -> ClinicResult<Report> {
        if from > to {
            let err = ClinicError::InvalidInput("report range starts after it ends".into());
            return self.repo.reported(messages::LOAD_REPORTS, async { Err(err) }).await;
        }

        let appointments = AppointmentService::new(self.repo.clone());
        let patients = PatientService::new(self.repo.clone());
        let filter = AppointmentFilter {
            from: Some(from),
            to: Some(to),
            ..AppointmentFilter::default()
        };
        let (appointments, patients) =
            tokio::try_join!(appointments.filter(&filter), patients.get_all())?;

        let today = self.repo.now().date();
        Ok(build_report(&appointments, &patients, from, to, today))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{at, fixtures, memory_clinic};
    use chrono::{Duration, NaiveDate};
    use clinic_wire::{AppointmentInput, AppointmentStatus};

    #[tokio::test]
    async fn report_over_backend_data() {
        let (clinic, _backend) = memory_clinic();
        let f = fixtures(&clinic).await;
        let appointments = clinic.appointments();
        for (day, hour) in [(10, 9), (11, 10), (20, 9)] {
            let start = at(2025, 3, day, hour, 0);
            let created = appointments
                .create(&AppointmentInput {
                    patient_id: Some(f.patient.id),
                    employee_id: Some(f.employee.id),
                    service_id: Some(f.service.id),
                    appointment_at: Some(start),
                    appointment_end: Some(start + Duration::minutes(30)),
                    ..AppointmentInput::default()
                })
                .await
                .expect("create");
            if day == 10 {
                appointments
                    .update_status(created.id, AppointmentStatus::Realizada)
                    .await
                    .expect("complete");
            }
        }

        let report = clinic
            .reports()
            .report(
                NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
                NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date"),
            )
            .await
            .expect("report");

        assert_eq!(report.summary.total_appointments, 2);
        assert_eq!(report.summary.completed, 1);
        assert!((report.summary.revenue - f.service.price).abs() < 1e-9);
        assert_eq!(report.summary.total_patients, 1);
        assert_eq!(report.top_services[0].name, "Limpeza");
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let (clinic, _backend) = memory_clinic();
        let err = clinic
            .reports()
            .report(
                NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date"),
                NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
            )
            .await
            .expect_err("inverted");
        assert!(err.is_local_validation());
    }
}
