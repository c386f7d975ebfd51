//! Password-gated end-to-end check against the configured backend.
//!
//! Runs create, read, update and delete for every entity, records one step per operation
//! and removes whatever it created. Nothing runs unless a smoke password is configured and
//! the caller supplies it.

use crate::backend::Backend;
use crate::{Clinic, ClinicError, ClinicResult};
use chrono::{Duration, NaiveTime};
use clinic_types::cpf_check_digit;
use clinic_wire::{
    AppointmentInput, AppointmentStatus, ClosureInput, ClosureType, ConvenioInput, EmployeeInput,
    EmployeeRole, EmployeeStatus, PatientInput, ServiceCategory, ServiceInput, Weekday,
};
use serde::Serialize;
use std::fmt::Display;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SmokeStep {
    pub name: String,
    pub ok: bool,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SmokeReport {
    pub steps: Vec<SmokeStep>,
}

impl SmokeReport {
    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|s| s.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    fn record<T, E: Display>(&mut self, name: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                tracing::info!(step = name, "smoke step passed");
                self.steps.push(SmokeStep {
                    name: name.to_string(),
                    ok: true,
                    detail: None,
                });
                Some(value)
            }
            Err(e) => {
                tracing::error!(step = name, "smoke step failed: {e}");
                self.steps.push(SmokeStep {
                    name: name.to_string(),
                    ok: false,
                    detail: Some(e.to_string()),
                });
                None
            }
        }
    }

    fn skip(&mut self, name: &str, reason: &str) {
        self.steps.push(SmokeStep {
            name: name.to_string(),
            ok: false,
            detail: Some(format!("skipped: {reason}")),
        });
    }
}

fn check_password(expected: Option<&str>, supplied: &str) -> ClinicResult<()> {
    match expected {
        None => Err(ClinicError::Forbidden("smoke tests are disabled".into())),
        Some(expected) if expected != supplied => {
            Err(ClinicError::Forbidden("invalid smoke test password".into()))
        }
        Some(_) => Ok(()),
    }
}

/// A CPF with valid check digits derived from `seed`, so repeated runs do not collide.
pub(crate) fn generated_cpf(seed: Uuid) -> String {
    let mut digits: Vec<u32> = seed
        .as_bytes()
        .iter()
        .take(9)
        .map(|b| u32::from(*b) % 10)
        .collect();
    if digits.iter().all(|d| *d == digits[0]) {
        digits[0] = (digits[0] + 1) % 10;
    }
    for _ in 0..2 {
        digits.push(cpf_check_digit(&digits));
    }
    digits.iter().map(|d| d.to_string()).collect()
}

/// Runs the smoke sequence if `password` matches the configured one.
pub async fn run_smoke<B: Backend>(clinic: &Clinic<B>, password: &str) -> ClinicResult<SmokeReport> {
    check_password(clinic.config().smoke_password(), password)?;

    let tag = Uuid::new_v4();
    let short = &tag.simple().to_string()[..8];
    let mut report = SmokeReport::default();
    tracing::info!(run = short, "smoke run started");

    // Patients
    let patients = clinic.patients();
    let patient_input = PatientInput {
        full_name: format!("Smoke Paciente {short}"),
        cpf: generated_cpf(tag),
        phone: "11987654321".into(),
        notes: Some("smoke".into()),
        ..PatientInput::default()
    };
    let patient = report.record("patients.create", patients.create(&patient_input).await);
    if let Some(p) = &patient {
        report.record("patients.get", patients.get_by_id(p.id).await);
        let mut edited = patient_input.clone();
        edited.address = Some("Rua do Teste, 1".into());
        report.record("patients.update", patients.update(p.id, &edited).await);
    }

    // Employees
    let employees = clinic.employees();
    let employee_input = EmployeeInput {
        name: format!("Smoke Profissional {short}"),
        role: EmployeeRole::Dentista,
        specialty: None,
        cpf: generated_cpf(Uuid::new_v4()),
        registration_number: None,
        hire_date: None,
        salary: None,
        status: EmployeeStatus::Ativo,
        phone: None,
        email: None,
        work_days: Weekday::ALL.to_vec(),
        start_hour: NaiveTime::from_hms_opt(8, 0, 0),
        end_hour: NaiveTime::from_hms_opt(18, 0, 0),
    };
    let employee = report.record("employees.create", employees.create(&employee_input).await);
    if let Some(e) = &employee {
        report.record("employees.get", employees.get_by_id(e.id).await);
        let mut edited = employee_input.clone();
        edited.registration_number = Some("CRO-SMOKE".into());
        report.record("employees.update", employees.update(e.id, &edited).await);
    }

    // Services
    let services = clinic.services();
    let service_input = ServiceInput {
        name: format!("Smoke Serviço {short}"),
        description: None,
        category: ServiceCategory::Diagnostico,
        duration_minutes: Some(30),
        price: 1.0,
        active: true,
    };
    let service = report.record("services.create", services.create(&service_input).await);
    if let Some(s) = &service {
        report.record("services.get", services.get_by_id(s.id).await);
        let mut edited = service_input.clone();
        edited.price = 2.0;
        report.record("services.update", services.update(s.id, &edited).await);
    }

    // Appointments
    let appointments = clinic.appointments();
    match (&patient, &employee, &service) {
        (Some(p), Some(e), Some(s)) => {
            let start = (clinic.now().date() + Duration::days(7))
                .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN));
            let input = AppointmentInput {
                patient_id: Some(p.id),
                employee_id: Some(e.id),
                service_id: Some(s.id),
                appointment_at: Some(start),
                appointment_end: Some(start + Duration::minutes(30)),
                notes: Some("smoke".into()),
                ..AppointmentInput::default()
            };
            if let Some(a) = report.record("appointments.create", appointments.create(&input).await) {
                report.record("appointments.get", appointments.get_by_id(a.id).await);
                report.record(
                    "appointments.update_status",
                    appointments
                        .update_status(a.id, AppointmentStatus::Confirmada)
                        .await,
                );
                report.record("appointments.delete", appointments.delete(a.id).await);
            }
        }
        _ => report.skip("appointments", "patient, employee or service missing"),
    }

    // Closures
    let closures = clinic.closures();
    let day = clinic.now().date() + Duration::days(365);
    let closure_input = ClosureInput {
        title: format!("Smoke Fechamento {short}"),
        start_date: day,
        end_date: day,
        closure_type: ClosureType::Outro,
        recurring: false,
        notes: None,
    };
    if let Some(c) = report.record("closures.create", closures.create(&closure_input).await) {
        report.record("closures.get", closures.get_by_id(c.id).await);
        let mut edited = closure_input.clone();
        edited.notes = Some("smoke".into());
        report.record("closures.update", closures.update(c.id, &edited).await);
        report.record("closures.delete", closures.delete(c.id).await);
    }

    // Convenios
    let convenios = clinic.convenios();
    let convenio_input = ConvenioInput {
        name: format!("Smoke Convênio {short}"),
        code: Some(format!("SMOKE-{short}")),
        discount_percentage: Some(5.0),
        phone: None,
        email: None,
        active: false,
    };
    if let Some(c) = report.record("convenios.create", convenios.create(&convenio_input).await) {
        report.record("convenios.get", convenios.get_by_id(c.id).await);
        let mut edited = convenio_input.clone();
        edited.discount_percentage = Some(10.0);
        report.record("convenios.update", convenios.update(c.id, &edited).await);
        report.record("convenios.delete", convenios.delete(c.id).await);
    }

    // Cleanup, in dependency order.
    if let Some(s) = &service {
        report.record("services.delete", services.delete(s.id).await);
    }
    if let Some(e) = &employee {
        report.record("employees.delete", employees.delete(e.id).await);
    }
    if let Some(p) = &patient {
        report.record("patients.delete", patients.delete(p.id).await);
    }

    tracing::info!(
        run = short,
        passed = report.passed(),
        failed = report.failed(),
        "smoke run finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Table;
    use crate::test_support::memory_clinic_with_smoke;

    #[test]
    fn generated_cpfs_are_valid() {
        for _ in 0..50 {
            let cpf = generated_cpf(Uuid::new_v4());
            assert_eq!(cpf.len(), 11);
            assert!(clinic_types::is_valid_cpf(&cpf), "{cpf} should be valid");
        }
    }

    #[tokio::test]
    async fn refuses_without_configured_password() {
        let (clinic, _backend) = memory_clinic_with_smoke(None);
        let err = run_smoke(&clinic, "anything").await.expect_err("disabled");
        assert!(matches!(err, ClinicError::Forbidden(_)));
    }

    #[tokio::test]
    async fn refuses_wrong_password() {
        let (clinic, backend) = memory_clinic_with_smoke(Some("s3nha"));
        let err = run_smoke(&clinic, "errada").await.expect_err("wrong");
        assert!(matches!(err, ClinicError::Forbidden(_)));
        assert!(backend.rows(Table::Patients).is_empty());
    }

    #[tokio::test]
    async fn full_run_passes_and_cleans_up() {
        let (clinic, backend) = memory_clinic_with_smoke(Some("s3nha"));
        let report = run_smoke(&clinic, "s3nha").await.expect("authorised");

        assert!(report.all_passed(), "failed steps: {:?}", report.steps);
        assert_eq!(report.steps.len(), 24);
        for table in [
            Table::Patients,
            Table::Employees,
            Table::Services,
            Table::Appointments,
            Table::Closures,
            Table::Convenios,
        ] {
            assert!(backend.rows(table).is_empty(), "{table} not cleaned up");
        }
    }
}
