//! Fixtures shared by the unit tests.

use crate::backend::MemoryBackend;
use crate::{Clinic, CoreConfig};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clinic_wire::{
    ClinicService, Employee, EmployeeInput, EmployeeRole, EmployeeStatus, Patient, PatientInput,
    ServiceCategory, ServiceInput, Specialty, Weekday,
};
use std::sync::Arc;

pub(crate) fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid fixture timestamp")
}

/// Saturday 2025-03-01 08:00.
pub(crate) fn fixed_now() -> NaiveDateTime {
    at(2025, 3, 1, 8, 0)
}

fn clinic_with(
    backend: MemoryBackend,
    smoke_password: Option<&str>,
) -> (Clinic<MemoryBackend>, Arc<MemoryBackend>) {
    let config = CoreConfig::new("http://localhost:54321", "test-anon-key")
        .expect("valid test config")
        .with_smoke_password(smoke_password.map(str::to_string));
    let backend = Arc::new(backend);
    let clinic = Clinic::new(Arc::new(config), Arc::clone(&backend)).with_clock(fixed_now);
    (clinic, backend)
}

pub(crate) fn memory_clinic() -> (Clinic<MemoryBackend>, Arc<MemoryBackend>) {
    clinic_with(MemoryBackend::new(), None)
}

pub(crate) fn memory_clinic_with_user(
    email: &str,
    password: &str,
) -> (Clinic<MemoryBackend>, Arc<MemoryBackend>) {
    clinic_with(MemoryBackend::new().with_user(email, password), None)
}

pub(crate) fn memory_clinic_with_smoke(
    password: Option<&str>,
) -> (Clinic<MemoryBackend>, Arc<MemoryBackend>) {
    clinic_with(MemoryBackend::new(), password)
}

pub(crate) fn patient_input(name: &str, cpf: &str) -> PatientInput {
    PatientInput {
        full_name: name.into(),
        cpf: cpf.into(),
        phone: "(11) 98765-4321".into(),
        email: Some("Paciente@Exemplo.com".into()),
        ..PatientInput::default()
    }
}

/// Active general-practice dentist working Monday to Friday, 08:00 to 18:00.
pub(crate) fn employee_input(name: &str, cpf: &str) -> EmployeeInput {
    EmployeeInput {
        name: name.into(),
        role: EmployeeRole::Dentista,
        specialty: Some(Specialty::ClinicaGeral),
        cpf: cpf.into(),
        registration_number: Some("CRO-SP 12345".into()),
        hire_date: NaiveDate::from_ymd_opt(2020, 1, 6),
        salary: Some(8000.0),
        status: EmployeeStatus::Ativo,
        phone: None,
        email: None,
        work_days: vec![
            Weekday::Segunda,
            Weekday::Terca,
            Weekday::Quarta,
            Weekday::Quinta,
            Weekday::Sexta,
        ],
        start_hour: NaiveTime::from_hms_opt(8, 0, 0),
        end_hour: NaiveTime::from_hms_opt(18, 0, 0),
    }
}

pub(crate) fn service_input(name: &str, duration_minutes: Option<u32>, price: f64) -> ServiceInput {
    ServiceInput {
        name: name.into(),
        description: None,
        category: ServiceCategory::Preventivo,
        duration_minutes,
        price,
        active: true,
    }
}

pub(crate) struct Fixtures {
    pub patient: Patient,
    pub employee: Employee,
    /// "Limpeza", 30 minutes.
    pub service: ClinicService,
    /// "Canal", 90 minutes.
    pub long_service: ClinicService,
}

pub(crate) async fn fixtures(clinic: &Clinic<MemoryBackend>) -> Fixtures {
    let patient = clinic
        .patients()
        .create(&patient_input("Maria Silva", "52998224725"))
        .await
        .expect("fixture patient");
    let employee = clinic
        .employees()
        .create(&employee_input("Dr. Paulo Souza", "11144477735"))
        .await
        .expect("fixture employee");
    let service = clinic
        .services()
        .create(&service_input("Limpeza", Some(30), 150.0))
        .await
        .expect("fixture service");
    let long_service = clinic
        .services()
        .create(&service_input("Canal", Some(90), 900.0))
        .await
        .expect("fixture service");
    Fixtures {
        patient,
        employee,
        service,
        long_service,
    }
}
