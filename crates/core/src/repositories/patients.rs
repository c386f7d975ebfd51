use super::shared::{digit_needle, Repo};
use crate::backend::{Backend, Query, Table};
use crate::constants::messages;
use crate::events::ClinicEvent;
use crate::validation::{validate_patient, ValidationReport};
use crate::ClinicResult;
use chrono::{Datelike, NaiveDate};
use clinic_wire::patient::{self, Patient, PatientInput, PatientRow};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SEARCH_COLUMNS: [&str; 4] = ["full_name", "cpf", "phone", "email"];

#[derive(Clone, Debug, Default, PartialEq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PatientFilter {
    pub convenio_id: Option<Uuid>,
    pub born_from: Option<NaiveDate>,
    pub born_to: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total: usize,
    pub new_this_month: usize,
    pub with_convenio: usize,
    pub average_age: Option<f64>,
}

pub struct PatientService<B> {
    repo: Repo<B>,
}

impl<B: Backend> PatientService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    pub async fn get_all(&self) -> ClinicResult<Vec<Patient>> {
        let query = Query::new().order_by("full_name", true);
        let rows: Vec<PatientRow> = self
            .repo
            .reported(messages::LOAD_PATIENTS, self.repo.fetch(Table::Patients, &query))
            .await?;
        Ok(rows.into_iter().map(patient::from_row).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> ClinicResult<Patient> {
        let row: PatientRow = self
            .repo
            .reported(
                messages::LOAD_PATIENT,
                self.repo.fetch_by_id(Table::Patients, id, Query::new()),
            )
            .await?;
        Ok(patient::from_row(row))
    }

    pub fn validate(&self, input: &PatientInput) -> ValidationReport {
        validate_patient(input, self.repo.now().date())
    }

    pub async fn create(&self, input: &PatientInput) -> ClinicResult<Patient> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let insert = patient::input_to_insert(input);
        let row: PatientRow = self
            .repo
            .reported(
                messages::CREATE_PATIENT,
                self.repo.insert(Table::Patients, &insert),
            )
            .await?;
        let created = patient::from_row(row);

        tracing::info!(patient_id = %created.id, "patient created");
        let events = self.repo.events();
        events.publish(ClinicEvent::PatientCreated { id: created.id });
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::PATIENT_CREATED);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, input: &PatientInput) -> ClinicResult<Patient> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let update = patient::input_to_insert(input);
        let row: PatientRow = self
            .repo
            .reported(
                messages::UPDATE_PATIENT,
                self.repo.update(Table::Patients, id, &update),
            )
            .await?;

        let events = self.repo.events();
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::PATIENT_UPDATED);
        Ok(patient::from_row(row))
    }

    pub async fn delete(&self, id: Uuid) -> ClinicResult<()> {
        self.repo
            .reported(
                messages::DELETE_PATIENT,
                self.repo.delete(Table::Patients, id),
            )
            .await?;

        tracing::info!(patient_id = %id, "patient deleted");
        let events = self.repo.events();
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::PATIENT_DELETED);
        Ok(())
    }

    /// Name, CPF, phone or e-mail containing `term`. Masked CPF/phone input matches the
    /// stored digits.
    pub async fn search(&self, term: &str) -> ClinicResult<Vec<Patient>> {
        let needle = digit_needle(term).unwrap_or_else(|| term.trim().to_string());
        let query = Query::new()
            .search(&SEARCH_COLUMNS, &needle)
            .order_by("full_name", true);
        let rows: Vec<PatientRow> = self
            .repo
            .reported(messages::LOAD_PATIENTS, self.repo.fetch(Table::Patients, &query))
            .await?;
        Ok(rows.into_iter().map(patient::from_row).collect())
    }

    pub async fn filter(&self, filter: &PatientFilter) -> ClinicResult<Vec<Patient>> {
        let mut query = Query::new().order_by("full_name", true);
        if let Some(convenio_id) = filter.convenio_id {
            query = query.eq("convenio_id", convenio_id.to_string());
        }
        if let Some(from) = filter.born_from {
            query = query.gte("birth_date", from.to_string());
        }
        if let Some(to) = filter.born_to {
            query = query.lte("birth_date", to.to_string());
        }

        let rows: Vec<PatientRow> = self
            .repo
            .reported(messages::LOAD_PATIENTS, self.repo.fetch(Table::Patients, &query))
            .await?;
        Ok(rows.into_iter().map(patient::from_row).collect())
    }

    pub async fn get_stats(&self) -> ClinicResult<PatientStats> {
        let patients = self.get_all().await?;
        Ok(patient_stats(&patients, self.repo.now().date()))
    }
}

pub fn patient_stats(patients: &[Patient], today: NaiveDate) -> PatientStats {
    let new_this_month = patients
        .iter()
        .filter_map(|p| p.created_at)
        .filter(|created| created.year() == today.year() && created.month() == today.month())
        .count();
    let with_convenio = patients.iter().filter(|p| p.convenio_id.is_some()).count();

    let ages = patients
        .iter()
        .filter_map(|p| p.age_on(today))
        .collect::<Vec<_>>();
    let average_age = (!ages.is_empty())
        .then(|| f64::from(ages.iter().sum::<u32>()) / ages.len() as f64);

    PatientStats {
        total: patients.len(),
        new_this_month,
        with_convenio,
        average_age,
    }
}

#[cfg(test)]
mod tests {
    use crate::events::{ClinicEvent, NotificationLevel};
    use crate::test_support::{memory_clinic, patient_input};
    use crate::ClinicError;

    #[tokio::test]
    async fn create_normalises_and_publishes() {
        let (clinic, _backend) = memory_clinic();
        let mut rx = clinic.events().subscribe();

        let created = clinic
            .patients()
            .create(&patient_input("Maria Silva", "529.982.247-25"))
            .await
            .expect("create should succeed");

        assert_eq!(created.cpf, "52998224725");
        assert_eq!(created.phone, "11987654321");
        assert_eq!(
            rx.recv().await.expect("event"),
            ClinicEvent::PatientCreated { id: created.id }
        );
        assert_eq!(
            rx.recv().await.expect("event"),
            ClinicEvent::RefreshDialogData
        );
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_backend() {
        let (clinic, backend) = memory_clinic();
        let mut rx = clinic.events().subscribe();

        let err = clinic
            .patients()
            .create(&patient_input("Maria", "123.456.789-00"))
            .await
            .expect_err("invalid CPF should be rejected");

        assert!(matches!(err, ClinicError::Validation(_)));
        assert!(backend.rows(crate::backend::Table::Patients).is_empty());
        assert_eq!(
            rx.recv().await.expect("event"),
            ClinicEvent::Notification {
                level: NotificationLevel::Warning,
                message: "CPF inválido".into(),
            }
        );
    }

    #[tokio::test]
    async fn failed_load_publishes_fixed_message() {
        let (clinic, backend) = memory_clinic();
        let mut rx = clinic.events().subscribe();
        backend.set_unavailable(true);

        let err = clinic
            .patients()
            .get_all()
            .await
            .expect_err("backend is down");
        assert!(err.is_remote());
        assert_eq!(
            rx.recv().await.expect("event"),
            ClinicEvent::Notification {
                level: NotificationLevel::Error,
                message: "Erro ao carregar pacientes".into(),
            }
        );
    }

    #[tokio::test]
    async fn search_matches_masked_cpf_and_name() {
        let (clinic, _backend) = memory_clinic();
        let service = clinic.patients();
        service
            .create(&patient_input("Maria Silva", "529.982.247-25"))
            .await
            .expect("create");
        service
            .create(&patient_input("João Souza", "111.444.777-35"))
            .await
            .expect("create");

        let by_cpf = service.search("529.982").await.expect("search");
        assert_eq!(by_cpf.len(), 1);
        assert_eq!(by_cpf[0].full_name, "Maria Silva");

        let by_name = service.search("souza").await.expect("search");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].full_name, "João Souza");
    }

    #[tokio::test]
    async fn update_get_and_delete_round_trip() {
        let (clinic, _backend) = memory_clinic();
        let service = clinic.patients();
        let created = service
            .create(&patient_input("Maria Silva", "52998224725"))
            .await
            .expect("create");

        let mut input = clinic_wire::patient::to_input(&created);
        input.full_name = "Maria S. Costa".into();
        let updated = service.update(created.id, &input).await.expect("update");
        assert_eq!(updated.full_name, "Maria S. Costa");
        assert_eq!(
            service.get_by_id(created.id).await.expect("get").full_name,
            "Maria S. Costa"
        );

        service.delete(created.id).await.expect("delete");
        assert!(matches!(
            service.get_by_id(created.id).await,
            Err(ClinicError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn stats_count_month_and_average_age() {
        let (clinic, _backend) = memory_clinic();
        let service = clinic.patients();
        let mut input = patient_input("Maria Silva", "52998224725");
        input.birth_date = chrono::NaiveDate::from_ymd_opt(1995, 3, 1);
        service.create(&input).await.expect("create");
        service
            .create(&patient_input("João Souza", "11144477735"))
            .await
            .expect("create");

        let stats = service.get_stats().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.with_convenio, 0);
        assert_eq!(stats.average_age, Some(30.0));
    }
}
