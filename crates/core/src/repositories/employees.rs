use super::shared::{digit_needle, Repo};
use crate::backend::{Backend, Query, Table};
use crate::constants::messages;
use crate::events::ClinicEvent;
use crate::validation::{validate_employee, ValidationReport};
use crate::ClinicResult;
use chrono::{Datelike, NaiveDate};
use clinic_wire::employee::{
    self, Employee, EmployeeInput, EmployeeRole, EmployeeRow, EmployeeStatus, Specialty, Weekday,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SEARCH_COLUMNS: [&str; 3] = ["name", "cpf", "registration_number"];

#[derive(Clone, Debug, Default, PartialEq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmployeeFilter {
    pub role: Option<EmployeeRole>,
    pub status: Option<EmployeeStatus>,
    pub specialty: Option<Specialty>,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleCount {
    pub role: EmployeeRole,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub by_role: Vec<RoleCount>,
}

pub struct EmployeeService<B> {
    repo: Repo<B>,
}

impl<B: Backend> EmployeeService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    async fn load(&self, query: &Query) -> ClinicResult<Vec<Employee>> {
        let rows: Vec<EmployeeRow> = self
            .repo
            .reported(messages::LOAD_EMPLOYEES, self.repo.fetch(Table::Employees, query))
            .await?;
        Ok(rows.into_iter().map(employee::from_row).collect())
    }

    pub async fn get_all(&self) -> ClinicResult<Vec<Employee>> {
        self.load(&Query::new().order_by("name", true)).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> ClinicResult<Employee> {
        let row: EmployeeRow = self
            .repo
            .reported(
                messages::LOAD_EMPLOYEE,
                self.repo.fetch_by_id(Table::Employees, id, Query::new()),
            )
            .await?;
        Ok(employee::from_row(row))
    }

    pub fn validate(&self, input: &EmployeeInput) -> ValidationReport {
        validate_employee(input)
    }

    pub async fn create(&self, input: &EmployeeInput) -> ClinicResult<Employee> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let insert = employee::input_to_insert(input);
        let row: EmployeeRow = self
            .repo
            .reported(
                messages::CREATE_EMPLOYEE,
                self.repo.insert(Table::Employees, &insert),
            )
            .await?;
        let created = employee::from_row(row);

        tracing::info!(employee_id = %created.id, "employee created");
        let events = self.repo.events();
        events.publish(ClinicEvent::EmployeeCreated { id: created.id });
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::EMPLOYEE_CREATED);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, input: &EmployeeInput) -> ClinicResult<Employee> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let update = employee::input_to_insert(input);
        let row: EmployeeRow = self
            .repo
            .reported(
                messages::UPDATE_EMPLOYEE,
                self.repo.update(Table::Employees, id, &update),
            )
            .await?;

        let events = self.repo.events();
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::EMPLOYEE_UPDATED);
        Ok(employee::from_row(row))
    }

    pub async fn delete(&self, id: Uuid) -> ClinicResult<()> {
        self.repo
            .reported(
                messages::DELETE_EMPLOYEE,
                self.repo.delete(Table::Employees, id),
            )
            .await?;

        tracing::info!(employee_id = %id, "employee deleted");
        let events = self.repo.events();
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::EMPLOYEE_DELETED);
        Ok(())
    }

    pub async fn search(&self, term: &str) -> ClinicResult<Vec<Employee>> {
        let needle = digit_needle(term).unwrap_or_else(|| term.trim().to_string());
        self.load(
            &Query::new()
                .search(&SEARCH_COLUMNS, &needle)
                .order_by("name", true),
        )
        .await
    }

    pub async fn filter(&self, filter: &EmployeeFilter) -> ClinicResult<Vec<Employee>> {
        let mut query = Query::new().order_by("name", true);
        if let Some(role) = filter.role {
            query = query.eq("role", role.as_str());
        }
        if let Some(status) = filter.status {
            query = query.eq("status", serde_json::to_value(status)?);
        }
        if let Some(specialty) = filter.specialty {
            query = query.eq("specialty", serde_json::to_value(specialty)?);
        }
        self.load(&query).await
    }

    /// Active employees whose work days include `date`'s weekday.
    pub async fn working_on(&self, date: NaiveDate) -> ClinicResult<Vec<Employee>> {
        let day = Weekday::from(date.weekday());
        let employees = self
            .load(
                &Query::new()
                    .eq("status", serde_json::to_value(EmployeeStatus::Ativo)?)
                    .order_by("name", true),
            )
            .await?;
        Ok(employees.into_iter().filter(|e| e.works_on(day)).collect())
    }

    pub async fn get_stats(&self) -> ClinicResult<EmployeeStats> {
        let employees = self.get_all().await?;
        Ok(employee_stats(&employees))
    }
}

pub fn employee_stats(employees: &[Employee]) -> EmployeeStats {
    let active = employees.iter().filter(|e| e.is_active()).count();
    let mut by_role = BTreeMap::<EmployeeRole, usize>::new();
    for e in employees {
        *by_role.entry(e.role).or_default() += 1;
    }

    EmployeeStats {
        total: employees.len(),
        active,
        inactive: employees.len() - active,
        by_role: by_role
            .into_iter()
            .map(|(role, count)| RoleCount { role, count })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{employee_input, memory_clinic};

    #[tokio::test]
    async fn create_and_filter_by_role() {
        let (clinic, _backend) = memory_clinic();
        let service = clinic.employees();
        service
            .create(&employee_input("Dra. Ana", "52998224725"))
            .await
            .expect("create dentist");
        let mut receptionist = employee_input("Paula", "11144477735");
        receptionist.role = EmployeeRole::Recepcionista;
        receptionist.specialty = None;
        service.create(&receptionist).await.expect("create receptionist");

        let dentists = service
            .filter(&EmployeeFilter {
                role: Some(EmployeeRole::Dentista),
                ..EmployeeFilter::default()
            })
            .await
            .expect("filter");
        assert_eq!(dentists.len(), 1);
        assert_eq!(dentists[0].name, "Dra. Ana");

        let stats = service.get_stats().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 2);
        assert_eq!(
            stats.by_role,
            vec![
                RoleCount { role: EmployeeRole::Dentista, count: 1 },
                RoleCount { role: EmployeeRole::Recepcionista, count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn working_on_honours_work_days_and_status() {
        let (clinic, _backend) = memory_clinic();
        let service = clinic.employees();
        // employee_input works Monday to Friday.
        service
            .create(&employee_input("Dra. Ana", "52998224725"))
            .await
            .expect("create");
        let mut inactive = employee_input("Dr. Beto", "11144477735");
        inactive.status = EmployeeStatus::Inativo;
        service.create(&inactive).await.expect("create");

        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date");
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).expect("valid date");

        let working = service.working_on(monday).await.expect("query");
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].name, "Dra. Ana");
        assert!(service.working_on(sunday).await.expect("query").is_empty());
    }

    #[tokio::test]
    async fn invalid_hours_are_rejected() {
        let (clinic, _backend) = memory_clinic();
        let mut input = employee_input("Dra. Ana", "52998224725");
        input.start_hour = chrono::NaiveTime::from_hms_opt(19, 0, 0);
        let err = clinic
            .employees()
            .create(&input)
            .await
            .expect_err("start after end");
        assert!(err.is_local_validation());
    }
}
