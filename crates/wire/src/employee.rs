//! Employee rows, view model and mappers, plus the work-schedule enumerations.

use crate::WireError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clinic_types::digits_only;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Dentista,
    Auxiliar,
    Higienista,
    Recepcionista,
    Gerente,
    Administrativo,
}

impl EmployeeRole {
    pub const ALL: [EmployeeRole; 6] = [
        EmployeeRole::Dentista,
        EmployeeRole::Auxiliar,
        EmployeeRole::Higienista,
        EmployeeRole::Recepcionista,
        EmployeeRole::Gerente,
        EmployeeRole::Administrativo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeRole::Dentista => "dentista",
            EmployeeRole::Auxiliar => "auxiliar",
            EmployeeRole::Higienista => "higienista",
            EmployeeRole::Recepcionista => "recepcionista",
            EmployeeRole::Gerente => "gerente",
            EmployeeRole::Administrativo => "administrativo",
        }
    }

    /// Roles that see patients in their own appointment slots.
    pub fn is_clinical(self) -> bool {
        matches!(self, EmployeeRole::Dentista | EmployeeRole::Higienista)
    }
}

impl FromStr for EmployeeRole {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmployeeRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| WireError::InvalidInput(format!("unknown employee role '{s}'")))
    }
}

/// Dentistry sub-field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    ClinicaGeral,
    Ortodontia,
    Endodontia,
    Periodontia,
    Implantodontia,
    Odontopediatria,
    Protese,
    Cirurgia,
    Estetica,
}

impl Specialty {
    pub const ALL: [Specialty; 9] = [
        Specialty::ClinicaGeral,
        Specialty::Ortodontia,
        Specialty::Endodontia,
        Specialty::Periodontia,
        Specialty::Implantodontia,
        Specialty::Odontopediatria,
        Specialty::Protese,
        Specialty::Cirurgia,
        Specialty::Estetica,
    ];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Ativo,
    Inativo,
}

/// Day of the week as stored in `work_days` and `clinic_hours.weekday`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Segunda,
    Terca,
    Quarta,
    Quinta,
    Sexta,
    Sabado,
    Domingo,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Segunda,
        Weekday::Terca,
        Weekday::Quarta,
        Weekday::Quinta,
        Weekday::Sexta,
        Weekday::Sabado,
        Weekday::Domingo,
    ];
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Segunda,
            chrono::Weekday::Tue => Weekday::Terca,
            chrono::Weekday::Wed => Weekday::Quarta,
            chrono::Weekday::Thu => Weekday::Quinta,
            chrono::Weekday::Fri => Weekday::Sexta,
            chrono::Weekday::Sat => Weekday::Sabado,
            chrono::Weekday::Sun => Weekday::Domingo,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// An `employees` row as returned by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EmployeeRow {
    pub id: Uuid,
    pub name: String,
    pub role: EmployeeRole,
    #[serde(default)]
    pub specialty: Option<Specialty>,
    pub cpf: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub work_days: Vec<Weekday>,
    #[serde(default, with = "crate::timestamp::time_option")]
    pub start_hour: Option<NaiveTime>,
    #[serde(default, with = "crate::timestamp::time_option")]
    pub end_hour: Option<NaiveTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload written on insert and on full-form update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmployeeInsert {
    pub name: String,
    pub role: EmployeeRole,
    pub specialty: Option<Specialty>,
    pub cpf: String,
    pub registration_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub status: EmployeeStatus,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub work_days: Vec<Weekday>,
    #[serde(with = "crate::timestamp::time_option")]
    pub start_hour: Option<NaiveTime>,
    #[serde(with = "crate::timestamp::time_option")]
    pub end_hour: Option<NaiveTime>,
}

// ============================================================================
// Domain types
// ============================================================================

/// Employee view model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub role: EmployeeRole,
    pub specialty: Option<Specialty>,
    pub cpf: String,
    pub registration_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub status: EmployeeStatus,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub work_days: Vec<Weekday>,
    #[schema(value_type = Option<String>, example = "08:00")]
    pub start_hour: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:00")]
    pub end_hour: Option<NaiveTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Ativo
    }

    /// True when a work schedule (days or hours) has been set.
    pub fn has_schedule(&self) -> bool {
        !self.work_days.is_empty() || self.start_hour.is_some() || self.end_hour.is_some()
    }

    pub fn works_on(&self, day: Weekday) -> bool {
        self.work_days.contains(&day)
    }
}

/// Create/edit submission as typed into the employee form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub name: String,
    pub role: EmployeeRole,
    #[serde(default)]
    pub specialty: Option<Specialty>,
    pub cpf: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub work_days: Vec<Weekday>,
    #[serde(default, with = "crate::timestamp::time_option")]
    #[schema(value_type = Option<String>, example = "08:00")]
    pub start_hour: Option<NaiveTime>,
    #[serde(default, with = "crate::timestamp::time_option")]
    #[schema(value_type = Option<String>, example = "18:00")]
    pub end_hour: Option<NaiveTime>,
}

// ============================================================================
// Mappers
// ============================================================================

pub fn from_row(row: EmployeeRow) -> Employee {
    Employee {
        id: row.id,
        name: row.name,
        role: row.role,
        specialty: row.specialty,
        cpf: row.cpf,
        registration_number: row.registration_number,
        hire_date: row.hire_date,
        salary: row.salary,
        status: row.status,
        phone: row.phone,
        email: row.email,
        work_days: row.work_days,
        start_hour: row.start_hour,
        end_hour: row.end_hour,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub fn to_insert(employee: &Employee) -> EmployeeInsert {
    EmployeeInsert {
        name: employee.name.clone(),
        role: employee.role,
        specialty: employee.specialty,
        cpf: employee.cpf.clone(),
        registration_number: employee.registration_number.clone(),
        hire_date: employee.hire_date,
        salary: employee.salary,
        status: employee.status,
        phone: employee.phone.clone(),
        email: employee.email.clone(),
        work_days: employee.work_days.clone(),
        start_hour: employee.start_hour,
        end_hour: employee.end_hour,
    }
}

/// Form submission → insert/update payload. Work days are deduplicated and sorted
/// Monday first.
pub fn input_to_insert(input: &EmployeeInput) -> EmployeeInsert {
    let mut work_days = input.work_days.clone();
    work_days.sort();
    work_days.dedup();

    EmployeeInsert {
        name: input.name.trim().to_owned(),
        role: input.role,
        specialty: input.specialty,
        cpf: digits_only(&input.cpf),
        registration_number: crate::clean_optional(&input.registration_number),
        hire_date: input.hire_date,
        salary: input.salary,
        status: input.status,
        phone: crate::clean_optional(&input.phone).map(|p| digits_only(&p)),
        email: crate::clean_optional(&input.email).map(|e| e.to_lowercase()),
        work_days,
        start_hour: input.start_hour,
        end_hour: input.end_hour,
    }
}

pub fn to_input(employee: &Employee) -> EmployeeInput {
    EmployeeInput {
        name: employee.name.clone(),
        role: employee.role,
        specialty: employee.specialty,
        cpf: employee.cpf.clone(),
        registration_number: employee.registration_number.clone(),
        hire_date: employee.hire_date,
        salary: employee.salary,
        status: employee.status,
        phone: employee.phone.clone(),
        email: employee.email.clone(),
        work_days: employee.work_days.clone(),
        start_hour: employee.start_hour,
        end_hour: employee.end_hour,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_row;
    use serde_json::json;

    fn sample_row() -> EmployeeRow {
        parse_row(json!({
            "id": "7d0e9c3a-2b1f-4a5e-9c8d-7b6a5f4e3d21",
            "name": "Dra. Carla Mendes",
            "role": "dentista",
            "specialty": "ortodontia",
            "cpf": "11144477735",
            "registration_number": "CRO-SP 12345",
            "hire_date": "2020-02-01",
            "salary": 9500.0,
            "status": "ativo",
            "phone": "1134567890",
            "email": "carla@clinica.com",
            "work_days": ["segunda", "quarta", "sexta"],
            "start_hour": "08:00:00",
            "end_hour": "17:00:00"
        }))
        .expect("row should parse")
    }

    #[test]
    fn parses_time_columns_and_work_days() {
        let employee = from_row(sample_row());
        assert_eq!(employee.start_hour, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(employee.end_hour, NaiveTime::from_hms_opt(17, 0, 0));
        assert!(employee.works_on(Weekday::Quarta));
        assert!(!employee.works_on(Weekday::Terca));
        assert!(employee.has_schedule());
        assert!(employee.is_active());
    }

    #[test]
    fn round_trip_preserves_shared_fields() {
        let row = sample_row();
        let insert = to_insert(&from_row(row.clone()));

        assert_eq!(insert.name, row.name);
        assert_eq!(insert.role, row.role);
        assert_eq!(insert.specialty, row.specialty);
        assert_eq!(insert.cpf, row.cpf);
        assert_eq!(insert.registration_number, row.registration_number);
        assert_eq!(insert.hire_date, row.hire_date);
        assert_eq!(insert.salary, row.salary);
        assert_eq!(insert.status, row.status);
        assert_eq!(insert.phone, row.phone);
        assert_eq!(insert.email, row.email);
        assert_eq!(insert.work_days, row.work_days);
        assert_eq!(insert.start_hour, row.start_hour);
        assert_eq!(insert.end_hour, row.end_hour);
    }

    #[test]
    fn insert_writes_short_times() {
        let insert = to_insert(&from_row(sample_row()));
        let value = serde_json::to_value(&insert).expect("serialize");
        assert_eq!(value["start_hour"], "08:00");
        assert_eq!(value["work_days"], json!(["segunda", "quarta", "sexta"]));
    }

    #[test]
    fn input_sorts_and_dedups_work_days() {
        let mut input = to_input(&from_row(sample_row()));
        input.work_days = vec![Weekday::Sexta, Weekday::Segunda, Weekday::Sexta];
        let insert = input_to_insert(&input);
        assert_eq!(insert.work_days, vec![Weekday::Segunda, Weekday::Sexta]);
    }

    #[test]
    fn weekday_from_chrono() {
        assert_eq!(Weekday::from(chrono::Weekday::Mon), Weekday::Segunda);
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Domingo);
    }
}
