//! Patient rows, view model and mappers.
//!
//! CPF and phone are stored as digits only; masks are a display concern.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use clinic_types::digits_only;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A `patients` row as returned by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PatientRow {
    pub id: Uuid,
    pub full_name: String,
    pub cpf: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub convenio_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload written on insert and on full-form update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientInsert {
    pub full_name: String,
    pub cpf: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub convenio_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Patient view model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub cpf: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub convenio_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Patient {
    /// Age in whole years on `today`, if the birth date is known and not in the future.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        if birth > today {
            return None;
        }
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

/// Create/edit submission as typed into the patient form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub full_name: String,
    pub cpf: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub convenio_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Row → view model.
pub fn from_row(row: PatientRow) -> Patient {
    Patient {
        id: row.id,
        full_name: row.full_name,
        cpf: row.cpf,
        birth_date: row.birth_date,
        phone: row.phone,
        email: row.email,
        address: row.address,
        convenio_id: row.convenio_id,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// View model → insert payload.
pub fn to_insert(patient: &Patient) -> PatientInsert {
    PatientInsert {
        full_name: patient.full_name.clone(),
        cpf: patient.cpf.clone(),
        birth_date: patient.birth_date,
        phone: patient.phone.clone(),
        email: patient.email.clone(),
        address: patient.address.clone(),
        convenio_id: patient.convenio_id,
        notes: patient.notes.clone(),
    }
}

/// Form submission → insert/update payload, normalising masks and blank fields.
pub fn input_to_insert(input: &PatientInput) -> PatientInsert {
    PatientInsert {
        full_name: input.full_name.trim().to_owned(),
        cpf: digits_only(&input.cpf),
        birth_date: input.birth_date,
        phone: digits_only(&input.phone),
        email: crate::clean_optional(&input.email).map(|e| e.to_lowercase()),
        address: crate::clean_optional(&input.address),
        convenio_id: input.convenio_id,
        notes: crate::clean_optional(&input.notes),
    }
}

/// View model → edit form contents.
pub fn to_input(patient: &Patient) -> PatientInput {
    PatientInput {
        full_name: patient.full_name.clone(),
        cpf: patient.cpf.clone(),
        birth_date: patient.birth_date,
        phone: patient.phone.clone(),
        email: patient.email.clone(),
        address: patient.address.clone(),
        convenio_id: patient.convenio_id,
        notes: patient.notes.clone(),
    }
}
