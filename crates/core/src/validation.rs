//! Input validation for every entity form.
//!
//! Each `validate_*` function is pure and total: it always returns a [`ValidationReport`]
//! listing every broken rule, never an error. Services run these before touching the
//! backend, so a failed validation never reaches the network.

use chrono::{NaiveDate, NaiveDateTime};
use clinic_types::{is_valid_cpf, is_valid_email, is_valid_phone};
use clinic_wire::{
    AppointmentInput, ClosureInput, ConvenioInput, EmployeeInput, PatientInput, ServiceInput,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of validating one form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn valid() -> Self {
        Self::from_errors(Vec::new())
    }
}

#[derive(Default)]
struct Rules {
    errors: Vec<String>,
}

impl Rules {
    fn check(&mut self, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(message.to_string());
        }
        self
    }

    fn finish(&mut self) -> ValidationReport {
        ValidationReport::from_errors(std::mem::take(&mut self.errors))
    }
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

fn optional_present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_patient(input: &PatientInput, today: NaiveDate) -> ValidationReport {
    let mut rules = Rules::default();
    rules
        .check(present(&input.full_name), "Nome é obrigatório")
        .check(present(&input.cpf), "CPF é obrigatório");
    if present(&input.cpf) {
        rules.check(is_valid_cpf(&input.cpf), "CPF inválido");
    }
    rules.check(present(&input.phone), "Telefone é obrigatório");
    if present(&input.phone) {
        rules.check(is_valid_phone(&input.phone), "Telefone inválido");
    }
    if let Some(email) = optional_present(&input.email) {
        rules.check(is_valid_email(email), "E-mail inválido");
    }
    if let Some(birth) = input.birth_date {
        rules.check(birth <= today, "Data de nascimento não pode ser futura");
    }
    rules.finish()
}

pub fn validate_employee(input: &EmployeeInput) -> ValidationReport {
    let mut rules = Rules::default();
    rules
        .check(present(&input.name), "Nome é obrigatório")
        .check(present(&input.cpf), "CPF é obrigatório");
    if present(&input.cpf) {
        rules.check(is_valid_cpf(&input.cpf), "CPF inválido");
    }
    if let Some(phone) = optional_present(&input.phone) {
        rules.check(is_valid_phone(phone), "Telefone inválido");
    }
    if let Some(email) = optional_present(&input.email) {
        rules.check(is_valid_email(email), "E-mail inválido");
    }
    if let Some(salary) = input.salary {
        rules.check(salary >= 0.0, "Salário não pode ser negativo");
    }
    if let (Some(start), Some(end)) = (input.start_hour, input.end_hour) {
        rules.check(
            start < end,
            "Horário de início deve ser anterior ao horário de término",
        );
    }
    if input.start_hour.is_some() || input.end_hour.is_some() {
        rules.check(
            !input.work_days.is_empty(),
            "Selecione pelo menos um dia de trabalho",
        );
    }
    rules.finish()
}

pub fn validate_service(input: &ServiceInput) -> ValidationReport {
    let mut rules = Rules::default();
    rules
        .check(present(&input.name), "Nome é obrigatório")
        .check(
            input.duration_minutes.map_or(true, |d| d > 0),
            "Duração deve ser maior que zero",
        )
        .check(
            input.price.is_finite() && input.price >= 0.0,
            "Preço não pode ser negativo",
        );
    rules.finish()
}

/// Validates an appointment submission against the wall-clock time `now`.
/// Rules for a new appointment: the start may not be in the past.
pub fn validate_appointment(input: &AppointmentInput, now: NaiveDateTime) -> ValidationReport {
    appointment_rules(input, now, None)
}

/// Rules for editing an appointment that currently starts at `previous_start`. The past
/// check only applies when the start moves.
pub fn validate_appointment_edit(
    input: &AppointmentInput,
    now: NaiveDateTime,
    previous_start: NaiveDateTime,
) -> ValidationReport {
    appointment_rules(input, now, Some(previous_start))
}

fn appointment_rules(
    input: &AppointmentInput,
    now: NaiveDateTime,
    previous_start: Option<NaiveDateTime>,
) -> ValidationReport {
    let mut rules = Rules::default();
    rules
        .check(input.patient_id.is_some(), "Paciente é obrigatório")
        .check(input.employee_id.is_some(), "Profissional é obrigatório")
        .check(input.service_id.is_some(), "Serviço é obrigatório")
        .check(input.appointment_at.is_some(), "Data e horário são obrigatórios");

    if let Some(start) = input.appointment_at {
        if previous_start != Some(start) {
            rules.check(start >= now, "Não é possível agendar no passado");
        }
        if let Some(end) = input.appointment_end {
            rules.check(
                end > start,
                "Horário de término deve ser posterior ao início",
            );
        }
    }
    rules.finish()
}

pub fn validate_closure(input: &ClosureInput) -> ValidationReport {
    let mut rules = Rules::default();
    rules
        .check(present(&input.title), "Título é obrigatório")
        .check(
            input.end_date >= input.start_date,
            "Data final não pode ser anterior à data inicial",
        );
    rules.finish()
}

pub fn validate_convenio(input: &ConvenioInput) -> ValidationReport {
    let mut rules = Rules::default();
    rules.check(present(&input.name), "Nome é obrigatório");
    if let Some(discount) = input.discount_percentage {
        rules.check(
            (0.0..=100.0).contains(&discount),
            "Desconto deve estar entre 0 e 100%",
        );
    }
    if let Some(phone) = optional_present(&input.phone) {
        rules.check(is_valid_phone(phone), "Telefone inválido");
    }
    if let Some(email) = optional_present(&input.email) {
        rules.check(is_valid_email(email), "E-mail inválido");
    }
    rules.finish()
}
