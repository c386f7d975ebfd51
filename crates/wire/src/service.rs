//! Service catalog rows, view model and mappers.
//!
//! `times_used` is a counter maintained by the clinic when appointments are completed; a
//! catalog edit never writes it, so [`ServiceUpdate`] leaves it out.

use crate::appointment::DEFAULT_DURATION_MINUTES;
use crate::WireError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Clinical category of a catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Preventivo,
    Restaurador,
    Endodontia,
    Periodontia,
    Ortodontia,
    Cirurgia,
    Protese,
    Estetica,
    Implante,
    Diagnostico,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 10] = [
        ServiceCategory::Preventivo,
        ServiceCategory::Restaurador,
        ServiceCategory::Endodontia,
        ServiceCategory::Periodontia,
        ServiceCategory::Ortodontia,
        ServiceCategory::Cirurgia,
        ServiceCategory::Protese,
        ServiceCategory::Estetica,
        ServiceCategory::Implante,
        ServiceCategory::Diagnostico,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCategory::Preventivo => "preventivo",
            ServiceCategory::Restaurador => "restaurador",
            ServiceCategory::Endodontia => "endodontia",
            ServiceCategory::Periodontia => "periodontia",
            ServiceCategory::Ortodontia => "ortodontia",
            ServiceCategory::Cirurgia => "cirurgia",
            ServiceCategory::Protese => "protese",
            ServiceCategory::Estetica => "estetica",
            ServiceCategory::Implante => "implante",
            ServiceCategory::Diagnostico => "diagnostico",
        }
    }
}

impl FromStr for ServiceCategory {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| WireError::InvalidInput(format!("unknown service category '{s}'")))
    }
}

fn default_active() -> bool {
    true
}

/// A `services` row as returned by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ServiceRow {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: ServiceCategory,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub price: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub times_used: u32,
    #[serde(default, with = "crate::timestamp::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "crate::timestamp::option")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Payload written on insert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceInsert {
    pub name: String,
    pub description: Option<String>,
    pub category: ServiceCategory,
    pub duration_minutes: Option<u32>,
    pub price: f64,
    pub active: bool,
    pub times_used: u32,
}

/// Payload written on full-form update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub name: String,
    pub description: Option<String>,
    pub category: ServiceCategory,
    pub duration_minutes: Option<u32>,
    pub price: f64,
    pub active: bool,
}

/// A service offered by the clinic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: ServiceCategory,
    pub duration_minutes: Option<u32>,
    pub price: f64,
    pub active: bool,
    pub times_used: u32,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl ClinicService {
    /// Duration used for scheduling: the declared one, or the clinic default.
    pub fn effective_duration(&self) -> u32 {
        self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: ServiceCategory,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub price: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

pub fn from_row(row: ServiceRow) -> ClinicService {
    ClinicService {
        id: row.id,
        name: row.name,
        description: row.description,
        category: row.category,
        duration_minutes: row.duration_minutes,
        price: row.price,
        active: row.active,
        times_used: row.times_used,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub fn to_insert(service: &ClinicService) -> ServiceInsert {
    ServiceInsert {
        name: service.name.clone(),
        description: service.description.clone(),
        category: service.category,
        duration_minutes: service.duration_minutes,
        price: service.price,
        active: service.active,
        times_used: service.times_used,
    }
}

pub fn input_to_insert(input: &ServiceInput) -> ServiceInsert {
    ServiceInsert {
        name: input.name.trim().to_owned(),
        description: crate::clean_optional(&input.description),
        category: input.category,
        duration_minutes: input.duration_minutes,
        price: input.price,
        active: input.active,
        times_used: 0,
    }
}

pub fn to_update(input: &ServiceInput) -> ServiceUpdate {
    ServiceUpdate {
        name: input.name.trim().to_owned(),
        description: crate::clean_optional(&input.description),
        category: input.category,
        duration_minutes: input.duration_minutes,
        price: input.price,
        active: input.active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_row;
    use serde_json::json;

    fn sample_row() -> ServiceRow {
        parse_row(json!({
            "id": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c61",
            "name": "Limpeza",
            "description": "Profilaxia completa",
            "category": "preventivo",
            "duration_minutes": 45,
            "price": 150.0,
            "active": true,
            "times_used": 12
        }))
        .expect("row should parse")
    }

    #[test]
    fn round_trip_preserves_shared_fields() {
        let row = sample_row();
        let insert = to_insert(&from_row(row.clone()));

        assert_eq!(insert.name, row.name);
        assert_eq!(insert.description, row.description);
        assert_eq!(insert.category, row.category);
        assert_eq!(insert.duration_minutes, row.duration_minutes);
        assert_eq!(insert.price, row.price);
        assert_eq!(insert.active, row.active);
        assert_eq!(insert.times_used, row.times_used);
    }

    #[test]
    fn missing_columns_take_defaults() {
        let row: ServiceRow = parse_row(json!({
            "id": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c62",
            "name": "Avaliação",
            "category": "diagnostico",
            "price": 0.0
        }))
        .expect("row should parse");
        let service = from_row(row);

        assert!(service.active);
        assert_eq!(service.times_used, 0);
        assert_eq!(service.effective_duration(), DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn update_payload_omits_usage_counter() {
        let input = ServiceInput {
            name: " Clareamento ".into(),
            description: None,
            category: ServiceCategory::Estetica,
            duration_minutes: Some(60),
            price: 900.0,
            active: true,
        };
        let value = serde_json::to_value(to_update(&input)).expect("serialize");
        assert!(value.get("times_used").is_none());
        assert_eq!(value["name"], "Clareamento");
        assert_eq!(input_to_insert(&input).times_used, 0);
    }
}
