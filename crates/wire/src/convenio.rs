//! Insurance plans (convênios) accepted by the clinic.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ConvenioRow {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Convenio {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub discount_percentage: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

impl Convenio {
    /// Price after the plan discount, never negative.
    pub fn discounted(&self, price: f64) -> f64 {
        let pct = self.discount_percentage.unwrap_or(0.0).clamp(0.0, 100.0);
        (price * (1.0 - pct / 100.0)).max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvenioInput {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvenioInsert {
    pub name: String,
    pub code: Option<String>,
    pub discount_percentage: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

pub fn from_row(row: ConvenioRow) -> Convenio {
    Convenio {
        id: row.id,
        name: row.name,
        code: row.code,
        discount_percentage: row.discount_percentage,
        phone: row.phone,
        email: row.email,
        active: row.active,
    }
}

pub fn input_to_insert(input: &ConvenioInput) -> ConvenioInsert {
    ConvenioInsert {
        name: input.name.trim().to_owned(),
        code: crate::clean_optional(&input.code),
        discount_percentage: input.discount_percentage,
        phone: crate::clean_optional(&input.phone).map(|p| clinic_types::digits_only(&p)),
        email: crate::clean_optional(&input.email).map(|e| e.to_lowercase()),
        active: input.active,
    }
}
