//! Clinic-wide records: opening hours per weekday and postal addresses.

use crate::employee::Weekday;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClinicHoursRow {
    pub id: Uuid,
    pub weekday: Weekday,
    #[serde(with = "crate::timestamp::time")]
    pub open_time: NaiveTime,
    #[serde(with = "crate::timestamp::time")]
    pub close_time: NaiveTime,
    #[serde(default)]
    pub is_open: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicHours {
    pub id: Uuid,
    pub weekday: Weekday,
    #[schema(value_type = String, example = "08:00")]
    pub open_time: NaiveTime,
    #[schema(value_type = String, example = "18:00")]
    pub close_time: NaiveTime,
    pub is_open: bool,
}

impl ClinicHours {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.is_open && self.open_time <= time && time < self.close_time
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicHoursInput {
    pub weekday: Weekday,
    #[serde(with = "crate::timestamp::time")]
    #[schema(value_type = String, example = "08:00")]
    pub open_time: NaiveTime,
    #[serde(with = "crate::timestamp::time")]
    #[schema(value_type = String, example = "18:00")]
    pub close_time: NaiveTime,
    pub is_open: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClinicHoursInsert {
    pub weekday: Weekday,
    #[serde(with = "crate::timestamp::time")]
    pub open_time: NaiveTime,
    #[serde(with = "crate::timestamp::time")]
    pub close_time: NaiveTime,
    pub is_open: bool,
}

pub fn hours_from_row(row: ClinicHoursRow) -> ClinicHours {
    ClinicHours {
        id: row.id,
        weekday: row.weekday,
        open_time: row.open_time,
        close_time: row.close_time,
        is_open: row.is_open,
    }
}

pub fn hours_to_insert(input: &ClinicHoursInput) -> ClinicHoursInsert {
    ClinicHoursInsert {
        weekday: input.weekday,
        open_time: input.open_time,
        close_time: input.close_time,
        is_open: input.is_open,
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClinicAddressRow {
    pub id: Uuid,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicAddress {
    pub id: Uuid,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_primary: bool,
}

impl ClinicAddress {
    /// One-line postal form: `Rua X, 10 - Sala 2, Centro, São Paulo/SP, 01000-000`.
    pub fn formatted(&self) -> String {
        let mut line = format!("{}, {}", self.street, self.number);
        if let Some(complement) = self.complement.as_deref().filter(|c| !c.is_empty()) {
            line.push_str(" - ");
            line.push_str(complement);
        }
        format!(
            "{line}, {}, {}/{}, {}",
            self.neighborhood,
            self.city,
            self.state,
            format_zip(&self.zip_code)
        )
    }
}

/// Masks a CEP as `00000-000` when it has exactly 8 digits.
pub fn format_zip(zip: &str) -> String {
    let digits = clinic_types::digits_only(zip);
    if digits.len() == 8 {
        format!("{}-{}", &digits[..5], &digits[5..])
    } else {
        zip.trim().to_owned()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicAddressInput {
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClinicAddressInsert {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_primary: bool,
}

pub fn address_from_row(row: ClinicAddressRow) -> ClinicAddress {
    ClinicAddress {
        id: row.id,
        street: row.street,
        number: row.number,
        complement: row.complement,
        neighborhood: row.neighborhood,
        city: row.city,
        state: row.state,
        zip_code: row.zip_code,
        is_primary: row.is_primary,
    }
}

pub fn address_to_insert(input: &ClinicAddressInput) -> ClinicAddressInsert {
    ClinicAddressInsert {
        street: input.street.trim().to_owned(),
        number: input.number.trim().to_owned(),
        complement: crate::clean_optional(&input.complement),
        neighborhood: input.neighborhood.trim().to_owned(),
        city: input.city.trim().to_owned(),
        state: input.state.trim().to_uppercase(),
        zip_code: clinic_types::digits_only(&input.zip_code),
        is_primary: input.is_primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_address_with_and_without_complement() {
        let mut address = ClinicAddress {
            id: Uuid::new_v4(),
            street: "Av. Paulista".into(),
            number: "1000".into(),
            complement: Some("Sala 12".into()),
            neighborhood: "Bela Vista".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            zip_code: "01310100".into(),
            is_primary: true,
        };
        assert_eq!(
            address.formatted(),
            "Av. Paulista, 1000 - Sala 12, Bela Vista, São Paulo/SP, 01310-100"
        );

        address.complement = None;
        assert_eq!(
            address.formatted(),
            "Av. Paulista, 1000, Bela Vista, São Paulo/SP, 01310-100"
        );
    }

    #[test]
    fn hours_contain_half_open_interval() {
        let hours = ClinicHours {
            id: Uuid::new_v4(),
            weekday: Weekday::Segunda,
            open_time: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
            close_time: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
            is_open: true,
        };
        assert!(hours.contains(NaiveTime::from_hms_opt(8, 0, 0).expect("valid time")));
        assert!(!hours.contains(NaiveTime::from_hms_opt(18, 0, 0).expect("valid time")));

        let closed = ClinicHours {
            is_open: false,
            ..hours
        };
        assert!(!closed.contains(NaiveTime::from_hms_opt(9, 0, 0).expect("valid time")));
    }

    #[test]
    fn zip_is_masked_only_when_complete() {
        assert_eq!(format_zip("01310-100"), "01310-100");
        assert_eq!(format_zip("01310100"), "01310-100");
        assert_eq!(format_zip("0131"), "0131");
    }
}
