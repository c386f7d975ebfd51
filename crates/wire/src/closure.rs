//! Clinic closures: holidays, vacations and maintenance windows.

use crate::WireError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClosureType {
    Feriado,
    Ferias,
    Manutencao,
    Outro,
}

impl ClosureType {
    pub const ALL: [ClosureType; 4] = [
        ClosureType::Feriado,
        ClosureType::Ferias,
        ClosureType::Manutencao,
        ClosureType::Outro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClosureType::Feriado => "feriado",
            ClosureType::Ferias => "ferias",
            ClosureType::Manutencao => "manutencao",
            ClosureType::Outro => "outro",
        }
    }
}

impl FromStr for ClosureType {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClosureType::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| WireError::InvalidInput(format!("unknown closure type '{s}'")))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClosureRow {
    pub id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub closure_type: ClosureType,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A period in which the whole clinic does not work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Closure {
    pub id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub closure_type: ClosureType,
    pub recurring: bool,
    pub notes: Option<String>,
}

impl Closure {
    /// True if `date` falls inside the closure.
    ///
    /// Recurring closures repeat every year on the same month/day span, including spans
    /// that wrap around the new year (e.g. 24/12 to 02/01).
    pub fn covers(&self, date: NaiveDate) -> bool {
        if !self.recurring {
            return self.start_date <= date && date <= self.end_date;
        }

        let md = |d: NaiveDate| (d.month(), d.day());
        let (start, end, day) = (md(self.start_date), md(self.end_date), md(date));
        if start <= end {
            start <= day && day <= end
        } else {
            day >= start || day <= end
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosureInput {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub closure_type: ClosureType,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Insert and update share the input shape once normalised.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosureInsert {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub closure_type: ClosureType,
    pub recurring: bool,
    pub notes: Option<String>,
}

pub fn from_row(row: ClosureRow) -> Closure {
    Closure {
        id: row.id,
        title: row.title,
        start_date: row.start_date,
        end_date: row.end_date,
        closure_type: row.closure_type,
        recurring: row.recurring,
        notes: row.notes,
    }
}

pub fn input_to_insert(input: &ClosureInput) -> ClosureInsert {
    ClosureInsert {
        title: input.title.trim().to_owned(),
        start_date: input.start_date,
        end_date: input.end_date,
        closure_type: input.closure_type,
        recurring: input.recurring,
        notes: crate::clean_optional(&input.notes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn closure(start: NaiveDate, end: NaiveDate, recurring: bool) -> Closure {
        Closure {
            id: Uuid::new_v4(),
            title: "Recesso".into(),
            start_date: start,
            end_date: end,
            closure_type: ClosureType::Ferias,
            recurring,
            notes: None,
        }
    }

    #[test]
    fn one_off_closure_covers_inclusive_range() {
        let c = closure(day(2025, 7, 1), day(2025, 7, 15), false);
        assert!(c.covers(day(2025, 7, 1)));
        assert!(c.covers(day(2025, 7, 15)));
        assert!(!c.covers(day(2025, 7, 16)));
        assert!(!c.covers(day(2026, 7, 5)), "one-off closures do not repeat");
    }

    #[test]
    fn recurring_closure_repeats_yearly() {
        let c = closure(day(2024, 4, 21), day(2024, 4, 21), true);
        assert!(c.covers(day(2030, 4, 21)));
        assert!(!c.covers(day(2030, 4, 22)));
    }

    #[test]
    fn recurring_closure_wraps_new_year() {
        let c = closure(day(2024, 12, 24), day(2025, 1, 2), true);
        assert!(c.covers(day(2027, 12, 31)));
        assert!(c.covers(day(2028, 1, 1)));
        assert!(!c.covers(day(2028, 1, 3)));
        assert!(!c.covers(day(2027, 12, 23)));
    }
}
