//! Report aggregation over already-fetched appointments and patients.
//!
//! Every aggregate is a single pass into buckets followed by percentage computation.
//! Percentages are `count / total * 100`, and `0.0` for every bucket when `total` is zero.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use clinic_wire::{Appointment, AppointmentStatus, Patient};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;
use uuid::Uuid;

pub const UNKNOWN_AGE: &str = "unknown";

/// Age bracket labels with their inclusive lower bound.
const AGE_BRACKETS: [(&str, u32); 5] = [
    ("0-17", 0),
    ("18-30", 18),
    ("31-45", 31),
    ("46-60", 46),
    ("60+", 61),
];

pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

fn buckets(counts: impl IntoIterator<Item = (String, usize)>, total: usize) -> Vec<Bucket> {
    counts
        .into_iter()
        .map(|(label, count)| Bucket {
            label,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

/// Appointments per `YYYY-MM`, oldest month first.
pub fn by_month(appointments: &[Appointment]) -> Vec<Bucket> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for a in appointments {
        *counts
            .entry((a.appointment_at.year(), a.appointment_at.month()))
            .or_default() += 1;
    }
    buckets(
        counts
            .into_iter()
            .map(|((y, m), c)| (format!("{y:04}-{m:02}"), c)),
        appointments.len(),
    )
}

/// Appointments per starting hour, only hours that have any.
pub fn by_hour(appointments: &[Appointment]) -> Vec<Bucket> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for a in appointments {
        *counts.entry(a.appointment_at.hour()).or_default() += 1;
    }
    buckets(
        counts.into_iter().map(|(h, c)| (format!("{h:02}:00"), c)),
        appointments.len(),
    )
}

/// One bucket per status, in lifecycle order, including empty ones.
pub fn status_distribution(appointments: &[Appointment]) -> Vec<Bucket> {
    let mut counts: HashMap<AppointmentStatus, usize> = HashMap::new();
    for a in appointments {
        *counts.entry(a.status).or_default() += 1;
    }
    buckets(
        AppointmentStatus::ALL.iter().map(|s| {
            (
                s.as_str().to_string(),
                counts.get(s).copied().unwrap_or_default(),
            )
        }),
        appointments.len(),
    )
}

/// Patients per age bracket on `today`; patients without a usable birth date land in
/// [`UNKNOWN_AGE`].
pub fn age_brackets(patients: &[Patient], today: NaiveDate) -> Vec<Bucket> {
    let mut counts = [0usize; AGE_BRACKETS.len()];
    let mut unknown = 0usize;
    for p in patients {
        match p.age_on(today) {
            Some(age) => {
                let index = AGE_BRACKETS
                    .iter()
                    .rposition(|(_, from)| age >= *from)
                    .unwrap_or(0);
                counts[index] += 1;
            }
            None => unknown += 1,
        }
    }

    buckets(
        AGE_BRACKETS
            .iter()
            .zip(counts)
            .map(|((label, _), c)| (label.to_string(), c))
            .chain(std::iter::once((UNKNOWN_AGE.to_string(), unknown))),
        patients.len(),
    )
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUsage {
    pub service_id: Uuid,
    pub name: String,
    pub count: usize,
    pub revenue: f64,
}

/// Most performed services among completed appointments, by count then revenue.
pub fn top_services(appointments: &[Appointment], limit: usize) -> Vec<ServiceUsage> {
    let mut usage: HashMap<Uuid, ServiceUsage> = HashMap::new();
    for a in appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Realizada)
    {
        let entry = usage.entry(a.service_id).or_insert_with(|| ServiceUsage {
            service_id: a.service_id,
            name: a.service_name.clone().unwrap_or_default(),
            count: 0,
            revenue: 0.0,
        });
        entry.count += 1;
        entry.revenue += a.service_price.unwrap_or_default();
    }

    let mut ranked: Vec<ServiceUsage> = usage.into_values().collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(b.revenue.total_cmp(&a.revenue))
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_appointments: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub no_show_rate: f64,
    /// Sum of service prices over completed appointments.
    pub revenue: f64,
    pub total_patients: usize,
    pub new_patients: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub summary: ReportSummary,
    pub by_month: Vec<Bucket>,
    pub by_hour: Vec<Bucket>,
    pub by_status: Vec<Bucket>,
    pub age_brackets: Vec<Bucket>,
    pub top_services: Vec<ServiceUsage>,
}

pub const TOP_SERVICES: usize = 5;

fn within(at: NaiveDateTime, from: NaiveDate, to: NaiveDate) -> bool {
    at >= from.and_time(NaiveTime::MIN) && at.date() <= to
}

/// Builds the report for appointments in `[from, to]` (whole days). Patient brackets cover
/// every patient; `new_patients` counts those registered inside the range.
pub fn build_report(
    appointments: &[Appointment],
    patients: &[Patient],
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
) -> Report {
    let in_range: Vec<Appointment> = appointments
        .iter()
        .filter(|a| within(a.appointment_at, from, to))
        .cloned()
        .collect();

    let count = |status: AppointmentStatus| in_range.iter().filter(|a| a.status == status).count();
    let completed = count(AppointmentStatus::Realizada);
    let cancelled = count(AppointmentStatus::Cancelada);
    let no_show = count(AppointmentStatus::NaoCompareceu);
    let total = in_range.len();
    let revenue: f64 = in_range
        .iter()
        .filter(|a| a.status == AppointmentStatus::Realizada)
        .map(|a| a.service_price.unwrap_or_default())
        .sum();

    let summary = ReportSummary {
        total_appointments: total,
        completed,
        cancelled,
        no_show,
        completion_rate: percentage(completed, total),
        cancellation_rate: percentage(cancelled, total),
        no_show_rate: percentage(no_show, total),
        revenue,
        total_patients: patients.len(),
        new_patients: patients
            .iter()
            .filter(|p| p.created_at.is_some_and(|c| within(c, from, to)))
            .count(),
    };

    Report {
        from,
        to,
        summary,
        by_month: by_month(&in_range),
        by_hour: by_hour(&in_range),
        by_status: status_distribution(&in_range),
        age_brackets: age_brackets(patients, today),
        top_services: top_services(&in_range, TOP_SERVICES),
    }
}
