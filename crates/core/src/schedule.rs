//! Availability checks used when offering booking slots.

use crate::booking::{appointment_end, time_slots};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use clinic_wire::{Appointment, ClinicHours, Closure, Employee, Weekday};

/// Whether `employee` can take an appointment over `[start, end)`.
///
/// Inactive employees are never available. An employee with no schedule recorded is
/// available whenever the clinic is.
pub fn employee_available_at(employee: &Employee, start: NaiveDateTime, end: NaiveDateTime) -> bool {
    if !employee.is_active() {
        return false;
    }
    if !employee.work_days.is_empty() && !employee.works_on(Weekday::from(start.weekday())) {
        return false;
    }
    if employee.start_hour.is_some_and(|from| start.time() < from) {
        return false;
    }
    if let Some(until) = employee.end_hour {
        if end.date() != start.date() || end.time() > until {
            return false;
        }
    }
    true
}

pub fn closures_on(closures: &[Closure], date: NaiveDate) -> Vec<&Closure> {
    closures.iter().filter(|c| c.covers(date)).collect()
}

pub fn is_closed(closures: &[Closure], date: NaiveDate) -> bool {
    closures.iter().any(|c| c.covers(date))
}

/// Everything needed to decide which slots of a day can be offered.
#[derive(Clone, Copy, Debug)]
pub struct DayContext<'a> {
    pub date: NaiveDate,
    pub duration_minutes: Option<u32>,
    pub employee: Option<&'a Employee>,
    pub appointments: &'a [Appointment],
    pub closures: &'a [Closure],
    pub hours: Option<&'a ClinicHours>,
}

fn within_hours(hours: &ClinicHours, start: NaiveDateTime, end: NaiveDateTime) -> bool {
    hours.is_open
        && end.date() == start.date()
        && start.time() >= hours.open_time
        && end.time() <= hours.close_time
}

/// Start times from the booking grid that fit the day's constraints: not a closure day,
/// inside opening hours when known, inside the employee's schedule, and not overlapping
/// any active appointment of that employee.
pub fn available_slots(ctx: &DayContext<'_>) -> Vec<NaiveTime> {
    if is_closed(ctx.closures, ctx.date) {
        return Vec::new();
    }

    time_slots()
        .into_iter()
        .filter(|slot| {
            let start = ctx.date.and_time(*slot);
            let end = appointment_end(start, ctx.duration_minutes);

            if ctx.hours.is_some_and(|h| !within_hours(h, start, end)) {
                return false;
            }
            if ctx
                .employee
                .is_some_and(|e| !employee_available_at(e, start, end))
            {
                return false;
            }
            !ctx.appointments.iter().any(|a| {
                a.status.is_active()
                    && ctx.employee.map_or(true, |e| a.employee_id == e.id)
                    && a.overlaps(start, end)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;
    use clinic_wire::{AppointmentStatus, ClosureType, EmployeeRole, EmployeeStatus};
    use uuid::Uuid;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
    }

    fn dentist() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Dr. Paulo".into(),
            role: EmployeeRole::Dentista,
            specialty: None,
            cpf: "52998224725".into(),
            registration_number: None,
            hire_date: None,
            salary: None,
            status: EmployeeStatus::Ativo,
            phone: None,
            email: None,
            work_days: vec![Weekday::Segunda, Weekday::Quarta],
            start_hour: Some(time(9, 0)),
            end_hour: Some(time(12, 0)),
            created_at: None,
            updated_at: None,
        }
    }

    fn booked(employee_id: Uuid, h: u32, m: u32, minutes: i64, status: AppointmentStatus) -> Appointment {
        let start = at(2025, 3, 10, h, m);
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            employee_id,
            service_id: Uuid::new_v4(),
            appointment_at: start,
            appointment_end: start + chrono::Duration::minutes(minutes),
            status,
            notes: None,
            created_at: None,
            updated_at: None,
            patient_name: None,
            patient_phone: None,
            employee_name: None,
            service_name: None,
            service_duration: None,
            service_price: None,
        }
    }

    #[test]
    fn employee_schedule_bounds_slots() {
        let e = dentist();
        assert!(employee_available_at(&e, at(2025, 3, 10, 9, 0), at(2025, 3, 10, 9, 30)));
        assert!(employee_available_at(&e, at(2025, 3, 10, 11, 30), at(2025, 3, 10, 12, 0)));
        assert!(!employee_available_at(&e, at(2025, 3, 10, 8, 30), at(2025, 3, 10, 9, 0)));
        assert!(!employee_available_at(&e, at(2025, 3, 10, 11, 30), at(2025, 3, 10, 12, 30)));
        // Tuesday
        assert!(!employee_available_at(&e, at(2025, 3, 11, 9, 0), at(2025, 3, 11, 9, 30)));

        let inactive = Employee {
            status: EmployeeStatus::Inativo,
            ..dentist()
        };
        assert!(!employee_available_at(&inactive, at(2025, 3, 10, 9, 0), at(2025, 3, 10, 9, 30)));
    }

    #[test]
    fn slots_skip_booked_and_out_of_schedule_times() {
        let e = dentist();
        let appointments = vec![
            booked(e.id, 10, 0, 60, AppointmentStatus::Confirmada),
            booked(e.id, 9, 0, 30, AppointmentStatus::Cancelada),
            booked(Uuid::new_v4(), 9, 30, 30, AppointmentStatus::Agendada),
        ];
        let slots = available_slots(&DayContext {
            date: monday(),
            duration_minutes: Some(30),
            employee: Some(&e),
            appointments: &appointments,
            closures: &[],
            hours: None,
        });
        assert_eq!(slots, vec![time(9, 0), time(9, 30), time(11, 0), time(11, 30)]);
    }

    #[test]
    fn closure_day_has_no_slots() {
        let closure = Closure {
            id: Uuid::new_v4(),
            title: "Carnaval".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date"),
            closure_type: ClosureType::Feriado,
            recurring: false,
            notes: None,
        };
        let closures = [closure];
        assert!(is_closed(&closures, monday()));
        assert_eq!(closures_on(&closures, monday()).len(), 1);
        assert!(available_slots(&DayContext {
            date: monday(),
            duration_minutes: None,
            employee: None,
            appointments: &[],
            closures: &closures,
            hours: None,
        })
        .is_empty());
    }

    #[test]
    fn clinic_hours_trim_the_grid() {
        let hours = ClinicHours {
            id: Uuid::new_v4(),
            weekday: Weekday::Segunda,
            open_time: time(14, 0),
            close_time: time(16, 0),
            is_open: true,
        };
        let slots = available_slots(&DayContext {
            date: monday(),
            duration_minutes: Some(60),
            employee: None,
            appointments: &[],
            closures: &[],
            hours: Some(&hours),
        });
        assert_eq!(slots, vec![time(14, 0), time(14, 30), time(15, 0)]);

        let closed = ClinicHours {
            is_open: false,
            ..hours
        };
        assert!(available_slots(&DayContext {
            date: monday(),
            duration_minutes: Some(60),
            employee: None,
            appointments: &[],
            closures: &[],
            hours: Some(&closed),
        })
        .is_empty());
    }
}
