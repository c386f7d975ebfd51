use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use clinic_core::booking::BookingForm;
use clinic_core::labels::DisplayLabel;
use clinic_core::pagination::{paginate, PageParams};
use clinic_core::repositories::AppointmentFilter;
use clinic_core::smoke::run_smoke;
use clinic_core::{backend::AnyBackend, Clinic};
use clinic_types::{format_cpf, format_phone, is_valid_cpf, is_valid_phone};
use clinic_wire::timestamp::parse_time;
use clinic_wire::{Appointment, AppointmentStatus};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Dental clinic administration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a CPF and print it masked
    ValidateCpf { value: String },
    /// Mask a Brazilian phone number
    FormatPhone { value: String },
    /// List patients
    Patients {
        /// Name, CPF, phone or e-mail fragment
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<usize>,
    },
    /// List employees
    Employees {
        #[arg(long)]
        search: Option<String>,
        /// Only active employees working on this date (YYYY-MM-DD)
        #[arg(long)]
        working: Option<NaiveDate>,
    },
    /// List the service catalog
    Services {
        #[arg(long)]
        search: Option<String>,
        /// Only services offered for booking
        #[arg(long)]
        active: bool,
    },
    /// List appointments
    Appointments {
        /// Only this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        employee: Option<Uuid>,
        /// agendada, confirmada, reagendada, cancelada, realizada or nao_compareceu
        #[arg(long)]
        status: Option<AppointmentStatus>,
    },
    /// Open start times for an employee on a day
    Slots {
        date: NaiveDate,
        employee: Uuid,
        #[arg(long)]
        service: Option<Uuid>,
    },
    /// Book an appointment; the end time follows the service duration
    Book {
        #[arg(long)]
        patient: Uuid,
        #[arg(long)]
        employee: Uuid,
        #[arg(long)]
        service: Uuid,
        #[arg(long)]
        date: NaiveDate,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_start_time)]
        time: NaiveTime,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change an appointment's status
    SetStatus {
        id: Uuid,
        status: AppointmentStatus,
    },
    /// Aggregated report for a period
    Report {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Create, read, update and delete one record of every entity, then clean up
    Smoke {
        #[arg(long)]
        password: String,
    },
}

fn parse_start_time(value: &str) -> Result<NaiveTime, String> {
    parse_time(value).ok_or_else(|| format!("invalid time '{value}', expected HH:MM"))
}

/// Builds the clinic from `CLINIC_*`. When `CLINIC_EMAIL` and `CLINIC_PASSWORD` are both
/// set it signs in and acts with that user's token for the rest of the run.
async fn connect() -> anyhow::Result<Clinic<AnyBackend>> {
    let (config, kind) =
        clinic_core::config::from_env().context("failed to read clinic configuration")?;
    let clinic = Clinic::connect(Arc::new(config), kind);
    if let (Ok(email), Ok(password)) = (
        std::env::var("CLINIC_EMAIL"),
        std::env::var("CLINIC_PASSWORD"),
    ) {
        let session = clinic
            .auth()
            .sign_in(&email, &password)
            .await
            .context("sign in failed")?;
        let who = session.user.email.as_deref().unwrap_or(&session.user.id);
        tracing::info!("signed in as {who}");
        return Ok(clinic.with_access_token(session.access_token));
    }
    Ok(clinic)
}

fn print_appointment(a: &Appointment) {
    println!(
        "{}  {} - {}  {:<14} {} / {} / {}",
        a.id,
        a.appointment_at.format("%d/%m/%Y %H:%M"),
        a.appointment_end.format("%H:%M"),
        a.status.label(),
        a.patient_name.as_deref().unwrap_or("-"),
        a.employee_name.as_deref().unwrap_or("-"),
        a.service_name.as_deref().unwrap_or("-"),
    );
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::ValidateCpf { value } => {
            let verdict = if is_valid_cpf(&value) { "valid" } else { "invalid" };
            println!("{} ({verdict})", format_cpf(&value));
        }
        Commands::FormatPhone { value } => {
            if !is_valid_phone(&value) {
                tracing::warn!("'{value}' is not a complete phone number");
            }
            println!("{}", format_phone(&value));
        }
        Commands::Patients { search, page } => {
            let clinic = connect().await?;
            let patients = clinic.patients();
            let items = match search.as_deref() {
                Some(term) => patients.search(term).await?,
                None => patients.get_all().await?,
            };
            let (page, size) = PageParams {
                page,
                page_size: None,
            }
            .resolve(clinic.config().page_size());
            let page = paginate(items, page, size);
            for p in &page.items {
                println!(
                    "{}  {:<30} {}  {}",
                    p.id,
                    p.full_name,
                    format_cpf(&p.cpf),
                    format_phone(&p.phone)
                );
            }
            println!(
                "page {}/{} ({} patients)",
                page.page,
                page.total_pages.max(1),
                page.total
            );
        }
        Commands::Employees { search, working } => {
            let clinic = connect().await?;
            let employees = clinic.employees();
            let items = match (search.as_deref(), working) {
                (Some(term), _) => employees.search(term).await?,
                (None, Some(date)) => employees.working_on(date).await?,
                (None, None) => employees.get_all().await?,
            };
            for e in &items {
                println!(
                    "{}  {:<30} {:<25} {}",
                    e.id,
                    e.name,
                    e.role.label(),
                    e.status.label()
                );
            }
        }
        Commands::Services { search, active } => {
            let clinic = connect().await?;
            let services = clinic.services();
            let items = match (search.as_deref(), active) {
                (Some(term), _) => services.search(term).await?,
                (None, true) => services.active().await?,
                (None, false) => services.get_all().await?,
            };
            for s in &items {
                println!(
                    "{}  {:<30} {:<12} {:>4} min  R$ {:>8.2}  usado {}x",
                    s.id,
                    s.name,
                    s.category.label(),
                    s.effective_duration(),
                    s.price,
                    s.times_used
                );
            }
        }
        Commands::Appointments {
            date,
            employee,
            status,
        } => {
            let clinic = connect().await?;
            let filter = AppointmentFilter {
                status,
                employee_id: employee,
                from: date,
                to: date,
                ..AppointmentFilter::default()
            };
            let items = clinic.appointments().filter(&filter).await?;
            items.iter().for_each(print_appointment);
            println!("{} appointments", items.len());
        }
        Commands::Slots {
            date,
            employee,
            service,
        } => {
            let clinic = connect().await?;
            let slots = clinic
                .appointments()
                .available_slots(date, employee, service)
                .await?;
            if slots.is_empty() {
                println!("No open slots on {date}");
            }
            for slot in slots {
                println!("{}", slot.format("%H:%M"));
            }
        }
        Commands::Book {
            patient,
            employee,
            service,
            date,
            time,
            notes,
        } => {
            let clinic = connect().await?;
            let form = BookingForm {
                patient_id: Some(patient),
                employee_id: Some(employee),
                service_id: Some(service),
                date: Some(date),
                time: Some(time),
                notes,
                ..BookingForm::default()
            };
            let booked = clinic.appointments().book(&form).await?;
            print_appointment(&booked);
        }
        Commands::SetStatus { id, status } => {
            let clinic = connect().await?;
            let updated = clinic.appointments().update_status(id, status).await?;
            print_appointment(&updated);
        }
        Commands::Report { from, to } => {
            let clinic = connect().await?;
            let report = clinic.reports().report(from, to).await?;
            let s = &report.summary;
            println!("Período: {} a {}", report.from, report.to);
            println!(
                "Consultas: {}  realizadas {} ({:.1}%)  canceladas {} ({:.1}%)  faltas {} ({:.1}%)",
                s.total_appointments,
                s.completed,
                s.completion_rate,
                s.cancelled,
                s.cancellation_rate,
                s.no_show,
                s.no_show_rate
            );
            println!("Receita: R$ {:.2}", s.revenue);
            println!(
                "Pacientes: {} ({} novos)",
                s.total_patients, s.new_patients
            );
            for usage in &report.top_services {
                println!("  {:<30} {:>4}x", usage.name, usage.count);
            }
        }
        Commands::Smoke { password } => {
            let clinic = connect().await?;
            let report = run_smoke(&clinic, &password).await?;
            for step in &report.steps {
                let mark = if step.ok { "ok  " } else { "FAIL" };
                match &step.detail {
                    Some(detail) => println!("{mark} {}: {detail}", step.name),
                    None => println!("{mark} {}", step.name),
                }
            }
            println!("{} passed, {} failed", report.passed(), report.failed());
            if !report.all_passed() {
                bail!("smoke run failed");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(command) => run(command).await,
        None => {
            println!("Use 'clinic --help' for commands");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_parses_short_time() {
        let cli = Cli::try_parse_from([
            "clinic",
            "book",
            "--patient",
            "00000000-0000-0000-0000-000000000001",
            "--employee",
            "00000000-0000-0000-0000-000000000002",
            "--service",
            "00000000-0000-0000-0000-000000000003",
            "--date",
            "2025-03-03",
            "--time",
            "09:00",
        ])
        .expect("valid arguments");
        match cli.command {
            Some(Commands::Book { time, date, .. }) => {
                assert_eq!(time, NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"));
            }
            _ => panic!("expected book"),
        }
    }

    #[test]
    fn set_status_uses_backend_names() {
        let cli = Cli::try_parse_from([
            "clinic",
            "set-status",
            "00000000-0000-0000-0000-000000000001",
            "nao_compareceu",
        ])
        .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Some(Commands::SetStatus {
                status: AppointmentStatus::NaoCompareceu,
                ..
            })
        ));

        assert!(Cli::try_parse_from([
            "clinic",
            "set-status",
            "00000000-0000-0000-0000-000000000001",
            "perdida",
        ])
        .is_err());
    }

    #[test]
    fn bad_time_is_rejected() {
        assert!(parse_start_time("25:00").is_err());
        assert!(parse_start_time("9h").is_err());
    }
}
