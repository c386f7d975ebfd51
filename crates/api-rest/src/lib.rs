//! # API REST
//!
//! REST API for the clinic dashboard.
//!
//! Handles:
//! - HTTP endpoints with axum, one handler module per resource
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status mapping, CORS, optional API key)
//!
//! Business rules live in `clinic-core`; handlers only translate between HTTP and services.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

use api_shared::{validate_api_key, HealthRes, API_KEY_HEADER};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use clinic_core::backend::{AnyBackend, Session};
use clinic_core::booking::BookingForm;
use clinic_core::pagination::{
    AppointmentPage, ClosurePage, ConvenioPage, EmployeePage, PatientPage, ServicePage,
};
use clinic_core::reports::{Bucket, Report, ReportSummary, ServiceUsage};
use clinic_core::repositories::{
    AppointmentStats, ClosureStats, ConvenioStats, EmployeeStats, PatientStats, RoleCount,
    ServiceStats, StatusCount,
};
use clinic_core::smoke::{SmokeReport, SmokeStep};
use clinic_core::{BackendKind, Clinic, ClinicResult};
use clinic_wire::appointment::StatusPatch;
use error::{error_message, ApiError, ErrorRes};
use handlers::{appointments, catalog, clinic, employees, patients, registry, system};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub clinic: Clinic<AnyBackend>,
    /// When set, every route except `/health` and the docs requires this `x-api-key`.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(clinic: Clinic<AnyBackend>, api_key: Option<String>) -> Self {
        Self {
            clinic,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Resolves `CLINIC_*` and `API_KEY` from the environment.
    pub fn from_env() -> ClinicResult<Self> {
        let (config, kind) = clinic_core::config::from_env()?;
        if kind == BackendKind::Memory {
            tracing::warn!("using the in-memory backend; data is lost on exit");
        }
        let clinic = Clinic::connect(Arc::new(config), kind);
        Ok(Self::new(clinic, std::env::var("API_KEY").ok()))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        system::health,
        system::sign_in,
        system::session,
        system::sign_out,
        system::validate_cpf,
        system::validate_phone,
        system::report_summary,
        system::events,
        system::smoke,
        patients::list_patients,
        patients::create_patient,
        patients::patient_stats,
        patients::get_patient,
        patients::update_patient,
        patients::delete_patient,
        employees::list_employees,
        employees::create_employee,
        employees::employee_stats,
        employees::working_employees,
        employees::get_employee,
        employees::update_employee,
        employees::delete_employee,
        catalog::list_services,
        catalog::create_service,
        catalog::service_stats,
        catalog::get_service,
        catalog::update_service,
        catalog::set_service_active,
        catalog::delete_service,
        registry::list_convenios,
        registry::create_convenio,
        registry::convenio_stats,
        registry::get_convenio,
        registry::update_convenio,
        registry::delete_convenio,
        registry::list_closures,
        registry::create_closure,
        registry::closure_stats,
        registry::get_closure,
        registry::update_closure,
        registry::delete_closure,
        appointments::list_appointments,
        appointments::book_appointment,
        appointments::appointment_stats,
        appointments::available_slots,
        appointments::get_appointment,
        appointments::edit_appointment,
        appointments::update_appointment_status,
        appointments::delete_appointment,
        clinic::get_hours,
        clinic::put_hours,
        clinic::get_address,
        clinic::create_address,
        clinic::update_address,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        Session,
        clinic_core::backend::SessionUser,
        system::SignInReq,
        system::CheckRes,
        system::SmokeReq,
        SmokeReport,
        SmokeStep,
        Report,
        ReportSummary,
        Bucket,
        ServiceUsage,
        PatientPage,
        EmployeePage,
        ServicePage,
        ConvenioPage,
        ClosurePage,
        AppointmentPage,
        PatientStats,
        EmployeeStats,
        RoleCount,
        ServiceStats,
        ConvenioStats,
        ClosureStats,
        AppointmentStats,
        StatusCount,
        BookingForm,
        StatusPatch,
        catalog::ActiveReq,
        appointments::SlotsRes,
        clinic_wire::Patient,
        clinic_wire::PatientInput,
        clinic_wire::Employee,
        clinic_wire::EmployeeInput,
        clinic_wire::EmployeeRole,
        clinic_wire::EmployeeStatus,
        clinic_wire::Specialty,
        clinic_wire::Weekday,
        clinic_wire::ClinicService,
        clinic_wire::ServiceInput,
        clinic_wire::ServiceCategory,
        clinic_wire::Convenio,
        clinic_wire::ConvenioInput,
        clinic_wire::Closure,
        clinic_wire::ClosureInput,
        clinic_wire::ClosureType,
        clinic_wire::Appointment,
        clinic_wire::AppointmentInput,
        clinic_wire::AppointmentStatus,
        clinic_wire::ClinicHours,
        clinic_wire::ClinicHoursInput,
        clinic_wire::ClinicAddress,
        clinic_wire::ClinicAddressInput,
    ))
)]
pub struct ApiDoc;

/// The clinic handle for one request, acting with the caller's `Authorization: Bearer`
/// token when one is sent. Tokens are never stored in [`AppState`], so callers do not see
/// each other's sessions.
pub struct Caller(pub Clinic<AnyBackend>);

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| "authorization header is not valid text")?;
    match value.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(Some(token.trim()))
        }
        _ => Err("authorization header must be 'Bearer <token>'"),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Ok(Some(token)) => Ok(Caller(state.clinic.with_access_token(token))),
            Ok(None) => Ok(Caller(state.clinic.clone())),
            Err(msg) => Err(error_message(StatusCode::UNAUTHORIZED, msg)),
        }
    }
}

/// Rejects requests without the configured `x-api-key`.
async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    match validate_api_key(state.api_key.as_deref(), provided) {
        Ok(()) => Ok(next.run(req).await),
        Err(e) => {
            tracing::warn!("rejected request to {}: {e}", req.uri().path());
            Err(error_message(StatusCode::UNAUTHORIZED, &e.to_string()))
        }
    }
}

/// Builds the full router: API routes behind the key guard, `/health` and the docs open.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/sign-in", post(system::sign_in))
        .route("/auth/session", get(system::session))
        .route("/auth/sign-out", post(system::sign_out))
        .route("/validate/cpf", get(system::validate_cpf))
        .route("/validate/phone", get(system::validate_phone))
        .route("/reports/summary", get(system::report_summary))
        .route("/events", get(system::events))
        .route("/smoke", post(system::smoke))
        .route(
            "/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route("/patients/stats", get(patients::patient_stats))
        .route(
            "/patients/:id",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route(
            "/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route("/employees/stats", get(employees::employee_stats))
        .route("/employees/working", get(employees::working_employees))
        .route(
            "/employees/:id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/services",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route("/services/stats", get(catalog::service_stats))
        .route(
            "/services/:id",
            get(catalog::get_service)
                .put(catalog::update_service)
                .delete(catalog::delete_service),
        )
        .route("/services/:id/active", patch(catalog::set_service_active))
        .route(
            "/convenios",
            get(registry::list_convenios).post(registry::create_convenio),
        )
        .route("/convenios/stats", get(registry::convenio_stats))
        .route(
            "/convenios/:id",
            get(registry::get_convenio)
                .put(registry::update_convenio)
                .delete(registry::delete_convenio),
        )
        .route(
            "/closures",
            get(registry::list_closures).post(registry::create_closure),
        )
        .route("/closures/stats", get(registry::closure_stats))
        .route(
            "/closures/:id",
            get(registry::get_closure)
                .put(registry::update_closure)
                .delete(registry::delete_closure),
        )
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::book_appointment),
        )
        .route("/appointments/stats", get(appointments::appointment_stats))
        .route("/appointments/slots", get(appointments::available_slots))
        .route(
            "/appointments/:id",
            get(appointments::get_appointment)
                .put(appointments::edit_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            "/appointments/:id/status",
            patch(appointments::update_appointment_status),
        )
        .route(
            "/clinic/hours",
            get(clinic::get_hours).put(clinic::put_hours),
        )
        .route(
            "/clinic/address",
            get(clinic::get_address).post(clinic::create_address),
        )
        .route("/clinic/address/:id", put(clinic::update_address))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(system::health))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
