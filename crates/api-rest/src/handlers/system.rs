//! Health, sign-in, validation helpers, reports, the event stream and the smoke run.

use crate::error::{api_error, ApiError, ApiResult, ErrorRes};
use crate::{AppState, Caller};
use api_shared::{HealthRes, HealthService};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::NaiveDate;
use clinic_core::backend::{Session, SessionUser};
use clinic_core::reports::Report;
use clinic_core::smoke::{run_smoke, SmokeReport};
use clinic_types::{format_cpf, format_phone, is_valid_cpf, is_valid_phone};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ValueParams {
    pub value: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckRes {
    pub valid: bool,
    /// Input re-masked for display.
    pub formatted: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportParams {
    /// First day included.
    pub from: NaiveDate,
    /// Last day included.
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SmokeReq {
    pub password: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, open even when the API key guard is on.
#[axum::debug_handler(state = AppState)]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

// ============================================================================
// Auth
// ============================================================================

#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInReq,
    responses(
        (status = 200, description = "Signed in; send `accessToken` as `Authorization: Bearer`", body = Session),
        (status = 400, description = "Email or password missing", body = ErrorRes),
        (status = 401, description = "Invalid credentials", body = ErrorRes)
    )
)]
/// Exchanges credentials for a session. Nothing is kept server-side: the caller sends the
/// returned access token on later requests.
#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInReq>,
) -> ApiResult<Session> {
    state
        .clinic
        .auth()
        .sign_in(&req.email, &req.password)
        .await
        .map(Json)
        .map_err(|e| api_error("Sign in", e))
}

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "User owning the bearer token", body = SessionUser),
        (status = 401, description = "No bearer token, or it is invalid or revoked", body = ErrorRes)
    )
)]
pub async fn session(Caller(clinic): Caller) -> ApiResult<SessionUser> {
    clinic
        .auth()
        .current_user()
        .await
        .map(Json)
        .map_err(|e| api_error("Session", e))
}

#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 204, description = "Bearer token revoked"),
        (status = 401, description = "No bearer token, or it is invalid or revoked", body = ErrorRes)
    )
)]
pub async fn sign_out(Caller(clinic): Caller) -> Result<StatusCode, ApiError> {
    match clinic.auth().sign_out().await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(api_error("Sign out", e)),
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

#[utoipa::path(
    get,
    path = "/validate/cpf",
    params(ValueParams),
    responses((status = 200, description = "CPF check", body = CheckRes))
)]
pub async fn validate_cpf(Query(params): Query<ValueParams>) -> Json<CheckRes> {
    Json(CheckRes {
        valid: is_valid_cpf(&params.value),
        formatted: format_cpf(&params.value),
    })
}

#[utoipa::path(
    get,
    path = "/validate/phone",
    params(ValueParams),
    responses((status = 200, description = "Phone check", body = CheckRes))
)]
pub async fn validate_phone(Query(params): Query<ValueParams>) -> Json<CheckRes> {
    Json(CheckRes {
        valid: is_valid_phone(&params.value),
        formatted: format_phone(&params.value),
    })
}

// ============================================================================
// Reports
// ============================================================================

#[utoipa::path(
    get,
    path = "/reports/summary",
    params(ReportParams),
    responses(
        (status = 200, description = "Aggregated report for the period", body = Report),
        (status = 400, description = "Start after end", body = ErrorRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn report_summary(
    Caller(clinic): Caller,
    Query(params): Query<ReportParams>,
) -> ApiResult<Report> {
    clinic
        .reports()
        .report(params.from, params.to)
        .await
        .map(Json)
        .map_err(|e| api_error("Report", e))
}

// ============================================================================
// Events and smoke run
// ============================================================================

/// Server-sent stream of clinic events, one `update` event per bus message.
///
/// Slow clients that lag behind the bus silently skip the missed events.
#[utoipa::path(
    get,
    path = "/events",
    responses((status = 200, description = "text/event-stream of clinic events"))
)]
pub async fn events(
    Caller(clinic): Caller,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = clinic.events().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Some(Event::default().event("update").json_data(event)),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[utoipa::path(
    post,
    path = "/smoke",
    request_body = SmokeReq,
    responses(
        (status = 200, description = "One result per step", body = SmokeReport),
        (status = 403, description = "Smoke runs disabled or wrong password", body = ErrorRes)
    )
)]
pub async fn smoke(
    Caller(clinic): Caller,
    Json(req): Json<SmokeReq>,
) -> ApiResult<SmokeReport> {
    run_smoke(&clinic, &req.password)
        .await
        .map(Json)
        .map_err(|e| api_error("Smoke run", e))
}
