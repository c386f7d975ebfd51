use super::{page_of, SearchParams};
use crate::error::{api_error, ApiError, ApiResult, ErrorRes};
use crate::{AppState, Caller};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use clinic_core::booking::BookingForm;
use clinic_core::pagination::{AppointmentPage, PageParams};
use clinic_core::repositories::{AppointmentFilter, AppointmentStats};
use clinic_wire::appointment::StatusPatch;
use clinic_wire::Appointment;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SlotParams {
    pub date: NaiveDate,
    pub employee_id: Uuid,
    /// Sizes the slots to this service; 30 minutes otherwise.
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotsRes {
    pub date: NaiveDate,
    /// Open start times as `HH:MM`.
    pub slots: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(SearchParams, AppointmentFilter, PageParams),
    responses(
        (status = 200, description = "Page of appointments", body = AppointmentPage),
        (status = 502, description = "Backend error")
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn list_appointments(
    Caller(clinic): Caller,
    Query(search): Query<SearchParams>,
    Query(filter): Query<AppointmentFilter>,
    Query(page): Query<PageParams>,
) -> ApiResult<AppointmentPage> {
    let appointments = clinic.appointments();
    let result = match search.term() {
        Some(term) => appointments.search(term).await,
        None => appointments.filter(&filter).await,
    };
    match result {
        Ok(items) => Ok(Json(page_of(&clinic, items, &page))),
        Err(e) => Err(api_error("List appointments", e)),
    }
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = BookingForm,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Form incomplete or invalid", body = ErrorRes)
    )
)]
/// Book an appointment from the booking form; the end time follows the service duration.
#[axum::debug_handler(state = AppState)]
pub async fn book_appointment(
    Caller(clinic): Caller,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    match clinic.appointments().book(&form).await {
        Ok(appointment) => Ok((StatusCode::CREATED, Json(appointment))),
        Err(e) => Err(api_error("Book appointment", e)),
    }
}

#[utoipa::path(
    get,
    path = "/appointments/stats",
    responses((status = 200, description = "Appointment statistics", body = AppointmentStats))
)]
pub async fn appointment_stats(Caller(clinic): Caller) -> ApiResult<AppointmentStats> {
    clinic
        .appointments()
        .get_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Appointment stats", e))
}

#[utoipa::path(
    get,
    path = "/appointments/slots",
    params(SlotParams),
    responses(
        (status = 200, description = "Open start times", body = SlotsRes),
        (status = 404, description = "Unknown employee or service")
    )
)]
pub async fn available_slots(
    Caller(clinic): Caller,
    Query(params): Query<SlotParams>,
) -> ApiResult<SlotsRes> {
    let slots = clinic
        .appointments()
        .available_slots(params.date, params.employee_id, params.service_id)
        .await
        .map_err(|e| api_error("Available slots", e))?;
    Ok(Json(SlotsRes {
        date: params.date,
        slots: slots.iter().map(|t| t.format("%H:%M").to_string()).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_appointment(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Appointment> {
    clinic
        .appointments()
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| api_error("Get appointment", e))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = BookingForm,
    responses(
        (status = 200, description = "Appointment updated", body = Appointment),
        (status = 400, description = "Form incomplete or invalid", body = ErrorRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn edit_appointment(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(form): Json<BookingForm>,
) -> ApiResult<Appointment> {
    clinic
        .appointments()
        .edit(id, &form)
        .await
        .map(Json)
        .map_err(|e| api_error("Edit appointment", e))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = StatusPatch,
    responses(
        (status = 200, description = "Status changed", body = Appointment),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_appointment_status(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<StatusPatch>,
) -> ApiResult<Appointment> {
    clinic
        .appointments()
        .update_status(id, patch.status)
        .await
        .map(Json)
        .map_err(|e| api_error("Update appointment status", e))
}

#[utoipa::path(
    delete,
    path = "/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses((status = 204, description = "Appointment deleted"))
)]
pub async fn delete_appointment(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match clinic.appointments().delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(api_error("Delete appointment", e)),
    }
}
