use super::{page_of, SearchParams};
use crate::error::{api_error, ApiError, ApiResult, ErrorRes};
use crate::{AppState, Caller};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use clinic_core::pagination::{PageParams, PatientPage};
use clinic_core::repositories::{PatientFilter, PatientStats};
use clinic_wire::{Patient, PatientInput};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/patients",
    params(SearchParams, PatientFilter, PageParams),
    responses(
        (status = 200, description = "Page of patients", body = PatientPage),
        (status = 502, description = "Backend error")
    )
)]
/// List patients, searched or filtered, one page at a time.
#[axum::debug_handler(state = AppState)]
pub async fn list_patients(
    Caller(clinic): Caller,
    Query(search): Query<SearchParams>,
    Query(filter): Query<PatientFilter>,
    Query(page): Query<PageParams>,
) -> ApiResult<PatientPage> {
    let patients = clinic.patients();
    let result = match search.term() {
        Some(term) => patients.search(term).await,
        None => patients.filter(&filter).await,
    };
    match result {
        Ok(items) => Ok(Json(page_of(&clinic, items, &page))),
        Err(e) => Err(api_error("List patients", e)),
    }
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientInput,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 502, description = "Backend error")
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_patient(
    Caller(clinic): Caller,
    Json(input): Json<PatientInput>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    match clinic.patients().create(&input).await {
        Ok(patient) => Ok((StatusCode::CREATED, Json(patient))),
        Err(e) => Err(api_error("Create patient", e)),
    }
}

#[utoipa::path(
    get,
    path = "/patients/stats",
    responses((status = 200, description = "Patient statistics", body = PatientStats))
)]
pub async fn patient_stats(Caller(clinic): Caller) -> ApiResult<PatientStats> {
    clinic
        .patients()
        .get_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Patient stats", e))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_patient(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Patient> {
    clinic
        .patients()
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| api_error("Get patient", e))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = PatientInput,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn update_patient(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<PatientInput>,
) -> ApiResult<Patient> {
    clinic
        .patients()
        .update(id, &input)
        .await
        .map(Json)
        .map_err(|e| api_error("Update patient", e))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses((status = 204, description = "Patient deleted"))
)]
pub async fn delete_patient(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match clinic.patients().delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(api_error("Delete patient", e)),
    }
}
