//! Opening hours and the clinic address.

use crate::error::{api_error, error_message, ApiError, ApiResult};
use crate::Caller;
use axum::{
    extract::Path,
    http::StatusCode,
    Json,
};
use clinic_wire::{ClinicAddress, ClinicAddressInput, ClinicHours, ClinicHoursInput};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/clinic/hours",
    responses((status = 200, description = "Opening hours, Monday first", body = [ClinicHours]))
)]
pub async fn get_hours(Caller(clinic): Caller) -> ApiResult<Vec<ClinicHours>> {
    clinic
        .clinic_info()
        .hours()
        .await
        .map(Json)
        .map_err(|e| api_error("Clinic hours", e))
}

#[utoipa::path(
    put,
    path = "/clinic/hours",
    request_body = ClinicHoursInput,
    responses(
        (status = 200, description = "Hours saved for the weekday", body = ClinicHours),
        (status = 400, description = "Opening after closing")
    )
)]
pub async fn put_hours(
    Caller(clinic): Caller,
    Json(input): Json<ClinicHoursInput>,
) -> ApiResult<ClinicHours> {
    clinic
        .clinic_info()
        .upsert_hours(&input)
        .await
        .map(Json)
        .map_err(|e| api_error("Save clinic hours", e))
}

#[utoipa::path(
    get,
    path = "/clinic/address",
    responses(
        (status = 200, description = "Primary address", body = ClinicAddress),
        (status = 404, description = "No address registered")
    )
)]
pub async fn get_address(Caller(clinic): Caller) -> ApiResult<ClinicAddress> {
    match clinic.clinic_info().primary_address().await {
        Ok(Some(address)) => Ok(Json(address)),
        Ok(None) => Err(error_message(
            StatusCode::NOT_FOUND,
            "No clinic address registered",
        )),
        Err(e) => Err(api_error("Clinic address", e)),
    }
}

#[utoipa::path(
    post,
    path = "/clinic/address",
    request_body = ClinicAddressInput,
    responses((status = 201, description = "Address created", body = ClinicAddress))
)]
pub async fn create_address(
    Caller(clinic): Caller,
    Json(input): Json<ClinicAddressInput>,
) -> Result<(StatusCode, Json<ClinicAddress>), ApiError> {
    match clinic.clinic_info().create_address(&input).await {
        Ok(address) => Ok((StatusCode::CREATED, Json(address))),
        Err(e) => Err(api_error("Create clinic address", e)),
    }
}

#[utoipa::path(
    put,
    path = "/clinic/address/{id}",
    params(("id" = Uuid, Path, description = "Address id")),
    request_body = ClinicAddressInput,
    responses((status = 200, description = "Address updated", body = ClinicAddress))
)]
pub async fn update_address(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<ClinicAddressInput>,
) -> ApiResult<ClinicAddress> {
    clinic
        .clinic_info()
        .update_address(id, &input)
        .await
        .map(Json)
        .map_err(|e| api_error("Update clinic address", e))
}
