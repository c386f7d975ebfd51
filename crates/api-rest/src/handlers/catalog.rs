use super::{page_of, SearchParams};
use crate::error::{api_error, ApiError, ApiResult, ErrorRes};
use crate::{AppState, Caller};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use clinic_core::pagination::{PageParams, ServicePage};
use clinic_core::repositories::{ServiceFilter, ServiceStats};
use clinic_wire::{ClinicService, ServiceInput};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActiveReq {
    pub active: bool,
}

#[utoipa::path(
    get,
    path = "/services",
    params(SearchParams, ServiceFilter, PageParams),
    responses(
        (status = 200, description = "Page of services", body = ServicePage),
        (status = 502, description = "Backend error")
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn list_services(
    Caller(clinic): Caller,
    Query(search): Query<SearchParams>,
    Query(filter): Query<ServiceFilter>,
    Query(page): Query<PageParams>,
) -> ApiResult<ServicePage> {
    let services = clinic.services();
    let result = match search.term() {
        Some(term) => services.search(term).await,
        None => services.filter(&filter).await,
    };
    result
        .map(|items| Json(page_of(&clinic, items, &page)))
        .map_err(|e| api_error("List services", e))
}

#[utoipa::path(
    post,
    path = "/services",
    request_body = ServiceInput,
    responses(
        (status = 201, description = "Service created", body = ClinicService),
        (status = 400, description = "Validation failed", body = ErrorRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_service(
    Caller(clinic): Caller,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<ClinicService>), ApiError> {
    match clinic.services().create(&input).await {
        Ok(service) => Ok((StatusCode::CREATED, Json(service))),
        Err(e) => Err(api_error("Create service", e)),
    }
}

#[utoipa::path(
    get,
    path = "/services/stats",
    responses((status = 200, description = "Catalog statistics", body = ServiceStats))
)]
pub async fn service_stats(Caller(clinic): Caller) -> ApiResult<ServiceStats> {
    clinic
        .services()
        .get_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Service stats", e))
}

#[utoipa::path(
    get,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service", body = ClinicService),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_service(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<ClinicService> {
    clinic
        .services()
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| api_error("Get service", e))
}

#[utoipa::path(
    put,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    request_body = ServiceInput,
    responses(
        (status = 200, description = "Service updated", body = ClinicService),
        (status = 400, description = "Validation failed", body = ErrorRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn update_service(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<ServiceInput>,
) -> ApiResult<ClinicService> {
    clinic
        .services()
        .update(id, &input)
        .await
        .map(Json)
        .map_err(|e| api_error("Update service", e))
}

#[utoipa::path(
    patch,
    path = "/services/{id}/active",
    params(("id" = Uuid, Path, description = "Service id")),
    request_body = ActiveReq,
    responses((status = 200, description = "Service toggled", body = ClinicService))
)]
pub async fn set_service_active(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<ActiveReq>,
) -> ApiResult<ClinicService> {
    clinic
        .services()
        .set_active(id, req.active)
        .await
        .map(Json)
        .map_err(|e| api_error("Toggle service", e))
}

#[utoipa::path(
    delete,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    responses((status = 204, description = "Service deleted"))
)]
pub async fn delete_service(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match clinic.services().delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(api_error("Delete service", e)),
    }
}
