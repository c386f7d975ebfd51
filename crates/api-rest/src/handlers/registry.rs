//! Convênios and clinic closures.

use super::{page_of, SearchParams};
use crate::error::{api_error, ApiError, ApiResult, ErrorRes};
use crate::{AppState, Caller};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use clinic_core::pagination::{ClosurePage, ConvenioPage, PageParams};
use clinic_core::repositories::{ClosureStats, ConvenioStats};
use clinic_wire::{Closure, ClosureInput, Convenio, ConvenioInput};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvenioListParams {
    /// Only plans currently accepted.
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClosureListParams {
    /// Only closures in effect on this day, yearly recurrences included.
    pub on: Option<NaiveDate>,
}

// ============================================================================
// Convenios
// ============================================================================

#[utoipa::path(
    get,
    path = "/convenios",
    params(SearchParams, ConvenioListParams, PageParams),
    responses((status = 200, description = "Page of convênios", body = ConvenioPage))
)]
#[axum::debug_handler(state = AppState)]
pub async fn list_convenios(
    Caller(clinic): Caller,
    Query(search): Query<SearchParams>,
    Query(params): Query<ConvenioListParams>,
    Query(page): Query<PageParams>,
) -> ApiResult<ConvenioPage> {
    let convenios = clinic.convenios();
    let result = match (search.term(), params.active) {
        (Some(term), _) => convenios.search(term).await,
        (None, Some(true)) => convenios.active().await,
        (None, Some(false)) => convenios
            .get_all()
            .await
            .map(|all| all.into_iter().filter(|c| !c.active).collect()),
        (None, None) => convenios.get_all().await,
    };
    match result {
        Ok(items) => Ok(Json(page_of(&clinic, items, &page))),
        Err(e) => Err(api_error("List convenios", e)),
    }
}

#[utoipa::path(
    post,
    path = "/convenios",
    request_body = ConvenioInput,
    responses(
        (status = 201, description = "Convênio created", body = Convenio),
        (status = 400, description = "Validation failed", body = ErrorRes)
    )
)]
pub async fn create_convenio(
    Caller(clinic): Caller,
    Json(input): Json<ConvenioInput>,
) -> Result<(StatusCode, Json<Convenio>), ApiError> {
    match clinic.convenios().create(&input).await {
        Ok(convenio) => Ok((StatusCode::CREATED, Json(convenio))),
        Err(e) => Err(api_error("Create convenio", e)),
    }
}

#[utoipa::path(
    get,
    path = "/convenios/stats",
    responses((status = 200, description = "Convênio statistics", body = ConvenioStats))
)]
pub async fn convenio_stats(Caller(clinic): Caller) -> ApiResult<ConvenioStats> {
    clinic
        .convenios()
        .get_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Convenio stats", e))
}

#[utoipa::path(
    get,
    path = "/convenios/{id}",
    params(("id" = Uuid, Path, description = "Convênio id")),
    responses(
        (status = 200, description = "Convênio", body = Convenio),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_convenio(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Convenio> {
    clinic
        .convenios()
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| api_error("Get convenio", e))
}

#[utoipa::path(
    put,
    path = "/convenios/{id}",
    params(("id" = Uuid, Path, description = "Convênio id")),
    request_body = ConvenioInput,
    responses((status = 200, description = "Convênio updated", body = Convenio))
)]
pub async fn update_convenio(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<ConvenioInput>,
) -> ApiResult<Convenio> {
    clinic
        .convenios()
        .update(id, &input)
        .await
        .map(Json)
        .map_err(|e| api_error("Update convenio", e))
}

#[utoipa::path(
    delete,
    path = "/convenios/{id}",
    params(("id" = Uuid, Path, description = "Convênio id")),
    responses((status = 204, description = "Convênio deleted"))
)]
pub async fn delete_convenio(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match clinic.convenios().delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(api_error("Delete convenio", e)),
    }
}

// ============================================================================
// Closures
// ============================================================================

#[utoipa::path(
    get,
    path = "/closures",
    params(SearchParams, ClosureListParams, PageParams),
    responses((status = 200, description = "Page of closures", body = ClosurePage))
)]
#[axum::debug_handler(state = AppState)]
pub async fn list_closures(
    Caller(clinic): Caller,
    Query(search): Query<SearchParams>,
    Query(params): Query<ClosureListParams>,
    Query(page): Query<PageParams>,
) -> ApiResult<ClosurePage> {
    let closures = clinic.closures();
    let result = match params.on {
        Some(day) => closures.closures_on(day).await,
        None => closures.get_all().await,
    };
    let mut items = result.map_err(|e| api_error("List closures", e))?;
    if let Some(term) = search.term() {
        let term = term.to_lowercase();
        items.retain(|c| c.title.to_lowercase().contains(&term));
    }
    Ok(Json(page_of(&clinic, items, &page)))
}

#[utoipa::path(
    post,
    path = "/closures",
    request_body = ClosureInput,
    responses(
        (status = 201, description = "Closure created", body = Closure),
        (status = 400, description = "Validation failed", body = ErrorRes)
    )
)]
pub async fn create_closure(
    Caller(clinic): Caller,
    Json(input): Json<ClosureInput>,
) -> Result<(StatusCode, Json<Closure>), ApiError> {
    match clinic.closures().create(&input).await {
        Ok(closure) => Ok((StatusCode::CREATED, Json(closure))),
        Err(e) => Err(api_error("Create closure", e)),
    }
}

#[utoipa::path(
    get,
    path = "/closures/stats",
    responses((status = 200, description = "Closure statistics", body = ClosureStats))
)]
pub async fn closure_stats(Caller(clinic): Caller) -> ApiResult<ClosureStats> {
    clinic
        .closures()
        .get_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Closure stats", e))
}

#[utoipa::path(
    get,
    path = "/closures/{id}",
    params(("id" = Uuid, Path, description = "Closure id")),
    responses(
        (status = 200, description = "Closure", body = Closure),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_closure(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Closure> {
    clinic
        .closures()
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| api_error("Get closure", e))
}

#[utoipa::path(
    put,
    path = "/closures/{id}",
    params(("id" = Uuid, Path, description = "Closure id")),
    request_body = ClosureInput,
    responses((status = 200, description = "Closure updated", body = Closure))
)]
pub async fn update_closure(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<ClosureInput>,
) -> ApiResult<Closure> {
    clinic
        .closures()
        .update(id, &input)
        .await
        .map(Json)
        .map_err(|e| api_error("Update closure", e))
}

#[utoipa::path(
    delete,
    path = "/closures/{id}",
    params(("id" = Uuid, Path, description = "Closure id")),
    responses((status = 204, description = "Closure deleted"))
)]
pub async fn delete_closure(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match clinic.closures().delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(api_error("Delete closure", e)),
    }
}
