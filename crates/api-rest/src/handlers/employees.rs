use super::{page_of, SearchParams};
use crate::error::{api_error, ApiError, ApiResult, ErrorRes};
use crate::{AppState, Caller};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use clinic_core::pagination::{PageParams, EmployeePage};
use clinic_core::repositories::{EmployeeFilter, EmployeeStats};
use chrono::NaiveDate;
use clinic_wire::{Employee, EmployeeInput};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkingParams {
    pub date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/employees",
    params(SearchParams, EmployeeFilter, PageParams),
    responses(
        (status = 200, description = "Page of employees", body = EmployeePage),
        (status = 502, description = "Backend error")
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn list_employees(
    Caller(clinic): Caller,
    Query(search): Query<SearchParams>,
    Query(filter): Query<EmployeeFilter>,
    Query(page): Query<PageParams>,
) -> ApiResult<EmployeePage> {
    let employees = clinic.employees();
    let result = match search.term() {
        Some(term) => employees.search(term).await,
        None => employees.filter(&filter).await,
    };
    match result {
        Ok(items) => Ok(Json(page_of(&clinic, items, &page))),
        Err(e) => Err(api_error("List employees", e)),
    }
}

#[utoipa::path(
    post,
    path = "/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 502, description = "Backend error")
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_employee(
    Caller(clinic): Caller,
    Json(input): Json<EmployeeInput>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    match clinic.employees().create(&input).await {
        Ok(employee) => Ok((StatusCode::CREATED, Json(employee))),
        Err(e) => Err(api_error("Create employee", e)),
    }
}

#[utoipa::path(
    get,
    path = "/employees/stats",
    responses((status = 200, description = "Employee statistics", body = EmployeeStats))
)]
pub async fn employee_stats(Caller(clinic): Caller) -> ApiResult<EmployeeStats> {
    clinic
        .employees()
        .get_stats()
        .await
        .map(Json)
        .map_err(|e| api_error("Employee stats", e))
}

#[utoipa::path(
    get,
    path = "/employees/working",
    params(WorkingParams),
    responses((status = 200, description = "Active employees scheduled on the date", body = [Employee]))
)]
pub async fn working_employees(
    Caller(clinic): Caller,
    Query(params): Query<WorkingParams>,
) -> ApiResult<Vec<Employee>> {
    clinic
        .employees()
        .working_on(params.date)
        .await
        .map(Json)
        .map_err(|e| api_error("Working employees", e))
}

#[utoipa::path(
    get,
    path = "/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_employee(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Employee> {
    clinic
        .employees()
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| api_error("Get employee", e))
}

#[utoipa::path(
    put,
    path = "/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = EmployeeInput,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn update_employee(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<EmployeeInput>,
) -> ApiResult<Employee> {
    clinic
        .employees()
        .update(id, &input)
        .await
        .map(Json)
        .map_err(|e| api_error("Update employee", e))
}

#[utoipa::path(
    delete,
    path = "/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses((status = 204, description = "Employee deleted"))
)]
pub async fn delete_employee(
    Caller(clinic): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match clinic.employees().delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(api_error("Delete employee", e)),
    }
}
