//! 1-based pagination of already-filtered lists.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use clinic_wire::{Appointment, ClinicService, Closure, Convenio, Employee, Patient};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[aliases(
    PatientPage = Page<Patient>,
    EmployeePage = Page<Employee>,
    ServicePage = Page<ClinicService>,
    AppointmentPage = Page<Appointment>,
    ConvenioPage = Page<Convenio>,
    ClosurePage = Page<Closure>
)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PageParams {
    /// Missing or zero page becomes 1; page size falls back to `default_size` and is
    /// clamped to `1..=MAX_PAGE_SIZE`.
    pub fn resolve(&self, default_size: usize) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let size = self
            .page_size
            .unwrap_or(default_size)
            .clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }
}

/// Slices `items` into page `page` of `page_size`. A page past the end is empty.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let offset = (page - 1).saturating_mul(page_size);

    Page {
        items: items.into_iter().skip(offset).take(page_size).collect(),
        page,
        page_size,
        total,
        total_pages,
    }
}
