//! Request handlers, one module per resource.

pub mod appointments;
pub mod catalog;
pub mod clinic;
pub mod employees;
pub mod patients;
pub mod registry;
pub mod system;

use clinic_core::backend::AnyBackend;
use clinic_core::pagination::{paginate, Page, PageParams};
use clinic_core::Clinic;
use serde::Deserialize;
use utoipa::IntoParams;

/// Free-text search shared by the list endpoints.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// When present and not blank, replaces the filters.
    pub q: Option<String>,
}

impl SearchParams {
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

pub(crate) fn page_of<T>(
    clinic: &Clinic<AnyBackend>,
    items: Vec<T>,
    params: &PageParams,
) -> Page<T> {
    let (page, size) = params.resolve(clinic.config().page_size());
    paginate(items, page, size)
}
