//! Entity services over the backend.
//!
//! Each service offers the same surface for its entity (`get_all`, `get_by_id`, `create`,
//! `update`, `delete`, `search`, `filter`, `get_stats`, `validate` where they apply) and
//! follows one failure policy: log, publish the operation's fixed message, return the error.

pub mod appointments;
pub mod catalog;
pub mod clinic_info;
pub mod closures;
pub mod convenios;
pub mod employees;
pub mod patients;
pub mod reports;
pub(crate) mod shared;

pub use appointments::{AppointmentFilter, AppointmentService, AppointmentStats, StatusCount};
pub use catalog::{CatalogService, ServiceFilter, ServiceStats};
pub use clinic_info::ClinicInfoService;
pub use closures::{ClosureService, ClosureStats};
pub use convenios::{ConvenioService, ConvenioStats};
pub use employees::{EmployeeFilter, EmployeeService, EmployeeStats, RoleCount};
pub use patients::{PatientFilter, PatientService, PatientStats};
pub use reports::ReportService;
