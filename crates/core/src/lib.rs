//! # Clinic Core
//!
//! Business logic for the dental clinic dashboard.
//!
//! This crate contains the services that sit between callers and the hosted backend:
//! - Entity services for patients, employees, the service catalog, appointments, closures,
//!   clinic hours/addresses and convênios
//! - Validation, booking workflow, availability and report aggregation
//! - The in-process event bus and the session store fed by it
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `clinic-cli`. Configuration is resolved once by the caller and passed in as [`CoreConfig`].

pub mod auth;
pub mod backend;
pub mod booking;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod labels;
pub mod pagination;
pub mod reports;
pub mod repositories;
pub mod schedule;
pub mod smoke;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{BackendKind, CoreConfig};
pub use error::{ClinicError, ClinicResult};

use auth::AuthService;
use backend::{AnyBackend, Authenticator, Backend, MemoryBackend, RemoteBackend};
use chrono::NaiveDateTime;
use events::EventBus;
use repositories::shared::Repo;
use repositories::{
    AppointmentService, CatalogService, ClinicInfoService, ClosureService, ConvenioService,
    EmployeeService, PatientService, ReportService,
};
use std::sync::Arc;

/// Source of "now" for validation and statistics.
pub type Clock = fn() -> NaiveDateTime;

/// Local wall-clock time; the backend stores naive clinic-local timestamps.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Entry point to every service, sharing one backend, one event bus and one clock.
///
/// A `Clinic` acts for at most one caller: the access token set with
/// [`Clinic::with_access_token`] goes out with every backend call made through it. Callers
/// get their own handle; the backend itself keeps no session.
pub struct Clinic<B> {
    config: Arc<CoreConfig>,
    backend: Arc<B>,
    events: EventBus,
    clock: Clock,
    access_token: Option<Arc<str>>,
}

impl<B> Clone for Clinic<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&self.backend),
            events: self.events.clone(),
            clock: self.clock,
            access_token: self.access_token.clone(),
        }
    }
}

impl<B: Backend> Clinic<B> {
    pub fn new(config: Arc<CoreConfig>, backend: Arc<B>) -> Self {
        Self {
            config,
            backend,
            events: EventBus::default(),
            clock: local_now,
            access_token: None,
        }
    }

    /// A handle acting for the holder of `token`, sharing this clinic's backend and bus.
    pub fn with_access_token(&self, token: impl Into<Arc<str>>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn repo(&self) -> Repo<B> {
        Repo::new(
            Arc::clone(&self.backend),
            self.events.clone(),
            self.clock,
            self.access_token.clone(),
        )
    }

    pub fn patients(&self) -> PatientService<B> {
        PatientService::new(self.repo())
    }

    pub fn employees(&self) -> EmployeeService<B> {
        EmployeeService::new(self.repo())
    }

    pub fn services(&self) -> CatalogService<B> {
        CatalogService::new(self.repo())
    }

    pub fn appointments(&self) -> AppointmentService<B> {
        AppointmentService::new(self.repo())
    }

    pub fn closures(&self) -> ClosureService<B> {
        ClosureService::new(self.repo())
    }

    pub fn clinic_info(&self) -> ClinicInfoService<B> {
        ClinicInfoService::new(self.repo())
    }

    pub fn convenios(&self) -> ConvenioService<B> {
        ConvenioService::new(self.repo())
    }

    pub fn reports(&self) -> ReportService<B> {
        ReportService::new(self.repo())
    }
}

impl<B: Backend + Authenticator> Clinic<B> {
    pub fn auth(&self) -> AuthService<B> {
        AuthService::new(
            Arc::clone(&self.backend),
            self.events.clone(),
            self.access_token.clone(),
        )
    }
}

impl Clinic<AnyBackend> {
    /// Builds a clinic over the backend selected at startup.
    pub fn connect(config: Arc<CoreConfig>, kind: BackendKind) -> Self {
        let backend = match kind {
            BackendKind::Remote => AnyBackend::Remote(RemoteBackend::new(&config)),
            BackendKind::Memory => AnyBackend::Memory(MemoryBackend::new()),
        };
        Self::new(config, Arc::new(backend))
    }
}
