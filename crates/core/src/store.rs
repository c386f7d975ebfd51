//! Session-scoped cache of the main collections.
//!
//! The dashboard loads patients, employees, services and appointments once, concurrently,
//! and keeps them until something asks for a refresh. A collection whose fetch fails keeps
//! its previous contents.

use crate::backend::Backend;
use crate::events::ClinicEvent;
use crate::{Clinic, ClinicResult};
use chrono::NaiveDateTime;
use clinic_wire::{Appointment, ClinicService, Employee, Patient};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collections {
    pub patients: Vec<Patient>,
    pub employees: Vec<Employee>,
    pub services: Vec<ClinicService>,
    pub appointments: Vec<Appointment>,
    pub loaded_at: Option<NaiveDateTime>,
}

pub struct ClinicStore<B> {
    clinic: Clinic<B>,
    collections: RwLock<Collections>,
}

/// Handle to a running [`ClinicStore::listen`] task. Dropping it stops the task too.
pub struct Listener {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Listener {
    /// Signals the task and waits for it to finish.
    pub async fn stop(self) {
        drop(self.shutdown);
        if let Err(e) = self.handle.await {
            tracing::warn!("store listener ended abnormally: {e}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Replaces `slot` on success and hands back the error otherwise.
fn keep_on_error<T>(slot: &mut Vec<T>, result: ClinicResult<Vec<T>>) -> Option<crate::ClinicError> {
    match result {
        Ok(items) => {
            *slot = items;
            None
        }
        Err(e) => Some(e),
    }
}

impl<B: Backend + 'static> ClinicStore<B> {
    pub fn new(clinic: Clinic<B>) -> Self {
        Self {
            clinic,
            collections: RwLock::new(Collections::default()),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Collections {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetches all four collections concurrently. Every successful fetch is applied; the
    /// first failure, if any, is returned afterwards.
    pub async fn load_all(&self) -> ClinicResult<()> {
        let patients = self.clinic.patients();
        let employees = self.clinic.employees();
        let services = self.clinic.services();
        let appointments = self.clinic.appointments();

        let (p, e, s, a) = tokio::join!(
            patients.get_all(),
            employees.get_all(),
            services.get_all(),
            appointments.get_all()
        );

        let mut guard = self.write();
        let errors = [
            keep_on_error(&mut guard.patients, p),
            keep_on_error(&mut guard.employees, e),
            keep_on_error(&mut guard.services, s),
            keep_on_error(&mut guard.appointments, a),
        ];
        guard.loaded_at = Some(self.clinic.now());
        drop(guard);

        match errors.into_iter().flatten().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub async fn refresh_patients(&self) -> ClinicResult<()> {
        let items = self.clinic.patients().get_all().await?;
        self.write().patients = items;
        Ok(())
    }

    pub async fn refresh_employees(&self) -> ClinicResult<()> {
        let items = self.clinic.employees().get_all().await?;
        self.write().employees = items;
        Ok(())
    }

    pub async fn refresh_services(&self) -> ClinicResult<()> {
        let items = self.clinic.services().get_all().await?;
        self.write().services = items;
        Ok(())
    }

    pub async fn refresh_appointments(&self) -> ClinicResult<()> {
        let items = self.clinic.appointments().get_all().await?;
        self.write().appointments = items;
        Ok(())
    }

    /// Applies one event: dialog refreshes reload everything, appointment changes reload
    /// appointments, entity creations reload that collection.
    pub async fn apply(&self, event: &ClinicEvent) -> ClinicResult<()> {
        match event {
            ClinicEvent::RefreshDialogData => self.load_all().await,
            ClinicEvent::AppointmentsChanged => self.refresh_appointments().await,
            ClinicEvent::PatientCreated { .. } => self.refresh_patients().await,
            ClinicEvent::EmployeeCreated { .. } => self.refresh_employees().await,
            ClinicEvent::ServiceCreated { .. } => self.refresh_services().await,
            ClinicEvent::Notification { .. } => Ok(()),
        }
    }

    /// Spawns a task that keeps the store in sync with the event bus.
    ///
    /// The task only holds a weak reference, so it never keeps the store or its event bus
    /// alive. It ends when the [`Listener`] is stopped or dropped, when the store is gone,
    /// or when the bus closes.
    pub fn listen(self: &Arc<Self>) -> Listener {
        let mut rx = self.clinic.events().subscribe();
        let store: Weak<Self> = Arc::downgrade(self);
        let (shutdown, mut stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = &mut stopped => break,
                    received = rx.recv() => received,
                };
                let Some(store) = store.upgrade() else { break };
                match received {
                    Ok(event) => {
                        if let Err(e) = store.apply(&event).await {
                            tracing::warn!("store refresh failed: {e}");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "store lagged, reloading");
                        if let Err(e) = store.load_all().await {
                            tracing::warn!("store reload failed: {e}");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("store listener stopped");
        });
        Listener { shutdown, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, memory_clinic, patient_input};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn wait_until<B: Backend + 'static>(
        store: &ClinicStore<B>,
        done: impl Fn(&Collections) -> bool,
    ) {
        timeout(Duration::from_secs(2), async {
            while !done(&store.snapshot()) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("store caught up");
    }

    #[tokio::test]
    async fn load_all_fills_every_collection() {
        let (clinic, _backend) = memory_clinic();
        fixtures(&clinic).await;
        let store = ClinicStore::new(clinic);

        store.load_all().await.expect("load");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.patients.len(), 1);
        assert_eq!(snapshot.employees.len(), 1);
        assert_eq!(snapshot.services.len(), 2);
        assert!(snapshot.appointments.is_empty());
        assert!(snapshot.loaded_at.is_some());
    }

    #[tokio::test]
    async fn failed_reload_keeps_stale_data() {
        let (clinic, backend) = memory_clinic();
        fixtures(&clinic).await;
        let store = ClinicStore::new(clinic);
        store.load_all().await.expect("load");

        backend.set_unavailable(true);
        let err = store.load_all().await.expect_err("backend down");
        assert!(err.is_remote());
        assert_eq!(store.snapshot().patients.len(), 1);
        assert_eq!(store.snapshot().services.len(), 2);
    }

    #[tokio::test]
    async fn apply_reloads_created_entity() {
        let (clinic, _backend) = memory_clinic();
        let store = ClinicStore::new(clinic.clone());
        store.load_all().await.expect("load");
        assert!(store.snapshot().patients.is_empty());

        let created = clinic
            .patients()
            .create(&patient_input("Maria Silva", "52998224725"))
            .await
            .expect("create");
        store
            .apply(&ClinicEvent::PatientCreated { id: created.id })
            .await
            .expect("apply");
        assert_eq!(store.snapshot().patients.len(), 1);
    }

    #[tokio::test]
    async fn refresh_dialog_event_reloads_snapshot() {
        let (clinic, _backend) = memory_clinic();
        fixtures(&clinic).await;
        let store = Arc::new(ClinicStore::new(clinic.clone()));
        let listener = store.listen();
        assert!(store.snapshot().loaded_at.is_none());

        clinic.events().publish(ClinicEvent::RefreshDialogData);
        wait_until(&store, |c| c.loaded_at.is_some()).await;
        let snapshot = store.snapshot();
        assert_eq!(snapshot.patients.len(), 1);
        assert_eq!(snapshot.services.len(), 2);

        timeout(Duration::from_secs(2), listener.stop())
            .await
            .expect("listener stops");
    }

    #[tokio::test]
    async fn dropping_the_listener_ends_the_task() {
        let (clinic, _backend) = memory_clinic();
        let store = Arc::new(ClinicStore::new(clinic.clone()));
        let Listener { shutdown, handle } = store.listen();

        drop(shutdown);
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("task ends")
            .expect("task did not panic");
        // Events after shutdown are not applied.
        clinic.events().publish(ClinicEvent::RefreshDialogData);
        tokio::task::yield_now().await;
        assert!(store.snapshot().loaded_at.is_none());
    }

    #[tokio::test]
    async fn task_ends_once_the_store_is_gone() {
        let (clinic, _backend) = memory_clinic();
        let store = Arc::new(ClinicStore::new(clinic.clone()));
        let Listener { shutdown, handle } = store.listen();

        drop(store);
        clinic.events().publish(ClinicEvent::AppointmentsChanged);
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("task ends without a store")
            .expect("task did not panic");
        drop(shutdown);
    }
}
