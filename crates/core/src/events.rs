//! In-process event bus.
//!
//! Services publish [`ClinicEvent`]s after every mutation and failure; the session store, the
//! REST event stream and the CLI subscribe. Publishing while nobody listens is fine.

use crate::constants::EVENT_CHANNEL_CAPACITY;
use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClinicEvent {
    PatientCreated { id: Uuid },
    EmployeeCreated { id: Uuid },
    ServiceCreated { id: Uuid },
    AppointmentsChanged,
    /// Lists feeding the booking forms (patients, employees, services, appointments) are stale.
    RefreshDialogData,
    Notification {
        level: NotificationLevel,
        message: String,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ClinicEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClinicEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ClinicEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("event published with no subscribers");
        }
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.publish(ClinicEvent::Notification {
            level,
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ClinicEvent::AppointmentsChanged);
        bus.error("Erro ao carregar pacientes");

        assert_eq!(
            rx.recv().await.expect("first event"),
            ClinicEvent::AppointmentsChanged
        );
        assert_eq!(
            rx.recv().await.expect("second event"),
            ClinicEvent::Notification {
                level: NotificationLevel::Error,
                message: "Erro ao carregar pacientes".into(),
            }
        );
    }

    #[test]
    fn publishing_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(4);
        bus.publish(ClinicEvent::RefreshDialogData);
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let value = serde_json::to_value(ClinicEvent::RefreshDialogData).expect("serialize");
        assert_eq!(value["kind"], "refresh_dialog_data");
    }
}
