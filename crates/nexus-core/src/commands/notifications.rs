use nexus_shared::Severity;

use crate::engine::Engine;
use crate::events::EngineEvent;
use crate::stores::Notification;

impl Engine {
    /// Raise an advisory notification; it retires itself after its TTL.
    pub fn raise_notification(&self, message: &str, severity: Severity) -> String {
        self.with_state(|inner, now| inner.notify(message, severity, now).id)
    }

    /// Remove a notification early and cancel its expiry timer. Dismissing
    /// an expired or unknown id is a no-op.
    pub fn dismiss_notification(&self, id: &str) -> bool {
        self.with_state(|inner, _| match inner.notifications.dismiss(id) {
            Some(expiry) => {
                if let Some(task) = expiry {
                    inner.scheduler.cancel(task);
                }
                inner.events.emit(EngineEvent::NotificationRetired { id: id.to_string() });
                true
            }
            None => false,
        })
    }

    /// Live notifications, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.with_state(|inner, _| inner.notifications.active().to_vec())
    }
}
