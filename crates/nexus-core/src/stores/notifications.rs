//! Short-lived advisory messages.
//!
//! The broker only keeps the active set; expiry is driven by the engine's
//! scheduler, which retires each notification on its own timer. The broker
//! remembers each timer's id so an early dismissal can cancel it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use nexus_shared::{new_id, Severity};

use crate::scheduler::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct NotificationBroker {
    active: Vec<Notification>,
    expiry: HashMap<String, TaskId>,
}

impl NotificationBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, message: &str, severity: Severity, now: DateTime<Utc>) -> Notification {
        let notification = Notification {
            id: new_id(),
            message: message.to_string(),
            severity,
            created_at: now,
        };
        self.active.push(notification.clone());
        notification
    }

    pub fn track_expiry(&mut self, id: &str, task: TaskId) {
        self.expiry.insert(id.to_string(), task);
    }

    /// Remove `id`; returns its pending expiry timer, or `None` if it was
    /// already gone.
    pub fn dismiss(&mut self, id: &str) -> Option<Option<TaskId>> {
        let pos = self.active.iter().position(|n| n.id == id)?;
        self.active.remove(pos);
        Some(self.expiry.remove(id))
    }

    /// Oldest first.
    pub fn active(&self) -> &[Notification] {
        &self.active
    }
}
