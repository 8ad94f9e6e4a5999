//! Publish/subscribe channel for the presentation layer.
//!
//! Commands emit an [`EngineEvent`] after their mutation is applied; a
//! subscriber that lags or has gone away never affects the command.

use serde::Serialize;
use tokio::sync::broadcast;

use nexus_shared::Severity;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EngineEvent {
    SessionStarted { user_id: String },
    SessionEnded { user_id: String },
    PostCreated { post_id: String },
    CommentAdded { post_id: String, comment_id: String },
    MessageAppended { message_id: String, recipient_id: String },
    GroupCreated { group_id: String },
    RelationChanged { user_id: String, other_id: String },
    NotificationRaised { id: String, severity: Severity },
    NotificationRetired { id: String },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: EngineEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("no event subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
