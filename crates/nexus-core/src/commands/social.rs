use tracing::info;

use nexus_shared::Severity;
use nexus_store::User;

use crate::engine::Engine;
use crate::error::Result;
use crate::events::EngineEvent;
use crate::stores::RelationChange;

impl Engine {
    /// Befriend `other`, or unfriend if already friends. Both users change
    /// within the same command.
    pub fn toggle_friendship(&self, other: &str) -> Result<RelationChange> {
        self.with_state(|inner, now| -> Result<RelationChange> {
            let actor = inner.actor()?;
            let change = inner.social.toggle_friendship(&actor.id, other)?;
            inner.persist_users();
            inner.refresh_principal();

            let name = display_name(inner.social.user(other));
            let text = match change {
                RelationChange::Added => format!("You and {name} are now friends"),
                RelationChange::Removed => format!("Removed {name} from your friends"),
            };
            inner.notify(&text, Severity::Success, now);

            info!(user = %actor.id, other, ?change, "friendship toggled");
            inner.events.emit(EngineEvent::RelationChanged {
                user_id: actor.id,
                other_id: other.to_string(),
            });
            Ok(change)
        })
    }

    /// Block or unblock `other`. Only the caller's block list changes.
    pub fn toggle_block(&self, other: &str) -> Result<RelationChange> {
        self.with_state(|inner, now| -> Result<RelationChange> {
            let actor = inner.actor()?;
            let change = inner.social.toggle_block(&actor.id, other)?;
            inner.persist_users();
            inner.refresh_principal();

            let name = display_name(inner.social.user(other));
            let text = match change {
                RelationChange::Added => format!("Blocked {name}"),
                RelationChange::Removed => format!("Unblocked {name}"),
            };
            inner.notify(&text, Severity::Info, now);

            info!(user = %actor.id, other, ?change, "block toggled");
            inner.events.emit(EngineEvent::RelationChanged {
                user_id: actor.id,
                other_id: other.to_string(),
            });
            Ok(change)
        })
    }

    pub fn is_blocked_either_way(&self, a: &str, b: &str) -> bool {
        self.with_state(|inner, _| inner.social.is_blocked_either_way(a, b))
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.with_state(|inner, _| inner.social.user(id).cloned())
    }

    pub fn users(&self) -> Vec<User> {
        self.with_state(|inner, _| inner.social.users().to_vec())
    }

    pub fn friends_of(&self, id: &str) -> Vec<User> {
        self.with_state(|inner, _| inner.social.friends_of(id).into_iter().cloned().collect())
    }

    pub fn blocked_by(&self, id: &str) -> Vec<User> {
        self.with_state(|inner, _| inner.social.blocked_by(id).into_iter().cloned().collect())
    }
}

fn display_name(user: Option<&User>) -> String {
    user.map(|u| u.name.clone()).unwrap_or_else(|| "user".into())
}
