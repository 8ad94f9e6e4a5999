use chrono::Duration;
use tracing::{debug, info, warn};

use nexus_shared::constants::{BOT_ID, BOT_REPLY_DELAY_MS};
use nexus_shared::{DeliveryStatus, MessageKind, Severity};
use nexus_store::{Group, Message};

use crate::bot;
use crate::engine::{Engine, Inner};
use crate::error::{EngineError, Result};
use crate::events::EngineEvent;
use crate::scheduler::ScheduledTask;

/// What a recipient id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recipient {
    Bot,
    Group,
    User,
}

fn resolve(inner: &Inner, id: &str) -> Result<Recipient> {
    if id == BOT_ID {
        Ok(Recipient::Bot)
    } else if inner.messaging.group(id).is_some() {
        Ok(Recipient::Group)
    } else if inner.social.user(id).is_some() {
        Ok(Recipient::User)
    } else {
        Err(EngineError::NotFound(format!("recipient {id}")))
    }
}

impl Engine {
    /// Send a message to a user, a group, or the bot.
    ///
    /// Block relations are evaluated here, at send time. Messages to the
    /// bot schedule an independent reply after a fixed delay.
    pub fn send_message(&self, recipient: &str, body: &str, kind: MessageKind) -> Result<Message> {
        self.with_state(|inner, now| -> Result<Message> {
            let sender = inner.actor()?;
            if body.trim().is_empty() {
                return Err(EngineError::InvalidOperation("message is empty".into()));
            }

            match resolve(inner, recipient)? {
                Recipient::User if recipient == sender.id => {
                    return Err(EngineError::InvalidOperation(
                        "cannot message yourself".into(),
                    ));
                }
                Recipient::User if inner.social.is_blocked_either_way(&sender.id, recipient) => {
                    warn!(from = %sender.id, to = recipient, "message blocked");
                    let err = EngineError::Blocked;
                    inner.notify(&err.to_string(), Severity::Error, now);
                    return Err(err);
                }
                Recipient::Group => {
                    let member = inner
                        .messaging
                        .group(recipient)
                        .map(|g| g.has_member(&sender.id))
                        .unwrap_or(false);
                    if !member {
                        return Err(EngineError::InvalidOperation(
                            "not a member of this group".into(),
                        ));
                    }
                }
                Recipient::Bot => {
                    let reply = bot::reply_to(body);
                    inner.scheduler.schedule(
                        now + Duration::milliseconds(BOT_REPLY_DELAY_MS),
                        ScheduledTask::BotReply {
                            recipient_id: sender.id.clone(),
                            body: reply.to_string(),
                        },
                    );
                    debug!(to = %sender.id, "bot reply scheduled");
                }
                Recipient::User => {}
            }

            let message =
                inner
                    .messaging
                    .append(&sender.id, recipient, body, kind, DeliveryStatus::Sent, now);
            inner.persist_messages();

            info!(message = %message.id, from = %sender.id, to = recipient, "message sent");
            inner.events.emit(EngineEvent::MessageAppended {
                message_id: message.id.clone(),
                recipient_id: recipient.to_string(),
            });
            Ok(message)
        })
    }

    /// Create a group owned by the signed-in user.
    pub fn create_group(&self, name: &str, member_ids: &[String]) -> Result<Group> {
        self.with_state(|inner, now| -> Result<Group> {
            let creator = inner.social.require(&inner.actor()?.id)?.clone();
            for id in member_ids {
                inner.social.require(id)?;
            }

            let group = inner
                .messaging
                .create_group(&creator, name, member_ids, now)?;
            inner.persist_groups();

            info!(group = %group.id, members = group.member_ids.len(), "group created");
            inner.notify(
                &format!("Group \"{}\" created", group.name),
                Severity::Success,
                now,
            );
            inner.events.emit(EngineEvent::GroupCreated {
                group_id: group.id.clone(),
            });
            Ok(group)
        })
    }

    /// Conversation with a user, the bot, or a group, oldest first.
    pub fn list_conversation(&self, peer_or_group: &str) -> Result<Vec<Message>> {
        self.with_state(|inner, _| -> Result<Vec<Message>> {
            let me = inner.actor()?;
            match resolve(inner, peer_or_group)? {
                Recipient::Group => {
                    let member = inner
                        .messaging
                        .group(peer_or_group)
                        .map(|g| g.has_member(&me.id))
                        .unwrap_or(false);
                    if !member {
                        return Err(EngineError::InvalidOperation(
                            "not a member of this group".into(),
                        ));
                    }
                    Ok(inner.messaging.in_group(peer_or_group))
                }
                Recipient::Bot | Recipient::User => {
                    Ok(inner.messaging.between(&me.id, peer_or_group))
                }
            }
        })
    }

    /// Groups the signed-in user belongs to.
    pub fn my_groups(&self) -> Result<Vec<Group>> {
        self.with_state(|inner, _| -> Result<Vec<Group>> {
            let me = inner.actor()?;
            Ok(inner.messaging.groups_for(&me.id))
        })
    }

    /// Mark everything `peer` sent to the signed-in user as read.
    pub fn mark_conversation_read(&self, peer: &str) -> Result<usize> {
        self.with_state(|inner, _| -> Result<usize> {
            let me = inner.actor()?;
            let changed = inner.messaging.mark_read(&me.id, peer);
            if changed > 0 {
                inner.persist_messages();
            }
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use nexus_shared::constants::BOT_ID;
    use nexus_shared::{DeliveryStatus, MessageKind, Severity};

    use crate::bot::{GENERIC_REPLY, GREETING_REPLY};
    use crate::error::EngineError;
    use crate::events::EngineEvent;
    use crate::testing::Harness;

    fn bot_replies(h: &Harness) -> Vec<String> {
        h.engine
            .list_conversation(BOT_ID)
            .unwrap()
            .into_iter()
            .filter(|m| m.sender_id == BOT_ID && m.id != "m-0")
            .map(|m| m.body)
            .collect()
    }

    #[tokio::test]
    async fn bot_answers_after_the_delay() {
        let h = Harness::signed_in("alex@nexus.com").await;
        let sent = h
            .engine
            .send_message(BOT_ID, "Hello there", MessageKind::Text)
            .unwrap();
        assert_eq!(sent.status, DeliveryStatus::Sent);

        h.clock.advance_ms(1_499);
        assert_eq!(h.engine.tick(), 0);
        assert!(bot_replies(&h).is_empty());

        h.clock.advance_ms(1);
        assert_eq!(h.engine.tick(), 1);
        let convo = h.engine.list_conversation(BOT_ID).unwrap();
        let reply = convo.last().unwrap();
        assert_eq!(reply.body, GREETING_REPLY);
        assert_eq!(reply.sender_id, BOT_ID);
        assert_eq!(reply.recipient_id, "user-1");
        assert_eq!(reply.status, DeliveryStatus::Read);
    }

    #[tokio::test]
    async fn each_send_gets_its_own_reply() {
        let h = Harness::signed_in("alex@nexus.com").await;
        h.engine
            .send_message(BOT_ID, "hello", MessageKind::Text)
            .unwrap();
        h.clock.advance_ms(500);
        h.engine
            .send_message(BOT_ID, "quantum soup", MessageKind::Text)
            .unwrap();

        h.clock.advance_ms(1_000);
        assert_eq!(bot_replies(&h), [GREETING_REPLY]);

        h.clock.advance_ms(500);
        assert_eq!(bot_replies(&h), [GREETING_REPLY, GENERIC_REPLY]);
    }

    #[tokio::test]
    async fn blocked_send_creates_no_record() {
        let h = Harness::signed_in("alex@nexus.com").await;
        h.engine.toggle_block("user-2").unwrap();
        let mut events = h.engine.subscribe();
        let before = h.engine.messages().len();

        let err = h
            .engine
            .send_message("user-2", "hi", MessageKind::Text)
            .unwrap_err();
        assert!(matches!(err, EngineError::Blocked));
        assert_eq!(h.engine.messages().len(), before);
        assert!(h.engine.list_conversation("user-2").unwrap().is_empty());

        let last = h.engine.notifications().pop().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert!(matches!(
            events.try_recv().unwrap(),
            EngineEvent::NotificationRaised {
                severity: Severity::Error,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn direct_conversation_is_exact_and_ordered() {
        let h = Harness::signed_in("alex@nexus.com").await;
        h.engine
            .send_message("user-2", "one", MessageKind::Text)
            .unwrap();
        h.engine
            .send_message("user-3", "elsewhere", MessageKind::Text)
            .unwrap();

        h.clock.advance_ms(10);
        h.login("sarah@nexus.com").await;
        h.engine
            .send_message("user-1", "two", MessageKind::Text)
            .unwrap();

        let bodies: Vec<_> = h
            .engine
            .list_conversation("user-1")
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, ["one", "two"]);

        assert_eq!(h.engine.mark_conversation_read("user-1").unwrap(), 1);
        assert_eq!(h.engine.mark_conversation_read("user-1").unwrap(), 0);
    }

    #[tokio::test]
    async fn group_chat_requires_membership() {
        let h = Harness::signed_in("alex@nexus.com").await;
        let group = h
            .engine
            .create_group("Builders", &["user-2".to_string()])
            .unwrap();
        assert_eq!(group.member_ids, ["user-1", "user-2"]);
        assert_eq!(h.engine.my_groups().unwrap().len(), 1);

        h.engine
            .send_message(&group.id, "standup?", MessageKind::Text)
            .unwrap();
        assert_eq!(h.engine.list_conversation(&group.id).unwrap().len(), 1);

        h.login("john@nexus.com").await;
        assert!(matches!(
            h.engine.send_message(&group.id, "let me in", MessageKind::Text),
            Err(EngineError::InvalidOperation(_))
        ));
        assert!(matches!(
            h.engine.list_conversation(&group.id),
            Err(EngineError::InvalidOperation(_))
        ));
        assert!(h.engine.my_groups().unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_members_must_exist() {
        let h = Harness::signed_in("alex@nexus.com").await;
        assert!(matches!(
            h.engine.create_group("Ghosts", &["ghost".to_string()]),
            Err(EngineError::NotFound(_))
        ));
        assert!(h.engine.groups().is_empty());
    }

    #[tokio::test]
    async fn invalid_sends_are_rejected() {
        let h = Harness::new();
        assert!(matches!(
            h.engine.send_message("user-2", "hi", MessageKind::Text),
            Err(EngineError::Unauthenticated)
        ));

        h.login("alex@nexus.com").await;
        assert!(matches!(
            h.engine.send_message("nobody", "hi", MessageKind::Text),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            h.engine.send_message("user-1", "me", MessageKind::Text),
            Err(EngineError::InvalidOperation(_))
        ));
        assert!(matches!(
            h.engine.send_message("user-2", "   ", MessageKind::Text),
            Err(EngineError::InvalidOperation(_))
        ));
        assert_eq!(h.engine.pending_tasks(), 0);
    }

    #[tokio::test]
    async fn messages_survive_restart() {
        let h = Harness::signed_in("alex@nexus.com").await;
        h.engine
            .send_message("user-3", "see you", MessageKind::Text)
            .unwrap();

        let restarted = h.restart();
        let convo = restarted.engine.list_conversation("user-3").unwrap();
        assert_eq!(convo.len(), 1);
        assert_eq!(convo[0].body, "see you");
    }
}
