//! Direct, group, and bot messages plus group definitions.

use chrono::{DateTime, Utc};

use nexus_shared::{new_id, DeliveryStatus, MessageKind};
use nexus_store::{Group, Message, User};

use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
pub struct MessagingStore {
    /// Insertion order.
    messages: Vec<Message>,
    groups: Vec<Group>,
}

impl MessagingStore {
    pub fn new(messages: Vec<Message>, groups: Vec<Group>) -> Self {
        Self { messages, groups }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn groups_for(&self, user_id: &str) -> Vec<Group> {
        self.groups
            .iter()
            .filter(|g| g.has_member(user_id))
            .cloned()
            .collect()
    }

    pub fn append(
        &mut self,
        sender_id: &str,
        recipient_id: &str,
        body: &str,
        kind: MessageKind,
        status: DeliveryStatus,
        now: DateTime<Utc>,
    ) -> Message {
        let message = Message {
            id: new_id(),
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            body: body.to_string(),
            created_at: now,
            kind,
            status,
        };
        self.messages.push(message.clone());
        message
    }

    /// Create a group owned by `creator`. Member ids are de-duplicated in
    /// order and the creator always comes first. Callers check that every
    /// member exists.
    pub fn create_group(
        &mut self,
        creator: &User,
        name: &str,
        member_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidOperation("group name is empty".into()));
        }

        let mut members = vec![creator.id.clone()];
        for id in member_ids {
            if !members.contains(id) {
                members.push(id.clone());
            }
        }
        if members.len() < 2 {
            return Err(EngineError::InvalidOperation(
                "a group needs at least one other member".into(),
            ));
        }

        let id = new_id();
        let group = Group {
            avatar: format!("https://ui-avatars.com/api/?name={}", name.replace(' ', "+")),
            id,
            name: name.to_string(),
            member_ids: members,
            admin_id: creator.id.clone(),
            created_at: now,
        };
        self.groups.push(group.clone());
        Ok(group)
    }

    /// Messages exchanged between exactly `a` and `b`, oldest first.
    pub fn between(&self, a: &str, b: &str) -> Vec<Message> {
        self.collect_sorted(|m| m.is_between(a, b))
    }

    /// Messages addressed to `group_id`, oldest first.
    pub fn in_group(&self, group_id: &str) -> Vec<Message> {
        self.collect_sorted(|m| m.recipient_id == group_id)
    }

    /// Mark every message from `peer` to `reader` as read; returns how many
    /// changed.
    pub fn mark_read(&mut self, reader: &str, peer: &str) -> usize {
        let mut changed = 0;
        for m in self
            .messages
            .iter_mut()
            .filter(|m| m.sender_id == peer && m.recipient_id == reader)
        {
            if m.status != DeliveryStatus::Read {
                m.status = DeliveryStatus::Read;
                changed += 1;
            }
        }
        changed
    }

    fn collect_sorted<F>(&self, pred: F) -> Vec<Message>
    where
        F: Fn(&Message) -> bool,
    {
        let mut out: Vec<Message> = self.messages.iter().filter(|m| pred(*m)).cloned().collect();
        // Stable: equal timestamps keep insertion order.
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }
}
