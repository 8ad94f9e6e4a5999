//! Domain model structs persisted as JSON snapshots.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be written
//! to the snapshot store and handed directly to the presentation layer.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nexus_shared::{Category, DeliveryStatus, MessageKind, Role};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A known user. The social graph holds the authoritative copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Contact address, used as the login handle.
    pub email: String,
    pub avatar: String,
    pub role: Role,
    #[serde(default)]
    pub is_online: bool,
    /// Symmetric: if `a.friend_ids` holds `b`, `b.friend_ids` holds `a`.
    #[serde(default)]
    pub friend_ids: BTreeSet<String>,
    /// One-directional.
    #[serde(default)]
    pub blocked_ids: BTreeSet<String>,
}

impl User {
    pub fn snapshot(&self) -> AuthorSnapshot {
        AuthorSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            role: self.role,
        }
    }

    pub fn is_friend(&self, other: &str) -> bool {
        self.friend_ids.contains(other)
    }

    pub fn has_blocked(&self, other: &str) -> bool {
        self.blocked_ids.contains(other)
    }
}

/// Read-only copy of a user's public profile taken when content is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorSnapshot {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub avatar: String,
    /// Insertion-ordered, always contains `admin_id`.
    pub member_ids: Vec<String>,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|m| m == user_id)
    }
}

// ---------------------------------------------------------------------------
// Post / Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub body: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub likes: u64,
    /// Users currently liking the post; `likes` counts likes recorded before
    /// tracking as well.
    #[serde(default)]
    pub liked_by: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub category: Category,
    pub author: AuthorSnapshot,
    /// Always equals the number of comments attached to this post.
    pub comments_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSnapshot,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message. `recipient_id` is a user id, a group id, or the bot id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub kind: MessageKind,
    pub status: DeliveryStatus,
}

impl Message {
    /// True when the message travels between exactly `a` and `b`.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.recipient_id == b)
            || (self.sender_id == b && self.recipient_id == a)
    }
}
