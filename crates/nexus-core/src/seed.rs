//! Built-in demonstration dataset.
//!
//! Used whenever a collection has no readable snapshot. Timestamps are
//! relative to `now` so a fresh install shows a plausible feed.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use nexus_shared::constants::BOT_ID;
use nexus_shared::{Category, DeliveryStatus, MessageKind, Role};
use nexus_store::{Message, Post, User};

fn user(id: &str, name: &str, email: &str, role: Role, online: bool, friends: &[&str]) -> User {
    User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        avatar: format!("https://picsum.photos/seed/{id}/200/200"),
        role,
        is_online: online,
        friend_ids: friends.iter().map(|f| f.to_string()).collect(),
        blocked_ids: BTreeSet::new(),
    }
}

pub fn users() -> Vec<User> {
    vec![
        user(
            "admin-1",
            "BinhMinhWL Admin",
            "admin123@gmail.com",
            Role::Admin,
            true,
            &["user-1", "user-2", "user-3"],
        ),
        user("user-1", "Alex Developer", "alex@nexus.com", Role::Member, true, &["admin-1"]),
        user("user-2", "Sarah Designer", "sarah@nexus.com", Role::Member, false, &["admin-1"]),
        user("user-3", "John Product", "john@nexus.com", Role::Member, true, &["admin-1"]),
        bot(),
    ]
}

pub fn bot() -> User {
    User {
        avatar: "https://ui-avatars.com/api/?name=AI&background=0D8ABC&color=fff".into(),
        ..user(BOT_ID, "Natch", "ai@binhminhwl.com", Role::Bot, true, &[])
    }
}

pub fn posts(now: DateTime<Utc>) -> Vec<Post> {
    let seeded = users();
    let author = |id: &str| {
        seeded
            .iter()
            .find(|u| u.id == id)
            .map(User::snapshot)
            .unwrap_or_else(|| bot().snapshot())
    };

    vec![
        Post {
            id: "p-2".into(),
            author_id: "user-2".into(),
            body: "Has everyone tried chatting with Natch yet? It's surprisingly clever!".into(),
            images: Vec::new(),
            likes: 45,
            liked_by: BTreeSet::new(),
            created_at: now - Duration::milliseconds(3_600_000),
            category: Category::Community,
            author: author("user-2"),
            comments_count: 0,
        },
        Post {
            id: "p-1".into(),
            author_id: "admin-1".into(),
            body: "Welcome to BinhMinhWL! We just shipped a new AI chat assistant called Natch."
                .into(),
            images: vec!["https://picsum.photos/seed/update/800/400".into()],
            likes: 1_240,
            liked_by: BTreeSet::new(),
            created_at: now - Duration::milliseconds(10_000_000),
            category: Category::Announcement,
            author: author("admin-1"),
            comments_count: 0,
        },
    ]
}

pub fn messages(now: DateTime<Utc>) -> Vec<Message> {
    vec![Message {
        id: "m-0".into(),
        sender_id: BOT_ID.into(),
        recipient_id: "user-1".into(),
        body: "Hi, I'm Natch. How can I help you?".into(),
        created_at: now - Duration::milliseconds(500_000),
        kind: MessageKind::Text,
        status: DeliveryStatus::Read,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_friendships_are_symmetric() {
        let users = users();
        for u in &users {
            for f in &u.friend_ids {
                let other = users.iter().find(|o| &o.id == f).unwrap();
                assert!(other.friend_ids.contains(&u.id), "{} -> {}", u.id, f);
            }
        }
    }

    #[test]
    fn seeded_feed_is_newest_first_with_one_of_each_category() {
        let posts = posts(Utc::now());
        assert_eq!(posts.len(), 2);
        assert!(posts[0].created_at > posts[1].created_at);
        assert_eq!(posts[0].category, Category::Community);
        assert_eq!(posts[1].category, Category::Announcement);
        assert!(posts.iter().all(|p| p.comments_count == 0));
    }

    #[test]
    fn seed_includes_the_bot() {
        assert!(users().iter().any(|u| u.id == BOT_ID && u.role == Role::Bot));
        assert_eq!(messages(Utc::now())[0].sender_id, BOT_ID);
    }
}
