//! Social graph: the authoritative user records and their relations.

use serde::Serialize;
use tracing::warn;

use nexus_store::User;

use crate::error::{EngineError, Result};

/// Outcome of a relation toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationChange {
    Added,
    Removed,
}

#[derive(Debug, Default)]
pub struct SocialGraph {
    users: Vec<User>,
}

impl SocialGraph {
    /// Build the graph, dropping self-edges and one-sided friendships that a
    /// hand-edited or stale snapshot may contain.
    pub fn new(mut users: Vec<User>) -> Self {
        let friend_pairs: Vec<(String, String)> = users
            .iter()
            .flat_map(|u| u.friend_ids.iter().map(move |f| (u.id.clone(), f.clone())))
            .collect();

        for user in &mut users {
            let id = user.id.clone();
            user.friend_ids.retain(|f| {
                let symmetric = *f != id && friend_pairs.contains(&(f.clone(), id.clone()));
                if !symmetric {
                    warn!(user = %id, friend = %f, "dropping one-sided friend edge");
                }
                symmetric
            });
            user.blocked_ids.remove(&id);
        }

        Self { users }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&User> {
        self.user(id)
            .ok_or_else(|| EngineError::NotFound(format!("user {id}")))
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.users
            .iter()
            .find(|u| !u.email.is_empty() && u.email.eq_ignore_ascii_case(email))
    }

    pub fn friends_of(&self, id: &str) -> Vec<&User> {
        match self.user(id) {
            Some(u) => u.friend_ids.iter().filter_map(|f| self.user(f)).collect(),
            None => Vec::new(),
        }
    }

    pub fn blocked_by(&self, id: &str) -> Vec<&User> {
        match self.user(id) {
            Some(u) => u.blocked_ids.iter().filter_map(|b| self.user(b)).collect(),
            None => Vec::new(),
        }
    }

    /// Add the friend edge on both sides, or remove it from both.
    pub fn toggle_friendship(&mut self, a: &str, b: &str) -> Result<RelationChange> {
        self.check_pair(a, b)?;

        let currently = self.user(a).map(|u| u.is_friend(b)).unwrap_or(false);
        for (this, other) in [(a, b), (b, a)] {
            if let Some(u) = self.user_mut(this) {
                if currently {
                    u.friend_ids.remove(other);
                } else {
                    u.friend_ids.insert(other.to_string());
                }
            }
        }

        Ok(if currently {
            RelationChange::Removed
        } else {
            RelationChange::Added
        })
    }

    /// Toggle `b` in `a`'s block set. `b`'s own set is left alone.
    pub fn toggle_block(&mut self, a: &str, b: &str) -> Result<RelationChange> {
        self.check_pair(a, b)?;

        let user = self
            .user_mut(a)
            .ok_or_else(|| EngineError::NotFound(format!("user {a}")))?;
        if user.blocked_ids.remove(b) {
            Ok(RelationChange::Removed)
        } else {
            user.blocked_ids.insert(b.to_string());
            Ok(RelationChange::Added)
        }
    }

    /// Whether either side has blocked the other. Unknown users block no one.
    pub fn is_blocked_either_way(&self, a: &str, b: &str) -> bool {
        let blocks = |x: &str, y: &str| self.user(x).map(|u| u.has_blocked(y)).unwrap_or(false);
        blocks(a, b) || blocks(b, a)
    }

    /// Returns `false` if the user is unknown.
    pub fn set_online(&mut self, id: &str, online: bool) -> bool {
        match self.user_mut(id) {
            Some(u) => {
                u.is_online = online;
                true
            }
            None => false,
        }
    }

    fn check_pair(&self, a: &str, b: &str) -> Result<()> {
        if a == b {
            return Err(EngineError::InvalidOperation(
                "cannot relate a user to themselves".into(),
            ));
        }
        self.require(a)?;
        self.require(b)?;
        Ok(())
    }

    fn user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn graph() -> SocialGraph {
        SocialGraph::new(seed::users())
    }

    #[test]
    fn friendship_toggle_is_symmetric() {
        let mut g = graph();
        assert_eq!(g.toggle_friendship("user-1", "user-2").unwrap(), RelationChange::Added);
        assert!(g.user("user-1").unwrap().is_friend("user-2"));
        assert!(g.user("user-2").unwrap().is_friend("user-1"));

        assert_eq!(g.toggle_friendship("user-2", "user-1").unwrap(), RelationChange::Removed);
        assert!(!g.user("user-1").unwrap().is_friend("user-2"));
        assert!(!g.user("user-2").unwrap().is_friend("user-1"));
    }

    #[test]
    fn self_relations_are_rejected() {
        let mut g = graph();
        assert!(matches!(
            g.toggle_friendship("user-1", "user-1"),
            Err(EngineError::InvalidOperation(_))
        ));
        assert!(matches!(
            g.toggle_block("user-1", "user-1"),
            Err(EngineError::InvalidOperation(_))
        ));
    }

    #[test]
    fn unknown_users_are_not_found_and_nothing_changes() {
        let mut g = graph();
        assert!(matches!(
            g.toggle_friendship("user-1", "ghost"),
            Err(EngineError::NotFound(_))
        ));
        assert!(!g.user("user-1").unwrap().is_friend("ghost"));
    }

    #[test]
    fn block_is_one_sided_but_checked_both_ways() {
        let mut g = graph();
        g.toggle_block("user-1", "user-3").unwrap();

        assert!(g.user("user-1").unwrap().has_blocked("user-3"));
        assert!(!g.user("user-3").unwrap().has_blocked("user-1"));
        assert!(g.is_blocked_either_way("user-1", "user-3"));
        assert!(g.is_blocked_either_way("user-3", "user-1"));

        g.toggle_block("user-1", "user-3").unwrap();
        assert!(!g.is_blocked_either_way("user-3", "user-1"));
    }

    #[test]
    fn one_sided_edges_are_dropped_on_load() {
        let mut users = seed::users();
        users[1].friend_ids.insert("user-2".into());
        users[1].friend_ids.insert("user-1".into());
        let g = SocialGraph::new(users);

        let alex = g.user("user-1").unwrap();
        assert!(!alex.is_friend("user-2"));
        assert!(!alex.is_friend("user-1"));
        assert!(alex.is_friend("admin-1"));
    }

    #[test]
    fn lookup_by_email_ignores_case() {
        let g = graph();
        assert_eq!(g.find_by_email("ALEX@nexus.com").unwrap().id, "user-1");
        assert!(g.find_by_email("").is_none());
        assert_eq!(g.friends_of("admin-1").len(), 3);
    }
}
