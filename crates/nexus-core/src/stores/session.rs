//! Current principal and the login throttle.

use std::collections::BTreeSet;

use nexus_shared::constants::GUEST_ID;
use nexus_shared::Role;
use nexus_store::User;

use crate::rate_limit::LoginThrottle;

#[derive(Debug, Default)]
pub struct SessionStore {
    principal: Option<User>,
    throttle: LoginThrottle,
}

impl SessionStore {
    pub fn new(principal: Option<User>) -> Self {
        Self {
            principal,
            throttle: LoginThrottle::default(),
        }
    }

    pub fn principal(&self) -> Option<&User> {
        self.principal.as_ref()
    }

    pub fn begin(&mut self, principal: User) {
        self.principal = Some(principal);
    }

    /// Clear the principal, returning whoever was signed in.
    pub fn end(&mut self) -> Option<User> {
        self.principal.take()
    }

    pub fn throttle_mut(&mut self) -> &mut LoginThrottle {
        &mut self.throttle
    }
}

/// A throwaway principal with no relations.
pub fn guest_principal() -> User {
    User {
        id: GUEST_ID.to_string(),
        name: "Guest User".to_string(),
        email: String::new(),
        avatar: format!("https://picsum.photos/seed/{GUEST_ID}/200/200"),
        role: Role::Guest,
        is_online: true,
        friend_ids: BTreeSet::new(),
        blocked_ids: BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_and_end() {
        let mut session = SessionStore::default();
        assert!(session.principal().is_none());

        session.begin(guest_principal());
        assert_eq!(session.principal().map(|p| p.role), Some(Role::Guest));

        let ended = session.end().unwrap();
        assert_eq!(ended.id, GUEST_ID);
        assert!(session.principal().is_none());
        assert!(session.end().is_none());
    }

    #[test]
    fn guest_has_no_relations() {
        let guest = guest_principal();
        assert!(guest.friend_ids.is_empty());
        assert!(guest.blocked_ids.is_empty());
        assert_eq!(guest.role, Role::Guest);
    }
}
