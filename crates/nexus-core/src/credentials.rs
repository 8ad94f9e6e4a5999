//! Credential verification policy.
//!
//! The session store never compares secrets itself; it asks a
//! [`CredentialVerifier`]. The stock [`RoleCredentials`] keeps one BLAKE3
//! digest per role and compares in constant time.

use std::collections::HashMap;

use subtle::ConstantTimeEq;

use nexus_shared::Role;
use nexus_store::User;

use crate::config::{digest, EngineConfig};

pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, user: &User, secret: &str) -> bool;
}

impl<F> CredentialVerifier for F
where
    F: Fn(&User, &str) -> bool + Send + Sync,
{
    fn verify(&self, user: &User, secret: &str) -> bool {
        self(user, secret)
    }
}

/// One shared secret per role. Roles without an entry cannot log in.
#[derive(Debug, Clone, Default)]
pub struct RoleCredentials {
    digests: HashMap<Role, [u8; 32]>,
}

impl RoleCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new()
            .with_digest(Role::Admin, config.admin_digest)
            .with_digest(Role::Member, config.member_digest)
    }

    pub fn with_secret(self, role: Role, secret: &str) -> Self {
        self.with_digest(role, digest(secret))
    }

    pub fn with_digest(mut self, role: Role, digest: [u8; 32]) -> Self {
        self.digests.insert(role, digest);
        self
    }
}

impl CredentialVerifier for RoleCredentials {
    fn verify(&self, user: &User, secret: &str) -> bool {
        let Some(expected) = self.digests.get(&user.role) else {
            return false;
        };
        let given = digest(secret);
        expected[..].ct_eq(&given[..]).unwrap_u8() == 1
    }
}
