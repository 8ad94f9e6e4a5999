//! Shared fixtures for the engine's unit tests.

use std::sync::Arc;

use nexus_store::MemoryBackend;

use crate::clock::ManualClock;
use crate::config::EngineConfig;
use crate::engine::Engine;

pub(crate) const MEMBER_SECRET: &str = "password";
pub(crate) const ADMIN_SECRET: &str = "admin-password";

pub(crate) struct Harness {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    pub backend: MemoryBackend,
}

impl Harness {
    /// Fresh engine over an empty backend, seeded data, virtual time and
    /// no login latency.
    pub fn new() -> Self {
        Self::over(MemoryBackend::new(), Arc::new(ManualClock::at_epoch()))
    }

    /// Build an engine over existing storage, as after a restart.
    pub fn over(backend: MemoryBackend, clock: Arc<ManualClock>) -> Self {
        let engine = Engine::builder(backend.clone())
            .config(EngineConfig::default().without_latency())
            .clock(clock.clone())
            .build();
        Self {
            engine,
            clock,
            backend,
        }
    }

    pub fn restart(&self) -> Self {
        Self::over(self.backend.clone(), self.clock.clone())
    }

    pub async fn signed_in(email: &str) -> Self {
        let h = Self::new();
        h.login(email).await;
        h
    }

    pub async fn login(&self, email: &str) {
        let secret = if email.starts_with("admin") {
            ADMIN_SECRET
        } else {
            MEMBER_SECRET
        };
        let user = self.engine.authenticate(email, secret).await.unwrap();
        assert_eq!(user.email, email);
    }
}
