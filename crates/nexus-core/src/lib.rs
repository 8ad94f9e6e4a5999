//! # nexus-core
//!
//! The Nexus social-interaction engine.
//!
//! [`Engine`] owns the user graph, the content feed, messaging, sessions
//! and notifications. Every public operation is one atomic command run
//! under a single lock. Delayed effects (bot replies, notification expiry)
//! are entries in an explicit [`scheduler::Scheduler`] that the engine
//! drains on each command, on [`Engine::tick`], or from the background
//! driver started with [`Engine::spawn_driver`]. Time comes from a
//! [`Clock`], so tests can advance it by hand.
//!
//! State is loaded from a [`nexus_store::SnapshotBackend`] at build time
//! and written back after each mutation.

pub mod bot;
pub mod clock;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod events;
pub mod rate_limit;
pub mod scheduler;
pub mod seed;
pub mod stores;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use credentials::{CredentialVerifier, RoleCredentials};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result};
pub use events::EngineEvent;
pub use stores::{Notification, RelationChange};
