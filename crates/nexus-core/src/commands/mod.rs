//! Engine commands and queries.
//!
//! Each sub-module adds an `impl Engine` block for one domain. Every
//! public function runs as a single atomic command through
//! `Engine::with_state`.

pub mod content;
pub mod messaging;
pub mod notifications;
pub mod session;
pub mod social;
