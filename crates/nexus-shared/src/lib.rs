//! # nexus-shared
//!
//! Types and constants shared by every Nexus crate: role and category
//! enums, message kinds, notification severities, and the fixed timing
//! parameters of the engine.

pub mod constants;
pub mod error;
pub mod types;

pub use error::ParseError;
pub use types::*;
