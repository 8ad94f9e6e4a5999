//! In-memory entity stores.
//!
//! Each store owns one slice of the state and knows nothing about locking,
//! persistence, or timers; the engine composes them.

pub mod content;
pub mod messaging;
pub mod notifications;
pub mod session;
pub mod social;

pub use content::ContentStore;
pub use messaging::MessagingStore;
pub use notifications::{Notification, NotificationBroker};
pub use session::SessionStore;
pub use social::{RelationChange, SocialGraph};
