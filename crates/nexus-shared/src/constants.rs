/// Application name
pub const APP_NAME: &str = "Nexus";

/// Identifier of the automated chat participant
pub const BOT_ID: &str = "ai-natch";

/// Identifier handed to guest principals
pub const GUEST_ID: &str = "guest";

/// Delay before the bot answers a direct message (ms)
pub const BOT_REPLY_DELAY_MS: i64 = 1_500;

/// Lifetime of an advisory notification (ms)
pub const NOTIFICATION_TTL_MS: i64 = 4_000;

/// Minimum interval between two comments by the same author (ms)
pub const COMMENT_SPAM_WINDOW_MS: i64 = 10_000;

/// Length of the login throttle window (ms)
pub const LOGIN_WINDOW_MS: i64 = 10 * 60 * 1_000;

/// Login attempts allowed inside one throttle window
pub const LOGIN_MAX_ATTEMPTS: u32 = 10;

/// Default simulated login latency (ms)
pub const LOGIN_LATENCY_MS: u64 = 800;

/// Snapshot keys, one per persisted entity collection
pub const KEY_POSTS: &str = "posts";
pub const KEY_COMMENTS: &str = "comments";
pub const KEY_MESSAGES: &str = "messages";
pub const KEY_GROUPS: &str = "groups";
pub const KEY_USERS: &str = "users";
pub const KEY_SESSION: &str = "session";
