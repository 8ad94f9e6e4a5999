//! Engine configuration loaded from environment variables.
//!
//! All settings have defaults so the console can start with zero
//! configuration for local development.

use std::path::PathBuf;
use std::time::Duration;

use nexus_shared::constants::LOGIN_LATENCY_MS;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite file holding the snapshots.
    /// Env: `NEXUS_DB_PATH`
    /// Default: `None` (platform data directory).
    pub db_path: Option<PathBuf>,

    /// BLAKE3 digest of the administrator credential.
    /// Env: `NEXUS_ADMIN_SECRET` (plaintext) or `NEXUS_ADMIN_SECRET_HASH`
    /// (64 hex chars, takes precedence).
    /// Default: digest of `admin-password`.
    pub admin_digest: [u8; 32],

    /// BLAKE3 digest of the member credential.
    /// Env: `NEXUS_MEMBER_SECRET` or `NEXUS_MEMBER_SECRET_HASH`.
    /// Default: digest of `password`.
    pub member_digest: [u8; 32],

    /// Simulated latency applied to every credential login.
    /// Env: `NEXUS_LOGIN_LATENCY_MS`
    /// Default: 800 ms.
    pub login_latency: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            admin_digest: digest("admin-password"),
            member_digest: digest("password"),
            login_latency: Duration::from_millis(LOGIN_LATENCY_MS),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("NEXUS_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(d) = secret_from_env("NEXUS_ADMIN_SECRET") {
            config.admin_digest = d;
        }

        if let Some(d) = secret_from_env("NEXUS_MEMBER_SECRET") {
            config.member_digest = d;
        }

        if let Ok(val) = std::env::var("NEXUS_LOGIN_LATENCY_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.login_latency = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid NEXUS_LOGIN_LATENCY_MS, using default");
                }
            }
        }

        config
    }

    /// Same configuration without the login delay; handy for tests.
    pub fn without_latency(mut self) -> Self {
        self.login_latency = Duration::ZERO;
        self
    }
}

/// BLAKE3 digest of a plaintext secret.
pub fn digest(secret: &str) -> [u8; 32] {
    *blake3::hash(secret.as_bytes()).as_bytes()
}

/// `<VAR>_HASH` wins over `<VAR>`; invalid hashes are logged and ignored.
fn secret_from_env(var: &str) -> Option<[u8; 32]> {
    let hash_var = format!("{var}_HASH");
    if let Ok(hex_digest) = std::env::var(&hash_var) {
        match parse_hex_digest(&hex_digest) {
            Ok(d) => return Some(d),
            Err(e) => tracing::warn!(var = %hash_var, error = %e, "Invalid digest, ignoring"),
        }
    }

    std::env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| digest(&s))
}

/// Parse a 64-character hex string into a 32-byte digest.
fn parse_hex_digest(s: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(s.trim()).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))
}
