//! Server configuration from the environment (and an optional `.env`).

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

/// Used when `JWT_SECRET` is unset. Never deploy with it.
pub const DEV_JWT_SECRET: &str = "knowledge-hub-development-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// sqlx connection URL (default `sqlite://knowledge-hub.db`)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Listen address (default `127.0.0.1:5000`)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// HS256 signing secret; falls back to [`DEV_JWT_SECRET`]
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Bearer token lifetime in seconds (default 7 days)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Password reset token lifetime in seconds (default 1 hour)
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_secs: u64,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
}

fn default_database_url() -> String { "sqlite://knowledge-hub.db".to_string() }
fn default_bind_addr() -> String { "127.0.0.1:5000".to_string() }
fn default_token_ttl() -> u64 { 7 * 24 * 60 * 60 }
fn default_reset_token_ttl() -> u64 { 60 * 60 }
fn default_max_connections() -> u32 { 10 }

/// Environment keys read as strings, with the field each one fills.
const STRING_KEYS: [(&str, &str); 3] = [
    ("DATABASE_URL", "database_url"),
    ("BIND_ADDR", "bind_addr"),
    ("JWT_SECRET", "jwt_secret"),
];

const NUMBER_KEYS: [(&str, &str); 3] = [
    ("TOKEN_TTL_SECS", "token_ttl_secs"),
    ("RESET_TOKEN_TTL_SECS", "reset_token_ttl_secs"),
    ("DB_MAX_CONNECTIONS", "db_max_connections"),
];

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or empty keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut fields = Map::new();
        for (key, field) in STRING_KEYS {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                fields.insert(field.to_string(), Value::String(value));
            }
        }
        for (key, field) in NUMBER_KEYS {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                let number: u64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("{key} must be a number"))?;
                fields.insert(field.to_string(), Value::from(number));
            }
        }
        serde_json::from_value(Value::Object(fields)).context("invalid configuration")
    }

    pub fn jwt_secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET is not set; using the development secret");
                DEV_JWT_SECRET
            }
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_secs)
    }
}
