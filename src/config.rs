//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default HTTP listen port.
const DEFAULT_PORT: u16 = 8080;

/// Default idle time before an unfinished registration is dropped.
const DEFAULT_REGISTRATION_IDLE_TTL_SECS: u64 = 30 * 60;

/// Bot configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// LINE channel secret; keys the webhook signature HMAC.
    pub channel_secret: SecretString,
    /// LINE Messaging API bearer token.
    pub channel_access_token: SecretString,
    /// Imgur client ID used for cover photo uploads.
    pub imgur_client_id: SecretString,
    /// libSQL location: a file path, `:memory:`, or a remote URL.
    pub database_url: String,
    /// Auth token for a remote libSQL database.
    pub database_auth_token: Option<SecretString>,
    pub port: u16,
    /// How long an in-progress registration may sit idle before it expires.
    pub registration_idle_ttl: Duration,
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let channel_secret = SecretString::from(required("CHANNEL_SECRET")?);
        let channel_access_token = SecretString::from(required("CHANNEL_ACCESS_TOKEN")?);
        let imgur_client_id = SecretString::from(required("IMGUR_CLIENT_ID")?);
        let database_url = required("DATABASE_URL")?;

        let database_auth_token = lookup("DATABASE_AUTH_TOKEN")
            .filter(|v| !v.is_empty())
            .map(SecretString::from);

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let ttl_secs = match lookup("REGISTRATION_IDLE_TTL_SECS") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "REGISTRATION_IDLE_TTL_SECS".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_REGISTRATION_IDLE_TTL_SECS,
        };

        Ok(Self {
            channel_secret,
            channel_access_token,
            imgur_client_id,
            database_url,
            database_auth_token,
            port,
            registration_idle_ttl: Duration::from_secs(ttl_secs),
        })
    }

    /// Whether `database_url` points at a remote libSQL server.
    pub fn is_remote_database(&self) -> bool {
        self.database_url.starts_with("libsql://")
            || self.database_url.starts_with("https://")
            || self.database_url.starts_with("http://")
    }
}
