//! Application settings loaded from environment variables.

use std::env;
use std::time::Duration;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_MAIL_FROM, DEFAULT_NOTIFY_TIMEOUT_SECS, DEFAULT_SMTP_PORT,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub notify_timeout_secs: u64,
    pub smtp: SmtpSettings,
}

/// Mail transport settings. `host == None` means SMTP is not configured and
/// the notifier logs messages instead of sending them.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("notify_timeout_secs", &self.notify_timeout_secs)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username.as_deref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_deref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            notify_timeout_secs: env::var("NOTIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS),
            smtp: SmtpSettings::from_env(),
        }
    }

    /// Upper bound on a single notification send.
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

impl SmtpSettings {
    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok(),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: env::var("SMTP_USER").ok(),
            password: env::var("SMTP_PASS").ok(),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
        }
    }

    /// Whether a real transport is available.
    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }
}
