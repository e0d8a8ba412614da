//! Configuration types.
//!
//! Library code only ever sees these structs; reading the environment
//! happens once, in the binary, through the `from_env()` constructors.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Account credentials, shared by the IMAP poller and the SMTP mailer.
const ACCOUNT_EMAIL_VAR: &str = "SMTP_EMAIL";
const ACCOUNT_PASSWORD_VAR: &str = "SMTP_PASSWORD";

// ── Mailbox ─────────────────────────────────────────────────────────

/// Inbox the poller reads replies from.
#[derive(Debug, Clone)]
pub struct MailboxConfig {
    pub host: String,
    pub port: u16,
    /// Login name; also the polling account's own address for self-filtering.
    pub username: String,
    pub password: SecretString,
}

impl MailboxConfig {
    /// Build a config for the default IMAP endpoint.
    ///
    /// Fails if either credential is empty; no connection is attempted.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar(ACCOUNT_EMAIL_VAR.into()));
        }
        if password.is_empty() {
            return Err(ConfigError::MissingEnvVar(ACCOUNT_PASSWORD_VAR.into()));
        }
        Ok(Self {
            host: DEFAULT_IMAP_HOST.to_string(),
            port: DEFAULT_IMAP_PORT,
            username,
            password: SecretString::from(password),
        })
    }

    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Build from `SMTP_EMAIL` / `SMTP_PASSWORD`, with optional
    /// `IMAP_HOST` / `IMAP_PORT` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let (username, password) = account_from_env()?;
        let host = std::env::var("IMAP_HOST").unwrap_or_else(|_| DEFAULT_IMAP_HOST.to_string());
        let port = parse_env("IMAP_PORT", DEFAULT_IMAP_PORT)?;
        Ok(Self::new(username, password)?.with_server(host, port))
    }
}

// ── SMTP ────────────────────────────────────────────────────────────

/// Outbound SMTP submission settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let (username, password) = account_from_env()?;
        Ok(Self {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string()),
            port: parse_env("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            from_address: username.clone(),
            username,
            password: SecretString::from(password),
        })
    }
}

// ── Server ──────────────────────────────────────────────────────────

/// What to store as the body of an HTML-only message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtmlBodyPolicy {
    /// Keep the raw HTML markup.
    #[default]
    Preserve,
    /// Remove tags, keeping line structure.
    StripTags,
}

impl FromStr for HtmlBodyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve" | "raw" => Ok(Self::Preserve),
            "strip" | "strip_tags" | "text" => Ok(Self::StripTags),
            other => Err(ConfigError::InvalidValue {
                key: "PITCHER_HTML_BODY".into(),
                message: format!("expected 'preserve' or 'strip', got '{other}'"),
            }),
        }
    }
}

/// HTTP server and storage settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// How many of the newest inbox messages one check examines.
    pub poll_limit: NonZeroUsize,
    pub html_body: HtmlBodyPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            db_path: PathBuf::from("./data/placement-pitcher.db"),
            poll_limit: NonZeroUsize::new(20).unwrap_or(NonZeroUsize::MIN),
            html_body: HtmlBodyPolicy::Preserve,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let poll_limit = match std::env::var("PITCHER_POLL_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "PITCHER_POLL_LIMIT".into(),
                    message: e.to_string(),
                })?,
            Err(_) => defaults.poll_limit,
        };

        let html_body = match std::env::var("PITCHER_HTML_BODY") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.html_body,
        };

        Ok(Self {
            port: parse_env("PITCHER_PORT", defaults.port)?,
            db_path: std::env::var("PITCHER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            poll_limit,
            html_body,
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn account_from_env() -> Result<(String, String), ConfigError> {
    let username = std::env::var(ACCOUNT_EMAIL_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(ACCOUNT_EMAIL_VAR.into()))?;
    let password = std::env::var(ACCOUNT_PASSWORD_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(ACCOUNT_PASSWORD_VAR.into()))?;
    Ok((username, password))
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
