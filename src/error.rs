//! Error types for placement-pitcher.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Contact {0} not found")]
    ContactNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Configuration-related errors. Raised only at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Connection-level mailbox failures. These abort a whole poll.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Failed to connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Authentication failed for {username}: {reason}")]
    Auth { username: String, reason: String },

    #[error("IMAP {command} failed: {reason}")]
    Protocol { command: String, reason: String },

    #[error("IMAP connection closed by server")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Poll task failed: {0}")]
    Task(String),
}

/// Why a single fetched message could not be turned into an
/// `IncomingMessage`. Never escapes the poller.
#[derive(Debug, thiserror::Error)]
pub enum MessageParseError {
    #[error("message is not valid MIME")]
    Unparseable,

    #[error("message has no Message-ID header")]
    MissingMessageId,

    #[error("body part could not be decoded")]
    Encoding,
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Outbound mail errors.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Transport(String),
}
