//! Messages produced by one poll cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded inbound message. Lives only for the duration of one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Address from the `From` header, lower-cased.
    pub sender: String,
    /// Decoded `Subject`, empty if the header is absent.
    pub subject: String,
    /// Reply text with quoted history removed.
    pub body: String,
    /// Parsed `Date` header, or the time of the poll if it was unusable.
    pub received_at: DateTime<Utc>,
    /// `Message-ID` without angle brackets.
    pub message_id: String,
}
