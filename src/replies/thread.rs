//! Merged view of one contact's conversation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::model::{ReplyRecord, SentEmail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outbound,
    Inbound,
}

/// One email in a thread, whichever way it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadEntry {
    pub direction: Direction,
    pub subject: String,
    pub body: String,
    pub at: DateTime<Utc>,
    /// Set for inbound replies only.
    pub message_id: Option<String>,
}

/// Interleave sent mail and replies by time, oldest first. On equal
/// timestamps outbound entries come first.
pub fn build_thread(sent: &[SentEmail], replies: &[ReplyRecord]) -> Vec<ThreadEntry> {
    let outbound = sent.iter().map(|s| ThreadEntry {
        direction: Direction::Outbound,
        subject: s.subject.clone(),
        body: s.body.clone(),
        at: s.sent_at,
        message_id: None,
    });
    let inbound = replies.iter().map(|r| ThreadEntry {
        direction: Direction::Inbound,
        subject: r.subject.clone(),
        body: r.body.clone(),
        at: r.received_at,
        message_id: Some(r.message_id.clone()),
    });

    let mut entries: Vec<_> = outbound.chain(inbound).collect();
    entries.sort_by_key(|e| (e.at, e.direction));
    entries
}
