//! One-shot inbox poll: fetch the newest messages and turn them into
//! quote-stripped `IncomingMessage`s.
//!
//! A poll never aborts because of a single bad message. Only failures to
//! open the session, select the inbox, or list messages reach the caller.

use std::num::NonZeroUsize;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{HtmlBodyPolicy, MailboxConfig};
use crate::error::{MailboxError, MessageParseError};
use crate::mailbox::parse::parse_message;
use crate::mailbox::session::{MailboxConnector, MailboxSession};
use crate::mailbox::types::IncomingMessage;
use crate::replies::quote::strip_quoted_text;

/// Polls one mailbox account.
pub struct MailboxPoller {
    config: MailboxConfig,
    connector: Box<dyn MailboxConnector>,
    html: HtmlBodyPolicy,
}

impl MailboxPoller {
    pub fn new(config: MailboxConfig, connector: Box<dyn MailboxConnector>) -> Self {
        Self {
            config,
            connector,
            html: HtmlBodyPolicy::default(),
        }
    }

    pub fn with_html_policy(mut self, html: HtmlBodyPolicy) -> Self {
        self.html = html;
        self
    }

    /// The polling account's own address.
    pub fn account(&self) -> &str {
        &self.config.username
    }

    /// Fetch up to `limit` of the most recent inbox messages, newest first.
    ///
    /// Self-sent and undecodable messages are left out. The session is
    /// logged out before returning once it has been opened.
    pub fn fetch_recent_messages(
        &self,
        limit: NonZeroUsize,
    ) -> Result<Vec<IncomingMessage>, MailboxError> {
        let mut session = self.connector.open(&self.config)?;

        let result = self.collect(session.as_mut(), limit);

        if let Err(e) = session.logout() {
            warn!("Mailbox logout failed: {e}");
        }

        let messages = result?;
        info!(count = messages.len(), "Mailbox poll complete");
        Ok(messages)
    }

    fn collect(
        &self,
        session: &mut dyn MailboxSession,
        limit: NonZeroUsize,
    ) -> Result<Vec<IncomingMessage>, MailboxError> {
        session.select_inbox()?;
        let ids = session.search_all()?;
        let start = ids.len().saturating_sub(limit.get());
        let recent = &ids[start..];
        debug!(total = ids.len(), selected = recent.len(), "Inbox searched");

        let mut messages = Vec::with_capacity(recent.len());
        for &seq in recent.iter().rev() {
            match self.read_one(session, seq) {
                Ok(Some(msg)) => messages.push(msg),
                Ok(None) => {}
                Err(reason) => warn!(seq, "Skipping message: {reason}"),
            }
        }
        Ok(messages)
    }

    /// `Ok(None)` for self-sent mail; `Err` for anything unreadable.
    fn read_one(
        &self,
        session: &mut dyn MailboxSession,
        seq: u32,
    ) -> Result<Option<IncomingMessage>, SkipReason> {
        let raw = session.fetch_message(seq).map_err(SkipReason::Fetch)?;
        let mut msg = parse_message(&raw, self.html, Utc::now()).map_err(SkipReason::Parse)?;

        if msg.sender.eq_ignore_ascii_case(&self.config.username) {
            debug!(seq, "Skipping self-sent email");
            return Ok(None);
        }

        msg.body = strip_quoted_text(&msg.body);
        Ok(Some(msg))
    }
}

/// Why a single message was dropped from a poll.
#[derive(Debug, thiserror::Error)]
enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(MailboxError),
    #[error("{0}")]
    Parse(MessageParseError),
}
