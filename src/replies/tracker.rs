//! One reply check: poll the inbox, correlate, persist.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, MailboxError};
use crate::mailbox::poller::MailboxPoller;
use crate::replies::correlate::{CheckSummary, ContactIndex, correlate};
use crate::store::Database;

/// Runs reply checks against one mailbox and one store.
pub struct ReplyTracker {
    poller: Arc<MailboxPoller>,
    db: Arc<dyn Database>,
    limit: NonZeroUsize,
}

impl ReplyTracker {
    pub fn new(poller: MailboxPoller, db: Arc<dyn Database>, limit: NonZeroUsize) -> Self {
        Self {
            poller: Arc::new(poller),
            db,
            limit,
        }
    }

    /// Poll, match against contacts and store new replies.
    ///
    /// Mailbox failures abort the check before anything is written.
    pub async fn check_replies(&self) -> Result<CheckSummary, Error> {
        let poller = Arc::clone(&self.poller);
        let limit = self.limit;
        let messages =
            tokio::task::spawn_blocking(move || poller.fetch_recent_messages(limit))
                .await
                .map_err(|e| MailboxError::Task(e.to_string()))??;

        let index = ContactIndex::from_pairs(self.db.contact_email_index().await?);

        let mut known = HashSet::new();
        for msg in &messages {
            if index.lookup(&msg.sender).is_some() && self.db.reply_exists(&msg.message_id).await? {
                known.insert(msg.message_id.clone());
            }
        }

        let correlation = correlate(&messages, &index, &mut known);

        let mut saved = 0;
        for record in &correlation.records {
            if self.db.insert_reply(record).await? {
                saved += 1;
            } else {
                warn!(message_id = %record.message_id, "Reply stored concurrently, skipped");
            }
        }

        let summary = CheckSummary {
            checked: correlation.summary.checked,
            saved,
        };
        info!(
            checked = summary.checked,
            saved = summary.saved,
            contacts = index.len(),
            "Reply check complete"
        );
        Ok(summary)
    }
}
