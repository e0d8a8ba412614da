//! Attach polled messages to contacts and drop anything already seen.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::mailbox::types::IncomingMessage;
use crate::store::model::ReplyRecord;

/// Lower-cased email address → contact id.
#[derive(Debug, Clone, Default)]
pub struct ContactIndex {
    by_email: HashMap<String, Uuid>,
}

impl ContactIndex {
    /// Build from `(email, contact_id)` pairs ordered oldest contact first.
    /// When two contacts share an address the later one wins.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Uuid)>,
        S: AsRef<str>,
    {
        let by_email = pairs
            .into_iter()
            .map(|(email, id)| (email.as_ref().trim().to_lowercase(), id))
            .filter(|(email, _)| !email.is_empty())
            .collect();
        Self { by_email }
    }

    pub fn lookup(&self, email: &str) -> Option<Uuid> {
        self.by_email.get(&email.trim().to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

/// Counts reported back to whoever triggered a check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    /// Messages the poller returned.
    pub checked: usize,
    /// New replies persisted.
    pub saved: usize,
}

impl CheckSummary {
    pub fn message(&self) -> String {
        format!(
            "Checked emails. Found {} recent, saved {} new replies.",
            self.checked, self.saved
        )
    }
}

/// Output of one correlation pass.
#[derive(Debug, Default)]
pub struct Correlation {
    pub records: Vec<ReplyRecord>,
    /// `saved` counts `records`; the tracker overwrites it with the rows
    /// the store actually accepted.
    pub summary: CheckSummary,
}

/// Turn polled messages into new reply records.
///
/// `known` holds Message-IDs that must not be stored again: those already
/// persisted, plus every id emitted earlier in this pass.
pub fn correlate(
    messages: &[IncomingMessage],
    index: &ContactIndex,
    known: &mut HashSet<String>,
) -> Correlation {
    let mut records = Vec::new();

    for msg in messages {
        let Some(contact_id) = index.lookup(&msg.sender) else {
            debug!(sender = %msg.sender, "No contact for sender");
            continue;
        };
        if !known.insert(msg.message_id.clone()) {
            debug!(message_id = %msg.message_id, "Reply already known");
            continue;
        }
        records.push(ReplyRecord::from_message(contact_id, msg));
    }

    Correlation {
        summary: CheckSummary {
            checked: messages.len(),
            saved: records.len(),
        },
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn msg(sender: &str, message_id: &str) -> IncomingMessage {
        IncomingMessage {
            sender: sender.into(),
            subject: "Re: Placement drive".into(),
            body: "Interested".into(),
            received_at: Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap(),
            message_id: message_id.into(),
        }
    }

    #[test]
    fn matches_known_sender() {
        let acme = Uuid::new_v4();
        let index = ContactIndex::from_pairs([("HR@Acme.com", acme)]);
        let out = correlate(&[msg("hr@acme.com", "a1")], &index, &mut HashSet::new());

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].contact_id, acme);
        assert_eq!(out.records[0].sender_email, "hr@acme.com");
        assert_eq!(out.records[0].message_id, "a1");
        assert_eq!(out.summary, CheckSummary { checked: 1, saved: 1 });
    }

    #[test]
    fn unknown_sender_is_discarded() {
        let index = ContactIndex::from_pairs([("hr@acme.com", Uuid::new_v4())]);
        let out = correlate(&[msg("stranger@spam.biz", "s1")], &index, &mut HashSet::new());
        assert!(out.records.is_empty());
        assert_eq!(out.summary, CheckSummary { checked: 1, saved: 0 });
    }

    #[test]
    fn stored_message_id_is_discarded() {
        let index = ContactIndex::from_pairs([("hr@acme.com", Uuid::new_v4())]);
        let mut known = HashSet::from(["a1".to_string()]);
        let out = correlate(&[msg("hr@acme.com", "a1")], &index, &mut known);
        assert!(out.records.is_empty());
    }

    #[test]
    fn duplicate_within_batch_emitted_once() {
        let index = ContactIndex::from_pairs([("hr@acme.com", Uuid::new_v4())]);
        let batch = [msg("hr@acme.com", "a1"), msg("hr@acme.com", "a1")];
        let out = correlate(&batch, &index, &mut HashSet::new());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.summary, CheckSummary { checked: 2, saved: 1 });
    }

    #[test]
    fn emitted_ids_are_remembered() {
        let index = ContactIndex::from_pairs([("hr@acme.com", Uuid::new_v4())]);
        let mut known = HashSet::new();
        correlate(&[msg("hr@acme.com", "a1")], &index, &mut known);
        assert!(known.contains("a1"));

        let again = correlate(&[msg("hr@acme.com", "a1")], &index, &mut known);
        assert!(again.records.is_empty());
    }

    #[test]
    fn unmatched_message_does_not_reserve_its_id() {
        let index = ContactIndex::from_pairs([("hr@acme.com", Uuid::new_v4())]);
        let mut known = HashSet::new();
        correlate(&[msg("stranger@spam.biz", "x1")], &index, &mut known);
        assert!(known.is_empty());
    }

    #[test]
    fn later_contact_wins_shared_address() {
        let older = Uuid::new_v4();
        let newer = Uuid::new_v4();
        let index = ContactIndex::from_pairs([("hr@acme.com", older), ("HR@ACME.COM", newer)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("hr@acme.com"), Some(newer));
    }

    #[test]
    fn blank_addresses_are_not_indexed() {
        let index = ContactIndex::from_pairs([("  ", Uuid::new_v4())]);
        assert!(index.is_empty());
        assert_eq!(index.lookup(""), None);
    }

    #[test]
    fn empty_batch() {
        let out = correlate(&[], &ContactIndex::default(), &mut HashSet::new());
        assert!(out.records.is_empty());
        assert_eq!(out.summary, CheckSummary::default());
    }

    #[test]
    fn summary_message_wording() {
        let s = CheckSummary { checked: 20, saved: 3 };
        assert_eq!(
            s.message(),
            "Checked emails. Found 20 recent, saved 3 new replies."
        );
    }
}
