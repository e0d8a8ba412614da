//! Persisted records: contacts, their replies, and what we sent them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mailbox::types::IncomingMessage;

/// Outreach state of a contact.
///
/// `Pending` and `Sent` are the states this service sets; anything else
/// a user typed in is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContactStatus {
    #[default]
    Pending,
    Sent,
    Other(String),
}

impl ContactStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Sent => "Sent",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ContactStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => Self::Pending,
            "Sent" => Self::Sent,
            _ => Self::Other(s),
        }
    }
}

impl From<ContactStatus> for String {
    fn from(status: ContactStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A company we pitch to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub company_name: String,
    pub hr_name: Option<String>,
    pub email: Option<String>,
    pub status: ContactStatus,
    /// Free-form notes about the company.
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(
        company_name: impl Into<String>,
        hr_name: Option<String>,
        email: Option<String>,
        context: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.into(),
            hr_name: non_empty(hr_name),
            email: non_empty(email),
            status: ContactStatus::Pending,
            context: non_empty(context),
            created_at: Utc::now(),
        }
    }
}

/// Fields a client may change on an existing contact. Absent fields are
/// left alone; a blank optional field clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    pub company_name: Option<String>,
    pub hr_name: Option<String>,
    pub email: Option<String>,
    pub status: Option<ContactStatus>,
    pub context: Option<String>,
}

impl Contact {
    /// Apply a partial update. A blank `company_name` is ignored.
    pub fn apply(&mut self, update: ContactUpdate) {
        if let Some(name) = update.company_name.map(|n| n.trim().to_string())
            && !name.is_empty()
        {
            self.company_name = name;
        }
        if update.hr_name.is_some() {
            self.hr_name = non_empty(update.hr_name);
        }
        if update.email.is_some() {
            self.email = non_empty(update.email);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.context.is_some() {
            self.context = non_empty(update.context);
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// A stored inbound reply. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub sender_email: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    /// Globally unique; a second insert with the same id is ignored.
    pub message_id: String,
}

impl ReplyRecord {
    pub fn from_message(contact_id: Uuid, msg: &IncomingMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            contact_id,
            sender_email: msg.sender.clone(),
            subject: msg.subject.clone(),
            body: msg.body.clone(),
            received_at: msg.received_at,
            message_id: msg.message_id.clone(),
        }
    }
}

/// An email we sent to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEmail {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub subject: String,
    pub body: String,
    /// Message-ID of the reply this email answered, without angle brackets.
    pub in_reply_to: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl SentEmail {
    pub fn new(
        contact_id: Uuid,
        subject: impl Into<String>,
        body: impl Into<String>,
        in_reply_to: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contact_id,
            subject: subject.into(),
            body: body.into(),
            in_reply_to,
            sent_at: Utc::now(),
        }
    }
}

/// One row of the sent-mail log, with the recipient's company.
///
/// A sent email whose contact is gone reports `"Unknown"` for both
/// contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentEmailOverview {
    pub id: Uuid,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    pub contact_company: String,
    pub contact_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(ContactStatus::from("Sent".to_string()), ContactStatus::Sent);
        assert_eq!(
            ContactStatus::from("Follow up in May".to_string()),
            ContactStatus::Other("Follow up in May".into())
        );
        assert_eq!(String::from(ContactStatus::Pending), "Pending");
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let json = serde_json::to_string(&ContactStatus::Sent).unwrap();
        assert_eq!(json, "\"Sent\"");
        let parsed: ContactStatus = serde_json::from_str("\"Interview\"").unwrap();
        assert_eq!(parsed, ContactStatus::Other("Interview".into()));
    }

    #[test]
    fn new_contact_drops_blank_fields() {
        let c = Contact::new("Acme", Some("  ".into()), Some(" hr@acme.com ".into()), None);
        assert_eq!(c.hr_name, None);
        assert_eq!(c.email.as_deref(), Some("hr@acme.com"));
        assert_eq!(c.status, ContactStatus::Pending);
    }

    #[test]
    fn update_touches_only_given_fields() {
        let mut c = Contact::new("Acme", Some("Priya".into()), Some("hr@acme.com".into()), None);
        c.apply(ContactUpdate {
            email: Some("jobs@acme.com".into()),
            status: Some(ContactStatus::from("Interview in May".to_string())),
            ..Default::default()
        });
        assert_eq!(c.company_name, "Acme");
        assert_eq!(c.hr_name.as_deref(), Some("Priya"));
        assert_eq!(c.email.as_deref(), Some("jobs@acme.com"));
        assert_eq!(c.status, ContactStatus::Other("Interview in May".into()));
    }

    #[test]
    fn update_clears_blank_fields_but_keeps_company() {
        let mut c = Contact::new("Acme", Some("Priya".into()), None, Some("fintech".into()));
        let update: ContactUpdate =
            serde_json::from_str(r#"{"company_name": "  ", "hr_name": "", "context": " "}"#)
                .unwrap();
        c.apply(update);
        assert_eq!(c.company_name, "Acme");
        assert_eq!(c.hr_name, None);
        assert_eq!(c.context, None);
    }
}
