//! Outbound mail: pitches and follow-ups to contacts.

pub mod smtp;

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Error, SendError};
use crate::store::{ContactStatus, Database, SentEmail};

pub use smtp::SmtpMailer;

/// A message ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Message-ID being answered, with or without angle brackets.
    pub in_reply_to: Option<String>,
}

/// Blocking mail submission. Called from `spawn_blocking`.
pub trait MailSender: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<(), SendError>;
}

/// Sends mail to contacts and keeps the store in step.
pub struct OutreachService {
    db: Arc<dyn Database>,
    mailer: Arc<dyn MailSender>,
}

impl OutreachService {
    pub fn new(db: Arc<dyn Database>, mailer: Arc<dyn MailSender>) -> Self {
        Self { db, mailer }
    }

    /// Email a contact, replying to their latest reply if there is one.
    ///
    /// On success the email is recorded and the contact marked `Sent`.
    /// Once the mail has been handed to the server the call succeeds even
    /// if recording it fails; that failure is only logged.
    pub async fn send_to_contact(
        &self,
        contact_id: Uuid,
        subject: &str,
        body: &str,
    ) -> Result<SentEmail, Error> {
        let contact = self
            .db
            .get_contact(contact_id)
            .await?
            .ok_or_else(|| Error::ContactNotFound(contact_id.to_string()))?;
        let to = contact.email.clone().ok_or_else(|| {
            Error::InvalidRequest(format!("{} has no email address", contact.company_name))
        })?;

        let in_reply_to = self
            .db
            .latest_reply_for_contact(contact_id)
            .await?
            .map(|r| r.message_id);

        let email = OutgoingEmail {
            to,
            subject: subject.to_string(),
            body: body.to_string(),
            in_reply_to: in_reply_to.clone(),
        };
        let mailer = Arc::clone(&self.mailer);
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| SendError::Transport(format!("send task failed: {e}")))??;

        // The mail is out; a store failure from here on must not read as a
        // failed send, or the caller would send it again.
        let sent = SentEmail::new(contact_id, subject, body, in_reply_to);
        if let Err(e) = self.db.insert_sent_email(&sent).await {
            error!(contact_id = %contact_id, sent_id = %sent.id, "Email sent but not recorded: {e}");
        }
        if let Err(e) = self
            .db
            .update_contact_status(contact_id, &ContactStatus::Sent)
            .await
        {
            error!(contact_id = %contact_id, "Email sent but status not updated: {e}");
        }

        info!(contact_id = %contact_id, threaded = sent.in_reply_to.is_some(), "Outreach email sent");
        Ok(sent)
    }
}
