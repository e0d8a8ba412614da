//! `Database` trait: the single async interface for all persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::model::{Contact, ContactStatus, ReplyRecord, SentEmail, SentEmailOverview};

/// Backend-agnostic database trait covering contacts, replies and sent mail.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Contacts ────────────────────────────────────────────────────

    async fn insert_contact(&self, contact: &Contact) -> Result<(), DatabaseError>;

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>, DatabaseError>;

    /// All contacts, newest first.
    async fn list_contacts(&self) -> Result<Vec<Contact>, DatabaseError>;

    /// Overwrite the editable fields of a contact. Returns `false` when
    /// no contact has this id.
    async fn update_contact(&self, contact: &Contact) -> Result<bool, DatabaseError>;

    /// Remove a contact together with its replies and sent mail.
    /// Returns `false` when no contact has this id.
    async fn delete_contact(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn update_contact_status(
        &self,
        id: Uuid,
        status: &ContactStatus,
    ) -> Result<(), DatabaseError>;

    /// `(email, contact_id)` for every contact with an address, oldest
    /// contact first. Emails are returned as stored.
    async fn contact_email_index(&self) -> Result<Vec<(String, Uuid)>, DatabaseError>;

    // ── Replies ─────────────────────────────────────────────────────

    /// Whether a reply with this Message-ID is already stored.
    async fn reply_exists(&self, message_id: &str) -> Result<bool, DatabaseError>;

    /// Store a reply. Returns `false` when the Message-ID was already
    /// present and nothing was written.
    async fn insert_reply(&self, reply: &ReplyRecord) -> Result<bool, DatabaseError>;

    /// Replies for a contact, oldest first.
    async fn list_replies_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Vec<ReplyRecord>, DatabaseError>;

    /// The most recently received reply for a contact.
    async fn latest_reply_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Option<ReplyRecord>, DatabaseError>;

    // ── Sent mail ───────────────────────────────────────────────────

    async fn insert_sent_email(&self, sent: &SentEmail) -> Result<(), DatabaseError>;

    /// Every sent email with its recipient, newest first.
    async fn list_sent_emails(&self) -> Result<Vec<SentEmailOverview>, DatabaseError>;

    /// Sent emails for a contact, oldest first.
    async fn list_sent_emails_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Vec<SentEmail>, DatabaseError>;
}
