//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::model::{Contact, ContactStatus, ReplyRecord, SentEmail, SentEmailOverview};
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_uuid(s: &str, column: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Query(format!("bad {column} '{s}': {e}")))
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn row_err(e: libsql::Error) -> DatabaseError {
    DatabaseError::Query(format!("row parse: {e}"))
}

const CONTACT_COLUMNS: &str = "id, company_name, hr_name, email, status, context, created_at";

/// Column order matches CONTACT_COLUMNS.
fn row_to_contact(row: &libsql::Row) -> Result<Contact, DatabaseError> {
    let id: String = row.get(0).map_err(row_err)?;
    let status: String = row.get(4).map_err(row_err)?;
    let created: String = row.get(6).map_err(row_err)?;
    Ok(Contact {
        id: parse_uuid(&id, "contact id")?,
        company_name: row.get(1).map_err(row_err)?,
        hr_name: row.get(2).ok(),
        email: row.get(3).ok(),
        status: ContactStatus::from(status),
        context: row.get(5).ok(),
        created_at: parse_datetime(&created),
    })
}

const REPLY_COLUMNS: &str = "id, contact_id, sender_email, subject, body, received_at, message_id";

/// Column order matches REPLY_COLUMNS.
fn row_to_reply(row: &libsql::Row) -> Result<ReplyRecord, DatabaseError> {
    let id: String = row.get(0).map_err(row_err)?;
    let contact_id: String = row.get(1).map_err(row_err)?;
    let received: String = row.get(5).map_err(row_err)?;
    Ok(ReplyRecord {
        id: parse_uuid(&id, "reply id")?,
        contact_id: parse_uuid(&contact_id, "contact_id")?,
        sender_email: row.get(2).map_err(row_err)?,
        subject: row.get(3).map_err(row_err)?,
        body: row.get(4).map_err(row_err)?,
        received_at: parse_datetime(&received),
        message_id: row.get(6).map_err(row_err)?,
    })
}

const SENT_COLUMNS: &str = "id, contact_id, subject, body, in_reply_to, sent_at";

/// Column order matches SENT_COLUMNS.
fn row_to_sent(row: &libsql::Row) -> Result<SentEmail, DatabaseError> {
    let id: String = row.get(0).map_err(row_err)?;
    let contact_id: String = row.get(1).map_err(row_err)?;
    let sent: String = row.get(5).map_err(row_err)?;
    Ok(SentEmail {
        id: parse_uuid(&id, "sent email id")?,
        contact_id: parse_uuid(&contact_id, "contact_id")?,
        subject: row.get(2).map_err(row_err)?,
        body: row.get(3).map_err(row_err)?,
        in_reply_to: row.get(4).ok(),
        sent_at: parse_datetime(&sent),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Contacts ────────────────────────────────────────────────────

    async fn insert_contact(&self, contact: &Contact) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO contacts (id, company_name, hr_name, email, status, context, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    contact.id.to_string(),
                    contact.company_name.as_str(),
                    opt_text(contact.hr_name.as_deref()),
                    opt_text(contact.email.as_deref()),
                    contact.status.as_str(),
                    opt_text(contact.context.as_deref()),
                    contact.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_contact: {e}")))?;

        debug!(id = %contact.id, company = %contact.company_name, "Contact inserted");
        Ok(())
    }

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_contact: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_contact(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_contact: {e}"))),
        }
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC, rowid DESC"
                ),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_contacts: {e}")))?;

        let mut contacts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_contacts: {e}")))?
        {
            contacts.push(row_to_contact(&row)?);
        }
        Ok(contacts)
    }

    async fn update_contact(&self, contact: &Contact) -> Result<bool, DatabaseError> {
        let updated = self
            .conn()
            .execute(
                "UPDATE contacts
                 SET company_name = ?1, hr_name = ?2, email = ?3, status = ?4, context = ?5
                 WHERE id = ?6",
                params![
                    contact.company_name.as_str(),
                    opt_text(contact.hr_name.as_deref()),
                    opt_text(contact.email.as_deref()),
                    contact.status.as_str(),
                    opt_text(contact.context.as_deref()),
                    contact.id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_contact: {e}")))?;
        Ok(updated > 0)
    }

    async fn delete_contact(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let id = id.to_string();
        for table in ["email_replies", "sent_emails"] {
            self.conn()
                .execute(
                    &format!("DELETE FROM {table} WHERE contact_id = ?1"),
                    params![id.as_str()],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("delete_contact: {e}")))?;
        }
        let deleted = self
            .conn()
            .execute("DELETE FROM contacts WHERE id = ?1", params![id.as_str()])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_contact: {e}")))?;

        if deleted > 0 {
            debug!(id = %id, "Contact deleted");
        }
        Ok(deleted > 0)
    }

    async fn update_contact_status(
        &self,
        id: Uuid,
        status: &ContactStatus,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "UPDATE contacts SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_contact_status: {e}")))?;
        Ok(())
    }

    async fn contact_email_index(&self) -> Result<Vec<(String, Uuid)>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT email, id FROM contacts
                 WHERE email IS NOT NULL AND email != ''
                 ORDER BY created_at ASC, rowid ASC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("contact_email_index: {e}")))?;

        let mut pairs = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("contact_email_index: {e}")))?
        {
            let email: String = row.get(0).map_err(row_err)?;
            let id: String = row.get(1).map_err(row_err)?;
            pairs.push((email, parse_uuid(&id, "contact id")?));
        }
        Ok(pairs)
    }

    // ── Replies ─────────────────────────────────────────────────────

    async fn reply_exists(&self, message_id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM email_replies WHERE message_id = ?1",
                params![message_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("reply_exists: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row.get(0).unwrap_or(0);
                Ok(count > 0)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(DatabaseError::Query(format!("reply_exists: {e}"))),
        }
    }

    async fn insert_reply(&self, reply: &ReplyRecord) -> Result<bool, DatabaseError> {
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO email_replies
                    (id, contact_id, sender_email, subject, body, received_at, message_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    reply.id.to_string(),
                    reply.contact_id.to_string(),
                    reply.sender_email.as_str(),
                    reply.subject.as_str(),
                    reply.body.as_str(),
                    reply.received_at.to_rfc3339(),
                    reply.message_id.as_str(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_reply: {e}")))?;

        if inserted == 0 {
            debug!(message_id = %reply.message_id, "Reply already stored");
            return Ok(false);
        }
        debug!(id = %reply.id, message_id = %reply.message_id, "Reply inserted");
        Ok(true)
    }

    async fn list_replies_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Vec<ReplyRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {REPLY_COLUMNS} FROM email_replies
                     WHERE contact_id = ?1 ORDER BY received_at ASC, rowid ASC"
                ),
                params![contact_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_replies_for_contact: {e}")))?;

        let mut replies = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_replies_for_contact: {e}")))?
        {
            replies.push(row_to_reply(&row)?);
        }
        Ok(replies)
    }

    async fn latest_reply_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Option<ReplyRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {REPLY_COLUMNS} FROM email_replies
                     WHERE contact_id = ?1 ORDER BY received_at DESC, rowid DESC LIMIT 1"
                ),
                params![contact_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("latest_reply_for_contact: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_reply(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("latest_reply_for_contact: {e}"))),
        }
    }

    // ── Sent mail ───────────────────────────────────────────────────

    async fn insert_sent_email(&self, sent: &SentEmail) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO sent_emails (id, contact_id, subject, body, in_reply_to, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    sent.id.to_string(),
                    sent.contact_id.to_string(),
                    sent.subject.as_str(),
                    sent.body.as_str(),
                    opt_text(sent.in_reply_to.as_deref()),
                    sent.sent_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_sent_email: {e}")))?;

        debug!(id = %sent.id, contact_id = %sent.contact_id, "Sent email recorded");
        Ok(())
    }

    async fn list_sent_emails(&self) -> Result<Vec<SentEmailOverview>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT s.id, s.subject, s.sent_at, c.id, c.company_name, c.email
                 FROM sent_emails s LEFT JOIN contacts c ON c.id = s.contact_id
                 ORDER BY s.sent_at DESC, s.rowid DESC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_sent_emails: {e}")))?;

        let mut sent = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_sent_emails: {e}")))?
        {
            let id: String = row.get(0).map_err(row_err)?;
            let sent_at: String = row.get(2).map_err(row_err)?;
            let contact_id: Option<String> = row.get(3).ok();
            let (contact_company, contact_email) = match contact_id {
                Some(_) => (row.get(4).map_err(row_err)?, row.get(5).ok()),
                None => ("Unknown".to_string(), Some("Unknown".to_string())),
            };
            sent.push(SentEmailOverview {
                id: parse_uuid(&id, "sent email id")?,
                subject: row.get(1).map_err(row_err)?,
                sent_at: parse_datetime(&sent_at),
                contact_company,
                contact_email,
            });
        }
        Ok(sent)
    }

    async fn list_sent_emails_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Vec<SentEmail>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {SENT_COLUMNS} FROM sent_emails
                     WHERE contact_id = ?1 ORDER BY sent_at ASC, rowid ASC"
                ),
                params![contact_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_sent_emails_for_contact: {e}")))?;

        let mut sent = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_sent_emails_for_contact: {e}")))?
        {
            sent.push(row_to_sent(&row)?);
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn contact(company: &str, email: &str) -> Contact {
        Contact::new(company, Some("Priya".into()), Some(email.into()), None)
    }

    fn reply(contact_id: Uuid, message_id: &str, minutes: i64) -> ReplyRecord {
        ReplyRecord {
            id: Uuid::new_v4(),
            contact_id,
            sender_email: "hr@acme.com".into(),
            subject: "Re: Placement drive".into(),
            body: "Interested".into(),
            received_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap()
                + Duration::minutes(minutes),
            message_id: message_id.into(),
        }
    }

    // ── Contacts ────────────────────────────────────────────────────

    #[tokio::test]
    async fn insert_and_get_contact() {
        let db = test_db().await;
        let c = contact("Acme", "hr@acme.com");
        db.insert_contact(&c).await.unwrap();

        let fetched = db.get_contact(c.id).await.unwrap().unwrap();
        assert_eq!(fetched.company_name, "Acme");
        assert_eq!(fetched.hr_name.as_deref(), Some("Priya"));
        assert_eq!(fetched.email.as_deref(), Some("hr@acme.com"));
        assert_eq!(fetched.context, None);
        assert_eq!(fetched.status, ContactStatus::Pending);
    }

    #[tokio::test]
    async fn get_contact_not_found() {
        let db = test_db().await;
        assert!(db.get_contact(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_status_keeps_free_text() {
        let db = test_db().await;
        let c = contact("Acme", "hr@acme.com");
        db.insert_contact(&c).await.unwrap();

        db.update_contact_status(c.id, &ContactStatus::Sent)
            .await
            .unwrap();
        assert_eq!(
            db.get_contact(c.id).await.unwrap().unwrap().status,
            ContactStatus::Sent
        );

        let custom = ContactStatus::Other("Interview scheduled".into());
        db.update_contact_status(c.id, &custom).await.unwrap();
        assert_eq!(db.get_contact(c.id).await.unwrap().unwrap().status, custom);
    }

    #[tokio::test]
    async fn list_contacts_newest_first() {
        let db = test_db().await;
        let mut older = contact("Acme", "hr@acme.com");
        older.created_at = Utc::now() - Duration::days(1);
        let newer = contact("Beta", "jobs@beta.io");
        db.insert_contact(&older).await.unwrap();
        db.insert_contact(&newer).await.unwrap();

        let names: Vec<_> = db
            .list_contacts()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.company_name)
            .collect();
        assert_eq!(names, ["Beta", "Acme"]);
    }

    #[tokio::test]
    async fn email_index_skips_contacts_without_address() {
        let db = test_db().await;
        let mut first = contact("Acme", "hr@acme.com");
        first.created_at = Utc::now() - Duration::hours(2);
        let no_email = Contact::new("Gamma", None, None, None);
        let second = contact("Acme Labs", "hr@acme.com");
        db.insert_contact(&first).await.unwrap();
        db.insert_contact(&no_email).await.unwrap();
        db.insert_contact(&second).await.unwrap();

        let pairs = db.contact_email_index().await.unwrap();
        assert_eq!(
            pairs,
            vec![
                ("hr@acme.com".to_string(), first.id),
                ("hr@acme.com".to_string(), second.id)
            ]
        );
    }

    // ── Replies ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn insert_reply_is_idempotent_on_message_id() {
        let db = test_db().await;
        let c = contact("Acme", "hr@acme.com");
        db.insert_contact(&c).await.unwrap();

        assert!(!db.reply_exists("abc@acme.com").await.unwrap());
        assert!(db.insert_reply(&reply(c.id, "abc@acme.com", 0)).await.unwrap());
        assert!(db.reply_exists("abc@acme.com").await.unwrap());
        assert!(!db.insert_reply(&reply(c.id, "abc@acme.com", 5)).await.unwrap());

        assert_eq!(db.list_replies_for_contact(c.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replies_listed_oldest_first_and_latest_picked() {
        let db = test_db().await;
        let c = contact("Acme", "hr@acme.com");
        db.insert_contact(&c).await.unwrap();

        db.insert_reply(&reply(c.id, "second@acme.com", 30)).await.unwrap();
        db.insert_reply(&reply(c.id, "first@acme.com", 0)).await.unwrap();

        let ids: Vec<_> = db
            .list_replies_for_contact(c.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.message_id)
            .collect();
        assert_eq!(ids, ["first@acme.com", "second@acme.com"]);

        let latest = db.latest_reply_for_contact(c.id).await.unwrap().unwrap();
        assert_eq!(latest.message_id, "second@acme.com");
        assert_eq!(latest.received_at, reply(c.id, "x", 30).received_at);
    }

    #[tokio::test]
    async fn latest_reply_none_without_replies() {
        let db = test_db().await;
        assert!(db
            .latest_reply_for_contact(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    // ── Sent mail ───────────────────────────────────────────────────

    #[tokio::test]
    async fn sent_emails_round_trip() {
        let db = test_db().await;
        let c = contact("Acme", "hr@acme.com");
        db.insert_contact(&c).await.unwrap();

        let first = SentEmail::new(c.id, "Campus placement 2026", "Dear HR", None);
        let follow_up = SentEmail {
            sent_at: first.sent_at + Duration::minutes(1),
            ..SentEmail::new(
                c.id,
                "Re: Campus placement 2026",
                "Following up",
                Some("abc@acme.com".into()),
            )
        };
        db.insert_sent_email(&first).await.unwrap();
        db.insert_sent_email(&follow_up).await.unwrap();

        let sent = db.list_sent_emails_for_contact(c.id).await.unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].in_reply_to, None);
        assert_eq!(sent[1].in_reply_to.as_deref(), Some("abc@acme.com"));
        assert_eq!(sent[1].body, "Following up");
    }

    #[tokio::test]
    async fn sent_email_log_names_recipient_or_unknown() {
        let db = test_db().await;
        let acme = contact("Acme", "hr@acme.com");
        db.insert_contact(&acme).await.unwrap();

        let pitch = SentEmail::new(acme.id, "Campus placement 2026", "Dear HR", None);
        let orphan = SentEmail {
            sent_at: pitch.sent_at + Duration::minutes(5),
            ..SentEmail::new(Uuid::new_v4(), "Old pitch", "Hello", None)
        };
        db.insert_sent_email(&pitch).await.unwrap();
        db.insert_sent_email(&orphan).await.unwrap();

        let log = db.list_sent_emails().await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, orphan.id);
        assert_eq!(log[0].contact_company, "Unknown");
        assert_eq!(log[0].contact_email.as_deref(), Some("Unknown"));
        assert_eq!(log[1].subject, "Campus placement 2026");
        assert_eq!(log[1].contact_company, "Acme");
        assert_eq!(log[1].contact_email.as_deref(), Some("hr@acme.com"));
    }

    // ── Edits ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn update_contact_overwrites_fields() {
        let db = test_db().await;
        let mut c = contact("Acme", "hr@acme.com");
        db.insert_contact(&c).await.unwrap();

        c.company_name = "Acme Labs".into();
        c.hr_name = None;
        c.status = ContactStatus::Other("Call back Friday".into());
        assert!(db.update_contact(&c).await.unwrap());

        let stored = db.get_contact(c.id).await.unwrap().unwrap();
        assert_eq!(stored.company_name, "Acme Labs");
        assert_eq!(stored.hr_name, None);
        assert_eq!(stored.status, ContactStatus::Other("Call back Friday".into()));
        assert_eq!(stored.email.as_deref(), Some("hr@acme.com"));

        let ghost = contact("Ghost", "x@ghost.io");
        assert!(!db.update_contact(&ghost).await.unwrap());
    }

    #[tokio::test]
    async fn delete_contact_removes_its_history() {
        let db = test_db().await;
        let acme = contact("Acme", "hr@acme.com");
        let beta = contact("Beta", "jobs@beta.io");
        db.insert_contact(&acme).await.unwrap();
        db.insert_contact(&beta).await.unwrap();
        db.insert_reply(&reply(acme.id, "a1@acme.com", 0)).await.unwrap();
        db.insert_reply(&reply(beta.id, "b1@beta.io", 0)).await.unwrap();
        db.insert_sent_email(&SentEmail::new(acme.id, "s", "b", None))
            .await
            .unwrap();

        assert!(db.delete_contact(acme.id).await.unwrap());
        assert!(db.get_contact(acme.id).await.unwrap().is_none());
        assert!(!db.reply_exists("a1@acme.com").await.unwrap());
        assert!(db.list_sent_emails().await.unwrap().is_empty());
        assert!(db.reply_exists("b1@beta.io").await.unwrap());

        assert!(!db.delete_contact(acme.id).await.unwrap());
    }

    #[tokio::test]
    async fn file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pitcher.db");
        let c = contact("Acme", "hr@acme.com");
        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.insert_contact(&c).await.unwrap();
        }
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        assert!(db.get_contact(c.id).await.unwrap().is_some());
    }
}
