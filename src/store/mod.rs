//! Persistence layer: libSQL-backed storage for contacts, replies and sent mail.

pub mod libsql_backend;
pub mod migrations;
pub mod model;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use model::{Contact, ContactStatus, ContactUpdate, ReplyRecord, SentEmail, SentEmailOverview};
pub use traits::Database;
