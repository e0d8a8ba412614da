//! Inbound mailbox access: IMAP session, MIME decoding and the poller.

pub mod imap;
pub mod parse;
pub mod poller;
pub mod session;
pub mod types;

pub use imap::ImapConnector;
pub use poller::MailboxPoller;
pub use session::{MailboxConnector, MailboxSession};
pub use types::IncomingMessage;
