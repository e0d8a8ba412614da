//! Mailbox session seam between the poller and the wire protocol.

use crate::config::MailboxConfig;
use crate::error::MailboxError;

/// An authenticated mailbox connection.
///
/// Message numbers are server-assigned sequence numbers, ascending in
/// arrival order.
pub trait MailboxSession {
    fn select_inbox(&mut self) -> Result<(), MailboxError>;

    /// Sequence numbers of every message in the selected folder.
    fn search_all(&mut self) -> Result<Vec<u32>, MailboxError>;

    /// Full RFC 822 bytes of one message.
    fn fetch_message(&mut self, seq: u32) -> Result<Vec<u8>, MailboxError>;

    /// Close the folder and end the session.
    fn logout(&mut self) -> Result<(), MailboxError>;
}

/// Opens authenticated sessions. Connection and login failures are
/// returned from `open`; nothing needs cleaning up in that case.
pub trait MailboxConnector: Send + Sync {
    fn open(&self, config: &MailboxConfig) -> Result<Box<dyn MailboxSession>, MailboxError>;
}
