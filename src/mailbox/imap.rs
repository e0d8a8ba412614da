//! Minimal blocking IMAP4rev1 client over rustls.
//!
//! Only what the poller needs: LOGIN, SELECT, SEARCH ALL, FETCH RFC822,
//! CLOSE and LOGOUT. Run it from `spawn_blocking`.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::config::MailboxConfig;
use crate::error::MailboxError;
use crate::mailbox::session::{MailboxConnector, MailboxSession};

const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Completion status of a tagged command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    No,
    Bad,
}

/// One untagged response line, with any `{N}` literals lifted out.
#[derive(Debug, Clone, Default)]
pub struct ResponseLine {
    /// Line text with literals replaced by their `{N}` markers.
    pub text: String,
    pub literals: Vec<Vec<u8>>,
}

/// Everything the server sent for one command.
#[derive(Debug, Clone)]
pub struct Response {
    pub untagged: Vec<ResponseLine>,
    pub status: Status,
    /// Human-readable text after the status word.
    pub text: String,
}

/// IMAP protocol session over any byte stream.
pub struct ImapSession<S: Read + Write> {
    stream: BufReader<S>,
    next_tag: u32,
}

impl<S: Read + Write> ImapSession<S> {
    /// Wrap a connected stream and consume the server greeting.
    pub fn start(stream: S) -> Result<Self, MailboxError> {
        let mut session = Self {
            stream: BufReader::new(stream),
            next_tag: 1,
        };
        let greeting = session.read_line()?;
        let upper = greeting.text.to_ascii_uppercase();
        if !(upper.starts_with("* OK") || upper.starts_with("* PREAUTH")) {
            return Err(MailboxError::Protocol {
                command: "greeting".into(),
                reason: greeting.text,
            });
        }
        Ok(session)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), MailboxError> {
        let resp = self.command(&format!("LOGIN {} {}", quote(username), quote(password)))?;
        if resp.status != Status::Ok {
            return Err(MailboxError::Auth {
                username: username.to_string(),
                reason: resp.text,
            });
        }
        Ok(())
    }

    pub fn select(&mut self, mailbox: &str) -> Result<(), MailboxError> {
        self.command_ok("SELECT", &format!("SELECT {}", quote(mailbox)))
            .map(|_| ())
    }

    pub fn search(&mut self, criteria: &str) -> Result<Vec<u32>, MailboxError> {
        let resp = self.command_ok("SEARCH", &format!("SEARCH {criteria}"))?;
        let mut ids = Vec::new();
        for line in &resp.untagged {
            let mut words = line.text.split_whitespace();
            if words.next() == Some("*")
                && words.next().is_some_and(|w| w.eq_ignore_ascii_case("SEARCH"))
            {
                ids.extend(words.filter_map(|w| w.parse::<u32>().ok()));
            }
        }
        Ok(ids)
    }

    pub fn fetch_rfc822(&mut self, seq: u32) -> Result<Vec<u8>, MailboxError> {
        let resp = self.command_ok("FETCH", &format!("FETCH {seq} RFC822"))?;
        resp.untagged
            .into_iter()
            .filter(|line| line.text.to_ascii_uppercase().contains("FETCH"))
            .find_map(|line| line.literals.into_iter().next())
            .ok_or_else(|| MailboxError::Protocol {
                command: "FETCH".into(),
                reason: format!("no message data for {seq}"),
            })
    }

    /// `CLOSE` then `LOGOUT`. A rejected CLOSE is not fatal.
    pub fn close_and_logout(&mut self) -> Result<(), MailboxError> {
        let close = self.command("CLOSE")?;
        if close.status != Status::Ok {
            debug!(reason = %close.text, "IMAP CLOSE rejected");
        }
        self.command_ok("LOGOUT", "LOGOUT").map(|_| ())
    }

    fn command_ok(&mut self, name: &str, cmd: &str) -> Result<Response, MailboxError> {
        let resp = self.command(cmd)?;
        if resp.status != Status::Ok {
            return Err(MailboxError::Protocol {
                command: name.to_string(),
                reason: resp.text,
            });
        }
        Ok(resp)
    }

    /// Send one tagged command and collect the response up to its tag.
    pub fn command(&mut self, cmd: &str) -> Result<Response, MailboxError> {
        let tag = format!("A{:04}", self.next_tag);
        self.next_tag += 1;

        let writer = self.stream.get_mut();
        writer.write_all(format!("{tag} {cmd}\r\n").as_bytes())?;
        writer.flush()?;

        let mut untagged = Vec::new();
        loop {
            let line = self.read_line()?;
            if let Some(rest) = line.text.strip_prefix(tag.as_str()) {
                let rest = rest.trim_start();
                let (word, text) = rest.split_once(' ').unwrap_or((rest, ""));
                let status = match word.to_ascii_uppercase().as_str() {
                    "OK" => Status::Ok,
                    "NO" => Status::No,
                    _ => Status::Bad,
                };
                return Ok(Response {
                    untagged,
                    status,
                    text: text.trim().to_string(),
                });
            }
            untagged.push(line);
        }
    }

    /// Read one logical response line, pulling in `{N}` literals.
    fn read_line(&mut self) -> Result<ResponseLine, MailboxError> {
        let mut line = ResponseLine::default();
        loop {
            let mut raw = Vec::new();
            let n = self.stream.read_until(b'\n', &mut raw)?;
            if n == 0 {
                return Err(MailboxError::Closed);
            }
            while raw.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
                raw.pop();
            }
            let chunk = String::from_utf8_lossy(&raw);
            line.text.push_str(&chunk);

            match literal_len(&chunk) {
                Some(len) => {
                    let mut literal = vec![0u8; len];
                    self.stream.read_exact(&mut literal)?;
                    line.literals.push(literal);
                }
                None => return Ok(line),
            }
        }
    }
}

/// Size of a `{N}` literal announced at the end of a line.
fn literal_len(chunk: &str) -> Option<usize> {
    let body = chunk.strip_suffix('}')?;
    let open = body.rfind('{')?;
    body[open + 1..].trim_end_matches('+').parse().ok()
}

/// IMAP quoted string.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

// ── TLS connector ───────────────────────────────────────────────────

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

/// Opens IMAPS sessions: TCP, rustls with webpki roots, then LOGIN.
#[derive(Debug, Default, Clone)]
pub struct ImapConnector;

impl ImapConnector {
    fn connect_tls(config: &MailboxConfig) -> Result<TlsStream, MailboxError> {
        let tcp = TcpStream::connect((config.host.as_str(), config.port)).map_err(|e| {
            MailboxError::Connect {
                host: config.host.clone(),
                port: config.port,
                reason: e.to_string(),
            }
        })?;
        tcp.set_read_timeout(Some(READ_TIMEOUT))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = Arc::new(
            rustls::ClientConfig::builder_with_provider(Arc::new(
                rustls::crypto::ring::default_provider(),
            ))
            .with_safe_default_protocol_versions()
            .map_err(|e| MailboxError::Tls(e.to_string()))?
            .with_root_certificates(root_store)
            .with_no_client_auth(),
        );
        let server_name = rustls_pki_types::ServerName::try_from(config.host.clone())
            .map_err(|e| MailboxError::Tls(format!("invalid server name: {e}")))?;
        let conn = rustls::ClientConnection::new(tls_config, server_name)
            .map_err(|e| MailboxError::Tls(e.to_string()))?;

        Ok(rustls::StreamOwned::new(conn, tcp))
    }
}

impl MailboxConnector for ImapConnector {
    fn open(&self, config: &MailboxConfig) -> Result<Box<dyn MailboxSession>, MailboxError> {
        info!(host = %config.host, port = config.port, "Connecting to IMAP server");
        let stream = Self::connect_tls(config)?;
        let mut session = ImapSession::start(stream)?;
        session.login(&config.username, config.password.expose_secret())?;
        info!(username = %config.username, "IMAP login succeeded");
        Ok(Box::new(session))
    }
}

impl<S: Read + Write> MailboxSession for ImapSession<S> {
    fn select_inbox(&mut self) -> Result<(), MailboxError> {
        self.select("INBOX")
    }

    fn search_all(&mut self) -> Result<Vec<u32>, MailboxError> {
        self.search("ALL")
    }

    fn fetch_message(&mut self, seq: u32) -> Result<Vec<u8>, MailboxError> {
        self.fetch_rfc822(seq)
    }

    fn logout(&mut self) -> Result<(), MailboxError> {
        self.close_and_logout().inspect_err(|e| warn!("IMAP logout failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Scripted server: reads come from `input`, writes are recorded.
    struct Scripted {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Scripted {
        fn new(server: &str) -> Self {
            Self {
                input: Cursor::new(server.as_bytes().to_vec()),
                written: Vec::new(),
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sent(session: ImapSession<Scripted>) -> String {
        String::from_utf8(session.stream.into_inner().written).unwrap()
    }

    #[test]
    fn login_sends_quoted_credentials() {
        let mut s = ImapSession::start(Scripted::new(
            "* OK IMAP4rev1 ready\r\nA0001 OK LOGIN completed\r\n",
        ))
        .unwrap();
        s.login("cell@college.edu", "p\"w").unwrap();
        assert_eq!(sent(s), "A0001 LOGIN \"cell@college.edu\" \"p\\\"w\"\r\n");
    }

    #[test]
    fn rejected_login_is_auth_error() {
        let mut s = ImapSession::start(Scripted::new(
            "* OK ready\r\nA0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n",
        ))
        .unwrap();
        let err = s.login("cell@college.edu", "wrong").unwrap_err();
        assert!(matches!(err, MailboxError::Auth { ref reason, .. } if reason.contains("Invalid credentials")));
    }

    #[test]
    fn bye_greeting_is_rejected() {
        let result = ImapSession::start(Scripted::new("* BYE too many connections\r\n"));
        assert!(matches!(result, Err(MailboxError::Protocol { .. })));
    }

    #[test]
    fn search_collects_sequence_numbers() {
        let mut s = ImapSession::start(Scripted::new(
            "* OK ready\r\n* SEARCH 1 2 3 17\r\nA0001 OK SEARCH completed\r\n",
        ))
        .unwrap();
        assert_eq!(s.search("ALL").unwrap(), vec![1, 2, 3, 17]);
    }

    #[test]
    fn empty_search_is_empty() {
        let mut s =
            ImapSession::start(Scripted::new("* OK ready\r\n* SEARCH\r\nA0001 OK done\r\n"))
                .unwrap();
        assert!(s.search("ALL").unwrap().is_empty());
    }

    #[test]
    fn fetch_reads_literal_exactly() {
        let message = "Subject: hi\r\n\r\nline one\r\nA0001 OK not a tag\r\n";
        let script = format!(
            "* OK ready\r\n* 4 FETCH (RFC822 {{{}}}\r\n{})\r\nA0001 OK FETCH completed\r\n",
            message.len(),
            message
        );
        let mut s = ImapSession::start(Scripted::new(&script)).unwrap();
        let body = s.fetch_rfc822(4).unwrap();
        assert_eq!(body, message.as_bytes());
    }

    #[test]
    fn fetch_without_literal_is_protocol_error() {
        let mut s = ImapSession::start(Scripted::new(
            "* OK ready\r\n* 4 FETCH (FLAGS (\\Seen))\r\nA0001 OK done\r\n",
        ))
        .unwrap();
        assert!(matches!(
            s.fetch_rfc822(4),
            Err(MailboxError::Protocol { .. })
        ));
    }

    #[test]
    fn tagged_no_on_select_is_protocol_error() {
        let mut s = ImapSession::start(Scripted::new(
            "* OK ready\r\nA0001 NO Mailbox doesn't exist\r\n",
        ))
        .unwrap();
        assert!(matches!(
            s.select("INBOX"),
            Err(MailboxError::Protocol { ref command, .. }) if command == "SELECT"
        ));
    }

    #[test]
    fn eof_mid_response_is_closed() {
        let mut s = ImapSession::start(Scripted::new("* OK ready\r\n* SEARCH 1\r\n")).unwrap();
        assert!(matches!(s.search("ALL"), Err(MailboxError::Closed)));
    }

    #[test]
    fn logout_tolerates_rejected_close() {
        let mut s = ImapSession::start(Scripted::new(
            "* OK ready\r\nA0001 BAD No mailbox selected\r\n* BYE logging out\r\nA0002 OK LOGOUT completed\r\n",
        ))
        .unwrap();
        s.close_and_logout().unwrap();
        assert_eq!(sent(s), "A0001 CLOSE\r\nA0002 LOGOUT\r\n");
    }

    #[test]
    fn literal_len_parses_markers() {
        assert_eq!(literal_len("* 1 FETCH (RFC822 {342}"), Some(342));
        assert_eq!(literal_len("A0001 OK done"), None);
        assert_eq!(literal_len("{12+}"), Some(12));
    }
}
