//! SMTP submission via lettre.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::SmtpConfig;
use crate::error::SendError;
use crate::outbound::{MailSender, OutgoingEmail};

/// Blocking SMTP mailer (STARTTLS on the submission port).
pub struct SmtpMailer {
    from_address: String,
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, SendError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| SendError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            from_address: config.from_address.clone(),
            transport,
        })
    }

    /// Build the RFC 5322 message, threading it when `in_reply_to` is set.
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, SendError> {
        let mut builder = Message::builder()
            .from(self.from_address.parse().map_err(|e| SendError::InvalidAddress {
                address: self.from_address.clone(),
                reason: format!("{e}"),
            })?)
            .to(email.to.parse().map_err(|e| SendError::InvalidAddress {
                address: email.to.clone(),
                reason: format!("{e}"),
            })?)
            .subject(email.subject.as_str());

        if let Some(id) = &email.in_reply_to {
            let id = format!("<{}>", id.trim_start_matches('<').trim_end_matches('>'));
            builder = builder.in_reply_to(id.clone()).references(id);
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| SendError::Build(e.to_string()))
    }
}

impl MailSender for SmtpMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), SendError> {
        let message = self.build_message(email)?;
        self.transport
            .send(&message)
            .map_err(|e| SendError::Transport(e.to_string()))?;
        info!(to = %email.to, threaded = email.in_reply_to.is_some(), "Email sent");
        Ok(())
    }
}
