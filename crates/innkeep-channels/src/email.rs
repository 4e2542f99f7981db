// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP email sender via lettre.

use async_trait::async_trait;
use innkeep_config::model::EmailConfig;
use innkeep_core::{Channel, ChannelSender, InnkeepError, OutboundMessage};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

/// Sends guest email through a configured SMTP relay.
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    /// Build from config; `None` when the section has no relay or from
    /// address configured, or when either is malformed.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        let host = config.smtp_host.clone()?;
        let from_address = config.from_address.clone()?;

        let from: Mailbox = match from_address.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                warn!(from_address, error = %e, "email sender disabled: bad from address");
                return None;
            }
        };

        let mut builder = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host) {
            Ok(builder) => builder.port(config.smtp_port),
            Err(e) => {
                warn!(host, error = %e, "email sender disabled: bad relay host");
                return None;
            }
        };
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Some(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<Option<String>, InnkeepError> {
        let to: Mailbox = msg.recipient.parse().map_err(|e| {
            InnkeepError::Validation(format!("bad email recipient {:?}: {e}", msg.recipient))
        })?;
        let subject = msg.subject.clone().unwrap_or_else(|| "Message from your host".to_string());

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(msg.body.clone())
            .map_err(|e| InnkeepError::Channel {
                message: "email could not be built".to_string(),
                source: Some(Box::new(e)),
            })?;

        self.transport
            .send(email)
            .await
            .map_err(|e| InnkeepError::Channel {
                message: "smtp send failed".to_string(),
                source: Some(Box::new(e)),
            })?;
        debug!(to = %msg.recipient, "email accepted by relay");
        // SMTP relays don't hand back a tracking id
        Ok(None)
    }
}
