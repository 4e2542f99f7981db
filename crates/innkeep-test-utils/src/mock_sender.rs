// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel sender for deterministic dispatch tests.
//!
//! Captures every [`OutboundMessage`] passed to `send()` for later
//! assertion, and can be scripted to fail so failure paths are testable
//! without a real provider.

use std::sync::Arc;

use async_trait::async_trait;
use innkeep_core::{Channel, ChannelSender, InnkeepError, OutboundMessage};
use tokio::sync::Mutex;

/// A channel sender that records instead of transmitting.
pub struct MockSender {
    channel: Channel,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl MockSender {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_with: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every subsequent `send()` fail with `message` until
    /// [`MockSender::succeed`] is called.
    pub async fn fail_with(&self, message: &str) {
        *self.fail_with.lock().await = Some(message.to_string());
    }

    /// Clear a scripted failure.
    pub async fn succeed(&self) {
        *self.fail_with.lock().await = None;
    }

    /// All messages captured so far.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl ChannelSender for MockSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<Option<String>, InnkeepError> {
        if let Some(message) = self.fail_with.lock().await.clone() {
            return Err(InnkeepError::channel(message));
        }
        self.sent.lock().await.push(msg.clone());
        Ok(Some(format!("mock-{}", uuid::Uuid::new_v4())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_core::MessageId;

    fn outbound(body: &str) -> OutboundMessage {
        OutboundMessage {
            message_id: MessageId("m-1".into()),
            recipient: "+351911111111".into(),
            subject: None,
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn send_captures_and_returns_provider_id() {
        let sender = MockSender::new(Channel::Whatsapp);
        let id = sender.send(&outbound("hello")).await.unwrap().unwrap();
        assert!(id.starts_with("mock-"));
        assert_eq!(sender.sent_count().await, 1);
        assert_eq!(sender.sent_messages().await[0].body, "hello");
    }

    #[tokio::test]
    async fn scripted_failure_then_recovery() {
        let sender = MockSender::new(Channel::Sms);
        sender.fail_with("provider 500").await;
        assert!(sender.send(&outbound("x")).await.is_err());
        assert_eq!(sender.sent_count().await, 0);

        sender.succeed().await;
        assert!(sender.send(&outbound("x")).await.is_ok());
        assert_eq!(sender.sent_count().await, 1);
    }
}
