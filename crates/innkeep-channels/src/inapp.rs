// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-app channel: no external transport.

use async_trait::async_trait;
use innkeep_core::{Channel, ChannelSender, InnkeepError, OutboundMessage};
use tracing::debug;

/// Sender for the in-app channel.
///
/// Persisting the message row already delivers an in-app message, so the
/// dispatch sweep short-circuits before calling `send`. The sender exists
/// so the channel is present in registries and doctor checks.
#[derive(Debug, Default)]
pub struct InAppSender;

impl InAppSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> Channel {
        Channel::InApp
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<Option<String>, InnkeepError> {
        debug!(message_id = %msg.message_id, "in-app message needs no transport");
        Ok(None)
    }
}
