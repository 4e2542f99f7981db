// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel sender trait for outbound message transport.

use async_trait::async_trait;

use crate::error::InnkeepError;
use crate::types::{Channel, OutboundMessage};

/// Transport for one messaging surface (WhatsApp, email, SMS, OTA, in-app).
///
/// Senders are fire-and-forget from the dispatcher's point of view: a
/// successful `send` means the provider accepted the message, not that it
/// was delivered. Delivery progress arrives later via provider webhooks.
#[async_trait]
pub trait ChannelSender: Send + Sync + 'static {
    /// The channel this sender serves.
    fn channel(&self) -> Channel;

    /// Hand one rendered message to the provider.
    ///
    /// Returns the provider-side message id when the provider issues one,
    /// used to correlate later delivery receipts. Channels without an
    /// external transport (in-app) return `None`.
    async fn send(&self, msg: &OutboundMessage) -> Result<Option<String>, InnkeepError>;
}
