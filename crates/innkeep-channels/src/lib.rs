// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel sender implementations for the Innkeep messaging engine.
//!
//! Each sender implements [`innkeep_core::ChannelSender`] for one channel
//! and is constructed from its config section; a section without
//! credentials yields no sender, so unconfigured channels simply don't
//! exist at runtime.

use std::sync::Arc;

use innkeep_config::model::InnkeepConfig;
use innkeep_core::ChannelSender;

pub mod email;
pub mod inapp;
pub mod ota;
pub mod sms;
pub mod whatsapp;

pub use email::EmailSender;
pub use inapp::InAppSender;
pub use ota::OtaSender;
pub use sms::SmsSender;
pub use whatsapp::WhatsappSender;

/// Seconds before an outbound provider call is abandoned.
pub(crate) const SEND_TIMEOUT_SECS: u64 = 10;

/// Build every sender the configuration enables.
pub fn build_senders(config: &InnkeepConfig) -> Vec<Arc<dyn ChannelSender>> {
    let mut senders: Vec<Arc<dyn ChannelSender>> = vec![Arc::new(InAppSender::new())];
    if let Some(sender) = WhatsappSender::from_config(&config.whatsapp) {
        senders.push(Arc::new(sender));
    }
    if let Some(sender) = EmailSender::from_config(&config.email) {
        senders.push(Arc::new(sender));
    }
    if let Some(sender) = SmsSender::from_config(&config.sms) {
        senders.push(Arc::new(sender));
    }
    if let Some(sender) = OtaSender::from_config(&config.ota) {
        senders.push(Arc::new(sender));
    }
    senders
}
