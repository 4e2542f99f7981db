// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Innkeep guest-messaging engine.
//!
//! This crate provides the error taxonomy, domain types, the delivery
//! state machine, rule trigger definitions, and the traits implemented at
//! Innkeep's external seams (channel transport, blob storage).

pub mod delivery;
pub mod error;
pub mod rules;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use delivery::DeliveryStatus;
pub use error::InnkeepError;
pub use rules::RuleTrigger;
pub use types::{
    Channel, MessageDirection, MessageId, MessageOrigin, OutboundMessage, ReservationId,
    ReservationStatus, RuleId, ScheduleStatus, TemplateId, ThreadId,
};

pub use traits::{BlobStore, ChannelSender};
