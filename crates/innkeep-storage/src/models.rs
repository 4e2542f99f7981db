// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row model types for storage entities.
//!
//! Enums and ids come from `innkeep-core`; this module owns the row structs
//! and the helpers that map TEXT columns back into typed values.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use innkeep_core::{
    Channel, DeliveryStatus, MessageDirection, MessageOrigin, ReservationStatus, RuleTrigger,
    ScheduleStatus,
};
use serde::{Deserialize, Serialize};

pub use innkeep_pricing::Season;

/// Format an instant the way the schema's strftime default does:
/// RFC 3339 UTC with millisecond precision.
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Current instant in column format.
pub fn now_utc_string() -> String {
    format_utc(Utc::now())
}

/// A reservation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub guest_name: String,
    pub status: ReservationStatus,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    /// Set on child reservations of a group booking; the master owns the
    /// automation schedule.
    pub master_reservation_id: Option<String>,
    pub automation_paused: bool,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub ota_guest_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Reservation {
    /// Channel-specific recipient address, if the guest has one.
    pub fn contact_for(&self, channel: Channel) -> Option<String> {
        match channel {
            Channel::InApp => Some(self.id.clone()),
            Channel::Whatsapp | Channel::Sms => self.contact_phone.clone(),
            Channel::Email => self.contact_email.clone(),
            Channel::Ota => self.ota_guest_id.clone(),
        }
    }
}

/// A message template row. Body supports `{{placeholder}}` substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub name: String,
    pub body: String,
}

/// An automation rule row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: String,
    pub name: String,
    pub trigger: RuleTrigger,
    pub channel: Channel,
    pub template_id: String,
    pub enabled: bool,
}

/// A scheduled message row (dispatch queue entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMessage {
    pub id: String,
    pub reservation_id: String,
    pub rule_id: String,
    /// Column-format UTC instant; compared lexicographically against "now".
    pub fire_at: String,
    pub status: ScheduleStatus,
    pub cancel_reason: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A conversation thread row, one per reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub reservation_id: String,
    pub status: String,
    pub last_message_at: Option<String>,
    pub last_message_preview: Option<String>,
}

/// A message row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub origin: MessageOrigin,
    pub direction: MessageDirection,
    pub channel: Channel,
    pub content: String,
    pub attachments: Vec<String>,
    pub reply_to_id: Option<String>,
    pub unsent: bool,
    /// Provider-side event id for webhook idempotency.
    pub provider_event_id: Option<String>,
    pub created_at: String,
}

/// A delivery row: one message's lifecycle on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: String,
    pub message_id: String,
    pub channel: Channel,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub provider_message_id: Option<String>,
    pub queued_at: String,
    pub sent_at: Option<String>,
    pub delivered_at: Option<String>,
    pub read_at: Option<String>,
    pub failed_at: Option<String>,
}

/// Map a TEXT column into a strum-parsed enum, surfacing parse failures as
/// rusqlite conversion errors so they travel the normal error path.
pub(crate) fn column_enum<T>(idx: usize, value: String) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Map a TEXT date column (`YYYY-MM-DD`) into a `NaiveDate`.
pub(crate) fn column_date(idx: usize, value: String) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Map a TEXT column holding a JSON value into a typed value.
pub(crate) fn column_json<T: serde::de::DeserializeOwned>(
    idx: usize,
    value: String,
) -> Result<T, rusqlite::Error> {
    serde_json::from_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
