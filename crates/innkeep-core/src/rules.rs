// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rule triggers.
//!
//! A trigger anchors a rule to one reservation lifecycle instant plus an
//! offset. Offsets are unsigned so a malformed negative offset is
//! unrepresentable; [`RuleTrigger::validate`] catches the remaining
//! nonsense values at rule-definition time.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::InnkeepError;

/// Upper bound on any trigger offset, in minutes (one year).
const MAX_OFFSET_MINUTES: u64 = 366 * 24 * 60;

/// When a rule fires, relative to a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleTrigger {
    /// N minutes after the reservation row was created.
    OnCreateDelay { minutes: u32 },
    /// N days before check-in date, at a fixed property-local time of day.
    BeforeArrival { days: u32, at: NaiveTime },
    /// On the check-in date, N hours before the property's check-in time.
    ArrivalDayBeforeCheckin { hours: u32 },
    /// N hours after the property's check-in time on the check-in date.
    AfterCheckin { hours: u32 },
    /// N hours before the property's check-out time on the check-out date.
    BeforeCheckout { hours: u32 },
    /// N days after the check-out date, sent mid-morning property-local.
    AfterDeparture { days: u32 },
}

impl RuleTrigger {
    /// Reject offsets no real rule would carry.
    pub fn validate(&self) -> Result<(), InnkeepError> {
        let minutes = match self {
            RuleTrigger::OnCreateDelay { minutes } => u64::from(*minutes),
            RuleTrigger::BeforeArrival { days, .. } | RuleTrigger::AfterDeparture { days } => {
                u64::from(*days) * 24 * 60
            }
            RuleTrigger::ArrivalDayBeforeCheckin { hours }
            | RuleTrigger::AfterCheckin { hours }
            | RuleTrigger::BeforeCheckout { hours } => u64::from(*hours) * 60,
        };
        if minutes > MAX_OFFSET_MINUTES {
            return Err(InnkeepError::Validation(format!(
                "trigger offset exceeds one year: {minutes} minutes"
            )));
        }
        Ok(())
    }
}
