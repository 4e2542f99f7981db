// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seasonality / date-range multiplier matching.
//!
//! Seasons are held in operator-defined list order; the first season whose
//! range contains the queried date wins, so overlap resolution is simply
//! "earlier in the list beats later". Recurring seasons match by month and
//! day regardless of year, including ranges that wrap the year boundary
//! (e.g. 20 Dec - 05 Jan).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Multiplier applied when no season matches.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// One operator-defined season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub multiplier: f64,
    /// When true, only month and day of the bounds matter; the stored
    /// years are ignored.
    pub recurring: bool,
}

/// Normalize a date to a year-independent comparable: `month * 100 + day`.
///
/// Jan 5 -> 105, Dec 20 -> 1220. Lexicographic order over these integers
/// equals calendar order within one year.
fn month_day_key(date: NaiveDate) -> u32 {
    date.month() * 100 + date.day()
}

impl Season {
    /// Whether this season contains `date`. Both bounds are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if self.recurring {
            let key = month_day_key(date);
            let start = month_day_key(self.start_date);
            let end = month_day_key(self.end_date);
            if start <= end {
                start <= key && key <= end
            } else {
                // wraps the year boundary: Dec 20 - Jan 5 matches Dec 28
                // (key >= start) and Jan 2 (key <= end)
                key >= start || key <= end
            }
        } else {
            self.start_date <= date && date <= self.end_date
        }
    }
}

/// Resolve the multiplier for `date` against an ordered season list.
///
/// First match wins; no match yields [`DEFAULT_MULTIPLIER`].
pub fn multiplier_for(seasons: &[Season], date: NaiveDate) -> f64 {
    seasons
        .iter()
        .find(|s| s.contains(date))
        .map(|s| s.multiplier)
        .unwrap_or(DEFAULT_MULTIPLIER)
}

/// Resolve the matching season for `date`, if any.
pub fn season_for<'a>(seasons: &'a [Season], date: NaiveDate) -> Option<&'a Season> {
    seasons.iter().find(|s| s.contains(date))
}
