// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event clock: resolves a rule trigger into an absolute UTC fire instant.
//!
//! All date-relative arithmetic happens in the property's local timezone
//! and is converted to UTC only at the end, so "3 days before arrival at
//! 10:00" means 10:00 on the guest's wall clock regardless of DST.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use innkeep_core::{InnkeepError, RuleTrigger};
use innkeep_storage::models::Reservation;

/// Property-local send time for `after_departure` messages (mid-morning,
/// after checkout is done).
const AFTER_DEPARTURE_HOUR: u32 = 10;

/// A resolved fire instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireTime {
    /// The instant is still in the future.
    At(DateTime<Utc>),
    /// The computed instant is already in the past; the evaluator decides
    /// whether to fire immediately or skip.
    Elapsed(DateTime<Utc>),
}

impl FireTime {
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            FireTime::At(at) | FireTime::Elapsed(at) => *at,
        }
    }
}

/// The property's notion of local time and check-in/out hours.
#[derive(Debug, Clone)]
pub struct PropertyClock {
    timezone: Tz,
    check_in_time: NaiveTime,
    check_out_time: NaiveTime,
}

impl Default for PropertyClock {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            check_in_time: NaiveTime::from_hms_opt(15, 0, 0).expect("valid time"),
            check_out_time: NaiveTime::from_hms_opt(11, 0, 0).expect("valid time"),
        }
    }
}

impl PropertyClock {
    pub fn new(timezone: Tz, check_in_time: NaiveTime, check_out_time: NaiveTime) -> Self {
        Self {
            timezone,
            check_in_time,
            check_out_time,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolve `trigger` against a reservation at instant `now`.
    pub fn resolve(
        &self,
        trigger: &RuleTrigger,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> Result<FireTime, InnkeepError> {
        let fire_at = match trigger {
            RuleTrigger::OnCreateDelay { minutes } => {
                let created = DateTime::parse_from_rfc3339(&reservation.created_at)
                    .map_err(|e| {
                        InnkeepError::Internal(format!(
                            "unparseable created_at on reservation {}: {e}",
                            reservation.id
                        ))
                    })?
                    .with_timezone(&Utc);
                created + Duration::minutes(i64::from(*minutes))
            }
            RuleTrigger::BeforeArrival { days, at } => {
                let date = reservation.check_in_date - Duration::days(i64::from(*days));
                self.local_to_utc(date.and_time(*at))?
            }
            RuleTrigger::ArrivalDayBeforeCheckin { hours } => self.local_to_utc(
                reservation.check_in_date.and_time(self.check_in_time)
                    - Duration::hours(i64::from(*hours)),
            )?,
            RuleTrigger::AfterCheckin { hours } => self.local_to_utc(
                reservation.check_in_date.and_time(self.check_in_time)
                    + Duration::hours(i64::from(*hours)),
            )?,
            RuleTrigger::BeforeCheckout { hours } => self.local_to_utc(
                reservation.check_out_date.and_time(self.check_out_time)
                    - Duration::hours(i64::from(*hours)),
            )?,
            RuleTrigger::AfterDeparture { days } => {
                let date = reservation.check_out_date + Duration::days(i64::from(*days));
                let at = NaiveTime::from_hms_opt(AFTER_DEPARTURE_HOUR, 0, 0).expect("valid time");
                self.local_to_utc(date.and_time(at))?
            }
        };

        if fire_at <= now {
            Ok(FireTime::Elapsed(fire_at))
        } else {
            Ok(FireTime::At(fire_at))
        }
    }

    /// Interpret a property-local wall time as a UTC instant.
    ///
    /// DST ambiguity takes the earlier offset; a wall time inside a
    /// spring-forward gap is pushed one hour later.
    fn local_to_utc(&self, naive: NaiveDateTime) -> Result<DateTime<Utc>, InnkeepError> {
        match self.timezone.from_local_datetime(&naive) {
            chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            chrono::LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
            chrono::LocalResult::None => self
                .timezone
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| {
                    InnkeepError::Internal(format!(
                        "no local interpretation for {naive} in {}",
                        self.timezone
                    ))
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use innkeep_test_utils::fixtures;

    fn lisbon_clock() -> PropertyClock {
        PropertyClock::new(
            chrono_tz::Europe::Lisbon,
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        )
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn on_create_delay_counts_from_row_creation() {
        let clock = PropertyClock::default();
        let mut res = fixtures::reservation("res-1");
        res.created_at = "2026-06-01T12:00:00.000Z".to_string();

        let fire = clock
            .resolve(
                &RuleTrigger::OnCreateDelay { minutes: 30 },
                &res,
                utc("2026-06-01T12:00:00Z"),
            )
            .unwrap();
        assert_eq!(fire, FireTime::At(utc("2026-06-01T12:30:00Z")));
    }

    #[test]
    fn before_arrival_uses_property_local_wall_time() {
        let clock = lisbon_clock();
        let res = fixtures::reservation("res-1"); // check-in 2026-07-01

        // 3 days before check-in at 10:00 Lisbon; July is WEST (UTC+1)
        let fire = clock
            .resolve(
                &RuleTrigger::BeforeArrival {
                    days: 3,
                    at: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                },
                &res,
                utc("2026-06-01T00:00:00Z"),
            )
            .unwrap();
        assert_eq!(fire, FireTime::At(utc("2026-06-28T09:00:00Z")));
    }

    #[test]
    fn checkin_relative_offsets() {
        let clock = lisbon_clock();
        let res = fixtures::reservation("res-1");
        let now = utc("2026-06-01T00:00:00Z");

        // 2h before 15:00 check-in = 13:00 local = 12:00 UTC in July
        let before = clock
            .resolve(&RuleTrigger::ArrivalDayBeforeCheckin { hours: 2 }, &res, now)
            .unwrap();
        assert_eq!(before, FireTime::At(utc("2026-07-01T12:00:00Z")));

        let after = clock
            .resolve(&RuleTrigger::AfterCheckin { hours: 3 }, &res, now)
            .unwrap();
        assert_eq!(after, FireTime::At(utc("2026-07-01T17:00:00Z")));

        // 1h before 11:00 check-out on 2026-07-08
        let checkout = clock
            .resolve(&RuleTrigger::BeforeCheckout { hours: 1 }, &res, now)
            .unwrap();
        assert_eq!(checkout, FireTime::At(utc("2026-07-08T09:00:00Z")));
    }

    #[test]
    fn after_departure_sends_mid_morning() {
        let clock = lisbon_clock();
        let res = fixtures::reservation("res-1"); // check-out 2026-07-08

        let fire = clock
            .resolve(
                &RuleTrigger::AfterDeparture { days: 2 },
                &res,
                utc("2026-06-01T00:00:00Z"),
            )
            .unwrap();
        assert_eq!(fire, FireTime::At(utc("2026-07-10T09:00:00Z")));
    }

    #[test]
    fn past_instant_resolves_elapsed() {
        let clock = lisbon_clock();
        let res = fixtures::reservation("res-1");

        let fire = clock
            .resolve(
                &RuleTrigger::BeforeCheckout { hours: 1 },
                &res,
                utc("2026-08-01T00:00:00Z"),
            )
            .unwrap();
        assert!(matches!(fire, FireTime::Elapsed(_)));
        assert_eq!(fire.instant(), utc("2026-07-08T09:00:00Z"));
    }

    #[test]
    fn spring_forward_gap_shifts_one_hour_later() {
        // New York skips 02:00-03:00 on 2026-03-08
        let clock = PropertyClock::new(
            chrono_tz::America::New_York,
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        );
        let mut res = fixtures::reservation("res-1");
        res.check_in_date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();

        let fire = clock
            .resolve(
                &RuleTrigger::BeforeArrival {
                    days: 0,
                    at: NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
                },
                &res,
                utc("2026-01-01T00:00:00Z"),
            )
            .unwrap();
        // 02:30 does not exist; resolved as 03:30 EDT = 07:30 UTC
        assert_eq!(fire, FireTime::At(utc("2026-03-08T07:30:00Z")));
    }
}
