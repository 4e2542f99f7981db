// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule evaluator: turns enabled automation rules into scheduled-message
//! rows for one reservation.
//!
//! Evaluation runs on reservation events (creation, amendment, manual
//! trigger), never on a per-rule poll. It is idempotent per
//! (reservation, rule): re-evaluating an unchanged reservation is a no-op.

use chrono::{DateTime, Utc};
use innkeep_bus::{DomainEvent, EventBus};
use innkeep_core::{InnkeepError, ReservationId, ReservationStatus, RuleTrigger, ScheduleStatus};
use innkeep_storage::database::Database;
use innkeep_storage::models::{format_utc, ScheduledMessage};
use innkeep_storage::queries::{reservations, rules, scheduled};
use tracing::{debug, info};
use uuid::Uuid;

/// Replacement reason logged when `force` replaces a pending row.
pub const REASON_FORCED: &str = "forced retrigger";
/// Replacement reason logged when an amendment moved the fire time.
pub const REASON_DATES_CHANGED: &str = "reservation dates changed";

/// What one evaluation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    /// Rows newly enqueued.
    pub scheduled: usize,
    /// Pending rows superseded and re-enqueued (force or date amendment).
    pub replaced: usize,
    /// Rules skipped (elapsed date-relative trigger, or settled rows).
    pub skipped: usize,
}

impl EvaluationSummary {
    fn changed(&self) -> bool {
        self.scheduled > 0 || self.replaced > 0
    }
}

/// Evaluate every enabled rule against one reservation.
///
/// With `force`, existing pending rows are replaced by fresh ones at
/// freshly resolved fire times. Sent and claimed rows are history and
/// never touched.
pub async fn evaluate_reservation(
    db: &Database,
    bus: &EventBus,
    clock: &crate::clock::PropertyClock,
    reservation_id: &str,
    force: bool,
    now: DateTime<Utc>,
) -> Result<EvaluationSummary, InnkeepError> {
    let reservation = reservations::get_reservation(db, reservation_id)
        .await?
        .ok_or_else(|| InnkeepError::NotFound {
            entity: "reservation",
            id: reservation_id.to_string(),
        })?;

    let mut summary = EvaluationSummary::default();

    if reservation.status == ReservationStatus::Cancelled {
        debug!(reservation_id, "evaluation skipped: reservation cancelled");
        return Ok(summary);
    }
    if reservation.automation_paused {
        debug!(reservation_id, "evaluation skipped: automation paused");
        return Ok(summary);
    }
    if reservation.master_reservation_id.is_some() {
        // group booking child: the master reservation owns the schedule
        debug!(reservation_id, "evaluation skipped: child of group booking");
        return Ok(summary);
    }

    for rule in rules::list_enabled_rules(db).await? {
        let fire = clock.resolve(&rule.trigger, &reservation, now)?;
        let (fire_at, elapsed) = match fire {
            crate::clock::FireTime::At(at) => (format_utc(at), false),
            crate::clock::FireTime::Elapsed(_) => {
                if matches!(rule.trigger, RuleTrigger::OnCreateDelay { .. }) {
                    // a welcome message is still worth sending late
                    (format_utc(now), true)
                } else {
                    summary.skipped += 1;
                    continue;
                }
            }
        };

        match scheduled::get_for_rule(db, &reservation.id, &rule.id).await? {
            None => {
                enqueue_row(db, &reservation.id, &rule.id, &fire_at).await?;
                summary.scheduled += 1;
            }
            Some(row) if row.status == ScheduleStatus::Pending => {
                // an elapsed instant resolves to the evaluation time itself,
                // so comparing it against the stored row would replace the
                // row on every pass
                let reason = if force {
                    Some(REASON_FORCED)
                } else if !elapsed && row.fire_at != fire_at {
                    Some(REASON_DATES_CHANGED)
                } else {
                    None
                };
                if let Some(reason) = reason {
                    scheduled::remove_for_rule(db, &reservation.id, &rule.id).await?;
                    enqueue_row(db, &reservation.id, &rule.id, &fire_at).await?;
                    info!(
                        reservation_id,
                        rule_id = %rule.id,
                        reason,
                        fire_at,
                        "scheduled message replaced"
                    );
                    summary.replaced += 1;
                }
            }
            Some(row) if row.status == ScheduleStatus::Cancelled && force => {
                scheduled::remove_for_rule(db, &reservation.id, &rule.id).await?;
                enqueue_row(db, &reservation.id, &rule.id, &fire_at).await?;
                summary.replaced += 1;
            }
            // claimed, sent, failed, or cancelled without force: settled
            Some(_) => summary.skipped += 1,
        }
    }

    if summary.changed() {
        bus.publish(DomainEvent::ScheduleChanged {
            reservation_id: ReservationId(reservation.id.clone()),
        });
    }
    debug!(reservation_id, ?summary, "evaluation finished");
    Ok(summary)
}

async fn enqueue_row(
    db: &Database,
    reservation_id: &str,
    rule_id: &str,
    fire_at: &str,
) -> Result<bool, InnkeepError> {
    let now = innkeep_storage::models::now_utc_string();
    scheduled::enqueue(
        db,
        &ScheduledMessage {
            id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            rule_id: rule_id.to_string(),
            fire_at: fire_at.to_string(),
            status: ScheduleStatus::Pending,
            cancel_reason: None,
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
        },
    )
    .await
}

/// Cancel every pending scheduled message for a reservation.
///
/// Sent rows are untouched. Returns the number of rows cancelled.
pub async fn cancel_for_reservation(
    db: &Database,
    bus: &EventBus,
    reservation_id: &str,
    reason: &str,
) -> Result<usize, InnkeepError> {
    let cancelled = scheduled::cancel_by_reservation(db, reservation_id, reason).await?;
    if cancelled > 0 {
        info!(reservation_id, cancelled, reason, "scheduled messages cancelled");
        bus.publish(DomainEvent::ScheduleChanged {
            reservation_id: ReservationId(reservation_id.to_string()),
        });
    }
    Ok(cancelled)
}
