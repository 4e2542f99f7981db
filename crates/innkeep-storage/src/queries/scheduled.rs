// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled message queue operations.
//!
//! The dispatch sweep claims due rows before sending: inside one
//! transaction a `pending` row flips to `claimed`, so a concurrent sweep
//! observing the same instant gets nothing. A claimed row then settles to
//! `sent` or `failed`.

use innkeep_core::{InnkeepError, ScheduleStatus};
use rusqlite::params;

use crate::database::Database;
use crate::models::{column_enum, ScheduledMessage};

const COLUMNS: &str = "id, reservation_id, rule_id, fire_at, status,
    cancel_reason, last_error, created_at, updated_at";

fn map_row(row: &rusqlite::Row<'_>) -> Result<ScheduledMessage, rusqlite::Error> {
    Ok(ScheduledMessage {
        id: row.get(0)?,
        reservation_id: row.get(1)?,
        rule_id: row.get(2)?,
        fire_at: row.get(3)?,
        status: column_enum(4, row.get(4)?)?,
        cancel_reason: row.get(5)?,
        last_error: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Enqueue one scheduled message.
///
/// Idempotent on (reservation_id, rule_id): a second enqueue for the same
/// pair is a no-op and returns `false`.
pub async fn enqueue(db: &Database, msg: &ScheduledMessage) -> Result<bool, InnkeepError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO scheduled_messages (id, reservation_id, rule_id, fire_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (reservation_id, rule_id) DO NOTHING",
                params![
                    msg.id,
                    msg.reservation_id,
                    msg.rule_id,
                    msg.fire_at,
                    msg.status.to_string(),
                ],
            )?;
            Ok(inserted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the row for one (reservation, rule) pair regardless of status.
pub async fn get_for_rule(
    db: &Database,
    reservation_id: &str,
    rule_id: &str,
) -> Result<Option<ScheduledMessage>, InnkeepError> {
    let reservation_id = reservation_id.to_string();
    let rule_id = rule_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM scheduled_messages
                     WHERE reservation_id = ?1 AND rule_id = ?2"
                ),
                params![reservation_id, rule_id],
                map_row,
            );
            match result {
                Ok(msg) => Ok(Some(msg)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim up to `limit` due rows, oldest fire_at first.
///
/// Atomically flips each selected `pending` row to `claimed` inside one
/// transaction and returns the claimed set. Rows another sweep claimed
/// first are simply not visible here.
pub async fn claim_due(
    db: &Database,
    now: &str,
    limit: usize,
) -> Result<Vec<ScheduledMessage>, InnkeepError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut due = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {COLUMNS} FROM scheduled_messages
                     WHERE status = 'pending' AND fire_at <= ?1
                     ORDER BY fire_at ASC
                     LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![now, limit as i64], map_row)?;
                let mut due = Vec::new();
                for row in rows {
                    due.push(row?);
                }
                due
            };

            for msg in &mut due {
                tx.execute(
                    "UPDATE scheduled_messages SET status = 'claimed',
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![msg.id],
                )?;
                msg.status = ScheduleStatus::Claimed;
            }

            tx.commit()?;
            Ok(due)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Settle a claimed row as sent.
pub async fn mark_sent(db: &Database, id: &str) -> Result<(), InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_messages SET status = 'sent', last_error = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'claimed'",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Settle a claimed row as failed, recording the dispatch error.
pub async fn mark_failed(db: &Database, id: &str, error: &str) -> Result<(), InnkeepError> {
    let id = id.to_string();
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_messages SET status = 'failed', last_error = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2 AND status = 'claimed'",
                params![error, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Cancel every pending row for a reservation with a reason.
///
/// Sent, claimed, and failed rows are untouched. Returns the number of
/// rows cancelled.
pub async fn cancel_by_reservation(
    db: &Database,
    reservation_id: &str,
    reason: &str,
) -> Result<usize, InnkeepError> {
    let reservation_id = reservation_id.to_string();
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_messages SET status = 'cancelled', cancel_reason = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE reservation_id = ?2 AND status = 'pending'",
                params![reason, reservation_id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove the row for a (reservation, rule) pair so it can be rescheduled.
///
/// Only pending and cancelled rows may be removed; a sent row is history.
pub async fn remove_for_rule(
    db: &Database,
    reservation_id: &str,
    rule_id: &str,
) -> Result<bool, InnkeepError> {
    let reservation_id = reservation_id.to_string();
    let rule_id = rule_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM scheduled_messages
                 WHERE reservation_id = ?1 AND rule_id = ?2
                   AND status IN ('pending', 'cancelled')",
                params![reservation_id, rule_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All rows for one reservation, oldest fire_at first.
pub async fn list_for_reservation(
    db: &Database,
    reservation_id: &str,
) -> Result<Vec<ScheduledMessage>, InnkeepError> {
    let reservation_id = reservation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM scheduled_messages
                 WHERE reservation_id = ?1 ORDER BY fire_at ASC"
            ))?;
            let rows = stmt.query_map(params![reservation_id], map_row)?;
            let mut msgs = Vec::new();
            for row in rows {
                msgs.push(row?);
            }
            Ok(msgs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    const PAST: &str = "2026-01-01T10:00:00.000Z";
    const NOW: &str = "2026-01-01T12:00:00.000Z";
    const FUTURE: &str = "2026-01-01T14:00:00.000Z";

    #[tokio::test]
    async fn enqueue_is_idempotent_per_reservation_rule() {
        let (db, _dir) = testutil::open_temp_db().await;
        testutil::seed_reservation_graph(&db, "res-1").await;

        let first = testutil::scheduled("sm-1", "res-1", "rule-1", FUTURE);
        assert!(enqueue(&db, &first).await.unwrap());

        // same pair, different id and fire_at: ignored
        let dup = testutil::scheduled("sm-2", "res-1", "rule-1", PAST);
        assert!(!enqueue(&db, &dup).await.unwrap());

        let stored = get_for_rule(&db, "res-1", "rule-1").await.unwrap().unwrap();
        assert_eq!(stored.id, "sm-1");
        assert_eq!(stored.fire_at, FUTURE);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_due_takes_only_due_pending_rows_in_fire_order() {
        let (db, _dir) = testutil::open_temp_db().await;
        testutil::seed_reservation_graph(&db, "res-1").await;
        crate::queries::rules::create_rule(&db, &testutil::rule("rule-2", "tpl-1"))
            .await
            .unwrap();
        crate::queries::rules::create_rule(&db, &testutil::rule("rule-3", "tpl-1"))
            .await
            .unwrap();

        enqueue(&db, &testutil::scheduled("sm-late", "res-1", "rule-1", NOW))
            .await
            .unwrap();
        enqueue(&db, &testutil::scheduled("sm-early", "res-1", "rule-2", PAST))
            .await
            .unwrap();
        enqueue(&db, &testutil::scheduled("sm-future", "res-1", "rule-3", FUTURE))
            .await
            .unwrap();

        let claimed = claim_due(&db, NOW, 10).await.unwrap();
        assert_eq!(claimed.len(), 2);
        assert_eq!(claimed[0].id, "sm-early");
        assert_eq!(claimed[1].id, "sm-late");
        assert!(claimed.iter().all(|m| m.status == ScheduleStatus::Claimed));

        // a second sweep at the same instant sees nothing
        let again = claim_due(&db, NOW, 10).await.unwrap();
        assert!(again.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_claims_yield_disjoint_rows() {
        let (db, _dir) = testutil::open_temp_db().await;
        testutil::seed_reservation_graph(&db, "res-1").await;
        enqueue(&db, &testutil::scheduled("sm-1", "res-1", "rule-1", PAST))
            .await
            .unwrap();

        // two "sweeps" race for the single due row
        let (a, b) = tokio::join!(claim_due(&db, NOW, 10), claim_due(&db, NOW, 10));
        let total = a.unwrap().len() + b.unwrap().len();
        assert_eq!(total, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn settle_sent_and_failed() {
        let (db, _dir) = testutil::open_temp_db().await;
        testutil::seed_reservation_graph(&db, "res-1").await;
        crate::queries::rules::create_rule(&db, &testutil::rule("rule-2", "tpl-1"))
            .await
            .unwrap();

        enqueue(&db, &testutil::scheduled("sm-1", "res-1", "rule-1", PAST))
            .await
            .unwrap();
        enqueue(&db, &testutil::scheduled("sm-2", "res-1", "rule-2", PAST))
            .await
            .unwrap();
        let claimed = claim_due(&db, NOW, 10).await.unwrap();
        assert_eq!(claimed.len(), 2);

        mark_sent(&db, "sm-1").await.unwrap();
        mark_failed(&db, "sm-2", "provider 500").await.unwrap();

        let rows = list_for_reservation(&db, "res-1").await.unwrap();
        let sm1 = rows.iter().find(|m| m.id == "sm-1").unwrap();
        let sm2 = rows.iter().find(|m| m.id == "sm-2").unwrap();
        assert_eq!(sm1.status, ScheduleStatus::Sent);
        assert_eq!(sm2.status, ScheduleStatus::Failed);
        assert_eq!(sm2.last_error.as_deref(), Some("provider 500"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_by_reservation_spares_sent_and_claimed() {
        let (db, _dir) = testutil::open_temp_db().await;
        testutil::seed_reservation_graph(&db, "res-1").await;
        crate::queries::rules::create_rule(&db, &testutil::rule("rule-2", "tpl-1"))
            .await
            .unwrap();
        crate::queries::rules::create_rule(&db, &testutil::rule("rule-3", "tpl-1"))
            .await
            .unwrap();

        enqueue(&db, &testutil::scheduled("sm-sent", "res-1", "rule-1", PAST))
            .await
            .unwrap();
        enqueue(&db, &testutil::scheduled("sm-claimed", "res-1", "rule-2", PAST))
            .await
            .unwrap();
        enqueue(&db, &testutil::scheduled("sm-pending", "res-1", "rule-3", FUTURE))
            .await
            .unwrap();

        let claimed = claim_due(&db, NOW, 10).await.unwrap();
        assert_eq!(claimed.len(), 2);
        mark_sent(&db, "sm-sent").await.unwrap();

        // sm-claimed is mid-dispatch: past the point of no return
        let cancelled = cancel_by_reservation(&db, "res-1", "reservation cancelled")
            .await
            .unwrap();
        assert_eq!(cancelled, 1);

        let rows = list_for_reservation(&db, "res-1").await.unwrap();
        assert_eq!(
            rows.iter().find(|m| m.id == "sm-sent").unwrap().status,
            ScheduleStatus::Sent
        );
        assert_eq!(
            rows.iter().find(|m| m.id == "sm-claimed").unwrap().status,
            ScheduleStatus::Claimed
        );
        let pending = rows.iter().find(|m| m.id == "sm-pending").unwrap();
        assert_eq!(pending.status, ScheduleStatus::Cancelled);
        assert_eq!(
            pending.cancel_reason.as_deref(),
            Some("reservation cancelled")
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn remove_for_rule_clears_pending_but_not_sent() {
        let (db, _dir) = testutil::open_temp_db().await;
        testutil::seed_reservation_graph(&db, "res-1").await;

        enqueue(&db, &testutil::scheduled("sm-1", "res-1", "rule-1", FUTURE))
            .await
            .unwrap();
        assert!(remove_for_rule(&db, "res-1", "rule-1").await.unwrap());
        assert!(get_for_rule(&db, "res-1", "rule-1").await.unwrap().is_none());

        // a sent row survives removal attempts
        enqueue(&db, &testutil::scheduled("sm-2", "res-1", "rule-1", PAST))
            .await
            .unwrap();
        claim_due(&db, NOW, 10).await.unwrap();
        mark_sent(&db, "sm-2").await.unwrap();
        assert!(!remove_for_rule(&db, "res-1", "rule-1").await.unwrap());
        assert!(get_for_rule(&db, "res-1", "rule-1").await.unwrap().is_some());

        db.close().await.unwrap();
    }

}
