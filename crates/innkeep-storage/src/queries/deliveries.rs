// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery row operations.
//!
//! [`advance`] is the only write path for status changes. It re-reads the
//! current status inside the write transaction and applies
//! `DeliveryStatus::can_transition`, so a replayed webhook or late
//! mark-read call becomes a no-op instead of a regression.

use innkeep_core::{Channel, DeliveryStatus, InnkeepError};
use rusqlite::params;

use crate::database::Database;
use crate::models::{column_enum, Delivery};

const COLUMNS: &str = "id, message_id, channel, status, error, provider_message_id,
    queued_at, sent_at, delivered_at, read_at, failed_at";

fn map_row(row: &rusqlite::Row<'_>) -> Result<Delivery, rusqlite::Error> {
    Ok(Delivery {
        id: row.get(0)?,
        message_id: row.get(1)?,
        channel: column_enum(2, row.get(2)?)?,
        status: column_enum(3, row.get(3)?)?,
        error: row.get(4)?,
        provider_message_id: row.get(5)?,
        queued_at: row.get(6)?,
        sent_at: row.get(7)?,
        delivered_at: row.get(8)?,
        read_at: row.get(9)?,
        failed_at: row.get(10)?,
    })
}

/// Timestamp column stamped when a row enters `status`.
fn timestamp_column(status: DeliveryStatus) -> Option<&'static str> {
    match status {
        DeliveryStatus::Queued => None, // set by the insert default
        DeliveryStatus::Sent => Some("sent_at"),
        DeliveryStatus::Delivered => Some("delivered_at"),
        DeliveryStatus::Read => Some("read_at"),
        DeliveryStatus::Failed => Some("failed_at"),
    }
}

/// Create a delivery row in `queued`.
pub async fn create_delivery(
    db: &Database,
    id: &str,
    message_id: &str,
    channel: Channel,
) -> Result<(), InnkeepError> {
    let id = id.to_string();
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO deliveries (id, message_id, channel) VALUES (?1, ?2, ?3)",
                params![id, message_id, channel.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Advance a delivery to `to`, stamping the matching timestamp column.
///
/// Returns `true` when the transition was applied, `false` when the state
/// machine refused it (already there, regression, or terminal). A missing
/// row is `NotFound`.
pub async fn advance(
    db: &Database,
    message_id: &str,
    channel: Channel,
    to: DeliveryStatus,
    error: Option<String>,
    provider_message_id: Option<String>,
) -> Result<bool, InnkeepError> {
    let message_id = message_id.to_string();
    let message_id_for_err = message_id.clone();
    let applied = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let current = {
                let result = tx.query_row(
                    "SELECT status FROM deliveries WHERE message_id = ?1 AND channel = ?2",
                    params![message_id, channel.to_string()],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(status) => Some(column_enum::<DeliveryStatus>(0, status)?),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e.into()),
                }
            };

            let Some(current) = current else {
                tx.commit()?;
                return Ok(None);
            };

            if !current.can_transition(to) {
                tx.commit()?;
                return Ok(Some(false));
            }

            let mut sql = String::from("UPDATE deliveries SET status = ?1");
            if let Some(col) = timestamp_column(to) {
                sql.push_str(&format!(", {col} = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"));
            }
            sql.push_str(", error = ?2");
            sql.push_str(", provider_message_id = COALESCE(?3, provider_message_id)");
            sql.push_str(" WHERE message_id = ?4 AND channel = ?5");
            tx.execute(
                &sql,
                params![
                    to.to_string(),
                    error,
                    provider_message_id,
                    message_id,
                    channel.to_string(),
                ],
            )?;

            tx.commit()?;
            Ok(Some(true))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    applied.ok_or(InnkeepError::NotFound {
        entity: "delivery",
        id: message_id_for_err,
    })
}

/// Fetch the delivery row for one (message, channel) pair.
pub async fn get_delivery(
    db: &Database,
    message_id: &str,
    channel: Channel,
) -> Result<Option<Delivery>, InnkeepError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM deliveries WHERE message_id = ?1 AND channel = ?2"),
                params![message_id, channel.to_string()],
                map_row,
            );
            match result {
                Ok(delivery) => Ok(Some(delivery)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a delivery by the provider's message id (delivery receipts).
pub async fn get_by_provider_message_id(
    db: &Database,
    provider_message_id: &str,
) -> Result<Option<Delivery>, InnkeepError> {
    let provider_message_id = provider_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM deliveries WHERE provider_message_id = ?1"),
                params![provider_message_id],
                map_row,
            );
            match result {
                Ok(delivery) => Ok(Some(delivery)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace a failed row with a fresh `queued` one (operator re-dispatch).
///
/// Failed is terminal for the row itself; retrying means a new row under
/// the same (message, channel) key. Returns false unless the current row
/// is `failed`.
pub async fn requeue_failed(
    db: &Database,
    new_id: &str,
    message_id: &str,
    channel: Channel,
) -> Result<bool, InnkeepError> {
    let new_id = new_id.to_string();
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM deliveries
                 WHERE message_id = ?1 AND channel = ?2 AND status = 'failed'",
                params![message_id, channel.to_string()],
            )?;
            if removed == 0 {
                tx.commit()?;
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO deliveries (id, message_id, channel) VALUES (?1, ?2, ?3)",
                params![new_id, message_id, channel.to_string()],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use innkeep_core::MessageDirection;

    async fn setup() -> (Database, tempfile::TempDir, String) {
        let (db, dir) = testutil::open_temp_db().await;
        let thread = testutil::seed_reservation_graph(&db, "res-1").await;
        crate::queries::messages::insert_message(
            &db,
            &testutil::message("m-1", &thread.id, MessageDirection::Outgoing),
        )
        .await
        .unwrap();
        create_delivery(&db, "d-1", "m-1", Channel::Whatsapp)
            .await
            .unwrap();
        (db, dir, "m-1".to_string())
    }

    #[tokio::test]
    async fn happy_path_walks_forward_with_timestamps() {
        let (db, _dir, msg) = setup().await;

        for to in [
            DeliveryStatus::Sent,
            DeliveryStatus::Delivered,
            DeliveryStatus::Read,
        ] {
            assert!(advance(&db, &msg, Channel::Whatsapp, to, None, None)
                .await
                .unwrap());
        }

        let d = get_delivery(&db, &msg, Channel::Whatsapp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(d.status, DeliveryStatus::Read);
        assert!(d.sent_at.is_some());
        assert!(d.delivered_at.is_some());
        assert!(d.read_at.is_some());
        assert!(d.failed_at.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn regression_is_a_noop() {
        let (db, _dir, msg) = setup().await;

        advance(&db, &msg, Channel::Whatsapp, DeliveryStatus::Delivered, None, None)
            .await
            .unwrap();

        // replayed "sent" receipt after delivery: refused, status unchanged
        let applied = advance(&db, &msg, Channel::Whatsapp, DeliveryStatus::Sent, None, None)
            .await
            .unwrap();
        assert!(!applied);

        let d = get_delivery(&db, &msg, Channel::Whatsapp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(d.status, DeliveryStatus::Delivered);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_is_terminal_until_requeued() {
        let (db, _dir, msg) = setup().await;

        advance(
            &db,
            &msg,
            Channel::Whatsapp,
            DeliveryStatus::Failed,
            Some("timeout".to_string()),
            None,
        )
        .await
        .unwrap();

        // no forward move out of failed
        let applied = advance(&db, &msg, Channel::Whatsapp, DeliveryStatus::Sent, None, None)
            .await
            .unwrap();
        assert!(!applied);

        // operator re-dispatch replaces the row
        assert!(requeue_failed(&db, "d-2", &msg, Channel::Whatsapp)
            .await
            .unwrap());
        let d = get_delivery(&db, &msg, Channel::Whatsapp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(d.id, "d-2");
        assert_eq!(d.status, DeliveryStatus::Queued);
        assert!(d.error.is_none());

        // requeue of a non-failed row is refused
        assert!(!requeue_failed(&db, "d-3", &msg, Channel::Whatsapp)
            .await
            .unwrap());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn provider_message_id_sticks_and_resolves() {
        let (db, _dir, msg) = setup().await;

        advance(
            &db,
            &msg,
            Channel::Whatsapp,
            DeliveryStatus::Sent,
            None,
            Some("wamid.123".to_string()),
        )
        .await
        .unwrap();

        // later transitions without a provider id keep the stored one
        advance(&db, &msg, Channel::Whatsapp, DeliveryStatus::Delivered, None, None)
            .await
            .unwrap();

        let d = get_by_provider_message_id(&db, "wamid.123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(d.message_id, msg);
        assert_eq!(d.provider_message_id.as_deref(), Some("wamid.123"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn advance_on_missing_row_is_not_found() {
        let (db, _dir, _msg) = setup().await;
        let err = advance(&db, "ghost", Channel::Sms, DeliveryStatus::Sent, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, InnkeepError::NotFound { .. }));
        db.close().await.unwrap();
    }
}
