// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD and unread aggregation queries.

use innkeep_core::InnkeepError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{column_enum, column_json, Message};

const COLUMNS: &str = "id, thread_id, origin, direction, channel, content,
    attachments, reply_to_id, unsent, provider_event_id, created_at";

fn map_row(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        origin: column_enum(2, row.get(2)?)?,
        direction: column_enum(3, row.get(3)?)?,
        channel: column_enum(4, row.get(4)?)?,
        content: row.get(5)?,
        attachments: column_json(6, row.get(6)?)?,
        reply_to_id: row.get(7)?,
        unsent: row.get(8)?,
        provider_event_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Characters of body text kept as the thread's preview.
const PREVIEW_LEN: usize = 80;

/// Insert a message and bump its thread's activity columns in one
/// transaction.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), InnkeepError> {
    let msg = msg.clone();
    let attachments_json = serde_json::to_string(&msg.attachments)
        .map_err(|e| InnkeepError::Internal(format!("attachment serialization: {e}")))?;
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (id, thread_id, origin, direction, channel, content,
                     attachments, reply_to_id, unsent, provider_event_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    msg.id,
                    msg.thread_id,
                    msg.origin.to_string(),
                    msg.direction.to_string(),
                    msg.channel.to_string(),
                    msg.content,
                    attachments_json,
                    msg.reply_to_id,
                    msg.unsent,
                    msg.provider_event_id,
                ],
            )?;
            let preview: String = msg.content.chars().take(PREVIEW_LEN).collect();
            tx.execute(
                "UPDATE threads SET
                     last_message_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     last_message_preview = ?1
                 WHERE id = ?2",
                params![preview, msg.thread_id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one message by id.
pub async fn get_message(db: &Database, id: &str) -> Result<Option<Message>, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
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

/// Messages for a thread in chronological order.
pub async fn list_for_thread(db: &Database, thread_id: &str) -> Result<Vec<Message>, InnkeepError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE thread_id = ?1 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(params![thread_id], map_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Unread count for one thread.
///
/// Unread means: an incoming, not-unsent message with no delivery row in
/// `read` status. Always computed from durable rows, never cached.
pub async fn unread_count_for_thread(db: &Database, thread_id: &str) -> Result<u64, InnkeepError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages m
                 WHERE m.thread_id = ?1 AND m.direction = 'incoming' AND m.unsent = 0
                   AND NOT EXISTS (
                       SELECT 1 FROM deliveries d
                       WHERE d.message_id = m.id AND d.status = 'read'
                   )",
                params![thread_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Unread counts per thread, skipping threads with zero unread.
pub async fn unread_counts(db: &Database) -> Result<Vec<(String, u64)>, InnkeepError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.thread_id, COUNT(*) FROM messages m
                 WHERE m.direction = 'incoming' AND m.unsent = 0
                   AND NOT EXISTS (
                       SELECT 1 FROM deliveries d
                       WHERE d.message_id = m.id AND d.status = 'read'
                   )
                 GROUP BY m.thread_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
