// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread operations. One thread per reservation.

use innkeep_core::InnkeepError;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::models::Thread;

const COLUMNS: &str = "id, reservation_id, status, last_message_at, last_message_preview";

fn map_row(row: &rusqlite::Row<'_>) -> Result<Thread, rusqlite::Error> {
    Ok(Thread {
        id: row.get(0)?,
        reservation_id: row.get(1)?,
        status: row.get(2)?,
        last_message_at: row.get(3)?,
        last_message_preview: row.get(4)?,
    })
}

/// Fetch the reservation's thread, creating it on first touch.
pub async fn get_or_create_thread(
    db: &Database,
    reservation_id: &str,
) -> Result<Thread, InnkeepError> {
    let reservation_id = reservation_id.to_string();
    let new_id = Uuid::new_v4().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, reservation_id) VALUES (?1, ?2)
                 ON CONFLICT (reservation_id) DO NOTHING",
                params![new_id, reservation_id],
            )?;
            Ok(conn.query_row(
                &format!("SELECT {COLUMNS} FROM threads WHERE reservation_id = ?1"),
                params![reservation_id],
                map_row,
            )?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one thread by id.
pub async fn get_thread(db: &Database, id: &str) -> Result<Option<Thread>, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM threads WHERE id = ?1"),
                params![id],
                map_row,
            );
            match result {
                Ok(thread) => Ok(Some(thread)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all threads, most recently active first.
pub async fn list_threads(db: &Database) -> Result<Vec<Thread>, InnkeepError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM threads
                 ORDER BY last_message_at IS NULL, last_message_at DESC"
            ))?;
            let rows = stmt.query_map([], map_row)?;
            let mut threads = Vec::new();
            for row in rows {
                threads.push(row?);
            }
            Ok(threads)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Close a thread (checkout flow). Returns false when it does not exist.
pub async fn set_status(db: &Database, id: &str, status: &str) -> Result<bool, InnkeepError> {
    let id = id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE threads SET status = ?1 WHERE id = ?2",
                params![status, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let (db, _dir) = testutil::open_temp_db().await;
        crate::queries::reservations::create_reservation(&db, &testutil::reservation("res-1"))
            .await
            .unwrap();

        let first = get_or_create_thread(&db, "res-1").await.unwrap();
        let second = get_or_create_thread(&db, "res-1").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.status, "open");
        assert!(first.last_message_at.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_and_lookup() {
        let (db, _dir) = testutil::open_temp_db().await;
        crate::queries::reservations::create_reservation(&db, &testutil::reservation("res-1"))
            .await
            .unwrap();

        let thread = get_or_create_thread(&db, "res-1").await.unwrap();
        assert!(set_status(&db, &thread.id, "closed").await.unwrap());
        let fetched = get_thread(&db, &thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, "closed");

        assert!(get_thread(&db, "missing").await.unwrap().is_none());

        db.close().await.unwrap();
    }
}
