// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Season persistence. The list is replaced wholesale; its stored
//! `position` preserves the operator's priority order for first-match-wins
//! resolution.

use innkeep_core::InnkeepError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{column_date, Season};

fn map_row(row: &rusqlite::Row<'_>) -> Result<Season, rusqlite::Error> {
    Ok(Season {
        id: row.get(0)?,
        name: row.get(1)?,
        start_date: column_date(2, row.get(2)?)?,
        end_date: column_date(3, row.get(3)?)?,
        multiplier: row.get(4)?,
        recurring: row.get(5)?,
    })
}

/// Replace the full season list in one transaction.
pub async fn replace_seasons(db: &Database, seasons: &[Season]) -> Result<(), InnkeepError> {
    let seasons = seasons.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM seasons", [])?;
            for (position, season) in seasons.iter().enumerate() {
                tx.execute(
                    "INSERT INTO seasons (id, name, start_date, end_date, multiplier, recurring, position)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        season.id,
                        season.name,
                        season.start_date.to_string(),
                        season.end_date.to_string(),
                        season.multiplier,
                        season.recurring,
                        position as i64,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Seasons in priority order.
pub async fn list_seasons(db: &Database) -> Result<Vec<Season>, InnkeepError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, start_date, end_date, multiplier, recurring
                 FROM seasons ORDER BY position ASC",
            )?;
            let rows = stmt.query_map([], map_row)?;
            let mut seasons = Vec::new();
            for row in rows {
                seasons.push(row?);
            }
            Ok(seasons)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
